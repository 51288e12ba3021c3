mod test_peer_disconnect_triggers_leave;
