mod webrtc_peer;

pub use webrtc_peer::*;
