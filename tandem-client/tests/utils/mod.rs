mod memory_relay;

pub use client_helpers::*;
pub use fake_peer::*;
pub use memory_relay::*;
pub use test_relay::*;
