mod connection;
mod envelope;
mod room;
mod session;

pub use connection::ConnectionId;
pub use envelope::{Envelope, EnvelopeError};
pub use room::{RoomId, RoomSummary, RoomsReport};
pub use session::{IceCandidate, SdpType, SessionDescription};
