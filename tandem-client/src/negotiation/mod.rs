mod candidate_buffer;
mod error;
mod peer;
mod session;
mod state;

pub use candidate_buffer::*;
pub use error::*;
pub use peer::*;
pub use session::*;
pub use state::*;
