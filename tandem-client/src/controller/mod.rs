mod reconnect;
mod retry;
mod scheduler;

pub use reconnect::*;
pub use retry::*;
pub use scheduler::*;
