mod member;
mod room;
mod room_registry;

pub use member::*;
pub use room::*;
pub use room_registry::*;
