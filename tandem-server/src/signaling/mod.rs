mod relay_service;
mod rooms_handler;
mod ws_handler;

pub use relay_service::*;
pub use rooms_handler::*;
pub use ws_handler::*;
