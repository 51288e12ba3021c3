mod relay_link;
mod ws_connector;

pub use relay_link::*;
pub use ws_connector::*;
