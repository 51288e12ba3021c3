mod client;
mod controller;
mod negotiation;
mod rtc;
mod transport;

pub use client::*;
pub use controller::*;
pub use negotiation::*;
pub use rtc::*;
pub use transport::*;
