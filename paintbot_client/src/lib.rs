mod client;
mod error;
mod player;
mod transport;
pub use client::*;
pub use error::*;
pub use player::*;
pub use transport::*;
