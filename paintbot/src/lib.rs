pub use coordinate::*;
pub use errors::*;
pub use map::*;
pub use protocol::*;
pub use visualization::*;

#[cfg(test)]
mod arbitrary;
mod coordinate;
mod errors;
mod map;
mod protocol;
mod visualization;
