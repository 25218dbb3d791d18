pub mod logic;
pub mod math;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use types::{DefaultListener, Listener, Worker};
