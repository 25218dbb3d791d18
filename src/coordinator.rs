pub mod broadcaster;
pub mod logic;
pub mod types;

pub use logic::Coordinator;
pub use types::RunConfig;
