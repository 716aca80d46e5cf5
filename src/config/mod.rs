//! Process configuration read from the environment.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;
