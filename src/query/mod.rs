//! Translation of raw query-string parameters into a store query description.

mod builder;
pub mod params;
pub mod spec;

pub use builder::*;
pub use params::*;
pub use spec::*;
