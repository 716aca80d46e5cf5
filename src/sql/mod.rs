//! SQL for the PostgreSQL document store: collection and field names only ever reach SQL as
//! quoted static identifiers or bound parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
