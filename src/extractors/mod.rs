//! Request extractors.

mod path;
mod query;
mod request_time;

pub use path::PathSegment;
pub use request_time::RequestTime;
