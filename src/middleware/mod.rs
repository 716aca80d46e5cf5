//! Router-wide middleware.

pub mod errors;
pub mod request_time;

pub use errors::{not_found_fallback, render, respond_to_errors};
pub use request_time::stamp_request_time;
