//! Router-level middleware.

pub mod access_log;

pub use access_log::{access_log_middleware, AccessLog};
