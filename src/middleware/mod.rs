//! Middleware for observability.
//!
//! Request logging with latency tracking. Authentication middleware lives
//! with the rest of the auth stack in `crate::auth::middleware`.

pub mod logging;

pub use logging::request_logging;
