//! # Observability Infrastructure
//!
//! Structured logging for secret resolution.

pub mod logging;

pub use logging::{env_filter, init_logging};
