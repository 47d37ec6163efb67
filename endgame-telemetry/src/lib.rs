//! Logging and metrics setup for the endgame admission webhook.

pub mod metrics;
pub mod tracing;

pub use crate::tracing::{LogFlusher, TracingError, init_test_tracing, init_tracing};
