//! Configuration management for the endgame admission webhook.
//!
//! Provides environment detection, layered configuration loading from YAML files
//! and environment variables, and the configuration types shared by the webhook
//! binary and its tests.

mod environment;
mod load;
pub mod shared;

pub use environment::*;
pub use load::*;
