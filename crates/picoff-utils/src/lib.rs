//! # picoff Utilities
//!
//! Shared utilities and logging for the picoff workspace.
//!
//! This crate provides common functionality used across the workspace,
//! including logging infrastructure built on `tracing`. Logs go to stderr so
//! they never mix with the listing the tool prints on stdout.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel};
pub use tracing::{debug, error, info, trace, warn};
