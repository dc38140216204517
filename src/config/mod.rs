//! Configuration and constants.
//!
//! This module provides:
//! - Configuration constants (environment variable names, fallbacks, URLs)
//! - Database connection configuration
//! - CLI option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{DatabaseConfig, LogFormat, LogLevel};
