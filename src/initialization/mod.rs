//! Process-level initialization.
//!
//! Logger setup for the binary and for embedding applications.

mod logger;

pub use logger::init_logger_with;
