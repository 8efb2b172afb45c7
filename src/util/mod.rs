//! Utility functions and helpers
//!
//! ## Modules
//!
//! - [`retry`] - Retry logic for resilient operations

pub mod retry;
