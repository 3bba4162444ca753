//! Utility functions for working with sample buffers.
//!
//! # Modules
//!
//! - [`comparison`] - Buffer comparison and similarity utilities
//! - [`generation`] - Test-signal generation utilities

pub mod comparison;
pub mod generation;

// Re-export common utilities
pub use comparison::*;
pub use generation::*;
