//! Utility functions and helpers.

pub mod distance;
pub mod filename;
pub mod http;

pub use distance::{distance, is_changed};
