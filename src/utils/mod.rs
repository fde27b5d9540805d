//! Utility functions

pub mod format;
pub mod fs;
