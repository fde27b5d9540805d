pub mod app;
pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod test_utils;
pub mod utils;

pub use error::{AuditError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
