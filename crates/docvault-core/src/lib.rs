//! DocVault Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! SSE-C key manager shared across all DocVault components.

pub mod config;
pub mod error;
pub mod models;
pub mod ssec;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, FieldError, LogLevel};
pub use ssec::CustomerKey;
