//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain. Each sub-module represents a specific feature area.

mod file;
mod folder;
mod link;

// Re-export all models for convenient imports
pub use file::*;
pub use folder::*;
pub use link::*;
