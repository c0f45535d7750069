//! Test helpers for service unit tests
//!
//! Mock repositories over shared in-memory maps, fixtures for the vault
//! models, and a storage stand-in that fails every call. No database or
//! bucket is needed, making these suitable for isolated unit tests.

pub mod fixtures;
pub mod mock_repositories;
pub mod mock_storage;

pub use fixtures::*;
pub use mock_repositories::*;
pub use mock_storage::*;
