//! Database repositories for the data access layer
//!
//! Repositories live under vault/ (smart folders, vault files, share links).
//! Each repository owns the SQL for one table and provides tenant-scoped
//! operations plus the specialized queries the services need. Service-facing
//! traits sit next to their PostgreSQL implementations so tests can stand in
//! lightweight fakes.
//
// Pool setup and migrations
pub mod pool;
//
// Transaction utilities
pub mod transaction;
//
// Vault repositories (smart folders, vault files, share links)
pub mod vault;

pub use pool::setup_database;
pub use vault::{
    ShareLinkRepository, ShareLinkRepositoryTrait, SmartFolderRepository,
    SmartFolderRepositoryTrait, VaultFileRepository, VaultFileRepositoryTrait,
};
