//! DocVault Storage Library
//!
//! This crate provides the object-store abstraction and implementations for
//! DocVault. It includes the ObjectStore trait, an S3-compatible backend and
//! an in-memory backend for tests and local development.
//!
//! # Object key format
//!
//! Object keys are tenant-scoped and taxonomy-derived. All backends use the
//! same key layout for consistency:
//!
//! - **Canonical**: `tenant/{tenant_id}/cat_{category}/subcat_{sub_category}/class_{classification}/{filename}`
//! - **Legacy**: pre-canonical `ten_{tenant}/...` keys are resolvable only
//!   through the substring fallback in [`keys::find_matching_key`].
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends and callers stay consistent.

pub mod keys;
#[cfg(feature = "storage-memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use keys::{find_matching_key, is_canonical_key, object_key, validate_key};
#[cfg(feature = "storage-memory")]
pub use memory::MemoryObjectStore;
#[cfg(feature = "storage-s3")]
pub use s3::S3ObjectStore;
pub use traits::{BucketStatus, ObjectStore, StorageError, StorageResult};
