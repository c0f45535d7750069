//! Business logic for the vault
//!
//! This crate composes the repositories and the object-store adapter into the
//! user-facing flows: share link issuance and anonymous resolution, and the
//! vault file lifecycle (upload, replace, delete, fetch). Link issuance is
//! serialized per tenant through an injected lock registry.

pub mod files;
pub mod links;
pub mod lock;
pub mod test_helpers;

pub use files::{FileContent, VaultFileService};
pub use links::{PublicLinkResolver, ShareLinkService};
pub use lock::LockRegistry;
