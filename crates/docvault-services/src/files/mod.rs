//! Vault file lifecycle around the object-store adapter.

mod service;

pub use service::{FileContent, VaultFileService, DOWNLOAD_URL_TTL};
