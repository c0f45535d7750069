//! Persistence layer for the vault: PostgreSQL pool setup, migrations,
//! transaction helpers and the repositories for smart folders, vault files
//! and share links.

pub mod db;

pub use db::*;
