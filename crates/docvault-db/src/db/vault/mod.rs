pub mod file;
pub mod folder;
pub mod link;

pub use file::{VaultFileRepository, VaultFileRepositoryTrait};
pub use folder::{SmartFolderRepository, SmartFolderRepositoryTrait};
pub use link::{ShareLinkRepository, ShareLinkRepositoryTrait};
