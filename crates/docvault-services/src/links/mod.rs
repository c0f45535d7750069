//! Share link issuance, management and anonymous resolution.

mod public;
mod service;

pub use public::{PublicLinkResolver, PUBLIC_URL_TTL};
pub use service::ShareLinkService;
