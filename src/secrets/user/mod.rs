//! User secrets
//!
//! Secrets supplied and owned by end users, referenced with `secret://` URIs
//! and resolved through the same engine registry as encrypted secrets.

pub mod manager;
pub mod mapper;
pub mod reference;
pub mod secret;
pub mod service;

pub use manager::UserSecretManager;
pub use mapper::{UserSecretEncoding, UserSecretMapper, UserSecretType};
pub use reference::{UserSecretReference, SECRET_URI_SCHEME};
pub use secret::{UserSecret, UserSecretData, UserSecretMetadata};
pub use service::UserSecretService;
