//! 凭证保管模块：密封存储与多来源凭证解析。
//!
//! # Credential Vault Module
//!
//! Persists provider credentials locally, sealed at rest, and resolves the
//! credential for a provider by priority: vault record, per-provider
//! environment variable, generic `API_KEY` fallback. Secrets are decoded
//! only transiently in memory and are never logged or displayed beyond
//! their masked `first4...last4` form.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CredentialVault`] | Public contract: set/get/delete/list/resolve |
//! | [`SecretStore`] | SQLite-backed `secrets` table (WAL) |
//! | [`SecretSealer`] | ChaCha20-Poly1305 sealing, passphrase-derived key |
//! | [`mask_secret`] | Display masking for secret material |
//!
//! The sealing layer authenticates on read: a record sealed under a
//! different passphrase, or corrupted on disk, fails to open and is
//! reported as absent rather than as recovered partial plaintext.

mod manager;
mod seal;
mod store;

use thiserror::Error;

pub use manager::{provider_env_var, CredentialVault, GENERIC_CREDENTIAL_ENV};
pub use seal::{mask_secret, SecretSealer, PASSPHRASE_ENV};
pub use store::{SecretRecord, SecretStore};

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("invalid provider name '{0}' (letters, digits, hyphen, underscore only)")]
    InvalidProvider(String),

    #[error("secret value must not be empty")]
    EmptySecret,

    #[error("failed to seal secret")]
    Seal,

    #[error("stored secret could not be decoded")]
    Unseal,

    #[error("stored secret is not valid Base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("vault storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("vault lock poisoned")]
    Poisoned,

    #[error("vault internal error: {0}")]
    Internal(String),
}
