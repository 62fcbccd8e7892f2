//! Credential vault: validated storage plus multi-source resolution.

use super::seal::SecretSealer;
use super::store::SecretStore;
use super::VaultError;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

static PROVIDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid provider pattern"));

/// Process-level fallback variable consulted when neither a vault record
/// nor a per-provider variable resolves.
pub const GENERIC_CREDENTIAL_ENV: &str = "API_KEY";

/// Owns the durable representation of stored credentials. Callers only
/// ever see decoded secret values; sealed records stay internal, and an
/// undecodable record behaves exactly like an absent one.
pub struct CredentialVault {
    store: SecretStore,
    sealer: SecretSealer,
}

impl CredentialVault {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            store: SecretStore::open(path)?,
            sealer: SecretSealer::from_env(),
        })
    }

    pub fn open_with_passphrase(path: &Path, passphrase: &str) -> Result<Self> {
        Ok(Self {
            store: SecretStore::open(path)?,
            sealer: SecretSealer::new(passphrase),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            store: SecretStore::in_memory()?,
            sealer: SecretSealer::from_env(),
        })
    }

    pub fn set_credential(&self, provider: &str, secret: &str) -> Result<()> {
        validate_provider(provider)?;
        if secret.is_empty() {
            return Err(VaultError::EmptySecret.into());
        }
        let sealed = self.sealer.seal(secret)?;
        self.store.upsert(provider, &sealed)?;
        info!(provider, "credential stored");
        Ok(())
    }

    /// `None` covers both "no record" and "record undecodable"; the latter
    /// is logged so operators can re-provision.
    pub fn get_credential(&self, provider: &str) -> Option<String> {
        if validate_provider(provider).is_err() {
            return None;
        }
        let record = match self.store.get(provider) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(provider, error = %e, "vault read failed, treating credential as absent");
                return None;
            }
        };
        match self.sealer.open(&record.sealed_value) {
            Ok(secret) => Some(secret),
            Err(_) => {
                warn!(
                    provider,
                    "stored credential could not be decoded, treating as absent"
                );
                None
            }
        }
    }

    pub fn delete_credential(&self, provider: &str) -> Result<bool> {
        validate_provider(provider)?;
        let existed = self.store.delete(provider)?;
        if existed {
            info!(provider, "credential deleted");
        }
        Ok(existed)
    }

    /// Provider names only, never secret material.
    pub fn list_providers(&self) -> Result<Vec<String>> {
        Ok(self.store.list()?)
    }

    /// Resolution priority: vault record, then `{PROVIDER}_API_KEY`, then
    /// the generic `API_KEY`. Fails fast with a remediation hint before any
    /// network attempt when nothing resolves.
    pub fn resolve_credential(&self, provider: &str) -> Result<String> {
        if let Some(secret) = self.get_credential(provider) {
            debug!(provider, "credential resolved from vault");
            return Ok(secret);
        }
        let env_key = provider_env_var(provider);
        if let Ok(value) = std::env::var(&env_key) {
            if !value.is_empty() {
                debug!(provider, source = %env_key, "credential resolved from environment");
                return Ok(value);
            }
        }
        if let Ok(value) = std::env::var(GENERIC_CREDENTIAL_ENV) {
            if !value.is_empty() {
                debug!(provider, source = GENERIC_CREDENTIAL_ENV, "credential resolved from environment");
                return Ok(value);
            }
        }
        Err(Error::configuration_with_hint(
            format!("no credential configured for provider '{provider}'"),
            format!("store one with `ai-relay-cli set-credential {provider} <secret>` or export {env_key}"),
        ))
    }
}

/// Environment variable consulted for a provider, e.g. `openai` ->
/// `OPENAI_API_KEY`.
pub fn provider_env_var(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_uppercase().replace('-', "_"))
}

fn validate_provider(provider: &str) -> Result<()> {
    if provider.is_empty() || !PROVIDER_PATTERN.is_match(provider) {
        return Err(VaultError::InvalidProvider(provider.to_string()).into());
    }
    Ok(())
}
