use crate::vault::VaultError;
use thiserror::Error;

/// Unified error type for the orchestration runtime.
///
/// Only configuration errors, exhausted rate-limit/transient failures, and
/// client faults ever reach callers; cache, vault-decode, and usage faults
/// degrade in place and are logged instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {message}{}", format_hint(.hint))]
    Configuration {
        message: String,
        hint: Option<String>,
    },

    #[error("rate limited by provider (HTTP {status}): {message}")]
    RateLimited {
        status: u16,
        message: String,
        retry_after_ms: Option<u64>,
    },

    #[error("transient provider failure (HTTP {status}): {message}")]
    TransientServer { status: u16, message: String },

    #[error("provider rejected the request (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    /// Raw boundary error surfaced by a remote task, before classification.
    #[error("remote call failed (HTTP {status}): {message}")]
    Remote {
        status: u16,
        message: String,
        retry_after_ms: Option<u64>,
    },

    #[error("network transport error: {0}")]
    Transport(String),

    #[error("remote call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("cache fault: {0}")]
    Cache(String),

    #[error("credential vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("usage tracking fault: {0}")]
    UsageTracking(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" ({h})"),
        None => String::new(),
    }
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            hint: None,
        }
    }

    pub fn configuration_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// HTTP-like status carried by this error, if it came from the remote boundary.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RateLimited { status, .. }
            | Error::TransientServer { status, .. }
            | Error::Client { status, .. }
            | Error::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Provider-supplied retry hint, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Error::RateLimited { retry_after_ms, .. } | Error::Remote { retry_after_ms, .. } => {
                *retry_after_ms
            }
            _ => None,
        }
    }

    /// Replace any occurrence of `secret` in user-facing message text with
    /// its masked form. Applied before an error is propagated to callers.
    pub fn redact(self, secret: &str) -> Self {
        if secret.len() < 4 {
            return self;
        }
        let mask = crate::vault::mask_secret(secret);
        let scrub = |text: String| text.replace(secret, &mask);
        match self {
            Error::Configuration { message, hint } => Error::Configuration {
                message: scrub(message),
                hint: hint.map(scrub),
            },
            Error::RateLimited {
                status,
                message,
                retry_after_ms,
            } => Error::RateLimited {
                status,
                message: scrub(message),
                retry_after_ms,
            },
            Error::TransientServer { status, message } => Error::TransientServer {
                status,
                message: scrub(message),
            },
            Error::Client { status, message } => Error::Client {
                status,
                message: scrub(message),
            },
            Error::Remote {
                status,
                message,
                retry_after_ms,
            } => Error::Remote {
                status,
                message: scrub(message),
                retry_after_ms,
            },
            Error::Transport(message) => Error::Transport(scrub(message)),
            Error::Cache(message) => Error::Cache(scrub(message)),
            Error::UsageTracking(message) => Error::UsageTracking(scrub(message)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_masks_secret_in_messages() {
        let err = Error::Client {
            status: 401,
            message: "invalid key sk-verysecretvalue1234 supplied".into(),
        };
        let redacted = err.redact("sk-verysecretvalue1234");
        let text = redacted.to_string();
        assert!(!text.contains("sk-verysecretvalue1234"));
        assert!(text.contains("sk-v...1234"));
    }

    #[test]
    fn configuration_hint_is_rendered() {
        let err = Error::configuration_with_hint("no credential", "set one with the CLI");
        assert!(err.to_string().contains("set one with the CLI"));
    }
}
