//! Secret sealing and masking.
//!
//! Stored credentials are sealed with ChaCha20-Poly1305 rather than a
//! reversible obfuscation, keyed from a passphrase (environment-supplied,
//! with an application default). A random 12-byte nonce is prepended to the
//! ciphertext and the whole blob is Base64-encoded for storage. Records
//! that fail authentication are reported as undecodable, never as partial
//! plaintext.

use super::VaultError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;
const DEFAULT_PASSPHRASE: &str = "ai-relay-vault-v1";

/// Environment variable that overrides the sealing passphrase.
pub const PASSPHRASE_ENV: &str = "AI_RELAY_VAULT_PASSPHRASE";

pub struct SecretSealer {
    cipher: ChaCha20Poly1305,
}

impl SecretSealer {
    pub fn new(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let key = Key::from_slice(digest.as_slice());
        Self {
            cipher: ChaCha20Poly1305::new(key),
        }
    }

    pub fn from_env() -> Self {
        let passphrase =
            std::env::var(PASSPHRASE_ENV).unwrap_or_else(|_| DEFAULT_PASSPHRASE.to_string());
        Self::new(&passphrase)
    }

    pub fn seal(&self, secret: &str) -> Result<String, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, secret.as_bytes())
            .map_err(|_| VaultError::Seal)?;
        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(blob))
    }

    pub fn open(&self, sealed: &str) -> Result<String, VaultError> {
        let blob = BASE64.decode(sealed)?;
        if blob.len() <= NONCE_LEN {
            return Err(VaultError::Unseal);
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::Unseal)?;
        String::from_utf8(plaintext).map_err(|_| VaultError::Unseal)
    }
}

/// `first4...last4`, or a fixed short mask for secrets too small to
/// partially reveal.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_round_trip() {
        let sealer = SecretSealer::new("test-passphrase");
        let sealed = sealer.seal("sk-abc123xyz789").unwrap();
        assert_ne!(sealed, "sk-abc123xyz789");
        assert_eq!(sealer.open(&sealed).unwrap(), "sk-abc123xyz789");
    }

    #[test]
    fn nonces_differ_between_seals() {
        let sealer = SecretSealer::new("test-passphrase");
        let a = sealer.seal("same-secret-value").unwrap();
        let b = sealer.seal("same-secret-value").unwrap();
        assert_ne!(a, b);
        assert_eq!(sealer.open(&a).unwrap(), sealer.open(&b).unwrap());
    }

    #[test]
    fn wrong_passphrase_fails_authentication() {
        let sealed = SecretSealer::new("passphrase-one").seal("sk-secret").unwrap();
        assert!(matches!(
            SecretSealer::new("passphrase-two").open(&sealed),
            Err(VaultError::Unseal)
        ));
    }

    #[test]
    fn garbage_blobs_are_rejected() {
        let sealer = SecretSealer::new("test-passphrase");
        assert!(sealer.open("not-base64!!!").is_err());
        assert!(sealer.open(&BASE64.encode(b"short")).is_err());
    }

    #[test]
    fn mask_reveals_only_edges() {
        assert_eq!(mask_secret("AIzaSyABCDEFGH1234"), "AIza...1234");
        assert_eq!(mask_secret("short6"), "****");
        assert_eq!(mask_secret("12345678"), "****");
        assert_eq!(mask_secret(""), "****");
    }
}
