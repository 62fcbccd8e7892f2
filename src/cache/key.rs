//! Request fingerprinting.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Ordered parameter map for a remote operation.
pub type Params = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub hash: String,
    pub operation: Option<String>,
    pub provider: Option<String>,
}

impl Fingerprint {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into(), operation: None, provider: None }
    }
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self { self.operation = Some(operation.into()); self }
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self { self.provider = Some(provider.into()); self }
    pub fn as_str(&self) -> &str { &self.hash }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.hash) }
}

impl From<&str> for Fingerprint { fn from(s: &str) -> Self { Self::new(s) } }
impl From<String> for Fingerprint { fn from(s: String) -> Self { Self::new(s) } }

/// Produces a deterministic, order-independent fingerprint for an operation
/// and its parameters. Equivalent parameter maps always hash identically;
/// distinct operation names never share a canonical form.
pub struct Fingerprinter {
    normalize_strings: bool,
    salt: Option<String>,
}

impl Fingerprinter {
    pub fn new() -> Self { Self { normalize_strings: true, salt: None } }

    /// Namespace fingerprints, e.g. per deployment or schema revision.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self { self.salt = Some(salt.into()); self }

    /// Keep string parameters byte-exact instead of trimming/lower-casing.
    pub fn raw_strings(mut self) -> Self { self.normalize_strings = false; self }

    pub fn fingerprint(&self, operation: &str, params: &Params) -> Fingerprint {
        let canonical = self.canonical_text(operation, params);
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        Fingerprint::new(hash).with_operation(operation)
    }

    /// The exact text that gets hashed. The operation name is a separate
    /// line so it can never be confused with serialized parameter content.
    pub fn canonical_text(&self, operation: &str, params: &Params) -> String {
        let mut parts: BTreeMap<String, Value> =
            params.iter().map(|(k, v)| (k.clone(), self.normalize(v))).collect();
        if let Some(ref salt) = self.salt {
            parts.insert("__salt".into(), Value::String(salt.clone()));
        }
        format!("{}\n{}", operation, serde_json::to_string(&parts).unwrap_or_default())
    }

    fn normalize(&self, value: &Value) -> Value {
        match value {
            Value::String(s) if self.normalize_strings => Value::String(s.trim().to_lowercase()),
            Value::Array(items) => Value::Array(items.iter().map(|i| self.normalize(i)).collect()),
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.iter().map(|(k, v)| (k.clone(), self.normalize(v))).collect();
                serde_json::to_value(sorted).unwrap_or(Value::Null)
            }
            other => other.clone(),
        }
    }
}

impl Default for Fingerprinter { fn default() -> Self { Self::new() } }

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params_from(value: Value) -> Params {
        value.as_object().unwrap().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    #[test]
    fn permuted_params_share_a_fingerprint() {
        let fp = Fingerprinter::new();
        let a = params_from(json!({"prompt": "draft an intro", "temperature": 0.2, "options": {"b": 1, "a": 2}}));
        let b = params_from(json!({"options": {"a": 2, "b": 1}, "temperature": 0.2, "prompt": "draft an intro"}));
        assert_eq!(fp.fingerprint("generate", &a), fp.fingerprint("generate", &b));
    }

    #[test]
    fn whitespace_and_case_variants_share_a_fingerprint() {
        let fp = Fingerprinter::new();
        let a = params_from(json!({"prompt": "  Draft an intro  "}));
        let b = params_from(json!({"prompt": "draft an intro"}));
        assert_eq!(fp.fingerprint("generate", &a), fp.fingerprint("generate", &b));
    }

    #[test]
    fn operation_name_distinguishes_fingerprints() {
        let fp = Fingerprinter::new();
        let params = params_from(json!({"prompt": "draft an intro"}));
        assert_ne!(fp.fingerprint("generate", &params), fp.fingerprint("summarize", &params));
    }

    #[test]
    fn raw_strings_preserve_case() {
        let fp = Fingerprinter::new().raw_strings();
        let a = params_from(json!({"prompt": "Draft"}));
        let b = params_from(json!({"prompt": "draft"}));
        assert_ne!(fp.fingerprint("generate", &a), fp.fingerprint("generate", &b));
    }

    #[test]
    fn salt_namespaces_fingerprints() {
        let params = params_from(json!({"prompt": "draft an intro"}));
        let plain = Fingerprinter::new().fingerprint("generate", &params);
        let salted = Fingerprinter::new().with_salt("v2").fingerprint("generate", &params);
        assert_ne!(plain, salted);
    }
}
