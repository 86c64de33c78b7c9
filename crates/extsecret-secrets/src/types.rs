//! Core types for secret resolution

use extsecret_core::{Error, Result};
use std::collections::BTreeMap;
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Lookup sent to a store client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRequest {
    /// Secret identifier (name or ARN)
    pub secret_id: String,
    /// Region to query; `None` uses the client's default region
    pub region: Option<String>,
}

impl SecretRequest {
    pub fn new(secret_id: impl Into<String>, region: Option<&str>) -> Self {
        Self {
            secret_id: secret_id.into(),
            region: region.map(str::to_string),
        }
    }
}

/// Raw store response: text, binary, or (invalidly) neither
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StoredSecret {
    pub text: Option<String>,
    pub binary: Option<Vec<u8>>,
}

impl StoredSecret {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            text: Some(value.into()),
            binary: None,
        }
    }

    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self {
            text: None,
            binary: Some(value.into()),
        }
    }
}

impl std::fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSecret")
            .field("text", &self.text.as_ref().map(|t| format!("[REDACTED {} bytes]", t.len())))
            .field("binary", &self.binary.as_ref().map(|b| format!("[REDACTED {} bytes]", b.len())))
            .finish()
    }
}

/// Secret payload tagged by how the store returned it
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub enum SecretPayload {
    Text(String),
    Binary(Vec<u8>),
}

impl SecretPayload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            SecretPayload::Text(text) => text.as_bytes(),
            SecretPayload::Binary(bytes) => bytes,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, SecretPayload::Binary(_))
    }
}

impl std::fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretPayload::Text(text) => write!(f, "Text([REDACTED {} bytes])", text.len()),
            SecretPayload::Binary(bytes) => write!(f, "Binary([REDACTED {} bytes])", bytes.len()),
        }
    }
}

/// Content fetched for one (region, identifier) pair
///
/// The key:val decode is attempted once here and reused by every reference
/// that shares the cache entry.
pub struct SecretContent {
    payload: SecretPayload,
    fields: Option<BTreeMap<String, String>>,
}

impl SecretContent {
    pub fn new(payload: SecretPayload) -> Self {
        let fields = serde_json::from_slice::<BTreeMap<String, String>>(payload.as_bytes()).ok();
        Self { payload, fields }
    }

    /// Build content from a store response, preferring text over binary
    pub fn from_stored(secret_id: &str, stored: StoredSecret) -> Result<Self> {
        let payload = match (stored.text, stored.binary) {
            (Some(text), _) => {
                if text.is_empty() {
                    warn!("Secret '{}' has an empty string value", secret_id);
                }
                SecretPayload::Text(text)
            }
            (None, Some(binary)) => SecretPayload::Binary(binary),
            (None, None) => {
                return Err(Error::malformed_secret(
                    secret_id,
                    format!(
                        "no string or binary found, make sure the content of secret `{}` is not empty",
                        secret_id
                    ),
                ))
            }
        };

        Ok(Self::new(payload))
    }

    pub fn payload(&self) -> &SecretPayload {
        &self.payload
    }

    /// Raw content, exactly as stored
    pub fn as_bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }

    /// Decoded key:val mapping, if the content is a JSON object of strings
    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        self.fields.as_ref()
    }

    pub fn is_structured(&self) -> bool {
        self.fields.is_some()
    }
}

impl std::fmt::Debug for SecretContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretContent")
            .field("payload", &self.payload)
            .field("fields", &self.fields.as_ref().map(|f| f.len()))
            .finish()
    }
}

impl Drop for SecretContent {
    fn drop(&mut self) {
        if let Some(fields) = self.fields.as_mut() {
            for value in fields.values_mut() {
                value.zeroize();
            }
        }
    }
}
