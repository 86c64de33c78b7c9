//! ExternalSecret generator manifest types
//!
//! These mirror the document kustomize hands to the exec plugin. Everything
//! here is plain data; the exactly-one rules are enforced by
//! [`crate::validate`] and [`SecretSource::provider`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind accepted by the generator
pub const EXTERNAL_SECRET_KIND: &str = "ExternalSecret";

/// Secret type used when the manifest does not set one
pub const DEFAULT_SECRET_TYPE: &str = "Opaque";

/// Root input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecret {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Kubernetes secret type of the generated Secret
    #[serde(default = "default_secret_type", rename = "type")]
    pub secret_type: String,

    #[serde(default)]
    pub spec: ExternalSecretSpec,
}

fn default_secret_type() -> String {
    DEFAULT_SECRET_TYPE.to_string()
}

impl ExternalSecret {
    /// Parse a manifest from YAML without validating it
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Default store region for references that do not carry their own
    pub fn default_region(&self) -> Option<&str> {
        non_blank(self.spec.store_config.region.as_deref())
    }
}

/// Identity metadata passed through to the generated Secret
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Generator settings and the secret composition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretSpec {
    #[serde(default)]
    pub store_config: StoreConfig,

    /// kustomize merge behavior for the generated Secret
    #[serde(default)]
    pub behavior: Behavior,

    #[serde(default)]
    pub disable_name_suffix_hash: bool,

    /// Explicit keys, applied after `dataFrom` and in declaration order
    #[serde(default)]
    pub data: Vec<Entry>,

    /// Whole-secret imports spread into the output as key:val
    #[serde(default)]
    pub data_from: Vec<SecretSource>,
}

/// Store-wide defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// kustomize generator behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    #[default]
    Create,
    Merge,
    Replace,
}

impl std::fmt::Display for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Behavior::Create => write!(f, "create"),
            Behavior::Merge => write!(f, "merge"),
            Behavior::Replace => write!(f, "replace"),
        }
    }
}

/// One named output key with a literal or store-backed value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default)]
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<SecretSource>,
}

impl Entry {
    /// Entry with a literal value
    pub fn literal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    /// Entry backed by a store reference
    pub fn from_source(key: impl Into<String>, source: SecretSource) -> Self {
        Self {
            key: key.into(),
            value: None,
            value_from: Some(source),
        }
    }
}

/// Provider selector: names exactly one store-backed provider
///
/// Unknown selector keys are kept instead of rejected by serde so the
/// validator can report them against the template path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_ref: Option<ProviderRef>,

    #[serde(flatten)]
    pub unsupported: BTreeMap<String, serde_yaml_ng::Value>,
}

impl SecretSource {
    /// Selector pointing at the keyed secret store
    pub fn provider_ref(reference: ProviderRef) -> Self {
        Self {
            provider_ref: Some(reference),
            unsupported: BTreeMap::new(),
        }
    }

    /// Select the single provider this source names
    pub fn provider(&self, path: &str) -> Result<Provider<'_>> {
        if let Some(kind) = self.unsupported.keys().next() {
            let message = if self.provider_ref.is_some() {
                format!(
                    "only one of the supported secret providers is permitted, `{}` is not supported",
                    kind
                )
            } else {
                format!("`{}` is not a supported secret provider", kind)
            };
            return Err(Error::validation(path, message));
        }

        match &self.provider_ref {
            Some(reference) => Ok(Provider::SecretsManager(reference)),
            None => Err(Error::validation(
                path,
                "one of the supported secret providers is required",
            )),
        }
    }
}

/// Supported provider variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Provider<'a> {
    SecretsManager(&'a ProviderRef),
}

impl<'a> Provider<'a> {
    /// Reference into the store backing this provider
    pub fn reference(&self) -> &'a ProviderRef {
        match self {
            Provider::SecretsManager(reference) => reference,
        }
    }

    /// Selector key used in manifests
    pub fn kind(&self) -> &'static str {
        match self {
            Provider::SecretsManager(_) => "providerRef",
        }
    }
}

/// Reference to a secret held in the keyed store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRef {
    /// Secret identifier (name or ARN)
    #[serde(default)]
    pub name: String,

    /// Field to extract from a multi-key secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Region override; falls back to `storeConfig.region`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl ProviderRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
            region: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Region the reference resolves in, given the template default
    ///
    /// Blank regions count as unset on both sides.
    pub fn effective_region<'a>(&'a self, default_region: Option<&'a str>) -> Option<&'a str> {
        non_blank(self.region.as_deref()).or(non_blank(default_region))
    }
}

fn non_blank(region: Option<&str>) -> Option<&str> {
    region.filter(|r| !r.trim().is_empty())
}
