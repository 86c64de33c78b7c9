//! Error types for extsecret-core

use thiserror::Error;

/// Result type alias using extsecret-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed store-level error carried by [`Error::StoreFetch`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error types for extsecret
#[derive(Error, Debug)]
pub enum Error {
    /// Manifest file not found
    #[error("Manifest file not found: {path}")]
    ManifestNotFound { path: String },

    /// Manifest parsed but is not something we can generate from
    #[error("Invalid manifest: {message}")]
    InvalidManifest { message: String },

    /// Structural violation of the template's selector invariants
    #[error("invalid input at .{path}: {message}")]
    Validation { path: String, message: String },

    /// The secret store failed to return the secret
    #[error("failed to fetch secret `{secret}`{}", region_suffix(.region))]
    StoreFetch {
        secret: String,
        region: Option<String>,
        #[source]
        source: BoxError,
    },

    /// A requested sub-key is absent from a multi-key secret
    #[error("invalid secret: missing key `{key}` in secret `{secret}`")]
    MissingKey { key: String, secret: String },

    /// Fetched content is empty or lacks the structure the reference needs
    #[error("invalid secret: {reason}")]
    MalformedSecret { secret: String, reason: String },

    /// Error raised while resolving a specific template location
    #[error("failed to resolve .{path}")]
    AtPath {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn region_suffix(region: &Option<String>) -> String {
    match region {
        Some(region) => format!(" in region `{}`", region),
        None => String::new(),
    }
}

impl Error {
    /// Create a manifest not found error
    pub fn manifest_not_found(path: impl Into<String>) -> Self {
        Self::ManifestNotFound { path: path.into() }
    }

    /// Create an invalid manifest error
    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: message.into(),
        }
    }

    /// Create a validation error for the given template path
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a store fetch error
    pub fn store_fetch(
        secret: impl Into<String>,
        region: Option<&str>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::StoreFetch {
            secret: secret.into(),
            region: region.map(str::to_string),
            source: source.into(),
        }
    }

    /// Create a missing key error
    pub fn missing_key(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::MissingKey {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Create a malformed secret error
    pub fn malformed_secret(secret: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSecret {
            secret: secret.into(),
            reason: reason.into(),
        }
    }

    /// Attach the template path the error was raised for
    pub fn at(self, path: impl Into<String>) -> Self {
        Self::AtPath {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The underlying error with any path context stripped
    pub fn root(&self) -> &Error {
        match self {
            Self::AtPath { source, .. } => source.root(),
            other => other,
        }
    }

    /// Template path the error was raised for, if known
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::AtPath { path, .. } | Self::Validation { path, .. } => Some(path),
            _ => None,
        }
    }
}
