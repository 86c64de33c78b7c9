//! Manifest file loading and parsing

use crate::error::{Error, Result};
use crate::types::{ExternalSecret, EXTERNAL_SECRET_KIND};
use crate::validate::validate;
use camino::Utf8Path;
use std::fs;
use tracing::debug;

/// Reads ExternalSecret manifests from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl ManifestLoader {
    /// Load, parse, and validate the manifest at `path`
    pub fn load(path: &Utf8Path) -> Result<ExternalSecret> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::manifest_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        debug!("Loaded manifest from {} ({} bytes)", path, content.len());
        Self::load_str(&content)
    }

    /// Parse and validate a manifest held in memory
    pub fn load_str(content: &str) -> Result<ExternalSecret> {
        let manifest = ExternalSecret::from_yaml_str(content)?;

        if manifest.kind != EXTERNAL_SECRET_KIND {
            return Err(Error::invalid_manifest(format!(
                "expected kind `{}`, found `{}`",
                EXTERNAL_SECRET_KIND, manifest.kind
            )));
        }

        validate(&manifest)?;
        Ok(manifest)
    }
}
