//! Selector validation
//!
//! Runs over the whole manifest before any store access. Every violation is
//! reported against its template path (`spec.data[i]`, `spec.dataFrom[i]`).

use crate::error::{Error, Result};
use crate::types::{Entry, ExternalSecret, ProviderRef, SecretSource};
use tracing::debug;

/// Validate a parsed manifest
///
/// `dataFrom` is checked before `data`; the first violation is returned.
pub fn validate(manifest: &ExternalSecret) -> Result<()> {
    for (i, source) in manifest.spec.data_from.iter().enumerate() {
        validate_spread(source, &data_from_path(i))?;
    }

    for (i, entry) in manifest.spec.data.iter().enumerate() {
        validate_entry(entry, &data_path(i))?;
    }

    debug!(
        "Validated manifest '{}': {} data entries, {} dataFrom imports",
        manifest.metadata.name,
        manifest.spec.data.len(),
        manifest.spec.data_from.len()
    );
    Ok(())
}

/// Template path of `spec.data[index]`
pub fn data_path(index: usize) -> String {
    format!("spec.data[{}]", index)
}

/// Template path of `spec.dataFrom[index]`
pub fn data_from_path(index: usize) -> String {
    format!("spec.dataFrom[{}]", index)
}

fn validate_spread(source: &SecretSource, path: &str) -> Result<()> {
    let reference = validate_source(source, path)?;

    if reference.key.is_some() {
        return Err(Error::validation(
            path,
            "`key` is not a valid option here as the content of the secret will be spread as key:val",
        ));
    }

    Ok(())
}

fn validate_entry(entry: &Entry, path: &str) -> Result<()> {
    if entry.key.is_empty() {
        return Err(Error::validation(path, "`key` is required"));
    }

    match (&entry.value, &entry.value_from) {
        (Some(_), Some(_)) => Err(Error::validation(
            path,
            "only one of `value` or `valueFrom` is permitted",
        )),
        (None, None) => Err(Error::validation(
            path,
            "one of `value` or `valueFrom` is required",
        )),
        (Some(_), None) => Ok(()),
        (None, Some(source)) => validate_source(source, path).map(|_| ()),
    }
}

fn validate_source<'a>(source: &'a SecretSource, path: &str) -> Result<&'a ProviderRef> {
    let reference = source.provider(path)?.reference();

    if reference.name.trim().is_empty() {
        return Err(Error::validation(path, "`name` of the secret is required"));
    }

    Ok(reference)
}
