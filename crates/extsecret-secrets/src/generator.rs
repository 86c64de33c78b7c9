//! Secret generation
//!
//! Walks the manifest, resolves every store-backed value, and merges the
//! results into a Kubernetes Secret:
//! - `dataFrom` imports first, in declaration order
//! - `data` entries second, in declaration order
//!
//! A later write always replaces an earlier one, so explicit entries win over
//! spread imports. Resolution fans out with bounded concurrency; the merge
//! itself always follows declaration order.

use crate::cache::ResolutionCache;
use crate::resolver::Resolver;
use crate::store::SecretStore;
use extsecret_core::types::{
    Entry, ExternalSecret, ObjectMeta, Secret, SecretSource, BEHAVIOR_ANNOTATION,
    NEEDS_HASH_ANNOTATION,
};
use extsecret_core::validate::{data_from_path, data_path, validate};
use extsecret_core::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of references resolved at once
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Generator settings that do not come from the manifest
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Maximum in-flight resolutions
    pub concurrency: usize,
    /// Region used when the manifest sets no `storeConfig.region`
    pub default_region: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            default_region: None,
        }
    }
}

/// Builds Secrets from ExternalSecret manifests
pub struct Generator {
    store: Arc<dyn SecretStore>,
    options: GeneratorOptions,
}

enum Job<'m> {
    Spread { path: String, source: &'m SecretSource },
    Entry { path: String, entry: &'m Entry },
}

enum Resolved<'m> {
    Spread(BTreeMap<String, Vec<u8>>),
    Entry { key: &'m str, value: Vec<u8> },
}

impl Generator {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self::with_options(store, GeneratorOptions::default())
    }

    pub fn with_options(store: Arc<dyn SecretStore>, options: GeneratorOptions) -> Self {
        Self { store, options }
    }

    /// Generate a Secret with a fresh cache
    pub async fn generate(&self, manifest: &ExternalSecret) -> Result<Secret> {
        let cache = ResolutionCache::new();
        self.generate_with_cache(manifest, &cache).await
    }

    /// Generate a Secret, resolving through the given cache
    ///
    /// Validation runs before any store access. Any error aborts the run and
    /// no partial Secret is returned.
    pub async fn generate_with_cache(
        &self,
        manifest: &ExternalSecret,
        cache: &ResolutionCache,
    ) -> Result<Secret> {
        validate(manifest)?;

        let default_region = manifest
            .default_region()
            .or(self.options.default_region.as_deref());
        let resolver = Resolver::new(self.store.as_ref(), cache, default_region);

        let spreads = manifest
            .spec
            .data_from
            .iter()
            .enumerate()
            .map(|(i, source)| Job::Spread {
                path: data_from_path(i),
                source,
            });
        let entries = manifest
            .spec
            .data
            .iter()
            .enumerate()
            .map(|(i, entry)| Job::Entry {
                path: data_path(i),
                entry,
            });

        let resolved: Vec<Resolved<'_>> = stream::iter(spreads.chain(entries))
            .map(|job| run_job(&resolver, job))
            .buffered(self.options.concurrency.max(1))
            .try_collect()
            .await?;

        let mut secret = Secret::new(output_metadata(manifest), manifest.secret_type.clone());
        for item in resolved {
            match item {
                Resolved::Spread(fields) => {
                    for (key, value) in fields {
                        secret.insert(key, value);
                    }
                }
                Resolved::Entry { key, value } => secret.insert(key, value),
            }
        }

        let stats = cache.stats();
        info!(
            "Generated Secret '{}' with {} keys ({} store fetches, {} cache hits)",
            secret.metadata.name,
            secret.data.len(),
            stats.misses,
            stats.hits
        );

        Ok(secret)
    }
}

async fn run_job<'m>(resolver: &Resolver<'_>, job: Job<'m>) -> Result<Resolved<'m>> {
    match job {
        Job::Spread { path, source } => {
            let provider = source.provider(&path)?;
            debug!("Resolving {} via {}", path, provider.kind());

            let fields = resolver
                .resolve_spread(provider.reference())
                .await
                .map_err(|e| e.at(&path))?;
            Ok(Resolved::Spread(fields))
        }
        Job::Entry { path, entry } => {
            let value = match (&entry.value, &entry.value_from) {
                (Some(value), _) => value.as_bytes().to_vec(),
                (None, Some(source)) => {
                    let provider = source.provider(&path)?;
                    debug!("Resolving {} via {}", path, provider.kind());

                    resolver
                        .resolve(provider.reference())
                        .await
                        .map_err(|e| e.at(&path))?
                }
                // validate() rejects entries without a value source
                (None, None) => unreachable!("entry at {} has no value source", path),
            };

            Ok(Resolved::Entry {
                key: &entry.key,
                value,
            })
        }
    }
}

/// Identity metadata plus the derived kustomize annotations
///
/// User annotations are copied first; the derived ones always win.
fn output_metadata(manifest: &ExternalSecret) -> ObjectMeta {
    let mut annotations = manifest.metadata.annotations.clone();
    annotations.insert(
        NEEDS_HASH_ANNOTATION.to_string(),
        (!manifest.spec.disable_name_suffix_hash).to_string(),
    );
    annotations.insert(
        BEHAVIOR_ANNOTATION.to_string(),
        manifest.spec.behavior.to_string(),
    );

    ObjectMeta {
        name: manifest.metadata.name.clone(),
        namespace: manifest.metadata.namespace.clone(),
        labels: manifest.metadata.labels.clone(),
        annotations,
    }
}
