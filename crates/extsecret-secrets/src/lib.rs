//! Secret resolution for extsecret
//!
//! This crate turns a validated ExternalSecret manifest into a Kubernetes
//! Secret:
//! - **Store**: AWS Secrets Manager behind the [`SecretStore`] trait
//! - **Cache**: one store call per (region, identifier) per run, single-flight
//! - **Resolver**: sub-key extraction and key:val spreading
//! - **Generator**: declaration-order merge with entries winning over spreads

pub mod cache;
pub mod generator;
pub mod resolver;
pub mod store;
pub mod types;

pub use cache::{CacheKey, CacheStats, ResolutionCache};
pub use generator::{Generator, GeneratorOptions, DEFAULT_CONCURRENCY};
pub use resolver::Resolver;
pub use store::{SecretStore, SecretsManagerStore, StoreOptions};
pub use types::{SecretContent, SecretPayload, SecretRequest, StoredSecret};

use extsecret_core::{ExternalSecret, Result, Secret};
use std::sync::Arc;

/// Convenience function to generate a Secret from AWS Secrets Manager
pub async fn generate_secret(
    manifest: &ExternalSecret,
    store_options: StoreOptions,
    options: GeneratorOptions,
) -> Result<Secret> {
    let store = Arc::new(SecretsManagerStore::new(store_options));
    Generator::with_options(store, options)
        .generate(manifest)
        .await
}
