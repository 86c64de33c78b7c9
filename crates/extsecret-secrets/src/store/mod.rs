//! Secret store trait and implementations

pub mod secrets_manager;

use crate::types::{SecretRequest, StoredSecret};
use anyhow::Result;
use async_trait::async_trait;

/// Keyed secret store with region-scoped identifiers
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the raw content of a secret
    ///
    /// Errors are store-level failures (network, authorization, not-found)
    /// and are surfaced to the caller unchanged.
    async fn get_secret(&self, request: &SecretRequest) -> Result<StoredSecret>;

    /// Store name for log and error messages
    fn name(&self) -> &'static str;
}

pub use secrets_manager::{SecretsManagerStore, StoreOptions};
