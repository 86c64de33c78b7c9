//! AWS Secrets Manager store
//!
//! Credentials come from the default AWS provider chain; only the region is
//! chosen here. One client is built per effective region and reused for the
//! rest of the run.

use crate::store::SecretStore;
use crate::types::{SecretRequest, StoredSecret};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::debug;

/// Client settings that are not part of the manifest
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Custom endpoint (LocalStack and other Secrets Manager compatible stores)
    pub endpoint_url: Option<String>,
    /// Version stage to read instead of the store default (`AWSCURRENT`)
    pub version_stage: Option<String>,
}

type ClientSlot = Arc<OnceCell<Client>>;

pub struct SecretsManagerStore {
    options: StoreOptions,
    /// Clients keyed by region; `None` is the SDK default region
    clients: Mutex<HashMap<Option<String>, ClientSlot>>,
}

impl SecretsManagerStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Client for the region, built on first use
    ///
    /// The map lock only guards slot lookup; building a client for one region
    /// never blocks requests to another.
    async fn client(&self, region: Option<&str>) -> Client {
        let slot = {
            let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(clients.entry(region.map(str::to_string)).or_default())
        };

        slot.get_or_init(|| Self::create_client(region, self.options.endpoint_url.as_deref()))
            .await
            .clone()
    }

    fn client_count(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    /// Create a Secrets Manager client for the given region and optional endpoint
    async fn create_client(region: Option<&str>, endpoint: Option<&str>) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_secretsmanager::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = endpoint {
            debug!("Using custom Secrets Manager endpoint: {}", endpoint_url);
            builder = builder.endpoint_url(endpoint_url);
        }

        debug!(
            "Created Secrets Manager client for region {}",
            region.unwrap_or("<default>")
        );
        Client::from_conf(builder.build())
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, request: &SecretRequest) -> Result<StoredSecret> {
        let client = self.client(request.region.as_deref()).await;

        let mut call = client.get_secret_value().secret_id(&request.secret_id);
        if let Some(stage) = &self.options.version_stage {
            call = call.version_stage(stage);
        }

        let output = call.send().await.map_err(|e| {
            anyhow!(
                "GetSecretValue failed for `{}`: {}",
                request.secret_id,
                DisplayErrorContext(&e)
            )
        })?;

        debug!("Fetched secret from Secrets Manager: {}", request.secret_id);

        Ok(StoredSecret {
            text: output.secret_string().map(str::to_string),
            binary: output.secret_binary().map(|blob| blob.as_ref().to_vec()),
        })
    }

    fn name(&self) -> &'static str {
        "secrets-manager"
    }
}

impl std::fmt::Debug for SecretsManagerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsManagerStore")
            .field("options", &self.options)
            .field("regions", &self.client_count())
            .finish_non_exhaustive()
    }
}
