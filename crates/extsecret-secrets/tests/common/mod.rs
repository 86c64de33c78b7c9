//! Common test helpers for extsecret-secrets integration tests
//!
//! Provides an in-memory [`SecretStore`] that records every call so tests can
//! verify how often and with which region the store was queried.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use extsecret_core::ExternalSecret;
use extsecret_secrets::{SecretRequest, SecretStore, StoredSecret};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory store keyed by (region, identifier)
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct RecordingStore {
    secrets: HashMap<(Option<String>, String), StoredSecret>,
    latency: Option<Duration>,
    calls: Arc<Mutex<Vec<SecretRequest>>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a text secret in the default region
    pub fn with_text(self, name: &str, value: &str) -> Self {
        self.with_secret(None, name, StoredSecret::text(value))
    }

    /// Store a text secret in a specific region
    pub fn with_regional_text(self, region: &str, name: &str, value: &str) -> Self {
        self.with_secret(Some(region), name, StoredSecret::text(value))
    }

    pub fn with_secret(mut self, region: Option<&str>, name: &str, secret: StoredSecret) -> Self {
        self.secrets
            .insert((region.map(str::to_string), name.to_string()), secret);
        self
    }

    /// Delay every response, widening the window for concurrent lookups
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<SecretRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of calls for one identifier, across regions
    pub fn calls_for(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.secret_id == name)
            .count()
    }
}

#[async_trait]
impl SecretStore for RecordingStore {
    async fn get_secret(&self, request: &SecretRequest) -> Result<StoredSecret> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.secrets
            .get(&(request.region.clone(), request.secret_id.clone()))
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "ResourceNotFoundException: Secrets Manager can't find the specified secret `{}`",
                    request.secret_id
                )
            })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Parse a manifest fixture, panicking on malformed YAML
#[allow(dead_code)]
pub fn manifest(yaml: &str) -> ExternalSecret {
    ExternalSecret::from_yaml_str(yaml).expect("fixture manifest must parse")
}
