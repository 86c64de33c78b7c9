//! Resolution of store references
//!
//! Turns a [`ProviderRef`] into bytes (single value) or a key:val mapping
//! (spread import), going through the run's [`ResolutionCache`].

use crate::cache::ResolutionCache;
use crate::store::SecretStore;
use crate::types::{SecretContent, SecretRequest};
use extsecret_core::types::ProviderRef;
use extsecret_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Resolves references for one generation run
pub struct Resolver<'a> {
    store: &'a dyn SecretStore,
    cache: &'a ResolutionCache,
    /// Region used by references that do not carry their own
    default_region: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a dyn SecretStore,
        cache: &'a ResolutionCache,
        default_region: Option<&'a str>,
    ) -> Self {
        Self {
            store,
            cache,
            default_region,
        }
    }

    /// Value for a single entry
    ///
    /// Without a sub-key the stored content is returned untouched. With one,
    /// the content must decode as key:val and contain the key.
    pub async fn resolve(&self, reference: &ProviderRef) -> Result<Vec<u8>> {
        let content = self.fetch(reference).await?;

        let Some(key) = reference.key.as_deref() else {
            return Ok(content.as_bytes().to_vec());
        };

        let fields = content.fields().ok_or_else(|| {
            Error::malformed_secret(
                &reference.name,
                format!(
                    "cannot extract key `{}` from non-structured secret `{}`",
                    key, reference.name
                ),
            )
        })?;

        fields
            .get(key)
            .map(|value| value.as_bytes().to_vec())
            .ok_or_else(|| Error::missing_key(key, &reference.name))
    }

    /// Every key:val of a secret, for `dataFrom`
    pub async fn resolve_spread(&self, reference: &ProviderRef) -> Result<BTreeMap<String, Vec<u8>>> {
        let content = self.fetch(reference).await?;

        let fields = content.fields().ok_or_else(|| {
            Error::malformed_secret(
                &reference.name,
                format!(
                    "content of secret `{}` cannot be spread as key:val, expected a JSON object of strings",
                    reference.name
                ),
            )
        })?;

        Ok(fields
            .iter()
            .map(|(key, value)| (key.clone(), value.as_bytes().to_vec()))
            .collect())
    }

    async fn fetch(&self, reference: &ProviderRef) -> Result<Arc<SecretContent>> {
        let region = reference.effective_region(self.default_region);
        let store = self.store;

        self.cache
            .get_or_fetch(region, &reference.name, || async move {
                debug!(
                    "Fetching secret '{}' from {} (region: {})",
                    reference.name,
                    store.name(),
                    region.unwrap_or("<default>")
                );

                let request = SecretRequest::new(&reference.name, region);
                let stored = store
                    .get_secret(&request)
                    .await
                    .map_err(|e| Error::store_fetch(&reference.name, region, e))?;

                SecretContent::from_stored(&reference.name, stored)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StoredSecret;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // Mock store for testing
    #[derive(Default)]
    struct MockStore {
        secrets: HashMap<(Option<String>, String), StoredSecret>,
        calls: Mutex<Vec<SecretRequest>>,
    }

    impl MockStore {
        fn with(mut self, region: Option<&str>, name: &str, secret: StoredSecret) -> Self {
            self.secrets
                .insert((region.map(str::to_string), name.to_string()), secret);
            self
        }

        fn calls(&self) -> Vec<SecretRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SecretStore for MockStore {
        async fn get_secret(&self, request: &SecretRequest) -> anyhow::Result<StoredSecret> {
            self.calls.lock().unwrap().push(request.clone());
            self.secrets
                .get(&(request.region.clone(), request.secret_id.clone()))
                .cloned()
                .ok_or_else(|| anyhow!("ResourceNotFoundException: {}", request.secret_id))
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_sub_key_from_structured_secret() {
        let store = MockStore::default().with(
            Some("eu-west-1"),
            "prod/db",
            StoredSecret::text(r#"{"user":"app","password":"pw"}"#),
        );
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, Some("eu-west-1"));

        let value = resolver
            .resolve(&ProviderRef::new("prod/db").with_key("password"))
            .await
            .unwrap();
        assert_eq!(value, b"pw");
    }

    #[tokio::test]
    async fn test_without_sub_key_returns_raw_content() {
        let raw = r#"{"user":"app"}"#;
        let store = MockStore::default().with(None, "prod/db", StoredSecret::text(raw));
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, None);

        let value = resolver.resolve(&ProviderRef::new("prod/db")).await.unwrap();
        assert_eq!(value, raw.as_bytes());
    }

    #[tokio::test]
    async fn test_binary_content_returned_unchanged() {
        let store = MockStore::default().with(
            None,
            "tls/key",
            StoredSecret::binary(vec![0u8, 159, 146, 150]),
        );
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, None);

        let value = resolver.resolve(&ProviderRef::new("tls/key")).await.unwrap();
        assert_eq!(value, vec![0u8, 159, 146, 150]);
    }

    #[tokio::test]
    async fn test_missing_sub_key() {
        let store = MockStore::default().with(None, "prod/db", StoredSecret::text(r#"{"a":"1"}"#));
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, None);

        let err = resolver
            .resolve(&ProviderRef::new("prod/db").with_key("b"))
            .await
            .unwrap_err();
        match err {
            Error::MissingKey { key, secret } => {
                assert_eq!(key, "b");
                assert_eq!(secret, "prod/db");
            }
            other => panic!("expected missing key error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sub_key_from_plain_secret() {
        let store = MockStore::default().with(None, "token", StoredSecret::text("abc"));
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, None);

        let err = resolver
            .resolve(&ProviderRef::new("token").with_key("value"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSecret { .. }));
        assert!(err.to_string().contains("non-structured secret `token`"));
    }

    #[tokio::test]
    async fn test_spread_requires_structured_content() {
        let store = MockStore::default().with(None, "token", StoredSecret::text("abc"));
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, None);

        let err = resolver
            .resolve_spread(&ProviderRef::new("token"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSecret { .. }));
    }

    #[tokio::test]
    async fn test_spread_decodes_all_keys() {
        let store =
            MockStore::default().with(None, "shared", StoredSecret::text(r#"{"a":"1","b":"2"}"#));
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, None);

        let fields = resolver.resolve_spread(&ProviderRef::new("shared")).await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["a"], b"1");
        assert_eq!(fields["b"], b"2");
    }

    #[tokio::test]
    async fn test_empty_secret_is_an_error() {
        let store = MockStore::default().with(None, "empty", StoredSecret::default());
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, None);

        let err = resolver.resolve(&ProviderRef::new("empty")).await.unwrap_err();
        assert!(matches!(err, Error::MalformedSecret { ref secret, .. } if secret == "empty"));
    }

    #[tokio::test]
    async fn test_store_failure_is_propagated() {
        let store = MockStore::default();
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, Some("eu-west-1"));

        let err = resolver.resolve(&ProviderRef::new("nope")).await.unwrap_err();
        match &err {
            Error::StoreFetch { secret, region, source } => {
                assert_eq!(secret, "nope");
                assert_eq!(region.as_deref(), Some("eu-west-1"));
                assert!(source.to_string().contains("ResourceNotFoundException"));
            }
            other => panic!("expected store fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reference_region_overrides_default() {
        let store = MockStore::default()
            .with(Some("eu-west-1"), "db", StoredSecret::text("eu"))
            .with(Some("us-east-1"), "db", StoredSecret::text("us"));
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, Some("eu-west-1"));

        let eu = resolver.resolve(&ProviderRef::new("db")).await.unwrap();
        let us = resolver
            .resolve(&ProviderRef::new("db").with_region("us-east-1"))
            .await
            .unwrap();
        assert_eq!(eu, b"eu");
        assert_eq!(us, b"us");
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_region_uses_default() {
        let store = MockStore::default().with(Some("eu-west-1"), "db", StoredSecret::text("eu"));
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, Some("eu-west-1"));

        let blank = resolver
            .resolve(&ProviderRef::new("db").with_region(""))
            .await
            .unwrap();
        let unset = resolver.resolve(&ProviderRef::new("db")).await.unwrap();

        assert_eq!(blank, b"eu");
        assert_eq!(unset, b"eu");
        assert_eq!(store.calls(), vec![SecretRequest::new("db", Some("eu-west-1"))]);
    }

    #[tokio::test]
    async fn test_same_reference_fetched_once() {
        let store =
            MockStore::default().with(None, "prod/db", StoredSecret::text(r#"{"a":"1","b":"2"}"#));
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&store, &cache, None);

        resolver
            .resolve(&ProviderRef::new("prod/db").with_key("a"))
            .await
            .unwrap();
        resolver
            .resolve(&ProviderRef::new("prod/db").with_key("b"))
            .await
            .unwrap();
        resolver.resolve_spread(&ProviderRef::new("prod/db")).await.unwrap();

        assert_eq!(store.calls(), vec![SecretRequest::new("prod/db", None)]);
    }
}
