//! Config store repository
//!
//! Reads config maps and secrets from the listener's own namespace.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hookline_client::KubeClient;
use std::collections::BTreeMap;

/// Read access to configuration material
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Returns the data of a config map
    async fn config_map(&self, name: &str) -> Result<BTreeMap<String, String>>;

    /// Returns one decoded key of a secret
    ///
    /// Fails when the secret or the key does not exist.
    async fn secret_value(&self, name: &str, key: &str) -> Result<Vec<u8>>;
}

/// Cluster-backed config store
pub struct KubeConfigStore {
    client: KubeClient,
    namespace: String,
}

impl KubeConfigStore {
    pub fn new(client: KubeClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl ConfigStore for KubeConfigStore {
    async fn config_map(&self, name: &str) -> Result<BTreeMap<String, String>> {
        let config_map = self
            .client
            .get_config_map(&self.namespace, name)
            .await
            .with_context(|| format!("Failed to read config map {}/{}", self.namespace, name))?;

        Ok(config_map.data)
    }

    async fn secret_value(&self, name: &str, key: &str) -> Result<Vec<u8>> {
        let secret = self
            .client
            .get_secret(&self.namespace, name)
            .await
            .with_context(|| format!("Failed to read secret {}/{}", self.namespace, name))?;

        secret
            .decoded(key)?
            .with_context(|| format!("Secret {}/{} has no {} field", self.namespace, name, key))
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory store for service tests

    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MemoryConfigStore {
        pub config_maps: HashMap<String, BTreeMap<String, String>>,
        pub secrets: HashMap<String, BTreeMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl ConfigStore for MemoryConfigStore {
        async fn config_map(&self, name: &str) -> Result<BTreeMap<String, String>> {
            self.config_maps
                .get(name)
                .cloned()
                .with_context(|| format!("config map {name} not found"))
        }

        async fn secret_value(&self, name: &str, key: &str) -> Result<Vec<u8>> {
            self.secrets
                .get(name)
                .with_context(|| format!("secret {name} not found"))?
                .get(key)
                .cloned()
                .with_context(|| format!("secret {name} has no {key} field"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_secret_value_requires_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ci/secrets/webhook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "password": "czNjcjN0" }
            })))
            .mount(&server)
            .await;

        let store = KubeConfigStore::new(KubeClient::new(server.uri()), "ci");

        assert_eq!(store.secret_value("webhook", "password").await.unwrap(), b"s3cr3t");
        let err = store.secret_value("webhook", "token").await.unwrap_err();
        assert!(err.to_string().contains("has no token field"));
    }

    #[tokio::test]
    async fn test_missing_config_map() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ci/configmaps/absent"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = KubeConfigStore::new(KubeClient::new(server.uri()), "ci");
        let err = store.config_map("absent").await.unwrap_err();
        assert!(err.to_string().contains("config map ci/absent"));
    }
}
