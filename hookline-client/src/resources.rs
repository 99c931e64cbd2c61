//! Config map, secret and custom object endpoints

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::KubeClient;
use crate::error::{ClientError, Result};

/// The data section of a config map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigMap {
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// The data section of a secret, values still base64 encoded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl Secret {
    /// Decoded value of one key, `None` if the key is absent
    pub fn decoded(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.data
            .get(key)
            .map(|encoded| {
                BASE64
                    .decode(encoded)
                    .map_err(|e| ClientError::ParseError(format!("secret key {key}: {e}")))
            })
            .transpose()
    }
}

impl KubeClient {
    // =============================================================================
    // Core resources
    // =============================================================================

    pub async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap> {
        let url = format!(
            "{}/api/v1/namespaces/{}/configmaps/{}",
            self.base_url, namespace, name
        );
        let response = self.authorize(self.client.get(&url)).send().await?;

        self.handle_response(response).await
    }

    pub async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret> {
        let url = format!(
            "{}/api/v1/namespaces/{}/secrets/{}",
            self.base_url, namespace, name
        );
        let response = self.authorize(self.client.get(&url)).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Custom objects
    // =============================================================================

    /// Create a namespaced custom object and return the stored object
    pub async fn create_namespaced_object<T, R>(
        &self,
        group: &str,
        version: &str,
        plural: &str,
        namespace: &str,
        body: &T,
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/apis/{}/{}/namespaces/{}/{}",
            self.base_url, group, version, namespace, plural
        );
        let response = self.authorize(self.client.post(&url)).json(body).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_config_map() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ci/configmaps/hookline-listener-config"))
            .and(header("authorization", "Bearer sa-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "ConfigMap",
                "metadata": { "name": "hookline-listener-config" },
                "data": { "config": "pipelines: []" }
            })))
            .mount(&server)
            .await;

        let client = KubeClient::new(server.uri()).with_token("sa-token");
        let config_map = client
            .get_config_map("ci", "hookline-listener-config")
            .await
            .unwrap();

        assert_eq!(config_map.data["config"], "pipelines: []");
    }

    #[tokio::test]
    async fn test_get_secret_decodes_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ci/secrets/webhook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "password": "czNjcjN0" }
            })))
            .mount(&server)
            .await;

        let secret = KubeClient::new(server.uri())
            .get_secret("ci", "webhook")
            .await
            .unwrap();

        assert_eq!(secret.decoded("password").unwrap(), Some(b"s3cr3t".to_vec()));
        assert_eq!(secret.decoded("username").unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_resource_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ci/secrets/absent"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string("secrets \"absent\" not found"),
            )
            .mount(&server)
            .await;

        let err = KubeClient::new(server.uri())
            .get_secret("ci", "absent")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::NotFound(_)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_namespaced_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apis/tekton.dev/v1beta1/namespaces/pipelines/pipelineruns"))
            .and(body_partial_json(json!({ "kind": "PipelineRun" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "kind": "PipelineRun",
                "metadata": { "name": "ci-abc123def456", "uid": "1234" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = json!({ "kind": "PipelineRun", "metadata": { "name": "ci-abc123def456" } });
        let created: Value = KubeClient::new(server.uri())
            .create_namespaced_object("tekton.dev", "v1beta1", "pipelineruns", "pipelines", &body)
            .await
            .unwrap();

        assert_eq!(created["metadata"]["uid"], "1234");
    }

    #[tokio::test]
    async fn test_create_conflict_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apis/tekton.dev/v1beta1/namespaces/pipelines/pipelineruns"))
            .respond_with(ResponseTemplate::new(409).set_body_string("already exists"))
            .mount(&server)
            .await;

        let err = KubeClient::new(server.uri())
            .create_namespaced_object::<_, Value>(
                "tekton.dev",
                "v1beta1",
                "pipelineruns",
                "pipelines",
                &json!({}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::ApiError { status: 409, .. }));
    }
}
