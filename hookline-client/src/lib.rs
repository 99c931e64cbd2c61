//! Hookline cluster client
//!
//! A small, typed HTTP client for the parts of the cluster API the listener
//! uses: reading config maps and secrets, and creating namespaced custom
//! objects.
//!
//! # Example
//!
//! ```no_run
//! use hookline_client::KubeClient;
//!
//! #[tokio::main]
//! async fn main() -> hookline_client::Result<()> {
//!     let client = KubeClient::new("http://localhost:8001");
//!
//!     let config = client.get_config_map("ci", "hookline-listener-config").await?;
//!     println!("keys: {:?}", config.data.keys().collect::<Vec<_>>());
//!     Ok(())
//! }
//! ```

pub mod error;
mod resources;

pub use error::{ClientError, Result};
pub use resources::{ConfigMap, Secret};

use reqwest::{Certificate, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// HTTP client for the cluster API server
#[derive(Debug, Clone)]
pub struct KubeClient {
    /// Base URL of the API server (e.g., "https://kubernetes.default.svc")
    base_url: String,
    /// Bearer token sent with every request, if any
    token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl KubeClient {
    /// Create a client without credentials
    ///
    /// Suitable behind `kubectl proxy` or in tests.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client with a preconfigured reqwest client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            client,
        }
    }

    /// Attach a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Create a client from service-account credential files
    ///
    /// Either file may be absent, in which case that credential is skipped.
    /// A file that exists but cannot be read is an error.
    pub async fn in_cluster(
        base_url: impl Into<String>,
        token_file: &Path,
        ca_file: &Path,
    ) -> Result<Self> {
        let mut builder = Client::builder();

        if let Some(pem) = read_optional(ca_file).await? {
            let cert = Certificate::from_pem(&pem)?;
            builder = builder.add_root_certificate(cert);
            debug!(path = %ca_file.display(), "Loaded cluster CA bundle");
        }

        let mut client = Self::with_client(base_url, builder.build()?);

        if let Some(token) = read_optional(token_file).await? {
            let token = String::from_utf8_lossy(&token).trim().to_string();
            if !token.is_empty() {
                client = client.with_token(token);
                debug!(path = %token_file.display(), "Loaded service account token");
            }
        }

        Ok(client)
    }

    /// Get the base URL of the API server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ClientError::NotFound(error_text));
            }
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ClientError::Credentials {
            path: path.to_path_buf(),
            source,
        }),
    }
}
