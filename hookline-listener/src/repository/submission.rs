//! Run submission repository
//!
//! Creates synthesized runs in the cluster. There is no retry: a failed
//! submission is reported once and the event is dropped.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hookline_client::KubeClient;
use hookline_core::domain::manifest::{API_GROUP, API_VERSION, PLURAL, RunManifest};

/// Creates a run manifest as a cluster resource
#[async_trait]
pub trait RunSubmitter: Send + Sync {
    async fn submit(&self, manifest: &RunManifest) -> Result<()>;
}

/// Submits runs through the cluster API
pub struct KubeRunSubmitter {
    client: KubeClient,
}

impl KubeRunSubmitter {
    pub fn new(client: KubeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RunSubmitter for KubeRunSubmitter {
    async fn submit(&self, manifest: &RunManifest) -> Result<()> {
        let _created: serde_json::Value = self
            .client
            .create_namespaced_object(
                API_GROUP,
                API_VERSION,
                PLURAL,
                &manifest.metadata.namespace,
                manifest,
            )
            .await
            .with_context(|| format!("Failed to create pipeline run {}", manifest.metadata.name))?;

        Ok(())
    }
}
