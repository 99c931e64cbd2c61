//! PipelineRun synthesis
//!
//! Builds the typed [`RunManifest`] for one accepted event. Values are placed
//! into typed fields and only escaped by the serializer, so parameter values
//! containing quotes or newlines reach the cluster unchanged.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::domain::config::ResourceRef;
use crate::domain::event::RunId;
use crate::domain::manifest::{
    API_GROUP, API_VERSION, KIND, PipelineRef, ResourceBinding, RunManifest, RunMetadata, RunParam,
    RunSpec,
};
use crate::domain::workspace::Workspace;

pub const LABEL_RUN_ID: &str = "pipelinerun-id";
pub const ANNOTATION_CREATED_BY: &str = "pipelinerun-created-by";
pub const ANNOTATION_CREATED_AT: &str = "pipelinerun-created-at";
pub const ANNOTATION_PIPELINE: &str = "pipeline-name";

pub const PARAM_PAYLOAD: &str = "payloadBase64";
pub const PARAM_EVENT: &str = "event";
pub const PARAM_RUN_ID: &str = "pipelineRunId";

/// Format of the creation annotation, always UTC
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S%.3f";

/// Strips one trailing `-` or `_` and lower-cases the result
pub fn normalize_prefix(prefix: &str) -> String {
    prefix
        .strip_suffix(['-', '_'])
        .unwrap_or(prefix)
        .to_lowercase()
}

/// Inputs of one synthesis
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub run_id: &'a RunId,
    pub pipeline: &'a str,
    /// Already normalized with [`normalize_prefix`]
    pub prefix: &'a str,
    pub event: &'a str,
    pub payload: &'a [u8],
    pub params: BTreeMap<String, String>,
    pub service_account: Option<&'a str>,
    pub workspaces: &'a [Workspace],
    pub resources: &'a [ResourceRef],
    pub namespace: &'a str,
}

pub struct Synthesizer {
    creator: String,
    clock: Arc<dyn Clock>,
}

impl Synthesizer {
    pub fn new(creator: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            creator: creator.into(),
            clock,
        }
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn synthesize(&self, req: RunRequest<'_>) -> RunManifest {
        let run_id = req.run_id.as_str();
        let created_at = self.clock.now().format(TIMESTAMP_FORMAT).to_string();

        let mut params = req.params;
        params.insert(PARAM_PAYLOAD.to_string(), BASE64.encode(req.payload));
        params.insert(PARAM_EVENT.to_string(), req.event.to_string());
        params.insert(PARAM_RUN_ID.to_string(), run_id.to_string());

        let labels = BTreeMap::from([(LABEL_RUN_ID.to_string(), run_id.to_string())]);
        let annotations = BTreeMap::from([
            (ANNOTATION_CREATED_BY.to_string(), self.creator.clone()),
            (ANNOTATION_CREATED_AT.to_string(), created_at),
            (ANNOTATION_PIPELINE.to_string(), req.pipeline.to_string()),
        ]);

        RunManifest {
            api_version: format!("{API_GROUP}/{API_VERSION}"),
            kind: KIND.to_string(),
            metadata: RunMetadata {
                name: format!("{}-{}", req.prefix, run_id),
                namespace: req.namespace.to_string(),
                labels,
                annotations,
            },
            spec: RunSpec {
                service_account_name: req.service_account.map(str::to_string),
                params: params
                    .into_iter()
                    .map(|(name, value)| RunParam { name, value })
                    .collect(),
                pipeline_ref: PipelineRef {
                    name: req.pipeline.to_string(),
                },
                workspaces: req
                    .workspaces
                    .iter()
                    .flat_map(|w| w.bindings.iter().cloned())
                    .collect(),
                resources: req
                    .resources
                    .iter()
                    .map(|r| ResourceBinding {
                        name: r.name.clone(),
                        resource_ref: PipelineRef {
                            name: r.resource_ref.clone(),
                        },
                    })
                    .collect(),
            },
        }
    }
}
