//! Validated listener configuration
//!
//! [`ListenerConfig`] is built once from a [`ConfigDocument`] plus the secret
//! and config-map material the loader fetched for it. After construction it is
//! read-only and shared by reference across every in-flight request.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::domain::when::WhenRule;
use crate::domain::workspace::{Workspace, WorkspaceKind};
use crate::dto::config::{ConfigDocument, ParamEntry, PipelineEntry};
use crate::error::ConfigError;

/// A named string parameter from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraParam {
    pub name: String,
    pub value: String,
}

impl ExtraParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A pipeline resource bound to an existing resource object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub name: String,
    pub resource_ref: String,
}

/// HMAC key used to verify event signatures
///
/// Debug output never shows the key.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    /// Returns `None` for an empty key, which counts as not configured
    pub fn new(key: impl Into<Vec<u8>>) -> Option<Self> {
        let key = key.into();
        (!key.is_empty()).then_some(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret([REDACTED])")
    }
}

/// One pipeline target
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Lower-cased pipeline name, also the `pipelineRef` of every run
    pub name: String,
    pub secret: Option<WebhookSecret>,
    pub when: Vec<WhenRule>,
    pub extra_params: Vec<ExtraParam>,
    pub workspaces: Vec<Workspace>,
    pub resources: Vec<ResourceRef>,
    pub service_account: Option<String>,
}

/// Material fetched from the cluster for a document
///
/// `secrets` maps a secret name to its key bytes. `workspace_data` maps a
/// claim workspace name to the content of its backing config map.
#[derive(Debug, Clone, Default)]
pub struct ExternalMaterial {
    pub secrets: HashMap<String, Vec<u8>>,
    pub workspace_data: HashMap<String, BTreeMap<String, String>>,
}

/// The immutable process-wide configuration
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    global_secret: Option<WebhookSecret>,
    global_extra_params: Vec<ExtraParam>,
    global_service_account: Option<String>,
    pipelines: Vec<PipelineConfig>,
}

impl ListenerConfig {
    /// Validates a document and resolves everything it references
    pub fn from_document(
        doc: &ConfigDocument,
        material: &ExternalMaterial,
    ) -> Result<Self, ConfigError> {
        if doc.pipelines.is_empty() {
            return Err(ConfigError::NoPipelines);
        }

        let global_extra_params = convert_params(&doc.global_extra_params, "global")?;
        let global_secret = lookup_secret(doc.global_github_secret_name.as_deref(), material)?;

        let mut seen = HashSet::new();
        let mut pipelines = Vec::with_capacity(doc.pipelines.len());

        for entry in &doc.pipelines {
            let pipeline = build_pipeline(entry, material)?;
            if !seen.insert(pipeline.name.clone()) {
                return Err(ConfigError::DuplicatePipeline(pipeline.name));
            }
            pipelines.push(pipeline);
        }

        Ok(Self {
            global_secret,
            global_extra_params,
            global_service_account: non_empty(doc.global_service_account.as_deref()),
            pipelines,
        })
    }

    /// Finds a pipeline by name, ignoring case
    pub fn pipeline(&self, name: &str) -> Option<&PipelineConfig> {
        self.pipelines
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn pipelines(&self) -> &[PipelineConfig] {
        &self.pipelines
    }

    /// Signature key for a pipeline: its own if set, else the global one
    pub fn secret_for<'a>(&'a self, pipeline: &'a PipelineConfig) -> Option<&'a WebhookSecret> {
        pipeline.secret.as_ref().or(self.global_secret.as_ref())
    }

    /// Service account for a pipeline: its own if set, else the global one
    pub fn service_account_for<'a>(&'a self, pipeline: &'a PipelineConfig) -> Option<&'a str> {
        pipeline
            .service_account
            .as_deref()
            .or(self.global_service_account.as_deref())
    }

    pub fn global_extra_params(&self) -> &[ExtraParam] {
        &self.global_extra_params
    }
}

// ============================================================================
// Validation
// ============================================================================

fn build_pipeline(
    entry: &PipelineEntry,
    material: &ExternalMaterial,
) -> Result<PipelineConfig, ConfigError> {
    if entry.name.is_empty() {
        return Err(ConfigError::EmptyPipelineName);
    }
    let name = entry.name.to_lowercase();

    let extra_params = convert_params(&entry.extra_params, &name)?;

    let mut resources = Vec::with_capacity(entry.resources.len());
    for resource in &entry.resources {
        if resource.name.is_empty() {
            return Err(ConfigError::InvalidResource {
                pipeline: name,
                field: "name",
            });
        }
        if resource.resource_ref.is_empty() {
            return Err(ConfigError::InvalidResource {
                pipeline: name,
                field: "resourceRef",
            });
        }
        resources.push(ResourceRef {
            name: resource.name.clone(),
            resource_ref: resource.resource_ref.clone(),
        });
    }

    let mut workspaces = Vec::with_capacity(entry.workspaces.len());
    for workspace in &entry.workspaces {
        if workspace.name.is_empty() {
            return Err(ConfigError::InvalidWorkspace {
                pipeline: name,
                field: "name",
            });
        }
        if workspace.kind.is_empty() {
            return Err(ConfigError::InvalidWorkspace {
                pipeline: name,
                field: "type",
            });
        }
        let kind: WorkspaceKind = workspace.kind.parse()?;
        let data = material.workspace_data.get(&workspace.name);
        workspaces.push(Workspace::resolve(&workspace.name, kind, data)?);
    }

    let when = entry
        .when
        .iter()
        .map(WhenRule::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let secret = lookup_secret(entry.github_secret_name.as_deref(), material)?;

    Ok(PipelineConfig {
        name,
        secret,
        when,
        extra_params,
        workspaces,
        resources,
        service_account: non_empty(entry.service_account.as_deref()),
    })
}

fn convert_params(entries: &[ParamEntry], scope: &str) -> Result<Vec<ExtraParam>, ConfigError> {
    entries
        .iter()
        .map(|p| {
            if p.name.is_empty() {
                Err(ConfigError::EmptyParamName {
                    scope: scope.to_string(),
                })
            } else {
                Ok(ExtraParam::new(&p.name, &p.value))
            }
        })
        .collect()
}

fn lookup_secret(
    name: Option<&str>,
    material: &ExternalMaterial,
) -> Result<Option<WebhookSecret>, ConfigError> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    let key = material
        .secrets
        .get(name)
        .ok_or_else(|| ConfigError::MissingMaterial {
            kind: "secret",
            name: name.to_string(),
        })?;

    Ok(WebhookSecret::new(key.clone()))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
