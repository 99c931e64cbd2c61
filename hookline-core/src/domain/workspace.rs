//! Workspace attachment types
//!
//! A workspace is declared by name and type in the configuration document.
//! Each type maps to a fixed binding fragment; the two claim types take their
//! fragments from a config map named after the workspace, fetched at load
//! time. Resolution happens once, so requests only copy finished bindings.

use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::ConfigError;

/// Backing type of a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceKind {
    /// Ephemeral scratch space
    EmptyDir,
    /// A claim created per run from a template
    VolumeClaimTemplate,
    /// An existing claim
    PersistentVolumeClaim,
    ConfigMap,
    Secret,
}

impl WorkspaceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkspaceKind::EmptyDir => "emptyDir",
            WorkspaceKind::VolumeClaimTemplate => "volumeClaimTemplate",
            WorkspaceKind::PersistentVolumeClaim => "persistentVolumeClaim",
            WorkspaceKind::ConfigMap => "configmap",
            WorkspaceKind::Secret => "secret",
        }
    }

    /// Whether the bindings come from a backing config map
    pub fn needs_backing_data(self) -> bool {
        matches!(
            self,
            WorkspaceKind::VolumeClaimTemplate | WorkspaceKind::PersistentVolumeClaim
        )
    }

    /// Builds the binding fragments for a workspace of this kind
    ///
    /// `data` is the backing config map content and is only read for claim
    /// kinds. Its values are YAML fragments (a mapping or a list of mappings)
    /// applied in key order.
    pub fn bindings(
        self,
        name: &str,
        data: Option<&BTreeMap<String, String>>,
    ) -> Result<Vec<Value>, ConfigError> {
        match self {
            WorkspaceKind::EmptyDir => Ok(vec![json!({ "name": name, "emptyDir": {} })]),
            WorkspaceKind::ConfigMap => {
                Ok(vec![json!({ "name": name, "configMap": { "name": name } })])
            }
            WorkspaceKind::Secret => {
                Ok(vec![json!({ "name": name, "secret": { "secretName": name } })])
            }
            WorkspaceKind::VolumeClaimTemplate | WorkspaceKind::PersistentVolumeClaim => {
                let data = data.ok_or_else(|| ConfigError::MissingMaterial {
                    kind: "config map",
                    name: name.to_string(),
                })?;
                template_bindings(name, data)
            }
        }
    }
}

impl FromStr for WorkspaceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "emptydir" => Ok(WorkspaceKind::EmptyDir),
            "volumeclaimtemplate" => Ok(WorkspaceKind::VolumeClaimTemplate),
            "persistentvolumeclaim" => Ok(WorkspaceKind::PersistentVolumeClaim),
            "configmap" => Ok(WorkspaceKind::ConfigMap),
            "secret" => Ok(WorkspaceKind::Secret),
            _ => Err(ConfigError::UnknownWorkspaceType(s.to_string())),
        }
    }
}

fn template_bindings(
    workspace: &str,
    data: &BTreeMap<String, String>,
) -> Result<Vec<Value>, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidWorkspaceTemplate {
        workspace: workspace.to_string(),
        message,
    };

    let mut bindings = Vec::new();

    for (key, text) in data {
        let fragment: Value =
            serde_yaml::from_str(text).map_err(|e| invalid(format!("key {key}: {e}")))?;

        match fragment {
            Value::Object(_) => bindings.push(fragment),
            Value::Array(items) => {
                for item in items {
                    if !item.is_object() {
                        return Err(invalid(format!("key {key}: list items must be mappings")));
                    }
                    bindings.push(item);
                }
            }
            _ => return Err(invalid(format!("key {key}: expected a mapping or a list"))),
        }
    }

    if bindings.is_empty() {
        return Err(invalid("backing config map has no bindings".to_string()));
    }

    Ok(bindings)
}

/// A workspace with its bindings already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub name: String,
    pub kind: WorkspaceKind,
    pub bindings: Vec<Value>,
}

impl Workspace {
    pub fn resolve(
        name: &str,
        kind: WorkspaceKind,
        data: Option<&BTreeMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.to_string(),
            kind,
            bindings: kind.bindings(name, data)?,
        })
    }
}
