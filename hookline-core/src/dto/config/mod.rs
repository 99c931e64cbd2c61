//! Configuration document DTOs
//!
//! Mirrors the YAML document operators keep in the listener's config map.
//! Every field is optional at this level so that missing values surface as
//! [`ConfigError`] validation messages instead of opaque parse failures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::workspace::WorkspaceKind;
use crate::error::ConfigError;

/// The whole configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default)]
    pub global_github_secret_name: Option<String>,
    #[serde(default)]
    pub global_extra_params: Vec<ParamEntry>,
    #[serde(default)]
    pub global_service_account: Option<String>,
    #[serde(default)]
    pub pipelines: Vec<PipelineEntry>,
}

/// One pipeline target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub extra_params: Vec<ParamEntry>,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceEntry>,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
    #[serde(default)]
    pub github_secret_name: Option<String>,
    #[serde(default)]
    pub service_account: Option<String>,
    #[serde(default)]
    pub when: Vec<WhenEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub resource_ref: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhenEntry {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub values: Vec<ValueEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueEntry {
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub data: String,
}

impl ConfigDocument {
    /// Parses the YAML text of a configuration document
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Names of every secret the document references, global one included
    pub fn secret_names(&self) -> BTreeSet<&str> {
        self.global_github_secret_name
            .iter()
            .chain(self.pipelines.iter().filter_map(|p| p.github_secret_name.as_ref()))
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Names of the config maps that back claim workspaces
    ///
    /// Workspaces with an unknown type are skipped here; validation reports
    /// them later.
    pub fn backing_config_maps(&self) -> BTreeSet<&str> {
        self.pipelines
            .iter()
            .flat_map(|p| p.workspaces.iter())
            .filter(|w| {
                w.kind
                    .parse::<WorkspaceKind>()
                    .is_ok_and(WorkspaceKind::needs_backing_data)
            })
            .map(|w| w.name.as_str())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
globalGithubSecretName: webhook-secret
globalServiceAccount: pipeline-runner
globalExtraParams:
  - name: registry
    value: quay.io/acme
pipelines:
  - name: Build
    githubSecretName: build-secret
    extraParams:
      - name: context
        value: ./app
    workspaces:
      - name: source
        type: volumeClaimTemplate
      - name: scratch
        type: emptyDir
    resources:
      - name: repo
        resourceRef: git-repo
    when:
      - kind: header
        keys: [X-GitHub-Event]
        values:
          - operator: equal
            data: push
  - name: deploy
"#;

    #[test]
    fn test_parse_sample_document() {
        let doc = ConfigDocument::from_yaml(SAMPLE).unwrap();
        assert_eq!(
            doc.global_github_secret_name.as_deref(),
            Some("webhook-secret")
        );
        assert_eq!(doc.global_extra_params[0].name, "registry");
        assert_eq!(doc.pipelines.len(), 2);

        let build = &doc.pipelines[0];
        assert_eq!(build.name, "Build");
        assert_eq!(build.workspaces[0].kind, "volumeClaimTemplate");
        assert_eq!(build.resources[0].resource_ref, "git-repo");
        assert_eq!(build.when[0].keys, vec!["X-GitHub-Event".to_string()]);
        assert_eq!(build.when[0].values[0].operator, "equal");

        let deploy = &doc.pipelines[1];
        assert!(deploy.when.is_empty());
        assert!(deploy.github_secret_name.is_none());
    }

    #[test]
    fn test_secret_names_deduplicated() {
        let mut doc = ConfigDocument::from_yaml(SAMPLE).unwrap();
        doc.pipelines[1].github_secret_name = Some("webhook-secret".to_string());

        let names: Vec<&str> = doc.secret_names().into_iter().collect();
        assert_eq!(names, vec!["build-secret", "webhook-secret"]);
    }

    #[test]
    fn test_backing_config_maps_only_claim_kinds() {
        let doc = ConfigDocument::from_yaml(SAMPLE).unwrap();
        let names: Vec<&str> = doc.backing_config_maps().into_iter().collect();
        assert_eq!(names, vec!["source"]);
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let result = ConfigDocument::from_yaml("pipelines: [unclosed");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
