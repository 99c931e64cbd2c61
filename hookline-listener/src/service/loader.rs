//! Configuration loading
//!
//! Reads the configuration document, fetches every secret and backing config
//! map it references, and validates the result into a [`ListenerConfig`].
//! Any failure here aborts startup.

use anyhow::{Context, Result};
use hookline_core::domain::config::{ExternalMaterial, ListenerConfig};
use hookline_core::dto::config::ConfigDocument;
use std::path::PathBuf;

use crate::repository::ConfigStore;

/// Config map key holding the document
pub const CONFIG_KEY: &str = "config";
/// Secret key holding the webhook HMAC key
pub const SECRET_KEY: &str = "password";

/// Where the configuration document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    ConfigMap { name: String },
    File(PathBuf),
}

pub async fn load(store: &dyn ConfigStore, source: &ConfigSource) -> Result<ListenerConfig> {
    let text = read_document(store, source).await?;
    let doc = ConfigDocument::from_yaml(&text).context("Failed to parse configuration")?;

    let mut material = ExternalMaterial::default();

    for name in doc.secret_names() {
        let key = store.secret_value(name, SECRET_KEY).await?;
        material.secrets.insert(name.to_string(), key);
    }

    for name in doc.backing_config_maps() {
        let data = store.config_map(name).await?;
        material.workspace_data.insert(name.to_string(), data);
    }

    let config = ListenerConfig::from_document(&doc, &material)
        .context("Invalid configuration")?;

    tracing::info!(
        pipelines = config.pipelines().len(),
        secrets = material.secrets.len(),
        "Configuration loaded"
    );

    Ok(config)
}

async fn read_document(store: &dyn ConfigStore, source: &ConfigSource) -> Result<String> {
    match source {
        ConfigSource::ConfigMap { name } => {
            let mut data = store.config_map(name).await?;
            data.remove(CONFIG_KEY)
                .with_context(|| format!("Config map {name} has no {CONFIG_KEY} key"))
        }
        ConfigSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::config_store::memory::MemoryConfigStore;
    use std::collections::BTreeMap;

    const DOCUMENT: &str = r#"
globalGithubSecretName: webhook
pipelines:
  - name: build
    workspaces:
      - name: source
        type: volumeClaimTemplate
"#;

    fn store() -> MemoryConfigStore {
        let mut store = MemoryConfigStore::default();
        store.config_maps.insert(
            "hookline-listener-config".to_string(),
            BTreeMap::from([(CONFIG_KEY.to_string(), DOCUMENT.to_string())]),
        );
        store.config_maps.insert(
            "source".to_string(),
            BTreeMap::from([(
                "template".to_string(),
                "name: source\nvolumeClaimTemplate:\n  spec:\n    resources:\n      requests:\n        storage: 1Gi\n"
                    .to_string(),
            )]),
        );
        store.secrets.insert(
            "webhook".to_string(),
            BTreeMap::from([(SECRET_KEY.to_string(), b"s3cr3t".to_vec())]),
        );
        store
    }

    fn source() -> ConfigSource {
        ConfigSource::ConfigMap {
            name: "hookline-listener-config".to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_resolves_material() {
        let config = load(&store(), &source()).await.unwrap();

        let build = config.pipeline("build").unwrap();
        assert_eq!(config.secret_for(build).unwrap().as_bytes(), b"s3cr3t");
        assert_eq!(
            build.workspaces[0].bindings[0]["volumeClaimTemplate"]["spec"]["resources"]["requests"]
                ["storage"],
            "1Gi"
        );
    }

    #[tokio::test]
    async fn test_missing_secret_aborts() {
        let mut store = store();
        store.secrets.clear();
        assert!(load(&store, &source()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_config_key() {
        let mut store = store();
        store
            .config_maps
            .insert("hookline-listener-config".to_string(), BTreeMap::new());

        let err = load(&store, &source()).await.unwrap_err();
        assert!(err.to_string().contains("has no config key"));
    }

    #[tokio::test]
    async fn test_invalid_document_aborts() {
        let mut store = store();
        store.config_maps.insert(
            "hookline-listener-config".to_string(),
            BTreeMap::from([(CONFIG_KEY.to_string(), "pipelines: []".to_string())]),
        );

        let err = load(&store, &source()).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration");
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir()
            .join(format!("hookline-config-{}.yaml", std::process::id()));
        tokio::fs::write(&path, "pipelines: [{name: deploy}]").await.unwrap();

        let config = load(&MemoryConfigStore::default(), &ConfigSource::File(path.clone()))
            .await
            .unwrap();
        assert!(config.pipeline("deploy").is_some());

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
