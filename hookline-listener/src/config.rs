//! Listener process settings
//!
//! Every setting is a flag with an environment variable behind it, so the
//! listener runs unchanged from a pod spec or a shell.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::service::loader::ConfigSource;

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

#[derive(Debug, Clone, Parser)]
#[command(name = "hookline-listener")]
#[command(about = "GitHub webhook listener that launches Tekton pipeline runs", long_about = None)]
pub struct Settings {
    /// Namespace the listener runs in; configuration is read from here
    #[arg(long, env = "POD_NAMESPACE")]
    pub pod_namespace: String,

    /// Namespace pipeline runs are created in (defaults to the pod namespace)
    #[arg(long, env = "PIPELINES_NAMESPACE")]
    pub pipelines_namespace: Option<String>,

    #[arg(long, env = "LISTEN_PORT", default_value_t = 8080)]
    pub listen_port: u16,

    /// Only accept events from GitHub hook addresses. Anything but "false" enables it
    #[arg(
        long,
        env = "CHECK_GITHUB_IPS",
        default_value = "true",
        value_parser = parse_lenient_bool,
        action = ArgAction::Set
    )]
    pub check_github_ips: bool,

    /// Config map holding the configuration document under the `config` key
    #[arg(long, env = "CONFIG_MAP_NAME", default_value = "hookline-listener-config")]
    pub config_map_name: String,

    /// Read the configuration document from a local file instead
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(long, env = "KUBE_API_URL", default_value = "https://kubernetes.default.svc")]
    pub kube_api_url: String,

    #[arg(long, env = "KUBE_TOKEN_FILE", default_value_os_t = PathBuf::from(SERVICE_ACCOUNT_DIR).join("token"))]
    pub kube_token_file: PathBuf,

    #[arg(long, env = "KUBE_CA_FILE", default_value_os_t = PathBuf::from(SERVICE_ACCOUNT_DIR).join("ca.crt"))]
    pub kube_ca_file: PathBuf,

    #[arg(long, env = "GITHUB_META_URL", default_value = "https://api.github.com/meta")]
    pub github_meta_url: String,

    /// Value of the creator annotation on every run
    #[arg(long, env = "RUN_CREATOR", default_value = "hookline-listener")]
    pub run_creator: String,
}

fn parse_lenient_bool(value: &str) -> Result<bool, String> {
    Ok(!value.trim().eq_ignore_ascii_case("false"))
}

impl Settings {
    pub fn pipelines_namespace(&self) -> &str {
        self.pipelines_namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(&self.pod_namespace)
    }

    pub fn config_source(&self) -> ConfigSource {
        match &self.config_file {
            Some(path) => ConfigSource::File(path.clone()),
            None => ConfigSource::ConfigMap {
                name: self.config_map_name.clone(),
            },
        }
    }

    /// Validates the settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pod_namespace.is_empty() {
            anyhow::bail!("pod namespace cannot be empty");
        }

        if self.config_file.is_none() && self.config_map_name.is_empty() {
            anyhow::bail!("config map name cannot be empty");
        }

        if !self.kube_api_url.starts_with("http://") && !self.kube_api_url.starts_with("https://")
        {
            anyhow::bail!("kube api url must start with http:// or https://");
        }

        if self.run_creator.is_empty() {
            anyhow::bail!("run creator cannot be empty");
        }

        Ok(())
    }
}
