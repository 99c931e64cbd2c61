use anyhow::Context;
use clap::Parser;
use hookline_client::KubeClient;
use hookline_core::clock::{Clock, SystemClock};
use hookline_core::manifest::Synthesizer;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod repository;
pub mod service;
pub mod state;

use config::Settings;
use repository::{KubeConfigStore, KubeRunSubmitter, github_meta};
use service::allowlist::SourceAllowlist;
use service::loader;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hookline_listener=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Hookline Listener...");

    let settings = Settings::parse();
    settings.validate().context("Invalid settings")?;

    let client = KubeClient::in_cluster(
        settings.kube_api_url.as_str(),
        &settings.kube_token_file,
        &settings.kube_ca_file,
    )
    .await
    .context("Failed to create cluster client")?;

    if !client.has_token() {
        tracing::warn!("No service account token found, calling the cluster API anonymously");
    }

    // Load and validate configuration
    let store = KubeConfigStore::new(client.clone(), settings.pod_namespace.clone());
    let config = loader::load(&store, &settings.config_source())
        .await
        .context("Failed to load configuration")?;

    let allowlist = if settings.check_github_ips {
        let ranges = github_meta::fetch_hook_ranges(&settings.github_meta_url)
            .await
            .context("Failed to fetch GitHub hook ranges")?;
        tracing::info!(ranges = ranges.len(), "Source IP checking enabled");
        Some(Arc::new(SourceAllowlist::new(ranges)))
    } else {
        tracing::warn!("Source IP checking disabled");
        None
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState {
        config: Arc::new(config),
        synthesizer: Arc::new(Synthesizer::new(settings.run_creator.as_str(), clock.clone())),
        submitter: Arc::new(KubeRunSubmitter::new(client)),
        allowlist,
        clock,
        namespace: Arc::from(settings.pipelines_namespace()),
    };

    // Build router with all API endpoints
    let app = api::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.listen_port));
    tracing::info!(
        "Listening on {}, creating runs in namespace {}",
        addr,
        settings.pipelines_namespace()
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
