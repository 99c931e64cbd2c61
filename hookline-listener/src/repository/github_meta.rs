//! GitHub meta repository
//!
//! Fetches the address ranges GitHub delivers webhooks from.

use anyhow::{Context, Result};
use ipnet::IpNet;
use serde::Deserialize;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("hookline-listener/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    hooks: Vec<String>,
}

/// Returns the `hooks` ranges published at `url`
///
/// An empty list or an unparsable range is an error: running with an
/// allow-list that admits nothing is never intended.
pub async fn fetch_hook_ranges(url: &str) -> Result<Vec<IpNet>> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let meta: Meta = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("GitHub meta request to {url} failed"))?
        .json()
        .await
        .context("Failed to parse GitHub meta response")?;

    if meta.hooks.is_empty() {
        anyhow::bail!("GitHub meta response lists no hook ranges");
    }

    meta.hooks
        .iter()
        .map(|cidr| {
            cidr.parse::<IpNet>()
                .with_context(|| format!("Invalid hook range {cidr}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_fetch_hook_ranges() {
        let server = serve(json!({
            "hooks": ["192.30.252.0/22", "2a0a:a440::/29"],
            "web": ["140.82.112.0/20"]
        }))
        .await;

        let ranges = fetch_hook_ranges(&format!("{}/meta", server.uri())).await.unwrap();

        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].to_string(), "192.30.252.0/22");
    }

    #[tokio::test]
    async fn test_empty_hooks_is_error() {
        let server = serve(json!({ "web": ["140.82.112.0/20"] })).await;
        assert!(fetch_hook_ranges(&format!("{}/meta", server.uri())).await.is_err());
    }

    #[tokio::test]
    async fn test_bad_range_is_error() {
        let server = serve(json!({ "hooks": ["not-a-cidr"] })).await;
        let err = fetch_hook_ranges(&format!("{}/meta", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not-a-cidr"));
    }
}
