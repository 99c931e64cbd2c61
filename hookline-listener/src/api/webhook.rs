//! Webhook API Handler
//!
//! Accepts GitHub events, answers immediately and hands the event to the
//! webhook service on a separate task.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
};
use hookline_core::domain::event::{MultiMap, RequestContext, RunId};
use std::net::SocketAddr;

use crate::api::error::{ApiError, ApiResult};
use crate::service::allowlist::source_ip;
use crate::service::webhook_service;
use crate::state::AppState;

pub const EVENT_HEADER: &str = "X-GitHub-Event";
const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";
const PING_EVENT: &str = "ping";
const RESPONSE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// POST /api/v1/github
/// Receive a GitHub event
pub async fn receive_event(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<String> {
    if let Some(allowlist) = &state.allowlist {
        let forwarded = header_str(&headers, FORWARDED_FOR_HEADER);
        let ip = source_ip(forwarded, Some(peer.ip())).ok_or_else(|| {
            ApiError::InternalError("could not determine source ip".to_string())
        })?;

        if !allowlist.allows(ip) {
            tracing::debug!(%ip, "Rejected event from unlisted address");
            return Err(ApiError::Unauthorized("source ip not allowed".to_string()));
        }
    }

    let event = header_str(&headers, EVENT_HEADER)
        .filter(|event| !event.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing {EVENT_HEADER} header")))?
        .to_string();

    let now = state.clock.now().format(RESPONSE_TIME_FORMAT);

    if event == PING_EVENT {
        return Ok(format!("pong at {now}"));
    }

    let run_id = RunId::generate();
    let reply = format!("Queued request id {run_id} at {now}");
    tracing::info!(pipelinerun_id = %run_id, %event, "Event queued");

    let ctx = RequestContext {
        run_id,
        payload: body.to_vec(),
        event,
        query: query.into_iter().collect(),
        headers: header_multimap(&headers),
        check_source_ip: state.allowlist.is_some(),
    };

    webhook_service::dispatch(state, ctx);

    Ok(reply)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Headers with non-UTF-8 values dropped
fn header_multimap(headers: &HeaderMap) -> MultiMap {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect()
}
