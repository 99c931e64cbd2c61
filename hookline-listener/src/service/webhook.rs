//! Webhook Service
//!
//! Runs one accepted event through routing, signature verification, when
//! conditions, parameter layering and synthesis, then submits the run.
//! Everything up to submission is a pure function of the configuration and
//! the request.

use hookline_core::domain::config::ListenerConfig;
use hookline_core::domain::event::RequestContext;
use hookline_core::domain::manifest::RunManifest;
use hookline_core::manifest::{RunRequest, Synthesizer, normalize_prefix};
use hookline_core::params;
use hookline_core::signature::{self, SIGNATURE_HEADER, SignatureError};
use hookline_core::when::{self, WhenError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

use crate::state::AppState;

/// Why an event did not produce a run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("request has no query parameters")]
    EmptyQuery,

    #[error("query parameter {0} is missing or empty")]
    MissingParameter(&'static str),

    #[error("pipeline {0} is not configured")]
    UnknownPipeline(String),

    #[error("signature does not match payload")]
    SignatureMismatch,

    #[error("when conditions not met")]
    ConditionNotMet,
}

impl Rejection {
    /// Rejections that are an expected part of filtering rather than a problem
    pub fn is_expected(&self) -> bool {
        matches!(self, Rejection::ConditionNotMet)
    }
}

/// The event could not be processed
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("signature check failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("when evaluation failed: {0}")]
    When(#[from] WhenError),

    #[error("submission failed: {0:#}")]
    Submission(anyhow::Error),
}

#[derive(Debug)]
pub enum Plan {
    Launch(RunManifest),
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Launched { name: String },
    Rejected(Rejection),
}

/// Decides what to do with an event without touching the cluster
pub fn plan_run(
    config: &ListenerConfig,
    synthesizer: &Synthesizer,
    namespace: &str,
    ctx: &RequestContext,
) -> Result<Plan, WebhookError> {
    if ctx.query.is_empty() {
        return Ok(Plan::Rejected(Rejection::EmptyQuery));
    }

    let Some(pipeline_name) = required_param(ctx, "pipeline") else {
        return Ok(Plan::Rejected(Rejection::MissingParameter("pipeline")));
    };
    let pipeline_name = pipeline_name.to_lowercase();

    let prefix = required_param(ctx, "prefix").map(normalize_prefix);
    let Some(prefix) = prefix.filter(|p| !p.is_empty()) else {
        return Ok(Plan::Rejected(Rejection::MissingParameter("prefix")));
    };

    let Some(pipeline) = config.pipeline(&pipeline_name) else {
        return Ok(Plan::Rejected(Rejection::UnknownPipeline(pipeline_name)));
    };

    match config.secret_for(pipeline) {
        Some(secret) => {
            let header = ctx.headers.first_ignore_case(SIGNATURE_HEADER);
            if !signature::verify(secret.as_bytes(), &ctx.payload, header)? {
                return Ok(Plan::Rejected(Rejection::SignatureMismatch));
            }
        }
        None => debug!(
            pipeline = %pipeline.name,
            "no webhook secret configured, skipping signature check"
        ),
    }

    if !when::evaluate(&pipeline.when, ctx)? {
        return Ok(Plan::Rejected(Rejection::ConditionNotMet));
    }

    let merged = params::resolve(config.global_extra_params(), &pipeline.extra_params, &ctx.query);

    let manifest = synthesizer.synthesize(RunRequest {
        run_id: &ctx.run_id,
        pipeline: &pipeline.name,
        prefix: &prefix,
        event: &ctx.event,
        payload: &ctx.payload,
        params: merged,
        service_account: config.service_account_for(pipeline),
        workspaces: &pipeline.workspaces,
        resources: &pipeline.resources,
        namespace,
    });

    Ok(Plan::Launch(manifest))
}

fn required_param<'a>(ctx: &'a RequestContext, name: &str) -> Option<&'a str> {
    ctx.query
        .first_ignore_case(name)
        .filter(|value| !value.is_empty())
}

/// Plans the event and submits the run if there is one
pub async fn handle_event(state: &AppState, ctx: RequestContext) -> Result<Outcome, WebhookError> {
    let plan = plan_run(&state.config, &state.synthesizer, &state.namespace, &ctx)?;

    let manifest = match plan {
        Plan::Launch(manifest) => manifest,
        Plan::Rejected(rejection) => return Ok(Outcome::Rejected(rejection)),
    };

    if let Ok(yaml) = manifest.to_yaml() {
        debug!(manifest = %yaml, "Submitting pipeline run");
    }

    state
        .submitter
        .submit(&manifest)
        .await
        .map_err(WebhookError::Submission)?;

    Ok(Outcome::Launched {
        name: manifest.metadata.name,
    })
}

/// Processes an event on its own task and logs the outcome
///
/// The caller has already answered the sender; nothing is reported back.
pub fn dispatch(state: AppState, ctx: RequestContext) -> JoinHandle<()> {
    let span = info_span!("pipeline_run", pipelinerun_id = %ctx.run_id, event = %ctx.event);

    tokio::spawn(
        async move {
            match handle_event(&state, ctx).await {
                Ok(Outcome::Launched { name }) => info!(run = %name, "Pipeline run launched"),
                Ok(Outcome::Rejected(rejection)) if rejection.is_expected() => {
                    info!("Pipeline run skipped: {}", rejection)
                }
                Ok(Outcome::Rejected(rejection)) => error!("Pipeline run rejected: {}", rejection),
                Err(WebhookError::Submission(err)) => {
                    error!(error = ?err, "Operational failure: could not submit pipeline run")
                }
                Err(err) => error!("Pipeline run aborted: {}", err),
            }
        }
        .instrument(span),
    )
}
