//! Shared application state

use hookline_core::clock::Clock;
use hookline_core::domain::config::ListenerConfig;
use hookline_core::manifest::Synthesizer;
use std::sync::Arc;

use crate::repository::RunSubmitter;
use crate::service::allowlist::SourceAllowlist;

/// Everything a request handler needs, cheap to clone into spawned tasks
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ListenerConfig>,
    pub synthesizer: Arc<Synthesizer>,
    pub submitter: Arc<dyn RunSubmitter>,
    /// `None` when source-IP checking is disabled
    pub allowlist: Option<Arc<SourceAllowlist>>,
    pub clock: Arc<dyn Clock>,
    /// Namespace runs are created in
    pub namespace: Arc<str>,
}

#[cfg(test)]
impl AppState {
    /// State with a pinned clock and no allow-list
    pub fn for_tests(config: ListenerConfig, submitter: Arc<dyn RunSubmitter>) -> Self {
        use chrono::{TimeZone, Utc};
        use hookline_core::clock::FixedClock;

        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(at));

        Self {
            config: Arc::new(config),
            synthesizer: Arc::new(Synthesizer::new("hookline-listener", clock.clone())),
            submitter,
            allowlist: None,
            clock,
            namespace: Arc::from("pipelines"),
        }
    }
}
