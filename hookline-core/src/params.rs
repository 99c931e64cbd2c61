//! Run parameter layering

use std::collections::BTreeMap;

use crate::domain::config::ExtraParam;
use crate::domain::event::MultiMap;

/// Query parameters that route the request and never reach the run
pub const RESERVED_PARAMS: [&str; 2] = ["pipeline", "prefix"];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_PARAMS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// Merges global, pipeline and query parameters, later layers winning
///
/// Query parameters contribute their first value. Reserved names are dropped
/// from every layer. Shared configuration is only read.
pub fn resolve(
    global: &[ExtraParam],
    pipeline: &[ExtraParam],
    query: &MultiMap,
) -> BTreeMap<String, String> {
    let configured = global
        .iter()
        .chain(pipeline)
        .map(|p| (p.name.as_str(), p.value.as_str()));

    let requested = query
        .iter()
        .filter_map(|(name, values)| values.first().map(|v| (name, v.as_str())));

    configured
        .chain(requested)
        .filter(|(name, _)| !is_reserved(name))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
