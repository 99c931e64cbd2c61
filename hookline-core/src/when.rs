//! When-rule evaluation
//!
//! Rule groups are ANDed and evaluation stops at the first group that fails.
//! Inside a group, every key is tried against every matcher and one hit is
//! enough.
//!
//! Payload keys are paths into the JSON body: segments are separated by `.`,
//! a numeric segment indexes an array and `\.` stands for a literal dot.
//! Only string values are observed. A present value that is empty or not a
//! string fails the group outright; an absent path only skips the key.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::event::RequestContext;
use crate::domain::when::{Operator, RuleKind, ValueMatcher, WhenRule};

/// The request cannot be evaluated
#[derive(Debug, Error)]
pub enum WhenError {
    #[error("invalid regular expression {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("payload is not valid JSON: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// Returns whether every rule group matches the request
pub fn evaluate(rules: &[WhenRule], ctx: &RequestContext) -> Result<bool, WhenError> {
    let mut payload: Option<Value> = None;

    for (index, rule) in rules.iter().enumerate() {
        let matched = match rule.kind {
            RuleKind::Header => header_group(rule, ctx)?,
            RuleKind::Query => query_group(rule, ctx)?,
            RuleKind::Payload => {
                let doc = match payload.take() {
                    Some(doc) => doc,
                    None => serde_json::from_slice(&ctx.payload)?,
                };
                let matched = payload_group(rule, &doc)?;
                payload = Some(doc);
                matched
            }
        };

        if !matched {
            debug!(
                group = index,
                kind = rule.kind.as_str(),
                keys = ?rule.keys,
                "when condition not met"
            );
            return Ok(false);
        }
    }

    Ok(true)
}

fn header_group(rule: &WhenRule, ctx: &RequestContext) -> Result<bool, WhenError> {
    for key in &rule.keys {
        for observed in ctx.headers.get_ignore_case(key) {
            if any_matcher(&rule.values, observed)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn query_group(rule: &WhenRule, ctx: &RequestContext) -> Result<bool, WhenError> {
    for key in &rule.keys {
        if let Some(observed) = ctx.query.first_ignore_case(key) {
            if any_matcher(&rule.values, observed)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn payload_group(rule: &WhenRule, doc: &Value) -> Result<bool, WhenError> {
    for key in &rule.keys {
        let Some(found) = lookup_path(doc, key) else {
            continue;
        };

        let observed = match found {
            Value::String(s) if !s.is_empty() => s.as_str(),
            _ => {
                debug!(key = %key, "payload value is empty or not a string");
                return Ok(false);
            }
        };

        if any_matcher(&rule.values, observed)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn any_matcher(matchers: &[ValueMatcher], observed: &str) -> Result<bool, WhenError> {
    for matcher in matchers {
        if matches(matcher, observed)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn matches(matcher: &ValueMatcher, observed: &str) -> Result<bool, WhenError> {
    match matcher.operator {
        Operator::Equal => Ok(observed == matcher.data),
        Operator::NotEqual => Ok(observed != matcher.data),
        Operator::Contains => Ok(compile(&matcher.data)?.is_match(observed)),
        Operator::NotContains => Ok(!compile(&matcher.data)?.is_match(observed)),
    }
}

fn compile(pattern: &str) -> Result<Regex, WhenError> {
    Regex::new(pattern).map_err(|source| WhenError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Resolves a dotted path inside a JSON document
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path_segments(path)
        .iter()
        .try_fold(doc, |current, segment| match current {
            Value::Object(map) => map.get(segment.as_str()),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn path_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'.') => {
                current.push('.');
                chars.next();
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
}
