//! When-rule domain types

use std::str::FromStr;

use crate::dto::config::{ValueEntry, WhenEntry};
use crate::error::ConfigError;

/// Data source a when-rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Header,
    Payload,
    Query,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Header => "header",
            RuleKind::Payload => "payload",
            RuleKind::Query => "query",
        }
    }
}

impl FromStr for RuleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "header" => Ok(RuleKind::Header),
            "payload" => Ok(RuleKind::Payload),
            "query" => Ok(RuleKind::Query),
            _ => Err(ConfigError::UnknownRuleKind(s.to_string())),
        }
    }
}

/// Comparison applied to an observed value
///
/// `Contains` and `NotContains` treat the matcher data as a regular
/// expression searched anywhere in the observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Contains,
    NotContains,
}

impl Operator {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "equal" => Some(Operator::Equal),
            "notequal" => Some(Operator::NotEqual),
            "contains" => Some(Operator::Contains),
            "notcontains" => Some(Operator::NotContains),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueMatcher {
    pub operator: Operator,
    pub data: String,
}

impl ValueMatcher {
    pub fn new(operator: Operator, data: impl Into<String>) -> Self {
        Self {
            operator,
            data: data.into(),
        }
    }
}

/// A rule group: passes when any key yields a value accepted by any matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhenRule {
    pub kind: RuleKind,
    pub keys: Vec<String>,
    pub values: Vec<ValueMatcher>,
}

impl WhenRule {
    pub fn new(kind: RuleKind, keys: Vec<String>, values: Vec<ValueMatcher>) -> Self {
        Self { kind, keys, values }
    }
}

impl TryFrom<&WhenEntry> for WhenRule {
    type Error = ConfigError;

    fn try_from(entry: &WhenEntry) -> Result<Self, Self::Error> {
        if entry.kind.is_empty() {
            return Err(ConfigError::EmptyWhenField("kind"));
        }

        if entry.keys.is_empty() {
            return Err(ConfigError::EmptyWhenField("keys"));
        }

        if entry.values.is_empty() {
            return Err(ConfigError::EmptyWhenField("values"));
        }

        let kind: RuleKind = entry.kind.parse()?;

        if entry.keys.iter().any(String::is_empty) {
            return Err(ConfigError::EmptyRuleKey(entry.kind.clone()));
        }

        let values = entry
            .values
            .iter()
            .map(|v| parse_matcher(&entry.kind, v))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(WhenRule {
            kind,
            keys: entry.keys.clone(),
            values,
        })
    }
}

fn parse_matcher(kind: &str, entry: &ValueEntry) -> Result<ValueMatcher, ConfigError> {
    if entry.operator.is_empty() {
        return Err(ConfigError::EmptyOperator(kind.to_string()));
    }

    let operator = Operator::parse(&entry.operator).ok_or_else(|| ConfigError::UnknownOperator {
        kind: kind.to_string(),
        operator: entry.operator.clone(),
    })?;

    if entry.data.is_empty() {
        return Err(ConfigError::EmptyMatcherData(kind.to_string()));
    }

    Ok(ValueMatcher::new(operator, entry.data.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str, keys: &[&str], values: &[(&str, &str)]) -> WhenEntry {
        WhenEntry {
            kind: kind.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            values: values
                .iter()
                .map(|(operator, data)| ValueEntry {
                    operator: operator.to_string(),
                    data: data.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_valid_rule_case_insensitive() {
        let rule = WhenRule::try_from(&entry(
            "Header",
            &["X-GitHub-Event"],
            &[("Equal", "push"), ("NOTCONTAINS", "^tag")],
        ))
        .unwrap();

        assert_eq!(rule.kind, RuleKind::Header);
        assert_eq!(rule.values[0].operator, Operator::Equal);
        assert_eq!(rule.values[1].operator, Operator::NotContains);
    }

    #[test]
    fn test_missing_fields() {
        let result = WhenRule::try_from(&entry("", &["a"], &[("equal", "x")]));
        assert_eq!(result, Err(ConfigError::EmptyWhenField("kind")));

        let result = WhenRule::try_from(&entry("payload", &[], &[("equal", "x")]));
        assert_eq!(result, Err(ConfigError::EmptyWhenField("keys")));

        let result = WhenRule::try_from(&entry("payload", &["a"], &[]));
        assert_eq!(result, Err(ConfigError::EmptyWhenField("values")));
    }

    #[test]
    fn test_unknown_kind() {
        let result = WhenRule::try_from(&entry("cookie", &["a"], &[("equal", "x")]));
        assert_eq!(result, Err(ConfigError::UnknownRuleKind("cookie".to_string())));
    }

    #[test]
    fn test_empty_key() {
        let result = WhenRule::try_from(&entry("query", &["a", ""], &[("equal", "x")]));
        assert_eq!(result, Err(ConfigError::EmptyRuleKey("query".to_string())));
    }

    #[test]
    fn test_bad_matchers() {
        let result = WhenRule::try_from(&entry("query", &["a"], &[("", "x")]));
        assert_eq!(result, Err(ConfigError::EmptyOperator("query".to_string())));

        let result = WhenRule::try_from(&entry("query", &["a"], &[("startswith", "x")]));
        assert!(matches!(result, Err(ConfigError::UnknownOperator { .. })));

        let result = WhenRule::try_from(&entry("query", &["a"], &[("equal", "")]));
        assert_eq!(
            result,
            Err(ConfigError::EmptyMatcherData("query".to_string()))
        );
    }
}
