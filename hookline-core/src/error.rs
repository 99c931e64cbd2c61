//! Load-time configuration errors
//!
//! Everything in here is detected while building a
//! [`ListenerConfig`](crate::domain::config::ListenerConfig) and is fatal to
//! startup. Request-time errors live next to the stage that raises them
//! ([`crate::signature`], [`crate::when`]).

use thiserror::Error;

/// Errors raised while parsing or validating the configuration document
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid YAML or does not have the expected shape
    #[error("invalid configuration document: {0}")]
    Parse(String),

    #[error("pipelines field is empty")]
    NoPipelines,

    #[error("pipeline name is empty")]
    EmptyPipelineName,

    #[error("pipeline {0} is declared more than once")]
    DuplicatePipeline(String),

    /// `scope` is either `global` or the pipeline name
    #[error("found an empty name in extra params ({scope})")]
    EmptyParamName { scope: String },

    #[error("found an empty {field} in resources of pipeline {pipeline}")]
    InvalidResource {
        pipeline: String,
        field: &'static str,
    },

    #[error("found an empty workspace {field} in pipeline {pipeline}")]
    InvalidWorkspace {
        pipeline: String,
        field: &'static str,
    },

    #[error("workspace type unknown: {0}")]
    UnknownWorkspaceType(String),

    #[error("invalid binding template for workspace {workspace}: {message}")]
    InvalidWorkspaceTemplate { workspace: String, message: String },

    /// A when clause is missing one of `kind`, `keys` or `values`
    #[error("{0} field is empty in when clause")]
    EmptyWhenField(&'static str),

    #[error("kind field ({0}) unknown in when clause")]
    UnknownRuleKind(String),

    #[error("found an empty key in when clause in kind {0}")]
    EmptyRuleKey(String),

    #[error("found an empty operator in when clause in kind {0}")]
    EmptyOperator(String),

    #[error("found an unknown operator ({operator}) in when clause in kind {kind}")]
    UnknownOperator { kind: String, operator: String },

    #[error("found an empty data in when clause in kind {0}")]
    EmptyMatcherData(String),

    /// A secret or backing config map named by the document was not supplied
    #[error("{kind} {name} referenced by the configuration was not loaded")]
    MissingMaterial { kind: &'static str, name: String },
}
