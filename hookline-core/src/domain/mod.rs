//! Core domain types
//!
//! Validated, immutable structures shared by every request. Configuration
//! types are built once at startup from the [`crate::dto`] document; request
//! and manifest types are built fresh for each inbound event.

pub mod config;
pub mod event;
pub mod manifest;
pub mod when;
pub mod workspace;
