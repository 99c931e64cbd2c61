//! Hookline Core
//!
//! Event gating and run synthesis for the Hookline webhook listener.
//!
//! This crate contains:
//! - Domain types: validated listener configuration, when-rules, workspaces,
//!   request context and the run manifest
//! - DTOs: the configuration document as operators write it
//! - The request stages: signature verification, when-rule evaluation,
//!   parameter layering and manifest synthesis
//!
//! Nothing in here performs I/O. Fetching configuration material and
//! submitting runs to the cluster lives in the listener.

pub mod clock;
pub mod domain;
pub mod dto;
pub mod error;
pub mod manifest;
pub mod params;
pub mod signature;
pub mod when;
