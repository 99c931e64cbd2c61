//! Service Module
//!
//! Business logic layer for the listener. Services chain the core stages and
//! call into repositories; they know nothing about HTTP.

pub mod allowlist;
pub mod loader;
pub mod webhook;

// Re-export for convenience
pub use webhook as webhook_service;
