//! Data Transfer Objects
//!
//! Raw shapes read from outside the process. DTOs are deserialized as-is and
//! carry no invariants; they are validated into domain types before use.

pub mod config;
