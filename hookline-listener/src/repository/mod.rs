//! Repository Module
//!
//! Outbound access for the listener: the cluster config store, run
//! submission and the GitHub meta endpoint. The first two are traits so the
//! service layer can be exercised without a cluster.

pub mod config_store;
pub mod github_meta;
pub mod submission;

pub use config_store::{ConfigStore, KubeConfigStore};
pub use submission::{KubeRunSubmitter, RunSubmitter};
