//! Orkest Store - Deployment and versioning of compiled processes.
//!
//! Deployment units are directories of process definitions. Deploying one
//! compiles every definition, assigns a new version, retires the active
//! versions of the same package family and announces the unit to the other
//! nodes of the cluster, which load it from the shared [`ConfStore`].
//!
//! # Architecture
//!
//! - [`models`]: Process configurations, deployment units, events
//! - [`conf_store`]: Shared deployment-unit repository
//! - [`cluster`]: The per-node clustered process store
//! - [`config`]: Environment configuration
//! - [`error`]: Error types and Result alias

pub mod cluster;
pub mod conf_store;
pub mod config;
pub mod error;
pub mod models;

pub use cluster::{
    previous_version_pattern, ClusterManager, ClusterProcessStore, InMemoryClusterManager,
    StateListener,
};
pub use conf_store::{ConfStore, InMemoryConfStore};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use models::{DeploymentUnit, ProcessConf, ProcessState, ProcessStateChange, ProcessStoreEvent};
