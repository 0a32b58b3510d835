use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Node identifier used when `ORKEST_NODE_ID` is not set.
pub const DEFAULT_NODE_ID: &str = "node-0";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Identity of this node in cluster events.
    pub node_id: String,
    /// Directory whose subdirectories are deployment units.
    pub deploy_dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let node_id = match std::env::var("ORKEST_NODE_ID") {
            Ok(id) if id.trim().is_empty() => {
                return Err(StoreError::Config("ORKEST_NODE_ID is empty".into()))
            }
            Ok(id) => id,
            Err(_) => DEFAULT_NODE_ID.to_string(),
        };

        let deploy_dir = std::env::var("ORKEST_DEPLOY_DIR").ok().map(PathBuf::from);

        Ok(Self {
            node_id,
            deploy_dir,
        })
    }

    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            deploy_dir: None,
        }
    }

    pub fn with_deploy_dir(mut self, deploy_dir: impl Into<PathBuf>) -> Self {
        self.deploy_dir = Some(deploy_dir.into());
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_ID)
    }
}
