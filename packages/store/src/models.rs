use std::sync::Arc;

use chrono::{DateTime, Utc};
use orkest_model::{ProcessEnvelope, QName};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a deployed process version.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ProcessState {
    /// Accepts new instances.
    Active,
    /// Superseded by a newer version; existing instances run to completion.
    Retired,
    /// Accepts nothing.
    Disabled,
}

/// One process version as the store tracks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessConf {
    /// `{targetNamespace}name-version`.
    pub process_id: QName,
    /// `{targetNamespace}name`, shared by every version.
    pub process_type: QName,
    pub version: u64,
    /// Name of the deployment unit the process came from.
    pub package: String,
    pub state: ProcessState,
    pub deployed_at: DateTime<Utc>,
    pub envelope: Arc<ProcessEnvelope>,
}

impl ProcessConf {
    /// Build the configuration of a freshly compiled process.
    pub fn new(envelope: ProcessEnvelope, package: &str, version: u64, deployed_at: DateTime<Utc>) -> Self {
        let process_type = envelope.process.qname();
        let process_id = process_id(&process_type, version);
        Self {
            process_id,
            process_type,
            version,
            package: package.to_string(),
            state: ProcessState::Active,
            deployed_at,
            envelope: Arc::new(envelope),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ProcessState::Active
    }

    pub fn state_change(&self) -> ProcessStateChange {
        ProcessStateChange {
            process_id: self.process_id.clone(),
            state: self.state,
            package: self.package.clone(),
        }
    }
}

/// Versioned process id: the type name with `-version` appended.
pub fn process_id(process_type: &QName, version: u64) -> QName {
    QName::new(
        &process_type.namespace,
        format!("{}-{version}", process_type.local),
    )
}

/// A deployed directory of process definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentUnit {
    pub name: String,
    pub version: u64,
    pub deployed_at: DateTime<Utc>,
    pub processes: Vec<ProcessConf>,
}

impl DeploymentUnit {
    pub fn process_ids(&self) -> Vec<QName> {
        self.processes.iter().map(|p| p.process_id.clone()).collect()
    }
}

/// Deployment change announced to the other nodes of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessStoreEvent {
    Deployed { deployment_unit: String, node: String },
    Undeployed { deployment_unit: String, node: String },
}

impl ProcessStoreEvent {
    pub fn deployment_unit(&self) -> &str {
        match self {
            ProcessStoreEvent::Deployed {
                deployment_unit, ..
            }
            | ProcessStoreEvent::Undeployed {
                deployment_unit, ..
            } => deployment_unit,
        }
    }

    pub fn node(&self) -> &str {
        match self {
            ProcessStoreEvent::Deployed { node, .. } | ProcessStoreEvent::Undeployed { node, .. } => {
                node
            }
        }
    }
}

/// Notification delivered to store listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStateChange {
    pub process_id: QName,
    pub state: ProcessState,
    pub package: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_process_state_strings() {
        assert_eq!(ProcessState::Retired.to_string(), "RETIRED");
        assert_eq!(ProcessState::from_str("ACTIVE").unwrap(), ProcessState::Active);
        assert!(ProcessState::from_str("active").is_err());
    }

    #[test]
    fn test_process_id() {
        let id = process_id(&QName::new("urn:shop", "order"), 4);
        assert_eq!(id.to_string(), "{urn:shop}order-4");
    }

    #[test]
    fn test_event_accessors() {
        let event = ProcessStoreEvent::Undeployed {
            deployment_unit: "shop-2".to_string(),
            node: "node-1".to_string(),
        };
        assert_eq!(event.deployment_unit(), "shop-2");
        assert_eq!(event.node(), "node-1");
    }
}
