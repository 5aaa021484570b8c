//! Lifecycle operation kinds and control-plane operation receipts

use crate::error::CloudError;
use serde::{Deserialize, Serialize};

/// Lifecycle operation requested by the orchestration framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Provision a new resource
    Create,
    /// Fetch the observed state of one resource
    Read,
    /// Converge an existing resource to the desired model
    Update,
    /// Deprovision a resource
    Delete,
    /// Enumerate every resource of one type
    List,
}

impl OperationKind {
    /// Whether the operation goes through PRE_CHECK → MUTATE → STABILIZE
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            OperationKind::Create | OperationKind::Update | OperationKind::Delete
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Read => "read",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::List => "list",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(OperationKind::Create),
            "read" => Ok(OperationKind::Read),
            "update" => Ok(OperationKind::Update),
            "delete" => Ok(OperationKind::Delete),
            "list" => Ok(OperationKind::List),
            other => Err(CloudError::InvalidInput(format!(
                "unknown operation: {}",
                other
            ))),
        }
    }
}

/// Receipt returned by the control plane for a mutating call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Control-plane operation ID
    #[serde(default)]
    pub id: Option<String>,

    /// Name of the resource the operation acted on
    #[serde(default)]
    pub resource_name: Option<String>,

    /// Operation type (e.g. "CreateDisk")
    #[serde(default)]
    pub operation_type: Option<String>,

    /// Operation status as reported by the control plane
    #[serde(default)]
    pub status: Option<String>,
}

impl Operation {
    pub fn new(operation_type: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            id: None,
            resource_name: Some(resource_name.into()),
            operation_type: Some(operation_type.into()),
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} on {} ({})",
            self.operation_type.as_deref().unwrap_or("operation"),
            self.resource_name.as_deref().unwrap_or("-"),
            self.status.as_deref().unwrap_or("submitted")
        )
    }
}
