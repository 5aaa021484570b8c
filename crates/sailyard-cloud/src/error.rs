//! Fault taxonomy raised by adapters and the control-plane client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable classification of a raised fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FaultKind {
    /// The target resource does not exist (yet, or any more)
    NotFound,
    /// The request was rejected as malformed or not applicable
    InvalidInput,
    /// The resource is already present
    AlreadyExists,
    /// Generic remote failure; the message tells transient and fatal cases apart
    OperationFailure,
    /// Stabilization polling gave up
    NotStabilized,
    /// Anything else
    Unclassified,
}

impl FaultKind {
    /// Wire code used by the remote control plane
    pub fn code(&self) -> &'static str {
        match self {
            FaultKind::NotFound => "NotFoundException",
            FaultKind::InvalidInput => "InvalidInputException",
            FaultKind::AlreadyExists => "AlreadyExistsException",
            FaultKind::OperationFailure => "OperationFailureException",
            FaultKind::NotStabilized => "NotStabilizedException",
            FaultKind::Unclassified => "UnclassifiedException",
        }
    }

    /// Parse a wire code. Codes may carry a namespace prefix (`ns#NotFoundException`).
    pub fn from_code(code: &str) -> Self {
        let code = code.rsplit('#').next().unwrap_or(code);
        match code {
            "NotFoundException" => FaultKind::NotFound,
            "InvalidInputException" => FaultKind::InvalidInput,
            "AlreadyExistsException" => FaultKind::AlreadyExists,
            "OperationFailureException" => FaultKind::OperationFailure,
            "NotStabilizedException" => FaultKind::NotStabilized,
            _ => FaultKind::Unclassified,
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Cloud resource errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Operation failed: {0}")]
    OperationFailure(String),

    #[error("Resource did not stabilize: {0}")]
    NotStabilized(String),

    #[error("Unexpected fault: {0}")]
    Unclassified(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Build a fault from a control-plane code and message
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        Self::from_kind(FaultKind::from_code(code), message)
    }

    pub fn from_kind(kind: FaultKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            FaultKind::NotFound => CloudError::ResourceNotFound(message),
            FaultKind::InvalidInput => CloudError::InvalidInput(message),
            FaultKind::AlreadyExists => CloudError::ResourceAlreadyExists(message),
            FaultKind::OperationFailure => CloudError::OperationFailure(message),
            FaultKind::NotStabilized => CloudError::NotStabilized(message),
            FaultKind::Unclassified => CloudError::Unclassified(message),
        }
    }

    pub fn kind(&self) -> FaultKind {
        match self {
            CloudError::ResourceNotFound(_) => FaultKind::NotFound,
            CloudError::InvalidInput(_) | CloudError::InvalidConfig(_) => FaultKind::InvalidInput,
            CloudError::ResourceAlreadyExists(_) => FaultKind::AlreadyExists,
            CloudError::OperationFailure(_) => FaultKind::OperationFailure,
            CloudError::NotStabilized(_) => FaultKind::NotStabilized,
            CloudError::Unclassified(_)
            | CloudError::StateError(_)
            | CloudError::LockError(_)
            | CloudError::Io(_)
            | CloudError::Json(_) => FaultKind::Unclassified,
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            CloudError::ResourceNotFound(m)
            | CloudError::InvalidInput(m)
            | CloudError::ResourceAlreadyExists(m)
            | CloudError::OperationFailure(m)
            | CloudError::NotStabilized(m)
            | CloudError::Unclassified(m)
            | CloudError::InvalidConfig(m)
            | CloudError::StateError(m)
            | CloudError::LockError(m) => m.clone(),
            CloudError::Io(e) => e.to_string(),
            CloudError::Json(e) => e.to_string(),
        }
    }

    pub fn message_contains(&self, needle: &str) -> bool {
        self.message().contains(needle)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == FaultKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_strips_namespace() {
        assert_eq!(
            FaultKind::from_code("com.example#NotFoundException"),
            FaultKind::NotFound
        );
        assert_eq!(
            FaultKind::from_code("InvalidInputException"),
            FaultKind::InvalidInput
        );
        assert_eq!(
            FaultKind::from_code("ThrottlingException"),
            FaultKind::Unclassified
        );
    }

    #[test]
    fn test_error_kind_and_message() {
        let err = CloudError::from_code("OperationFailureException", "Disk state is: available");
        assert_eq!(err.kind(), FaultKind::OperationFailure);
        assert_eq!(err.message(), "Disk state is: available");
        assert!(err.message_contains("is: available"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_local_failures_are_unclassified() {
        let err = CloudError::LockError("held".into());
        assert_eq!(err.kind(), FaultKind::Unclassified);
        assert_eq!(CloudError::InvalidConfig("x".into()).kind(), FaultKind::InvalidInput);
    }
}
