//! Callback state threaded across reconciliation ticks

use crate::action::OperationKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serializable per-operation state carried between ticks.
///
/// Created empty when a lifecycle operation starts and discarded once the
/// operation reaches a terminal state. The flags guard PRE_CHECK and MUTATE
/// so that re-entry only re-executes STABILIZE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackContext {
    /// Named stage flags (e.g. "pre-check-create-done")
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,

    /// Number of stabilization polls performed so far
    #[serde(default)]
    pub stabilization_attempts: u32,
}

impl CallbackContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.stabilization_attempts == 0
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn mark(&mut self, key: impl Into<String>) {
        self.flags.insert(key.into(), true);
    }

    pub fn with_flag(mut self, key: impl Into<String>) -> Self {
        self.mark(key);
        self
    }

    /// Count one stabilization poll and return the new total
    pub fn record_attempt(&mut self) -> u32 {
        self.stabilization_attempts = self.stabilization_attempts.saturating_add(1);
        self.stabilization_attempts
    }

    pub fn pre_check_done(&self, op: OperationKind) -> bool {
        self.is_set(&pre_check_key(op))
    }

    pub fn mutation_issued(&self, op: OperationKind) -> bool {
        self.is_set(&mutation_key(op))
    }

    pub fn settled(&self, op: OperationKind) -> bool {
        self.is_set(&settled_key(op))
    }

    pub fn release_issued(&self, op: OperationKind) -> bool {
        self.is_set(&release_issued_key(op))
    }

    pub fn released(&self, op: OperationKind) -> bool {
        self.is_set(&released_key(op))
    }
}

/// Flag recorded once the existence guard for `op` has run
pub fn pre_check_key(op: OperationKind) -> String {
    format!("pre-check-{}-done", op)
}

/// Flag recorded once the mutating call for `op` has been accepted
pub fn mutation_key(op: OperationKind) -> String {
    format!("{}-issued", op)
}

/// Flag recorded once the call freeing dependents of `op` has been accepted
pub fn release_issued_key(op: OperationKind) -> String {
    format!("{}-release-issued", op)
}

/// Flag recorded once the dependents of `op` are observably free
pub fn released_key(op: OperationKind) -> String {
    format!("{}-released", op)
}

/// Flag recorded on the first ready stabilization pass of a settling operation
pub fn settled_key(op: OperationKind) -> String {
    format!("{}-settled", op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_keys() {
        assert_eq!(pre_check_key(OperationKind::Create), "pre-check-create-done");
        assert_eq!(pre_check_key(OperationKind::Update), "pre-check-update-done");
        assert_eq!(mutation_key(OperationKind::Delete), "delete-issued");
        assert_eq!(settled_key(OperationKind::Update), "update-settled");
        assert_eq!(release_issued_key(OperationKind::Delete), "delete-release-issued");
        assert_eq!(released_key(OperationKind::Update), "update-released");
    }

    #[test]
    fn test_context_serialization() {
        let mut ctx = CallbackContext::new().with_flag(pre_check_key(OperationKind::Create));
        ctx.record_attempt();

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["flags"]["pre-check-create-done"], true);
        assert_eq!(json["stabilizationAttempts"], 1);

        let restored: CallbackContext = serde_json::from_value(json).unwrap();
        assert!(restored.pre_check_done(OperationKind::Create));
        assert!(!restored.mutation_issued(OperationKind::Create));
    }

    #[test]
    fn test_empty_payload_deserializes() {
        let ctx: CallbackContext = serde_json::from_str("{}").unwrap();
        assert!(ctx.is_empty());
    }
}
