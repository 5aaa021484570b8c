//! Fault classification shared by every resource type
//!
//! Adapters contribute only the stage allow-list and the NotFound-equivalence
//! test. The decision table itself is the same for all resource kinds:
//!
//! | Fault                       | Operation | Stage     | Resolution    |
//! |-----------------------------|-----------|-----------|---------------|
//! | NotFound-equivalent         | Delete    | any       | `AlreadyGone` |
//! | NotFound-equivalent         | Create    | Stabilize | `NotYetReady` |
//! | kind in stage allow-list    | any       | any       | `Allowed`     |
//! | anything else               | any       | any       | `Propagate`   |

use crate::action::OperationKind;
use crate::error::{CloudError, FaultKind};

/// Engine stage at which a fault was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    PreCheck,
    Mutate,
    Stabilize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::PreCheck => write!(f, "pre-check"),
            Stage::Mutate => write!(f, "mutate"),
            Stage::Stabilize => write!(f, "stabilize"),
        }
    }
}

/// What the engine does with a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The resource is gone; the delete counts as successful
    AlreadyGone,
    /// Still provisioning; the stabilization predicate is false
    NotYetReady,
    /// Listed as safe for this stage; the stage decides what it means
    Allowed(FaultKind),
    /// Surface as a FAILED event
    Propagate,
}

impl Resolution {
    pub fn is_propagated(&self) -> bool {
        matches!(self, Resolution::Propagate)
    }
}

/// Classify a fault raised during `stage` of operation `op`.
///
/// `allow_list` holds the fault kinds the stage tolerates and `is_not_found`
/// decides whether the fault means the resource is absent.
pub fn classify<F>(
    op: OperationKind,
    stage: Stage,
    error: &CloudError,
    allow_list: &[FaultKind],
    is_not_found: F,
) -> Resolution
where
    F: Fn(&CloudError) -> bool,
{
    let not_found = is_not_found(error);

    if not_found && op == OperationKind::Delete {
        return Resolution::AlreadyGone;
    }
    if not_found && op == OperationKind::Create && stage == Stage::Stabilize {
        return Resolution::NotYetReady;
    }

    let kind = error.kind();
    if allow_list.contains(&kind) {
        return Resolution::Allowed(kind);
    }

    Resolution::Propagate
}
