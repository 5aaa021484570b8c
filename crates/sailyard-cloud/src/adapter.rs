//! Resource adapter trait definition

use crate::action::{Operation, OperationKind};
use crate::classifier::{Resolution, Stage, classify};
use crate::error::{CloudError, FaultKind, Result};
use async_trait::async_trait;
use std::fmt::Debug;

/// Per-resource-type lifecycle logic.
///
/// Every resource kind (alarm, bucket, disk, ...) implements this trait
/// against the remote control plane. The engine issues the mutating method
/// of an operation once, after `release` has freed any dependents, and
/// relies on the stabilization predicates to decide when an asynchronous
/// provisioning action has finished.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Desired/observed attribute set for one resource instance
    type Model: Clone + Debug + Send + Sync + 'static;

    /// Resource type name for logs and events (e.g. "disk")
    fn type_name(&self) -> &str;

    /// Primary identifier of the instance described by `model`
    fn identifier(&self, model: &Self::Model) -> String;

    /// Issue the provisioning call
    async fn create(&self, model: &Self::Model) -> Result<Vec<Operation>>;

    /// Fetch the observed state; `ResourceNotFound` when absent
    async fn read(&self, model: &Self::Model) -> Result<Self::Model>;

    /// Converge to `desired`. `Ok(None)` means the change is already applied
    /// and no mutating call was issued.
    async fn update(&self, desired: &Self::Model) -> Result<Option<Vec<Operation>>>;

    /// Issue the deprovisioning call
    async fn delete(&self, model: &Self::Model) -> Result<Vec<Operation>>;

    /// Free whatever must be let go before the mutating call of `op`
    /// (e.g. detach a disk before deleting it). `Ok(None)` when nothing is
    /// held; the mutating call then runs in the same tick.
    async fn release(
        &self,
        _op: OperationKind,
        _model: &Self::Model,
    ) -> Result<Option<Vec<Operation>>> {
        Ok(None)
    }

    /// True once what `release` let go is observably free
    async fn is_released(&self, _op: OperationKind, _model: &Self::Model) -> Result<bool> {
        Ok(true)
    }

    /// Enumerate every instance of this resource type
    async fn list(&self, model: &Self::Model) -> Result<Vec<Self::Model>>;

    /// Whether an observed model is in its ready state
    fn is_ready(&self, _observed: &Self::Model) -> bool {
        true
    }

    /// True once the resource is observably present and ready.
    /// Absence means "still provisioning", not a failure.
    async fn is_stabilized_create(&self, model: &Self::Model) -> Result<bool> {
        match self.read(model).await {
            Ok(observed) => Ok(self.is_ready(&observed)),
            Err(e) => match classify(
                OperationKind::Create,
                Stage::Stabilize,
                &e,
                &[],
                |err: &CloudError| self.is_not_found(err),
            ) {
                Resolution::NotYetReady => Ok(false),
                _ => Err(e),
            },
        }
    }

    /// True once the observed state reflects the update
    async fn is_stabilized_update(&self, model: &Self::Model) -> Result<bool> {
        let observed = self.read(model).await?;
        Ok(self.is_ready(&observed))
    }

    /// True once `read` fails with NotFound; other faults propagate
    async fn is_stabilized_delete(&self, model: &Self::Model) -> Result<bool> {
        match self.read(model).await {
            Ok(_) => Ok(false),
            Err(e) => match classify(
                OperationKind::Delete,
                Stage::Stabilize,
                &e,
                &[],
                |err: &CloudError| self.is_not_found(err),
            ) {
                Resolution::AlreadyGone => Ok(true),
                _ => Err(e),
            },
        }
    }

    /// NotFound-equivalence test
    fn is_not_found(&self, error: &CloudError) -> bool {
        error.is_not_found()
    }

    /// Faults raised by `delete` that mean the resource is already gone
    fn is_safe_exception_delete(&self, error: &CloudError) -> bool {
        self.is_not_found(error)
    }

    /// Fault kinds the PRE_CHECK read tolerates for `op`
    fn pre_check_allow_list(&self, op: OperationKind) -> &'static [FaultKind] {
        match op {
            OperationKind::Create => &[FaultKind::NotFound, FaultKind::InvalidInput],
            _ => &[],
        }
    }

    /// Whether `op` needs an extra settling tick before it can succeed
    fn requires_settling(&self, _op: OperationKind) -> bool {
        false
    }
}
