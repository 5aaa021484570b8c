//! Block storage disk adapter
//!
//! A disk is attached to at most one instance at a mount path. Moving or
//! deleting an attached disk detaches it in the release stage, and the
//! attach or delete call is only issued once the disk is observed
//! `available` with no attachment.

use crate::client::{ControlPlane, Mutations, fetch_one, paginate};
use crate::tagging::{Tag, sync_tags};
use async_trait::async_trait;
use sailyard_cloud::{CloudError, FaultKind, Operation, OperationKind, ResourceAdapter, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Message of a detach fault raised for a disk that is not attached
const ALREADY_DETACHED: &str = "is: available";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskModel {
    pub disk_name: String,
    pub size_in_gb: Option<u32>,
    pub availability_zone: Option<String>,
    /// `None` means detached
    pub attachment: Option<DiskAttachment>,
    pub tags: Option<Vec<Tag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskAttachment {
    pub instance_name: String,
    pub disk_path: String,
}

impl DiskModel {
    pub fn new(disk_name: impl Into<String>) -> Self {
        Self {
            disk_name: disk_name.into(),
            ..Default::default()
        }
    }
}

/// A detach fault that only says the disk is already detached
pub fn detach_is_benign(error: &CloudError) -> bool {
    error.message_contains(ALREADY_DETACHED)
}

/// Detached and idle, so the mount point and the disk itself are free
pub fn is_detached(observed: &DiskModel) -> bool {
    observed.attachment.is_none() && observed.state.as_deref() == Some("available")
}

pub struct DiskAdapter {
    client: Arc<dyn ControlPlane>,
}

impl DiskAdapter {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    async fn detach(&self, mutations: &mut Mutations, disk_name: &str) -> Result<()> {
        match mutations
            .issue(
                &*self.client,
                "DetachDisk",
                &json!({ "diskName": disk_name }),
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if detach_is_benign(&e) => {
                tracing::debug!("{} already detached: {}", disk_name, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn attach(
        &self,
        mutations: &mut Mutations,
        disk_name: &str,
        attachment: &DiskAttachment,
    ) -> Result<()> {
        mutations
            .issue(
                &*self.client,
                "AttachDisk",
                &json!({
                    "diskName": disk_name,
                    "instanceName": attachment.instance_name,
                    "diskPath": attachment.disk_path,
                }),
            )
            .await
    }
}

#[async_trait]
impl ResourceAdapter for DiskAdapter {
    type Model = DiskModel;

    fn type_name(&self) -> &str {
        "disk"
    }

    fn identifier(&self, model: &DiskModel) -> String {
        model.disk_name.clone()
    }

    /// Creates the disk detached; the attachment converges through update
    async fn create(&self, model: &DiskModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "CreateDisk",
                &json!({
                    "diskName": model.disk_name,
                    "sizeInGb": model.size_in_gb,
                    "availabilityZone": model.availability_zone,
                    "tags": model.tags.as_deref().unwrap_or_default(),
                }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn read(&self, model: &DiskModel) -> Result<DiskModel> {
        fetch_one(
            &*self.client,
            "GetDisk",
            json!({ "diskName": model.disk_name }),
            "disk",
            &model.disk_name,
        )
        .await
    }

    /// Attaches a detached disk. Detaching is left to the release stage.
    async fn update(&self, desired: &DiskModel) -> Result<Option<Vec<Operation>>> {
        let current = self.read(desired).await?;
        let mut mutations = Mutations::new();

        if desired.attachment != current.attachment {
            if let Some(held) = &current.attachment {
                return Err(CloudError::from_kind(
                    FaultKind::OperationFailure,
                    format!(
                        "disk {} is still attached to {}",
                        desired.disk_name, held.instance_name
                    ),
                ));
            }
            if let Some(attachment) = &desired.attachment {
                self.attach(&mut mutations, &desired.disk_name, attachment)
                    .await?;
            }
        }

        if let Some(tags) = &desired.tags {
            sync_tags(
                &*self.client,
                &mut mutations,
                &desired.disk_name,
                tags,
                current.tags.as_deref().unwrap_or_default(),
            )
            .await?;
        }

        Ok(mutations.into_update_result())
    }

    async fn delete(&self, model: &DiskModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "DeleteDisk",
                &json!({ "diskName": model.disk_name }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    /// Detaches the disk when a delete or a move needs it free
    async fn release(
        &self,
        op: OperationKind,
        model: &DiskModel,
    ) -> Result<Option<Vec<Operation>>> {
        if !matches!(op, OperationKind::Update | OperationKind::Delete) {
            return Ok(None);
        }
        let current = self.read(model).await?;
        let must_detach = current.attachment.is_some()
            && (op == OperationKind::Delete || current.attachment != model.attachment);
        if !must_detach {
            return Ok(None);
        }

        let mut mutations = Mutations::new();
        self.detach(&mut mutations, &model.disk_name).await?;
        Ok(mutations.into_update_result())
    }

    async fn is_released(&self, _op: OperationKind, model: &DiskModel) -> Result<bool> {
        let observed = self.read(model).await?;
        Ok(is_detached(&observed))
    }

    async fn list(&self, _model: &DiskModel) -> Result<Vec<DiskModel>> {
        paginate(&*self.client, "GetDisks", "disks").await
    }

    fn is_ready(&self, observed: &DiskModel) -> bool {
        matches!(observed.state.as_deref(), Some("available") | Some("in-use"))
    }

    /// Stable once the observed attachment matches the desired one
    async fn is_stabilized_update(&self, model: &DiskModel) -> Result<bool> {
        let observed = self.read(model).await?;
        Ok(self.is_ready(&observed) && observed.attachment == model.attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockControlPlane;
    use sailyard_cloud::FaultKind;

    fn attached_to(instance: &str) -> Option<DiskAttachment> {
        Some(DiskAttachment {
            instance_name: instance.to_string(),
            disk_path: "/dev/xvdf".to_string(),
        })
    }

    fn observed(instance: &str) -> serde_json::Value {
        json!({ "disk": {
            "diskName": "data",
            "attachment": { "instanceName": instance, "diskPath": "/dev/xvdf" },
            "state": "in-use"
        } })
    }

    fn detached() -> serde_json::Value {
        json!({ "disk": { "diskName": "data", "state": "available" } })
    }

    fn detaching() -> serde_json::Value {
        json!({ "disk": {
            "diskName": "data",
            "attachment": { "instanceName": "web-1", "diskPath": "/dev/xvdf" },
            "state": "detaching"
        } })
    }

    #[tokio::test]
    async fn test_move_releases_by_detaching_only() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond("GetDisk", observed("web-1"));

        let desired = DiskModel {
            attachment: attached_to("web-2"),
            ..DiskModel::new("data")
        };
        let adapter = DiskAdapter::new(mock.clone());
        let released = adapter.release(OperationKind::Update, &desired).await.unwrap();

        assert!(released.is_some());
        assert_eq!(mock.mutating_actions(), vec!["DetachDisk"]);
    }

    #[tokio::test]
    async fn test_attach_refused_while_still_attached() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond("GetDisk", observed("web-1"));

        let desired = DiskModel {
            attachment: attached_to("web-2"),
            ..DiskModel::new("data")
        };
        let adapter = DiskAdapter::new(mock.clone());
        let err = adapter.update(&desired).await.unwrap_err();

        assert!(err.message_contains("still attached to web-1"));
        assert!(mock.mutating_actions().is_empty());
    }

    #[tokio::test]
    async fn test_released_only_once_available_without_attachment() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond_sequence("GetDisk", vec![observed("web-1"), detaching(), detached()]);

        let adapter = DiskAdapter::new(mock);
        let model = DiskModel::new("data");
        assert!(!adapter.is_released(OperationKind::Delete, &model).await.unwrap());
        assert!(!adapter.is_released(OperationKind::Delete, &model).await.unwrap());
        assert!(adapter.is_released(OperationKind::Delete, &model).await.unwrap());
    }

    #[tokio::test]
    async fn test_detached_disk_needs_no_release() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond("GetDisk", detached());

        let adapter = DiskAdapter::new(mock.clone());
        let released = adapter
            .release(OperationKind::Delete, &DiskModel::new("data"))
            .await
            .unwrap();

        assert!(released.is_none());
        assert!(mock.mutating_actions().is_empty());
    }

    #[tokio::test]
    async fn test_same_attachment_is_noop() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond("GetDisk", observed("web-1"));

        let desired = DiskModel {
            attachment: attached_to("web-1"),
            ..DiskModel::new("data")
        };
        let adapter = DiskAdapter::new(mock.clone());
        assert!(adapter.update(&desired).await.unwrap().is_none());
        assert!(mock.mutating_actions().is_empty());
    }

    #[tokio::test]
    async fn test_delete_issues_delete_only() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond("GetDisk", detached());

        let adapter = DiskAdapter::new(mock.clone());
        adapter.delete(&DiskModel::new("data")).await.unwrap();

        assert_eq!(mock.mutating_actions(), vec!["DeleteDisk"]);
    }

    #[test]
    fn test_detach_benign_message() {
        let benign = CloudError::from_kind(
            FaultKind::OperationFailure,
            "The disk state is: available",
        );
        let fatal = CloudError::from_kind(
            FaultKind::OperationFailure,
            "The instance must be stopped before detaching",
        );
        assert!(detach_is_benign(&benign));
        assert!(!detach_is_benign(&fatal));
    }

    #[tokio::test]
    async fn test_update_stabilizes_on_matching_attachment() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond_sequence("GetDisk", vec![observed("web-1"), observed("web-2")]);

        let desired = DiskModel {
            attachment: attached_to("web-2"),
            ..DiskModel::new("data")
        };
        let adapter = DiskAdapter::new(mock);
        assert!(!adapter.is_stabilized_update(&desired).await.unwrap());
        assert!(adapter.is_stabilized_update(&desired).await.unwrap());
    }
}
