//! Managed relational database adapter
//!
//! Database creates and updates are followed by a settling tick: the
//! control plane reports `available` briefly before applying pending
//! modifications, so one observation is not enough.

use super::differs;
use crate::client::{ControlPlane, Mutations, fetch_one, paginate};
use crate::tagging::{Tag, sync_tags};
use async_trait::async_trait;
use sailyard_cloud::{Operation, OperationKind, ResourceAdapter, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const READY_STATE: &str = "available";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseModel {
    pub relational_database_name: String,
    pub relational_database_blueprint_id: Option<String>,
    pub relational_database_bundle_id: Option<String>,
    pub availability_zone: Option<String>,
    pub master_database_name: Option<String>,
    pub master_username: Option<String>,
    /// Only sent on create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_user_password: Option<String>,
    pub publicly_accessible: Option<bool>,
    pub backup_retention_enabled: Option<bool>,
    pub preferred_backup_window: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub ca_certificate_identifier: Option<String>,
    pub rotate_master_user_password: Option<bool>,
    pub tags: Option<Vec<Tag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl DatabaseModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            relational_database_name: name.into(),
            ..Default::default()
        }
    }
}

/// Whether `desired` needs an UpdateRelationalDatabase call against `current`.
///
/// Password rotation is requested only by `rotate_master_user_password: true`;
/// an explicit `false` asks for nothing.
pub fn is_update_required(desired: &DatabaseModel, current: &DatabaseModel) -> bool {
    differs(&desired.publicly_accessible, &current.publicly_accessible)
        || differs(
            &desired.backup_retention_enabled,
            &current.backup_retention_enabled,
        )
        || differs(
            &desired.preferred_backup_window,
            &current.preferred_backup_window,
        )
        || differs(
            &desired.preferred_maintenance_window,
            &current.preferred_maintenance_window,
        )
        || differs(
            &desired.ca_certificate_identifier,
            &current.ca_certificate_identifier,
        )
        || desired.rotate_master_user_password == Some(true)
}

pub struct DatabaseAdapter {
    client: Arc<dyn ControlPlane>,
}

impl DatabaseAdapter {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceAdapter for DatabaseAdapter {
    type Model = DatabaseModel;

    fn type_name(&self) -> &str {
        "database"
    }

    fn identifier(&self, model: &DatabaseModel) -> String {
        model.relational_database_name.clone()
    }

    async fn create(&self, model: &DatabaseModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "CreateRelationalDatabase",
                &json!({
                    "relationalDatabaseName": model.relational_database_name,
                    "relationalDatabaseBlueprintId": model.relational_database_blueprint_id,
                    "relationalDatabaseBundleId": model.relational_database_bundle_id,
                    "availabilityZone": model.availability_zone,
                    "masterDatabaseName": model.master_database_name,
                    "masterUsername": model.master_username,
                    "masterUserPassword": model.master_user_password,
                    "publiclyAccessible": model.publicly_accessible,
                    "preferredBackupWindow": model.preferred_backup_window,
                    "preferredMaintenanceWindow": model.preferred_maintenance_window,
                    "tags": model.tags.as_deref().unwrap_or_default(),
                }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn read(&self, model: &DatabaseModel) -> Result<DatabaseModel> {
        fetch_one(
            &*self.client,
            "GetRelationalDatabase",
            json!({ "relationalDatabaseName": model.relational_database_name }),
            "relationalDatabase",
            &model.relational_database_name,
        )
        .await
    }

    async fn update(&self, desired: &DatabaseModel) -> Result<Option<Vec<Operation>>> {
        let current = self.read(desired).await?;
        let mut mutations = Mutations::new();

        if is_update_required(desired, &current) {
            let mut request = json!({
                "relationalDatabaseName": desired.relational_database_name,
                "publiclyAccessible": desired.publicly_accessible,
                "enableBackupRetention": desired.backup_retention_enabled,
                "preferredBackupWindow": desired.preferred_backup_window,
                "preferredMaintenanceWindow": desired.preferred_maintenance_window,
                "caCertificateIdentifier": desired.ca_certificate_identifier,
            });
            if desired.rotate_master_user_password == Some(true) {
                request["rotateMasterUserPassword"] = json!(true);
            }
            mutations
                .issue(&*self.client, "UpdateRelationalDatabase", &request)
                .await?;
        } else {
            tracing::debug!(
                "{} already matches desired settings",
                desired.relational_database_name
            );
        }

        if let Some(tags) = &desired.tags {
            sync_tags(
                &*self.client,
                &mut mutations,
                &desired.relational_database_name,
                tags,
                current.tags.as_deref().unwrap_or_default(),
            )
            .await?;
        }

        Ok(mutations.into_update_result())
    }

    async fn delete(&self, model: &DatabaseModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "DeleteRelationalDatabase",
                &json!({
                    "relationalDatabaseName": model.relational_database_name,
                    "skipFinalSnapshot": true,
                }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn list(&self, _model: &DatabaseModel) -> Result<Vec<DatabaseModel>> {
        paginate(&*self.client, "GetRelationalDatabases", "relationalDatabases").await
    }

    fn is_ready(&self, observed: &DatabaseModel) -> bool {
        observed.state.as_deref() == Some(READY_STATE)
    }

    fn requires_settling(&self, op: OperationKind) -> bool {
        matches!(op, OperationKind::Create | OperationKind::Update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockControlPlane;

    fn current() -> DatabaseModel {
        DatabaseModel {
            publicly_accessible: Some(true),
            backup_retention_enabled: Some(true),
            preferred_backup_window: Some("16:00-16:30".to_string()),
            state: Some("available".to_string()),
            ..DatabaseModel::new("orders")
        }
    }

    #[test]
    fn test_update_not_required_when_equal() {
        let desired = DatabaseModel {
            publicly_accessible: Some(true),
            backup_retention_enabled: Some(true),
            ..DatabaseModel::new("orders")
        };
        assert!(!is_update_required(&desired, &current()));
    }

    #[test]
    fn test_rotate_password_gates_on_true_only() {
        let mut desired = DatabaseModel::new("orders");

        desired.rotate_master_user_password = Some(false);
        assert!(!is_update_required(&desired, &current()));

        desired.rotate_master_user_password = Some(true);
        assert!(is_update_required(&desired, &current()));
    }

    #[test]
    fn test_changed_window_requires_update() {
        let desired = DatabaseModel {
            preferred_backup_window: Some("03:00-03:30".to_string()),
            ..DatabaseModel::new("orders")
        };
        assert!(is_update_required(&desired, &current()));
    }

    #[tokio::test]
    async fn test_update_sends_rotation_flag() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond(
            "GetRelationalDatabase",
            json!({ "relationalDatabase": { "relationalDatabaseName": "orders" } }),
        );

        let desired = DatabaseModel {
            rotate_master_user_password: Some(true),
            ..DatabaseModel::new("orders")
        };
        let adapter = DatabaseAdapter::new(mock.clone());
        adapter.update(&desired).await.unwrap();

        let calls = mock.calls_to("UpdateRelationalDatabase");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["rotateMasterUserPassword"], true);
    }

    #[test]
    fn test_settling_applies_to_create_and_update() {
        let adapter = DatabaseAdapter::new(Arc::new(MockControlPlane::new()));
        assert!(adapter.requires_settling(OperationKind::Create));
        assert!(adapter.requires_settling(OperationKind::Update));
        assert!(!adapter.requires_settling(OperationKind::Delete));
    }
}
