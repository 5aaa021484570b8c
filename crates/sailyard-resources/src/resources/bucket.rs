//! Object storage bucket adapter

use super::differs;
use crate::client::{ControlPlane, Mutations, fetch_one, paginate};
use crate::tagging::{Tag, sync_tags};
use async_trait::async_trait;
use sailyard_cloud::{CloudError, Operation, ResourceAdapter, Result, set_difference};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const READY_STATE: &str = "OK";

/// Bucket attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BucketModel {
    pub bucket_name: String,
    pub bundle_id: Option<String>,
    pub object_versioning: Option<bool>,
    pub access_rules: Option<AccessRules>,
    /// Instances granted access to the bucket
    pub resources_receiving_access: Option<Vec<String>>,
    pub tags: Option<Vec<Tag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub able_to_update_bundle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessRules {
    /// `public` or `private`
    pub get_object: Option<String>,
    pub allow_public_overrides: Option<bool>,
}

impl BucketModel {
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            ..Default::default()
        }
    }
}

pub struct BucketAdapter {
    client: Arc<dyn ControlPlane>,
}

impl BucketAdapter {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    async fn set_access(
        &self,
        mutations: &mut Mutations,
        bucket_name: &str,
        resource_name: &str,
        access: &str,
    ) -> Result<()> {
        mutations
            .issue(
                &*self.client,
                "SetResourceAccessForBucket",
                &json!({
                    "bucketName": bucket_name,
                    "resourceName": resource_name,
                    "access": access,
                }),
            )
            .await
    }
}

#[async_trait]
impl ResourceAdapter for BucketAdapter {
    type Model = BucketModel;

    fn type_name(&self) -> &str {
        "bucket"
    }

    fn identifier(&self, model: &BucketModel) -> String {
        model.bucket_name.clone()
    }

    /// Creates the bucket only. Access rules and resource access converge
    /// through update once the bucket exists.
    async fn create(&self, model: &BucketModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "CreateBucket",
                &json!({
                    "bucketName": model.bucket_name,
                    "bundleId": model.bundle_id,
                    "enableObjectVersioning": model.object_versioning.unwrap_or(false),
                    "tags": model.tags.as_deref().unwrap_or_default(),
                }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn read(&self, model: &BucketModel) -> Result<BucketModel> {
        fetch_one(
            &*self.client,
            "GetBuckets",
            json!({ "bucketName": model.bucket_name, "includeConnectedResources": true }),
            "buckets",
            &model.bucket_name,
        )
        .await
    }

    async fn update(&self, desired: &BucketModel) -> Result<Option<Vec<Operation>>> {
        let current = self.read(desired).await?;
        let mut mutations = Mutations::new();

        if differs(&desired.bundle_id, &current.bundle_id) {
            if current.able_to_update_bundle == Some(false) {
                return Err(CloudError::InvalidInput(format!(
                    "bucket {} can no longer change its bundle",
                    desired.bucket_name
                )));
            }
            mutations
                .issue(
                    &*self.client,
                    "UpdateBucketBundle",
                    &json!({ "bucketName": desired.bucket_name, "bundleId": desired.bundle_id }),
                )
                .await?;
        }

        let versioning_changed = differs(&desired.object_versioning, &current.object_versioning);
        let rules_changed = differs(&desired.access_rules, &current.access_rules);
        if versioning_changed || rules_changed {
            let mut request = json!({ "bucketName": desired.bucket_name });
            if versioning_changed {
                let versioning = match desired.object_versioning {
                    Some(true) => "Enabled",
                    _ => "Suspended",
                };
                request["versioning"] = json!(versioning);
            }
            if rules_changed {
                request["accessRules"] = json!(desired.access_rules);
            }
            mutations
                .issue(&*self.client, "UpdateBucket", &request)
                .await?;
        }

        if let Some(resources) = &desired.resources_receiving_access {
            let diff = set_difference(
                Some(resources.as_slice()),
                current.resources_receiving_access.as_deref(),
                |name: &String| name.clone(),
            );
            for resource in &diff.to_remove {
                self.set_access(&mut mutations, &desired.bucket_name, resource, "deny")
                    .await?;
            }
            for resource in &diff.to_add {
                self.set_access(&mut mutations, &desired.bucket_name, resource, "allow")
                    .await?;
            }
        }

        if let Some(tags) = &desired.tags {
            sync_tags(
                &*self.client,
                &mut mutations,
                &desired.bucket_name,
                tags,
                current.tags.as_deref().unwrap_or_default(),
            )
            .await?;
        }

        Ok(mutations.into_update_result())
    }

    async fn delete(&self, model: &BucketModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "DeleteBucket",
                &json!({ "bucketName": model.bucket_name, "forceDelete": true }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn list(&self, _model: &BucketModel) -> Result<Vec<BucketModel>> {
        paginate(&*self.client, "GetBuckets", "buckets").await
    }

    fn is_ready(&self, observed: &BucketModel) -> bool {
        observed.state_code.as_deref() == Some(READY_STATE)
    }
}
