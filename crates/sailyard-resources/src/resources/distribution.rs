//! Content delivery distribution adapter

use super::differs;
use crate::client::{ControlPlane, Mutations, fetch_one, paginate};
use crate::tagging::{Tag, sync_tags};
use async_trait::async_trait;
use sailyard_cloud::{Operation, ResourceAdapter, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::sync::Arc;

const READY_STATUS: &str = "Deployed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DistributionModel {
    pub distribution_name: String,
    pub bundle_id: Option<String>,
    pub origin: Option<Origin>,
    pub default_cache_behavior: Option<CacheBehavior>,
    pub is_enabled: Option<bool>,
    /// Absent leaves the certificate alone, `null` detaches it
    #[serde(
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_name: Option<Option<String>>,
    pub tags: Option<Vec<Tag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
}

/// Keeps an explicit `null` apart from an absent field
fn explicit_null<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub name: String,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub protocol_policy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheBehavior {
    /// `cache` or `dont-cache`
    pub behavior: String,
}

impl DistributionModel {
    pub fn new(distribution_name: impl Into<String>) -> Self {
        Self {
            distribution_name: distribution_name.into(),
            ..Default::default()
        }
    }
}

pub struct DistributionAdapter {
    client: Arc<dyn ControlPlane>,
}

impl DistributionAdapter {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceAdapter for DistributionAdapter {
    type Model = DistributionModel;

    fn type_name(&self) -> &str {
        "distribution"
    }

    fn identifier(&self, model: &DistributionModel) -> String {
        model.distribution_name.clone()
    }

    async fn create(&self, model: &DistributionModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "CreateDistribution",
                &json!({
                    "distributionName": model.distribution_name,
                    "bundleId": model.bundle_id,
                    "origin": model.origin,
                    "defaultCacheBehavior": model.default_cache_behavior,
                    "certificateName": model.certificate_name.clone().flatten(),
                    "tags": model.tags.as_deref().unwrap_or_default(),
                }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn read(&self, model: &DistributionModel) -> Result<DistributionModel> {
        fetch_one(
            &*self.client,
            "GetDistributions",
            json!({ "distributionName": model.distribution_name }),
            "distributions",
            &model.distribution_name,
        )
        .await
    }

    async fn update(&self, desired: &DistributionModel) -> Result<Option<Vec<Operation>>> {
        let current = self.read(desired).await?;
        let mut mutations = Mutations::new();
        let name = &desired.distribution_name;

        if differs(&desired.bundle_id, &current.bundle_id) {
            mutations
                .issue(
                    &*self.client,
                    "UpdateDistributionBundle",
                    &json!({ "distributionName": name, "bundleId": desired.bundle_id }),
                )
                .await?;
        }

        if differs(&desired.origin, &current.origin)
            || differs(&desired.default_cache_behavior, &current.default_cache_behavior)
            || differs(&desired.is_enabled, &current.is_enabled)
        {
            mutations
                .issue(
                    &*self.client,
                    "UpdateDistribution",
                    &json!({
                        "distributionName": name,
                        "origin": desired.origin,
                        "defaultCacheBehavior": desired.default_cache_behavior,
                        "isEnabled": desired.is_enabled,
                    }),
                )
                .await?;
        }

        if let Some(wanted) = &desired.certificate_name {
            let held = current.certificate_name.clone().flatten();
            if *wanted != held {
                if held.is_some() {
                    mutations
                        .issue(
                            &*self.client,
                            "DetachCertificateFromDistribution",
                            &json!({ "distributionName": name }),
                        )
                        .await?;
                }
                if let Some(certificate) = wanted {
                    mutations
                        .issue(
                            &*self.client,
                            "AttachCertificateToDistribution",
                            &json!({
                                "distributionName": name,
                                "certificateName": certificate,
                            }),
                        )
                        .await?;
                }
            }
        }

        if let Some(tags) = &desired.tags {
            sync_tags(
                &*self.client,
                &mut mutations,
                name,
                tags,
                current.tags.as_deref().unwrap_or_default(),
            )
            .await?;
        }

        Ok(mutations.into_update_result())
    }

    async fn delete(&self, model: &DistributionModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "DeleteDistribution",
                &json!({ "distributionName": model.distribution_name }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn list(&self, _model: &DistributionModel) -> Result<Vec<DistributionModel>> {
        paginate(&*self.client, "GetDistributions", "distributions").await
    }

    fn is_ready(&self, observed: &DistributionModel) -> bool {
        observed.status.as_deref() == Some(READY_STATUS)
    }
}
