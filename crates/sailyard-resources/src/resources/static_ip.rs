//! Static IP adapter

use crate::client::{ControlPlane, Mutations, fetch_one, paginate};
use async_trait::async_trait;
use sailyard_cloud::{Operation, ResourceAdapter, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticIpModel {
    pub static_ip_name: String,
    /// Instance the address is attached to; `None` means unattached
    pub attached_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl StaticIpModel {
    pub fn new(static_ip_name: impl Into<String>) -> Self {
        Self {
            static_ip_name: static_ip_name.into(),
            ..Default::default()
        }
    }
}

pub struct StaticIpAdapter {
    client: Arc<dyn ControlPlane>,
}

impl StaticIpAdapter {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    async fn attach(&self, mutations: &mut Mutations, name: &str, instance: &str) -> Result<()> {
        mutations
            .issue(
                &*self.client,
                "AttachStaticIp",
                &json!({ "staticIpName": name, "instanceName": instance }),
            )
            .await
    }
}

#[async_trait]
impl ResourceAdapter for StaticIpAdapter {
    type Model = StaticIpModel;

    fn type_name(&self) -> &str {
        "static-ip"
    }

    fn identifier(&self, model: &StaticIpModel) -> String {
        model.static_ip_name.clone()
    }

    /// Allocates the address only; `attached_to` converges through update
    async fn create(&self, model: &StaticIpModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "AllocateStaticIp",
                &json!({ "staticIpName": model.static_ip_name }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn read(&self, model: &StaticIpModel) -> Result<StaticIpModel> {
        fetch_one(
            &*self.client,
            "GetStaticIp",
            json!({ "staticIpName": model.static_ip_name }),
            "staticIp",
            &model.static_ip_name,
        )
        .await
    }

    /// Detach before attach when moving to another instance
    async fn update(&self, desired: &StaticIpModel) -> Result<Option<Vec<Operation>>> {
        let current = self.read(desired).await?;
        let mut mutations = Mutations::new();

        if desired.attached_to != current.attached_to {
            if current.attached_to.is_some() {
                mutations
                    .issue(
                        &*self.client,
                        "DetachStaticIp",
                        &json!({ "staticIpName": desired.static_ip_name }),
                    )
                    .await?;
            }
            if let Some(instance) = &desired.attached_to {
                self.attach(&mut mutations, &desired.static_ip_name, instance)
                    .await?;
            }
        }

        Ok(mutations.into_update_result())
    }

    async fn delete(&self, model: &StaticIpModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "ReleaseStaticIp",
                &json!({ "staticIpName": model.static_ip_name }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn list(&self, _model: &StaticIpModel) -> Result<Vec<StaticIpModel>> {
        paginate(&*self.client, "GetStaticIps", "staticIps").await
    }

    async fn is_stabilized_update(&self, model: &StaticIpModel) -> Result<bool> {
        let observed = self.read(model).await?;
        Ok(observed.attached_to == model.attached_to)
    }
}
