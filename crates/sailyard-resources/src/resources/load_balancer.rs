//! Load balancer adapter

use super::differs;
use crate::client::{ControlPlane, Mutations, fetch_one, paginate};
use crate::tagging::{Tag, sync_tags};
use async_trait::async_trait;
use sailyard_cloud::{Operation, ResourceAdapter, Result, set_difference};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const READY_STATE: &str = "active";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancerModel {
    pub load_balancer_name: String,
    pub instance_port: Option<u16>,
    pub health_check_path: Option<String>,
    pub attached_instances: Option<Vec<String>>,
    pub session_stickiness_enabled: Option<bool>,
    pub tls_policy_name: Option<String>,
    pub https_redirection_enabled: Option<bool>,
    pub tags: Option<Vec<Tag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

impl LoadBalancerModel {
    pub fn new(load_balancer_name: impl Into<String>) -> Self {
        Self {
            load_balancer_name: load_balancer_name.into(),
            ..Default::default()
        }
    }

    /// Attribute name/value pairs that differ from `current`
    fn changed_attributes(&self, current: &LoadBalancerModel) -> Vec<(&'static str, String)> {
        let mut changed = Vec::new();
        if differs(&self.health_check_path, &current.health_check_path) {
            if let Some(path) = &self.health_check_path {
                changed.push(("HealthCheckPath", path.clone()));
            }
        }
        if differs(
            &self.session_stickiness_enabled,
            &current.session_stickiness_enabled,
        ) {
            if let Some(enabled) = self.session_stickiness_enabled {
                changed.push(("SessionStickinessEnabled", enabled.to_string()));
            }
        }
        if differs(&self.tls_policy_name, &current.tls_policy_name) {
            if let Some(policy) = &self.tls_policy_name {
                changed.push(("TlsPolicyName", policy.clone()));
            }
        }
        if differs(
            &self.https_redirection_enabled,
            &current.https_redirection_enabled,
        ) {
            if let Some(enabled) = self.https_redirection_enabled {
                changed.push(("HttpsRedirectionEnabled", enabled.to_string()));
            }
        }
        changed
    }
}

pub struct LoadBalancerAdapter {
    client: Arc<dyn ControlPlane>,
}

impl LoadBalancerAdapter {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceAdapter for LoadBalancerAdapter {
    type Model = LoadBalancerModel;

    fn type_name(&self) -> &str {
        "load-balancer"
    }

    fn identifier(&self, model: &LoadBalancerModel) -> String {
        model.load_balancer_name.clone()
    }

    /// Instances are attached by a later update once the balancer is active
    async fn create(&self, model: &LoadBalancerModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "CreateLoadBalancer",
                &json!({
                    "loadBalancerName": model.load_balancer_name,
                    "instancePort": model.instance_port,
                    "healthCheckPath": model.health_check_path,
                    "tlsPolicyName": model.tls_policy_name,
                    "tags": model.tags.as_deref().unwrap_or_default(),
                }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn read(&self, model: &LoadBalancerModel) -> Result<LoadBalancerModel> {
        fetch_one(
            &*self.client,
            "GetLoadBalancer",
            json!({ "loadBalancerName": model.load_balancer_name }),
            "loadBalancer",
            &model.load_balancer_name,
        )
        .await
    }

    async fn update(&self, desired: &LoadBalancerModel) -> Result<Option<Vec<Operation>>> {
        let current = self.read(desired).await?;
        let mut mutations = Mutations::new();
        let name = &desired.load_balancer_name;

        for (attribute, value) in desired.changed_attributes(&current) {
            mutations
                .issue(
                    &*self.client,
                    "UpdateLoadBalancerAttribute",
                    &json!({
                        "loadBalancerName": name,
                        "attributeName": attribute,
                        "attributeValue": value,
                    }),
                )
                .await?;
        }

        if let Some(instances) = &desired.attached_instances {
            let diff = set_difference(
                Some(instances.as_slice()),
                current.attached_instances.as_deref(),
                |instance: &String| instance.clone(),
            );
            for instance in &diff.to_remove {
                mutations
                    .issue(
                        &*self.client,
                        "DetachInstancesFromLoadBalancer",
                        &json!({ "loadBalancerName": name, "instanceNames": [instance] }),
                    )
                    .await?;
            }
            for instance in &diff.to_add {
                mutations
                    .issue(
                        &*self.client,
                        "AttachInstancesToLoadBalancer",
                        &json!({ "loadBalancerName": name, "instanceNames": [instance] }),
                    )
                    .await?;
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

    async fn delete(&self, model: &LoadBalancerModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "DeleteLoadBalancer",
                &json!({ "loadBalancerName": model.load_balancer_name }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn list(&self, _model: &LoadBalancerModel) -> Result<Vec<LoadBalancerModel>> {
        paginate(&*self.client, "GetLoadBalancers", "loadBalancers").await
    }

    fn is_ready(&self, observed: &LoadBalancerModel) -> bool {
        observed.state.as_deref() == Some(READY_STATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockControlPlane;

    fn observed() -> serde_json::Value {
        json!({ "loadBalancer": {
            "loadBalancerName": "front",
            "healthCheckPath": "/",
            "attachedInstances": ["web-1", "web-2"],
            "state": "active"
        } })
    }

    #[tokio::test]
    async fn test_one_call_per_differing_instance() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond("GetLoadBalancer", observed());

        let desired = LoadBalancerModel {
            attached_instances: Some(vec![
                "web-2".to_string(),
                "web-3".to_string(),
                "web-4".to_string(),
            ]),
            ..LoadBalancerModel::new("front")
        };
        let adapter = LoadBalancerAdapter::new(mock.clone());
        adapter.update(&desired).await.unwrap();

        assert_eq!(mock.count("DetachInstancesFromLoadBalancer"), 1);
        assert_eq!(mock.count("AttachInstancesToLoadBalancer"), 2);
        assert_eq!(
            mock.calls_to("DetachInstancesFromLoadBalancer")[0]["instanceNames"],
            json!(["web-1"])
        );
    }

    #[tokio::test]
    async fn test_attribute_update() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond("GetLoadBalancer", observed());

        let desired = LoadBalancerModel {
            health_check_path: Some("/healthz".to_string()),
            session_stickiness_enabled: Some(true),
            ..LoadBalancerModel::new("front")
        };
        let adapter = LoadBalancerAdapter::new(mock.clone());
        adapter.update(&desired).await.unwrap();

        let calls = mock.calls_to("UpdateLoadBalancerAttribute");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0]["attributeName"], "HealthCheckPath");
        assert_eq!(calls[0]["attributeValue"], "/healthz");
        assert_eq!(calls[1]["attributeValue"], "true");
    }

    #[tokio::test]
    async fn test_unchanged_balancer_is_noop() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond("GetLoadBalancer", observed());

        let desired = LoadBalancerModel {
            health_check_path: Some("/".to_string()),
            attached_instances: Some(vec!["web-1".to_string(), "web-2".to_string()]),
            ..LoadBalancerModel::new("front")
        };
        let adapter = LoadBalancerAdapter::new(mock.clone());
        assert!(adapter.update(&desired).await.unwrap().is_none());
    }
}
