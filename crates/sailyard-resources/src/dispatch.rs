//! Dynamic dispatch over resource kinds
//!
//! Callers that only know the resource type at runtime (the CLI, a
//! persisted pending operation) pass the model as JSON and get the event
//! back as JSON.

use crate::client::ControlPlane;
use crate::resources::{
    AlarmAdapter, BucketAdapter, CertificateAdapter, DatabaseAdapter, DiskAdapter,
    DistributionAdapter, LoadBalancerAdapter, StaticIpAdapter,
};
use sailyard_cloud::{
    CallbackContext, CloudError, FaultKind, OperationKind, ProgressEvent, ReconciliationEngine,
    ResourceAdapter, RetryConfig,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Supported resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Alarm,
    Bucket,
    Certificate,
    Database,
    Disk,
    Distribution,
    LoadBalancer,
    StaticIp,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Alarm,
        ResourceKind::Bucket,
        ResourceKind::Certificate,
        ResourceKind::Database,
        ResourceKind::Disk,
        ResourceKind::Distribution,
        ResourceKind::LoadBalancer,
        ResourceKind::StaticIp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Alarm => "alarm",
            ResourceKind::Bucket => "bucket",
            ResourceKind::Certificate => "certificate",
            ResourceKind::Database => "database",
            ResourceKind::Disk => "disk",
            ResourceKind::Distribution => "distribution",
            ResourceKind::LoadBalancer => "load-balancer",
            ResourceKind::StaticIp => "static-ip",
        }
    }

    /// JSON field holding the primary identifier
    pub fn identifier_field(&self) -> &'static str {
        match self {
            ResourceKind::Alarm => "alarmName",
            ResourceKind::Bucket => "bucketName",
            ResourceKind::Certificate => "certificateName",
            ResourceKind::Database => "relationalDatabaseName",
            ResourceKind::Disk => "diskName",
            ResourceKind::Distribution => "distributionName",
            ResourceKind::LoadBalancer => "loadBalancerName",
            ResourceKind::StaticIp => "staticIpName",
        }
    }

    /// Primary identifier of a JSON model
    pub fn identifier(&self, model: &Value) -> Option<String> {
        model
            .get(self.identifier_field())
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CloudError::InvalidInput(format!("unknown resource type: {}", s)))
    }
}

/// Run one tick for a JSON model of `kind`
pub async fn tick(
    kind: ResourceKind,
    client: Arc<dyn ControlPlane>,
    retry: &RetryConfig,
    op: OperationKind,
    model: Value,
    context: CallbackContext,
) -> ProgressEvent<Value> {
    match kind {
        ResourceKind::Alarm => run(AlarmAdapter::new(client), retry, op, model, context).await,
        ResourceKind::Bucket => run(BucketAdapter::new(client), retry, op, model, context).await,
        ResourceKind::Certificate => {
            run(CertificateAdapter::new(client), retry, op, model, context).await
        }
        ResourceKind::Database => {
            run(DatabaseAdapter::new(client), retry, op, model, context).await
        }
        ResourceKind::Disk => run(DiskAdapter::new(client), retry, op, model, context).await,
        ResourceKind::Distribution => {
            run(DistributionAdapter::new(client), retry, op, model, context).await
        }
        ResourceKind::LoadBalancer => {
            run(LoadBalancerAdapter::new(client), retry, op, model, context).await
        }
        ResourceKind::StaticIp => {
            run(StaticIpAdapter::new(client), retry, op, model, context).await
        }
    }
}

async fn run<A>(
    adapter: A,
    retry: &RetryConfig,
    op: OperationKind,
    model: Value,
    context: CallbackContext,
) -> ProgressEvent<Value>
where
    A: ResourceAdapter,
    A::Model: Serialize + DeserializeOwned,
{
    let model: A::Model = match serde_json::from_value(model) {
        Ok(model) => model,
        Err(e) => {
            return ProgressEvent::failed(
                FaultKind::InvalidInput,
                format!("invalid {} model: {}", adapter.type_name(), e),
            );
        }
    };

    let engine = ReconciliationEngine::new(adapter).with_retry(retry.clone());
    to_json_event(engine.tick(op, model, context).await)
}

/// JSON form of an event; a model that cannot be serialized fails the tick
fn to_json_event<M: Serialize>(event: ProgressEvent<M>) -> ProgressEvent<Value> {
    let mut fault = None;
    let converted = event.map_model(|model| match serde_json::to_value(model) {
        Ok(value) => value,
        Err(e) => {
            fault.get_or_insert_with(|| e.to_string());
            Value::Null
        }
    });

    match fault {
        Some(message) => ProgressEvent::failed(
            FaultKind::Unclassified,
            format!("failed to serialize model: {}", message),
        ),
        None => converted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockControlPlane;
    use serde_json::json;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("vpc".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_identifier_from_json() {
        let model = json!({ "staticIpName": "front-ip" });
        assert_eq!(
            ResourceKind::StaticIp.identifier(&model).as_deref(),
            Some("front-ip")
        );
        assert_eq!(ResourceKind::Disk.identifier(&model), None);
    }

    #[tokio::test]
    async fn test_invalid_model_fails_without_calls() {
        let mock = Arc::new(MockControlPlane::new());
        let event = tick(
            ResourceKind::Disk,
            mock.clone(),
            &RetryConfig::default(),
            OperationKind::Create,
            json!({ "diskName": 42 }),
            CallbackContext::new(),
        )
        .await;

        assert_eq!(event.error_code(), Some(FaultKind::InvalidInput));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_unserializable_model_fails_the_tick() {
        let mut model = std::collections::BTreeMap::new();
        model.insert(vec![1u8], 1u8);

        let event = to_json_event(ProgressEvent::success(model));
        assert_eq!(event.error_code(), Some(FaultKind::Unclassified));
    }

    #[tokio::test]
    async fn test_read_returns_json_model() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond(
            "GetStaticIp",
            json!({ "staticIp": { "staticIpName": "front-ip", "ipAddress": "203.0.113.7" } }),
        );

        let event = tick(
            ResourceKind::StaticIp,
            mock,
            &RetryConfig::default(),
            OperationKind::Read,
            json!({ "staticIpName": "front-ip" }),
            CallbackContext::new(),
        )
        .await;

        match event {
            ProgressEvent::Success { model: Some(model), .. } => {
                assert_eq!(model["ipAddress"], "203.0.113.7");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
