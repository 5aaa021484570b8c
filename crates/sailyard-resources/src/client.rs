//! Remote control-plane client abstraction
//!
//! Every adapter talks to the control plane through [`ControlPlane::call`]:
//! one named action, one JSON request, one JSON response or a classified
//! [`CloudError`]. The typed helpers in this module do the (de)serialization.

use async_trait::async_trait;
use sailyard_cloud::{CloudError, Operation, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Issues a single request against the remote control plane
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Invoke `action` with a JSON request body
    async fn call(&self, action: &str, request: Value) -> Result<Value>;
}

#[async_trait]
impl<T: ControlPlane + ?Sized> ControlPlane for Arc<T> {
    async fn call(&self, action: &str, request: Value) -> Result<Value> {
        (**self).call(action, request).await
    }
}

/// Typed request/response round trip
pub async fn invoke<Req, Resp>(client: &dyn ControlPlane, action: &str, request: &Req) -> Result<Resp>
where
    Req: Serialize + ?Sized + Sync,
    Resp: DeserializeOwned,
{
    let request = serde_json::to_value(request)?;
    let response = client.call(action, request).await?;
    let response = if response.is_null() {
        Value::Object(Default::default())
    } else {
        response
    };
    Ok(serde_json::from_value(response)?)
}

/// Fetch one resource. `field` may hold either the object itself or an
/// array whose first element is the resource; anything else is NotFound.
pub async fn fetch_one<T: DeserializeOwned>(
    client: &dyn ControlPlane,
    action: &str,
    request: Value,
    field: &str,
    name: &str,
) -> Result<T> {
    let mut response = client.call(action, request).await?;
    let item = match response.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => items.into_iter().next(),
        Some(Value::Null) | None => None,
        Some(item) => Some(item),
    };

    match item {
        Some(item) => Ok(serde_json::from_value(item)?),
        None => Err(CloudError::ResourceNotFound(format!(
            "{} returned no resource named {}",
            action, name
        ))),
    }
}

/// List every item of `field`, following `nextPageToken`
pub async fn paginate<T: DeserializeOwned>(
    client: &dyn ControlPlane,
    action: &str,
    field: &str,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let request = match &page_token {
            Some(token) => serde_json::json!({ "pageToken": token }),
            None => serde_json::json!({}),
        };
        let mut response = client.call(action, request).await?;

        if let Some(Value::Array(page)) = response.get_mut(field).map(Value::take) {
            for item in page {
                items.push(serde_json::from_value(item)?);
            }
        }

        page_token = response
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        if page_token.is_none() {
            break;
        }
    }

    Ok(items)
}

#[derive(Debug, Default, serde::Deserialize)]
struct OperationsResponse {
    #[serde(default)]
    operations: Vec<Operation>,
    #[serde(default)]
    operation: Option<Operation>,
}

/// Accumulates the mutating calls issued by one adapter method
#[derive(Debug, Default)]
pub struct Mutations {
    operations: Vec<Operation>,
    calls: usize,
}

impl Mutations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue one mutating call and keep its operation receipts
    pub async fn issue<Req>(
        &mut self,
        client: &dyn ControlPlane,
        action: &str,
        request: &Req,
    ) -> Result<()>
    where
        Req: Serialize + ?Sized + Sync,
    {
        tracing::info!("Calling {}", action);
        let response: OperationsResponse = invoke(client, action, request).await?;
        self.calls += 1;
        self.operations.extend(response.operations);
        self.operations.extend(response.operation);
        Ok(())
    }

    /// Number of mutating calls issued so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn is_empty(&self) -> bool {
        self.calls == 0
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// `None` when no mutating call was needed
    pub fn into_update_result(self) -> Option<Vec<Operation>> {
        if self.is_empty() {
            None
        } else {
            Some(self.operations)
        }
    }
}
