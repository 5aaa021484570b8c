//! Tag synchronisation shared by taggable resources

use crate::client::{ControlPlane, Mutations};
use sailyard_cloud::{Result, set_difference};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Resource tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// Converge the tags of `resource_name` from `current` to `desired`.
///
/// New and changed tags go out in one `TagResource` call; keys that
/// disappeared go out in one `UntagResource` call.
pub async fn sync_tags(
    client: &dyn ControlPlane,
    mutations: &mut Mutations,
    resource_name: &str,
    desired: &[Tag],
    current: &[Tag],
) -> Result<()> {
    let changed = set_difference(Some(desired), Some(current), |t: &Tag| t.clone());
    let removed = set_difference(Some(desired), Some(current), |t: &Tag| t.key.clone());

    if !removed.to_remove.is_empty() {
        let keys: Vec<&str> = removed.to_remove.iter().map(|t| t.key.as_str()).collect();
        tracing::debug!("Removing tags {:?} from {}", keys, resource_name);
        mutations
            .issue(
                client,
                "UntagResource",
                &json!({ "resourceName": resource_name, "tagKeys": keys }),
            )
            .await?;
    }

    if !changed.to_add.is_empty() {
        tracing::debug!("Applying {} tag(s) to {}", changed.to_add.len(), resource_name);
        mutations
            .issue(
                client,
                "TagResource",
                &json!({ "resourceName": resource_name, "tags": changed.to_add }),
            )
            .await?;
    }

    Ok(())
}
