//! TLS certificate adapter

use super::differs;
use crate::client::{ControlPlane, Mutations, fetch_one, paginate};
use crate::tagging::{Tag, sync_tags};
use async_trait::async_trait;
use sailyard_cloud::{CloudError, Operation, ResourceAdapter, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateModel {
    pub certificate_name: String,
    pub domain_name: Option<String>,
    pub subject_alternative_names: Option<Vec<String>>,
    pub tags: Option<Vec<Tag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

impl CertificateModel {
    pub fn new(certificate_name: impl Into<String>, domain_name: impl Into<String>) -> Self {
        Self {
            certificate_name: certificate_name.into(),
            domain_name: Some(domain_name.into()),
            ..Default::default()
        }
    }
}

pub struct CertificateAdapter {
    client: Arc<dyn ControlPlane>,
}

impl CertificateAdapter {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceAdapter for CertificateAdapter {
    type Model = CertificateModel;

    fn type_name(&self) -> &str {
        "certificate"
    }

    fn identifier(&self, model: &CertificateModel) -> String {
        model.certificate_name.clone()
    }

    async fn create(&self, model: &CertificateModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "CreateCertificate",
                &json!({
                    "certificateName": model.certificate_name,
                    "domainName": model.domain_name,
                    "subjectAlternativeNames": model.subject_alternative_names,
                    "tags": model.tags.as_deref().unwrap_or_default(),
                }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn read(&self, model: &CertificateModel) -> Result<CertificateModel> {
        fetch_one(
            &*self.client,
            "GetCertificates",
            json!({ "certificateName": model.certificate_name }),
            "certificates",
            &model.certificate_name,
        )
        .await
    }

    /// Only tags can change after issuance
    async fn update(&self, desired: &CertificateModel) -> Result<Option<Vec<Operation>>> {
        let current = self.read(desired).await?;
        if differs(&desired.domain_name, &current.domain_name)
            || differs(
                &desired.subject_alternative_names,
                &current.subject_alternative_names,
            )
        {
            return Err(CloudError::InvalidInput(format!(
                "certificate {} cannot change its domain names",
                desired.certificate_name
            )));
        }

        let mut mutations = Mutations::new();
        if let Some(tags) = &desired.tags {
            sync_tags(
                &*self.client,
                &mut mutations,
                &desired.certificate_name,
                tags,
                current.tags.as_deref().unwrap_or_default(),
            )
            .await?;
        }
        Ok(mutations.into_update_result())
    }

    async fn delete(&self, model: &CertificateModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "DeleteCertificate",
                &json!({ "certificateName": model.certificate_name }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn list(&self, _model: &CertificateModel) -> Result<Vec<CertificateModel>> {
        paginate(&*self.client, "GetCertificates", "certificates").await
    }

    /// A certificate is usable once requested; validation happens out of band
    fn is_ready(&self, observed: &CertificateModel) -> bool {
        matches!(
            observed.status.as_deref(),
            Some("PENDING_VALIDATION") | Some("ISSUED")
        )
    }
}
