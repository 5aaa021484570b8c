//! Metric alarm adapter

use super::differs;
use crate::client::{ControlPlane, Mutations, fetch_one, paginate};
use async_trait::async_trait;
use sailyard_cloud::{Operation, ResourceAdapter, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Alarm attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlarmModel {
    pub alarm_name: String,
    pub monitored_resource_name: Option<String>,
    pub metric_name: Option<String>,
    pub comparison_operator: Option<String>,
    pub threshold: Option<f64>,
    pub evaluation_periods: Option<u32>,
    pub datapoints_to_alarm: Option<u32>,
    pub treat_missing_data: Option<String>,
    pub contact_protocols: Option<Vec<String>>,
    pub notification_triggers: Option<Vec<String>>,
    pub notification_enabled: Option<bool>,
    /// Observed alarm state (OK, ALARM, INSUFFICIENT_DATA)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

impl AlarmModel {
    pub fn new(alarm_name: impl Into<String>) -> Self {
        Self {
            alarm_name: alarm_name.into(),
            ..Default::default()
        }
    }

    fn differs_from(&self, current: &AlarmModel) -> bool {
        differs(&self.monitored_resource_name, &current.monitored_resource_name)
            || differs(&self.metric_name, &current.metric_name)
            || differs(&self.comparison_operator, &current.comparison_operator)
            || differs(&self.threshold, &current.threshold)
            || differs(&self.evaluation_periods, &current.evaluation_periods)
            || differs(&self.datapoints_to_alarm, &current.datapoints_to_alarm)
            || differs(&self.treat_missing_data, &current.treat_missing_data)
            || differs(&self.contact_protocols, &current.contact_protocols)
            || differs(&self.notification_triggers, &current.notification_triggers)
            || differs(&self.notification_enabled, &current.notification_enabled)
    }

    fn put_request(&self) -> serde_json::Value {
        json!({
            "alarmName": self.alarm_name,
            "monitoredResourceName": self.monitored_resource_name,
            "metricName": self.metric_name,
            "comparisonOperator": self.comparison_operator,
            "threshold": self.threshold,
            "evaluationPeriods": self.evaluation_periods,
            "datapointsToAlarm": self.datapoints_to_alarm,
            "treatMissingData": self.treat_missing_data,
            "contactProtocols": self.contact_protocols,
            "notificationTriggers": self.notification_triggers,
            "notificationEnabled": self.notification_enabled,
        })
    }
}

pub struct AlarmAdapter {
    client: Arc<dyn ControlPlane>,
}

impl AlarmAdapter {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceAdapter for AlarmAdapter {
    type Model = AlarmModel;

    fn type_name(&self) -> &str {
        "alarm"
    }

    fn identifier(&self, model: &AlarmModel) -> String {
        model.alarm_name.clone()
    }

    async fn create(&self, model: &AlarmModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(&*self.client, "PutAlarm", &model.put_request())
            .await?;
        Ok(mutations.into_operations())
    }

    async fn read(&self, model: &AlarmModel) -> Result<AlarmModel> {
        fetch_one(
            &*self.client,
            "GetAlarms",
            json!({ "alarmName": model.alarm_name }),
            "alarms",
            &model.alarm_name,
        )
        .await
    }

    /// PutAlarm is an upsert; it is only sent when an attribute changed
    async fn update(&self, desired: &AlarmModel) -> Result<Option<Vec<Operation>>> {
        let current = self.read(desired).await?;
        let mut mutations = Mutations::new();
        if desired.differs_from(&current) {
            mutations
                .issue(&*self.client, "PutAlarm", &desired.put_request())
                .await?;
        }
        Ok(mutations.into_update_result())
    }

    async fn delete(&self, model: &AlarmModel) -> Result<Vec<Operation>> {
        let mut mutations = Mutations::new();
        mutations
            .issue(
                &*self.client,
                "DeleteAlarm",
                &json!({ "alarmName": model.alarm_name }),
            )
            .await?;
        Ok(mutations.into_operations())
    }

    async fn list(&self, _model: &AlarmModel) -> Result<Vec<AlarmModel>> {
        paginate(&*self.client, "GetAlarms", "alarms").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockControlPlane;

    fn cpu_alarm() -> AlarmModel {
        AlarmModel {
            monitored_resource_name: Some("web-1".to_string()),
            metric_name: Some("CPUUtilization".to_string()),
            threshold: Some(80.0),
            ..AlarmModel::new("web-1-cpu")
        }
    }

    #[tokio::test]
    async fn test_update_skipped_when_unchanged() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond(
            "GetAlarms",
            json!({ "alarms": [{
                "alarmName": "web-1-cpu",
                "monitoredResourceName": "web-1",
                "metricName": "CPUUtilization",
                "threshold": 80.0,
                "evaluationPeriods": 2,
                "state": "OK"
            }] }),
        );

        let adapter = AlarmAdapter::new(mock.clone());
        assert!(adapter.update(&cpu_alarm()).await.unwrap().is_none());
        assert!(mock.mutating_actions().is_empty());
    }

    #[tokio::test]
    async fn test_update_puts_changed_threshold() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond(
            "GetAlarms",
            json!({ "alarms": [{ "alarmName": "web-1-cpu", "threshold": 50.0 }] }),
        );

        let adapter = AlarmAdapter::new(mock.clone());
        assert!(adapter.update(&cpu_alarm()).await.unwrap().is_some());
        assert_eq!(mock.mutating_actions(), vec!["PutAlarm"]);
        assert_eq!(mock.calls_to("PutAlarm")[0]["threshold"], 80.0);
    }

    #[tokio::test]
    async fn test_read_missing_alarm_is_not_found() {
        let mock = Arc::new(MockControlPlane::new());
        mock.respond("GetAlarms", json!({ "alarms": [] }));

        let adapter = AlarmAdapter::new(mock);
        assert!(adapter.read(&cpu_alarm()).await.unwrap_err().is_not_found());
    }
}
