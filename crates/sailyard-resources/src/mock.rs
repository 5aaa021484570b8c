//! In-memory control plane for tests and dry runs.
//!
//! Responses are scripted per action. A scripted queue is consumed in
//! order and its last entry keeps answering once the queue is drained, so
//! repeated polling reads see a stable state. Unscripted actions answer
//! with an empty object, which reads interpret as NotFound.

use crate::client::ControlPlane;
use async_trait::async_trait;
use sailyard_cloud::{CloudError, FaultKind, Result};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Reply(Value),
    Fault(FaultKind, String),
}

impl Scripted {
    fn answer(&self) -> Result<Value> {
        match self {
            Scripted::Reply(value) => Ok(value.clone()),
            Scripted::Fault(kind, message) => Err(CloudError::from_kind(*kind, message.clone())),
        }
    }
}

/// A request received by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub action: String,
    pub request: Value,
}

/// Scripted control plane that records every call
#[derive(Debug, Default)]
pub struct MockControlPlane {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, action: &str, scripted: Scripted) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts
                .entry(action.to_string())
                .or_default()
                .push_back(scripted);
        }
    }

    /// Queue a successful response for `action`
    pub fn respond(&self, action: &str, response: Value) -> &Self {
        self.push(action, Scripted::Reply(response));
        self
    }

    /// Queue several successful responses, answered in order
    pub fn respond_sequence(&self, action: &str, responses: Vec<Value>) -> &Self {
        for response in responses {
            self.push(action, Scripted::Reply(response));
        }
        self
    }

    /// Queue a fault for `action`
    pub fn fail(&self, action: &str, kind: FaultKind, message: &str) -> &Self {
        self.push(action, Scripted::Fault(kind, message.to_string()));
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Action names received so far, in order
    pub fn actions(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.action).collect()
    }

    /// Request bodies received for `action`
    pub fn calls_to(&self, action: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|c| c.action == action)
            .map(|c| c.request)
            .collect()
    }

    pub fn count(&self, action: &str) -> usize {
        self.calls().iter().filter(|c| c.action == action).count()
    }

    /// Calls other than reads (`Get*`)
    pub fn mutating_actions(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter(|a| !a.starts_with("Get"))
            .collect()
    }

    fn next_answer(&self, action: &str) -> Result<Value> {
        let mut scripts = self
            .scripts
            .lock()
            .map_err(|e| CloudError::Unclassified(e.to_string()))?;

        match scripts.get_mut(action) {
            Some(queue) if queue.len() > 1 => match queue.pop_front() {
                Some(scripted) => scripted.answer(),
                None => Ok(Value::Object(Default::default())),
            },
            Some(queue) => match queue.front() {
                Some(scripted) => scripted.answer(),
                None => Ok(Value::Object(Default::default())),
            },
            None => Ok(Value::Object(Default::default())),
        }
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn call(&self, action: &str, request: Value) -> Result<Value> {
        tracing::debug!("MockControlPlane: {} {}", action, request);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                action: action.to_string(),
                request,
            });
        }
        self.next_answer(action)
    }
}
