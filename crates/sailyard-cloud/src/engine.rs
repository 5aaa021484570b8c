//! Reconciliation engine
//!
//! Drives one resource instance through PRE_CHECK → RELEASE → MUTATE →
//! STABILIZE, one tick per invocation. The engine never loops or sleeps:
//! when the resource has not stabilized yet it returns `IN_PROGRESS` with a
//! delay hint and the caller re-invokes it with the returned context.
//! PRE_CHECK, RELEASE and MUTATE record flags in the [`CallbackContext`] so
//! that re-entry only re-runs the stage still waiting.
//!
//! RELEASE is empty for most adapters. When an adapter holds dependents
//! (an attached disk), the mutating call is only issued once the adapter
//! reports them observably free.

use crate::action::OperationKind;
use crate::adapter::ResourceAdapter;
use crate::classifier::{Resolution, Stage, classify};
use crate::context::{
    CallbackContext, mutation_key, pre_check_key, release_issued_key, released_key, settled_key,
};
use crate::error::{CloudError, FaultKind};
use crate::event::ProgressEvent;
use crate::retry::RetryConfig;
use tracing::Instrument;

/// Tick-driven state machine over one [`ResourceAdapter`]
pub struct ReconciliationEngine<A> {
    adapter: A,
    retry: RetryConfig,
}

impl<A: ResourceAdapter> ReconciliationEngine<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Run one tick of `op` for `model`, resuming from `context`
    pub async fn tick(
        &self,
        op: OperationKind,
        model: A::Model,
        context: CallbackContext,
    ) -> ProgressEvent<A::Model> {
        let span = tracing::info_span!(
            "tick",
            resource_type = self.adapter.type_name(),
            id = %self.adapter.identifier(&model),
            operation = %op
        );

        async move {
            let event = match op {
                OperationKind::Read => self.read(model).await,
                OperationKind::List => self.list(model).await,
                OperationKind::Create | OperationKind::Update | OperationKind::Delete => {
                    self.lifecycle(op, model, context).await
                }
            };
            tracing::debug!(
                terminal = event.is_terminal(),
                failed = event.is_failed(),
                "tick finished"
            );
            event
        }
        .instrument(span)
        .await
    }

    async fn read(&self, model: A::Model) -> ProgressEvent<A::Model> {
        match self.adapter.read(&model).await {
            Ok(observed) => ProgressEvent::success(observed),
            Err(e) => self.fail(Stage::PreCheck, &e),
        }
    }

    async fn list(&self, model: A::Model) -> ProgressEvent<A::Model> {
        match self.adapter.list(&model).await {
            Ok(models) => {
                tracing::debug!("listed {} resources", models.len());
                ProgressEvent::listed(models)
            }
            Err(e) => self.fail(Stage::PreCheck, &e),
        }
    }

    async fn lifecycle(
        &self,
        op: OperationKind,
        model: A::Model,
        context: CallbackContext,
    ) -> ProgressEvent<A::Model> {
        let (model, context) = match self.pre_check(op, model, context).await.proceed() {
            Ok(next) => next,
            Err(terminal) => return terminal,
        };
        let released = self.release(op, model, context).await;
        if released.context().is_some_and(|c| !c.released(op)) {
            return released;
        }
        let (model, context) = match released.proceed() {
            Ok(next) => next,
            Err(terminal) => return terminal,
        };
        let (model, context) = match self.mutate(op, model, context).await.proceed() {
            Ok(next) => next,
            Err(terminal) => return terminal,
        };
        self.stabilize(op, model, context).await
    }

    /// Existence guard for create, refresh-and-fail-fast read for update/delete
    pub async fn pre_check(
        &self,
        op: OperationKind,
        model: A::Model,
        mut context: CallbackContext,
    ) -> ProgressEvent<A::Model> {
        if context.pre_check_done(op) {
            tracing::debug!("pre-check already recorded, skipping");
            return ProgressEvent::in_progress(model, context);
        }

        match self.adapter.read(&model).await {
            Ok(_) if op == OperationKind::Create => ProgressEvent::failed(
                FaultKind::AlreadyExists,
                format!(
                    "{} {} already exists",
                    self.adapter.type_name(),
                    self.adapter.identifier(&model)
                ),
            ),
            Ok(_) => {
                context.mark(pre_check_key(op));
                ProgressEvent::in_progress(model, context)
            }
            Err(e) => {
                let allow_list = self.adapter.pre_check_allow_list(op);
                match classify(op, Stage::PreCheck, &e, allow_list, |err: &CloudError| {
                    self.is_gone(op, Stage::PreCheck, err)
                }) {
                    Resolution::AlreadyGone => {
                        tracing::info!("{} already absent", self.adapter.type_name());
                        ProgressEvent::done()
                    }
                    Resolution::Allowed(kind) => {
                        tracing::debug!(fault = %kind, "pre-check fault tolerated");
                        context.mark(pre_check_key(op));
                        ProgressEvent::in_progress(model, context)
                    }
                    Resolution::NotYetReady | Resolution::Propagate => {
                        self.fail(Stage::PreCheck, &e)
                    }
                }
            }
        }
    }

    /// Let go of dependents and wait until they are free
    pub async fn release(
        &self,
        op: OperationKind,
        model: A::Model,
        mut context: CallbackContext,
    ) -> ProgressEvent<A::Model> {
        if context.released(op) {
            return ProgressEvent::in_progress(model, context);
        }

        if !context.release_issued(op) {
            match self.adapter.release(op, &model).await {
                Ok(None) => {
                    context.mark(released_key(op));
                    return ProgressEvent::in_progress(model, context);
                }
                Ok(Some(operations)) => {
                    for operation in &operations {
                        tracing::info!("release accepted: {}", operation);
                    }
                    context.mark(release_issued_key(op));
                }
                Err(e) => return self.mutation_failed(op, &e),
            }
        }

        let attempts = context.record_attempt();
        let released = match self.adapter.is_released(op, &model).await {
            Ok(released) => released,
            Err(e) => match classify(op, Stage::Stabilize, &e, &[], |err: &CloudError| {
                self.is_gone(op, Stage::Stabilize, err)
            }) {
                Resolution::AlreadyGone => {
                    tracing::info!("{} already absent", self.adapter.type_name());
                    return ProgressEvent::done();
                }
                Resolution::NotYetReady | Resolution::Allowed(_) => false,
                Resolution::Propagate => return self.fail(Stage::Stabilize, &e),
            },
        };

        if released {
            tracing::debug!("dependents released after {} attempt(s)", attempts);
            context.mark(released_key(op));
            context.stabilization_attempts = 0;
            return ProgressEvent::in_progress(model, context);
        }

        tracing::debug!(attempts, "dependents not released yet");
        self.wait(model, context, attempts)
    }

    /// Issue the single mutating call of `op`, once per operation
    pub async fn mutate(
        &self,
        op: OperationKind,
        model: A::Model,
        mut context: CallbackContext,
    ) -> ProgressEvent<A::Model> {
        if context.mutation_issued(op) {
            tracing::debug!("{} already issued, skipping", op);
            return ProgressEvent::in_progress(model, context);
        }

        let outcome = match op {
            OperationKind::Create => self.adapter.create(&model).await.map(Some),
            OperationKind::Update => self.adapter.update(&model).await,
            OperationKind::Delete => self.adapter.delete(&model).await.map(Some),
            OperationKind::Read | OperationKind::List => {
                return ProgressEvent::in_progress(model, context);
            }
        };

        match outcome {
            Ok(Some(operations)) => {
                if operations.is_empty() {
                    tracing::info!("{} accepted", op);
                }
                for operation in &operations {
                    tracing::info!("{} accepted: {}", op, operation);
                }
            }
            Ok(None) => {
                tracing::info!("no changes required");
            }
            Err(e) => return self.mutation_failed(op, &e),
        }

        context.mark(mutation_key(op));
        ProgressEvent::in_progress(model, context)
    }

    /// Poll the stabilization predicate once
    pub async fn stabilize(
        &self,
        op: OperationKind,
        model: A::Model,
        mut context: CallbackContext,
    ) -> ProgressEvent<A::Model> {
        let attempts = context.record_attempt();

        let polled = match op {
            OperationKind::Create => self.adapter.is_stabilized_create(&model).await,
            OperationKind::Update => self.adapter.is_stabilized_update(&model).await,
            OperationKind::Delete => self.adapter.is_stabilized_delete(&model).await,
            OperationKind::Read | OperationKind::List => Ok(true),
        };

        let resource_ready = match polled {
            Ok(ready) => ready,
            Err(e) => match classify(op, Stage::Stabilize, &e, &[], |err: &CloudError| {
                self.is_gone(op, Stage::Stabilize, err)
            }) {
                Resolution::AlreadyGone => true,
                Resolution::NotYetReady | Resolution::Allowed(_) => false,
                Resolution::Propagate => return self.fail(Stage::Stabilize, &e),
            },
        };

        // Both conditions are evaluated in the same tick; neither alone is enough.
        // The settling flag is only recorded on a pass that observed readiness.
        let settled = if self.adapter.requires_settling(op) {
            let settled = context.settled(op);
            if resource_ready && !settled {
                context.mark(settled_key(op));
            }
            settled
        } else {
            true
        };

        if resource_ready && settled {
            tracing::info!("stabilized after {} attempt(s)", attempts);
            return match op {
                OperationKind::Delete => ProgressEvent::done(),
                _ => match self.adapter.read(&model).await {
                    Ok(observed) => ProgressEvent::success(observed),
                    Err(e) => self.fail(Stage::Stabilize, &e),
                },
            };
        }

        tracing::debug!(attempts, resource_ready, settled, "not yet stabilized");
        self.wait(model, context, attempts)
    }

    /// IN_PROGRESS with a delay hint, or NotStabilized once the budget is spent
    fn wait(
        &self,
        model: A::Model,
        context: CallbackContext,
        attempts: u32,
    ) -> ProgressEvent<A::Model> {
        if self.retry.exhausted(attempts) {
            tracing::warn!("giving up after {} stabilization attempts", attempts);
            return ProgressEvent::failed(
                FaultKind::NotStabilized,
                format!(
                    "{} {} did not stabilize after {} attempts",
                    self.adapter.type_name(),
                    self.adapter.identifier(&model),
                    attempts
                ),
            );
        }

        let delay = self.retry.delay_for_attempt(attempts.saturating_sub(1));
        ProgressEvent::delayed(model, context, delay)
    }

    fn mutation_failed(&self, op: OperationKind, error: &CloudError) -> ProgressEvent<A::Model> {
        match classify(op, Stage::Mutate, error, &[], |err: &CloudError| {
            self.is_gone(op, Stage::Mutate, err)
        }) {
            Resolution::AlreadyGone => {
                tracing::info!("{} already absent", self.adapter.type_name());
                ProgressEvent::done()
            }
            _ => self.fail(Stage::Mutate, error),
        }
    }

    fn is_gone(&self, op: OperationKind, stage: Stage, error: &CloudError) -> bool {
        if op == OperationKind::Delete && stage == Stage::Mutate {
            self.adapter.is_safe_exception_delete(error)
        } else {
            self.adapter.is_not_found(error)
        }
    }

    fn fail(&self, stage: Stage, error: &CloudError) -> ProgressEvent<A::Model> {
        tracing::warn!(%stage, fault = %error.kind(), "{}", error);
        ProgressEvent::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Operation;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        name: String,
        size: u32,
        state: String,
    }

    fn widget(name: &str, size: u32) -> Widget {
        Widget {
            name: name.to_string(),
            size,
            state: String::new(),
        }
    }

    /// In-memory adapter. Reads report `pending` until `ready_after` reads
    /// have been served since creation.
    #[derive(Default)]
    struct FakeAdapter {
        stored: Mutex<Option<Widget>>,
        reads: Mutex<u32>,
        mutations: Mutex<Vec<String>>,
        ready_after: u32,
        read_fault: Mutex<Option<CloudError>>,
        delete_fault: Mutex<Option<CloudError>>,
        settling: bool,
        holds_dependent: bool,
        release_polls: Mutex<u32>,
        released_after: u32,
    }

    impl FakeAdapter {
        fn with(stored: Option<Widget>) -> Self {
            Self {
                stored: Mutex::new(stored),
                ..Default::default()
            }
        }

        fn reads(&self) -> u32 {
            *self.reads.lock().unwrap()
        }

        fn mutations(&self) -> Vec<String> {
            self.mutations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceAdapter for FakeAdapter {
        type Model = Widget;

        fn type_name(&self) -> &str {
            "widget"
        }

        fn identifier(&self, model: &Widget) -> String {
            model.name.clone()
        }

        async fn create(&self, model: &Widget) -> Result<Vec<Operation>> {
            self.mutations.lock().unwrap().push("create".into());
            *self.stored.lock().unwrap() = Some(model.clone());
            *self.reads.lock().unwrap() = 0;
            Ok(vec![Operation::new("CreateWidget", &model.name)])
        }

        async fn read(&self, model: &Widget) -> Result<Widget> {
            if let Some(e) = self.read_fault.lock().unwrap().take() {
                return Err(e);
            }
            let mut reads = self.reads.lock().unwrap();
            *reads += 1;
            match self.stored.lock().unwrap().clone() {
                Some(mut w) => {
                    w.state = if *reads > self.ready_after {
                        "ready".into()
                    } else {
                        "pending".into()
                    };
                    Ok(w)
                }
                None => Err(CloudError::ResourceNotFound(model.name.clone())),
            }
        }

        async fn update(&self, desired: &Widget) -> Result<Option<Vec<Operation>>> {
            let current = self.stored.lock().unwrap().clone();
            if current.as_ref().map(|w| w.size) == Some(desired.size) {
                return Ok(None);
            }
            self.mutations.lock().unwrap().push("update".into());
            *self.stored.lock().unwrap() = Some(desired.clone());
            Ok(Some(vec![]))
        }

        async fn delete(&self, _model: &Widget) -> Result<Vec<Operation>> {
            self.mutations.lock().unwrap().push("delete".into());
            if let Some(e) = self.delete_fault.lock().unwrap().take() {
                return Err(e);
            }
            *self.stored.lock().unwrap() = None;
            Ok(vec![])
        }

        async fn list(&self, _model: &Widget) -> Result<Vec<Widget>> {
            Ok(self.stored.lock().unwrap().clone().into_iter().collect())
        }

        fn is_ready(&self, observed: &Widget) -> bool {
            observed.state == "ready"
        }

        fn requires_settling(&self, op: OperationKind) -> bool {
            self.settling && op == OperationKind::Update
        }

        async fn release(
            &self,
            op: OperationKind,
            model: &Widget,
        ) -> Result<Option<Vec<Operation>>> {
            if !self.holds_dependent || op != OperationKind::Delete {
                return Ok(None);
            }
            self.mutations.lock().unwrap().push("release".into());
            Ok(Some(vec![Operation::new("DetachWidget", &model.name)]))
        }

        async fn is_released(&self, _op: OperationKind, _model: &Widget) -> Result<bool> {
            let mut polls = self.release_polls.lock().unwrap();
            *polls += 1;
            Ok(*polls > self.released_after)
        }
    }

    #[tokio::test]
    async fn test_create_completes_in_one_tick_when_ready() {
        let engine = ReconciliationEngine::new(FakeAdapter::with(None));

        let event = engine
            .tick(OperationKind::Create, widget("w1", 1), CallbackContext::new())
            .await;

        match event {
            ProgressEvent::Success { model: Some(m), .. } => assert_eq!(m.state, "ready"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(engine.adapter().mutations(), vec!["create"]);
    }

    #[tokio::test]
    async fn test_create_existing_fails_with_already_exists() {
        let engine = ReconciliationEngine::new(FakeAdapter::with(Some(widget("w1", 1))));

        let event = engine
            .tick(OperationKind::Create, widget("w1", 1), CallbackContext::new())
            .await;

        assert_eq!(event.error_code(), Some(FaultKind::AlreadyExists));
        assert!(engine.adapter().mutations().is_empty());
    }

    #[tokio::test]
    async fn test_create_reentry_only_stabilizes() {
        let adapter = FakeAdapter {
            ready_after: 1,
            ..Default::default()
        };
        let engine = ReconciliationEngine::new(adapter).with_retry(RetryConfig::fixed(10, 3));

        let first = engine
            .tick(OperationKind::Create, widget("w1", 1), CallbackContext::new())
            .await;
        assert_eq!(first.delay_seconds(), Some(3));
        let (model, context) = first.proceed().unwrap();
        assert!(context.pre_check_done(OperationKind::Create));
        assert!(context.mutation_issued(OperationKind::Create));

        let second = engine.tick(OperationKind::Create, model, context).await;
        assert!(second.is_success(), "{:?}", second);
        assert_eq!(engine.adapter().mutations(), vec!["create"]);
    }

    #[tokio::test]
    async fn test_pre_check_skipped_when_recorded() {
        let engine = ReconciliationEngine::new(FakeAdapter::with(None));
        let context = CallbackContext::new().with_flag(pre_check_key(OperationKind::Create));

        let event = engine
            .pre_check(OperationKind::Create, widget("w1", 1), context)
            .await;
        let event = engine
            .pre_check(OperationKind::Create, widget("w1", 1), event.context().unwrap().clone())
            .await;

        assert!(event.is_in_progress());
        assert_eq!(engine.adapter().reads(), 0);
    }

    #[tokio::test]
    async fn test_stabilization_gives_up() {
        let adapter = FakeAdapter {
            ready_after: u32::MAX,
            ..Default::default()
        };
        let engine = ReconciliationEngine::new(adapter).with_retry(RetryConfig::fixed(2, 1));

        let (model, context) = engine
            .tick(OperationKind::Create, widget("w1", 1), CallbackContext::new())
            .await
            .proceed()
            .unwrap();
        let event = engine.tick(OperationKind::Create, model, context).await;

        assert_eq!(event.error_code(), Some(FaultKind::NotStabilized));
    }

    #[tokio::test]
    async fn test_update_noop_issues_no_mutation() {
        let engine = ReconciliationEngine::new(FakeAdapter::with(Some(widget("w1", 4))));

        let event = engine
            .tick(OperationKind::Update, widget("w1", 4), CallbackContext::new())
            .await;

        assert!(event.is_success());
        assert!(engine.adapter().mutations().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_missing_resource_fails() {
        let engine = ReconciliationEngine::new(FakeAdapter::with(None));

        let event = engine
            .tick(OperationKind::Update, widget("w1", 4), CallbackContext::new())
            .await;

        assert_eq!(event.error_code(), Some(FaultKind::NotFound));
    }

    #[tokio::test]
    async fn test_composite_stabilization_needs_settling_tick() {
        let adapter = FakeAdapter {
            stored: Mutex::new(Some(widget("w1", 1))),
            settling: true,
            ..Default::default()
        };
        let engine = ReconciliationEngine::new(adapter);

        // resource is ready immediately but the settling flag is not set yet
        let first = engine
            .tick(OperationKind::Update, widget("w1", 2), CallbackContext::new())
            .await;
        assert!(first.is_in_progress());
        let (model, context) = first.proceed().unwrap();
        assert!(context.settled(OperationKind::Update));

        let second = engine.tick(OperationKind::Update, model, context).await;
        assert!(second.is_success());
        assert_eq!(engine.adapter().mutations(), vec!["update"]);
    }

    #[tokio::test]
    async fn test_settling_waits_for_a_ready_pass() {
        // pre-check read and the first poll both see "pending"
        let adapter = FakeAdapter {
            stored: Mutex::new(Some(widget("w1", 1))),
            settling: true,
            ready_after: 2,
            ..Default::default()
        };
        let engine = ReconciliationEngine::new(adapter).with_retry(RetryConfig::fixed(10, 1));

        let first = engine
            .tick(OperationKind::Update, widget("w1", 2), CallbackContext::new())
            .await;
        let (model, context) = first.proceed().unwrap();
        assert!(!context.settled(OperationKind::Update));

        // first ready observation only records the flag
        let second = engine.tick(OperationKind::Update, model, context).await;
        assert!(second.is_in_progress(), "{:?}", second);
        let (model, context) = second.proceed().unwrap();
        assert!(context.settled(OperationKind::Update));

        let third = engine.tick(OperationKind::Update, model, context).await;
        assert!(third.is_success(), "{:?}", third);
    }

    #[tokio::test]
    async fn test_delete_waits_until_dependents_are_released() {
        let adapter = FakeAdapter {
            stored: Mutex::new(Some(widget("w1", 1))),
            holds_dependent: true,
            released_after: 1,
            ..Default::default()
        };
        let engine = ReconciliationEngine::new(adapter).with_retry(RetryConfig::fixed(10, 2));

        let first = engine
            .tick(OperationKind::Delete, widget("w1", 1), CallbackContext::new())
            .await;
        assert_eq!(first.delay_seconds(), Some(2));
        assert_eq!(engine.adapter().mutations(), vec!["release"]);
        let (model, context) = first.proceed().unwrap();
        assert!(context.release_issued(OperationKind::Delete));
        assert!(!context.mutation_issued(OperationKind::Delete));

        let second = engine.tick(OperationKind::Delete, model, context).await;
        assert!(second.is_success(), "{:?}", second);
        assert_eq!(engine.adapter().mutations(), vec!["release", "delete"]);
    }

    #[tokio::test]
    async fn test_release_gives_up() {
        let adapter = FakeAdapter {
            stored: Mutex::new(Some(widget("w1", 1))),
            holds_dependent: true,
            released_after: u32::MAX,
            ..Default::default()
        };
        let engine = ReconciliationEngine::new(adapter).with_retry(RetryConfig::fixed(2, 1));

        let (model, context) = engine
            .tick(OperationKind::Delete, widget("w1", 1), CallbackContext::new())
            .await
            .proceed()
            .unwrap();
        let event = engine.tick(OperationKind::Delete, model, context).await;

        assert_eq!(event.error_code(), Some(FaultKind::NotStabilized));
        assert_eq!(engine.adapter().mutations(), vec!["release"]);
    }

    #[tokio::test]
    async fn test_delete_of_absent_resource_succeeds() {
        let engine = ReconciliationEngine::new(FakeAdapter::with(None));

        let event = engine
            .tick(OperationKind::Delete, widget("w1", 1), CallbackContext::new())
            .await;

        assert_eq!(event, ProgressEvent::done());
        assert!(engine.adapter().mutations().is_empty());
    }

    #[tokio::test]
    async fn test_delete_not_found_during_mutate_succeeds() {
        let adapter = FakeAdapter::with(Some(widget("w1", 1)));
        *adapter.delete_fault.lock().unwrap() = Some(CloudError::ResourceNotFound("w1".into()));
        let engine = ReconciliationEngine::new(adapter);

        let event = engine
            .tick(OperationKind::Delete, widget("w1", 1), CallbackContext::new())
            .await;

        assert!(event.is_success());
    }

    #[tokio::test]
    async fn test_delete_stabilizes_when_absent() {
        let engine = ReconciliationEngine::new(FakeAdapter::with(Some(widget("w1", 1))));

        let event = engine
            .tick(OperationKind::Delete, widget("w1", 1), CallbackContext::new())
            .await;

        assert!(event.is_success());
        assert_eq!(engine.adapter().mutations(), vec!["delete"]);
    }

    #[tokio::test]
    async fn test_unexpected_fault_propagates() {
        let adapter = FakeAdapter::with(Some(widget("w1", 1)));
        *adapter.read_fault.lock().unwrap() =
            Some(CloudError::Unclassified("connection reset".into()));
        let engine = ReconciliationEngine::new(adapter);

        let event = engine
            .tick(OperationKind::Delete, widget("w1", 1), CallbackContext::new())
            .await;

        assert_eq!(
            event,
            ProgressEvent::failed(FaultKind::Unclassified, "connection reset")
        );
    }

    #[tokio::test]
    async fn test_read_and_list() {
        let engine = ReconciliationEngine::new(FakeAdapter::with(Some(widget("w1", 1))));

        let read = engine
            .tick(OperationKind::Read, widget("w1", 0), CallbackContext::new())
            .await;
        assert!(read.is_success());

        let listed = engine
            .tick(OperationKind::List, widget("", 0), CallbackContext::new())
            .await;
        match listed {
            ProgressEvent::Success { models, .. } => assert_eq!(models.len(), 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
