//! Sailyard cloud resource reconciliation
//!
//! This crate provides the resource-agnostic core of Sailyard: the
//! reconciliation engine that drives one cloud resource through its
//! lifecycle, one tick at a time, on behalf of an external orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │            orchestration framework               │
//! │   (op, model, CallbackContext) → ProgressEvent   │
//! └─────────────────┬───────────────────────────────┘
//!                   │ one tick
//! ┌─────────────────▼───────────────────────────────┐
//! │                sailyard-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │ ReconciliationEngine                      │   │
//! │  │  PRE_CHECK → RELEASE → MUTATE → STABILIZE │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Classifier  │  │ ContextStore │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │ trait ResourceAdapter
//! ┌───────▼─────────────────────────────────────────┐
//! │  sailyard-resources (alarm, bucket, disk, ...)  │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod adapter;
pub mod classifier;
pub mod context;
pub mod diff;
pub mod engine;
pub mod error;
pub mod event;
pub mod retry;
pub mod store;

// Re-exports
pub use action::{Operation, OperationKind};
pub use adapter::ResourceAdapter;
pub use classifier::{Resolution, Stage, classify};
pub use context::CallbackContext;
pub use diff::{SetDiff, set_difference};
pub use engine::ReconciliationEngine;
pub use error::{CloudError, FaultKind, Result};
pub use event::ProgressEvent;
pub use retry::RetryConfig;
pub use store::{ContextStore, PendingOperation, PendingOperations, StoreLock, TickLock};
