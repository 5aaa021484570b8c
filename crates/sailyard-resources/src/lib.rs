//! Sailyard resource adapters
//!
//! This crate connects the reconciliation engine in `sailyard-cloud` to a
//! remote control plane.
//!
//! # Features
//!
//! - [`ControlPlane`] client trait, with an HTTP implementation and a
//!   scripted in-memory mock
//! - One [`ResourceAdapter`](sailyard_cloud::ResourceAdapter) per resource kind
//! - Tag synchronisation shared by taggable resources
//! - JSON dispatch by [`ResourceKind`] for callers that pick the type at runtime
//!
//! # Example
//!
//! ```ignore
//! use sailyard_cloud::{CallbackContext, OperationKind, ReconciliationEngine};
//! use sailyard_resources::{ControlPlaneConfig, HttpControlPlane};
//! use sailyard_resources::resources::{DiskAdapter, DiskModel};
//! use std::sync::Arc;
//!
//! let client = Arc::new(HttpControlPlane::new(ControlPlaneConfig::from_env()?));
//! let engine = ReconciliationEngine::new(DiskAdapter::new(client));
//!
//! let event = engine
//!     .tick(OperationKind::Create, DiskModel::new("data"), CallbackContext::new())
//!     .await;
//! ```

pub mod client;
pub mod dispatch;
pub mod http;
pub mod mock;
pub mod resources;
pub mod tagging;

pub use client::{ControlPlane, Mutations, fetch_one, invoke, paginate};
pub use dispatch::ResourceKind;
pub use http::{ControlPlaneConfig, HttpControlPlane};
pub use mock::MockControlPlane;
pub use tagging::{Tag, sync_tags};
