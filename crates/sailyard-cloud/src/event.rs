//! Per-tick outcome returned to the orchestration framework

use crate::context::CallbackContext;
use crate::error::{CloudError, FaultKind};
use serde::{Deserialize, Serialize};

/// Outcome of one reconciliation tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "status",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ProgressEvent<M> {
    /// Not finished; the framework re-invokes with `context` after the delay
    InProgress {
        model: M,
        context: CallbackContext,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        callback_delay_seconds: Option<u64>,
    },
    /// Terminal success
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<M>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        models: Vec<M>,
    },
    /// Terminal failure carrying the originating fault
    Failed { error_code: FaultKind, message: String },
}

impl<M> ProgressEvent<M> {
    pub fn in_progress(model: M, context: CallbackContext) -> Self {
        ProgressEvent::InProgress {
            model,
            context,
            callback_delay_seconds: None,
        }
    }

    pub fn delayed(model: M, context: CallbackContext, delay_seconds: u64) -> Self {
        ProgressEvent::InProgress {
            model,
            context,
            callback_delay_seconds: Some(delay_seconds),
        }
    }

    pub fn success(model: M) -> Self {
        ProgressEvent::Success {
            model: Some(model),
            models: Vec::new(),
        }
    }

    /// Success without a model (delete)
    pub fn done() -> Self {
        ProgressEvent::Success {
            model: None,
            models: Vec::new(),
        }
    }

    pub fn listed(models: Vec<M>) -> Self {
        ProgressEvent::Success { model: None, models }
    }

    pub fn failed(error_code: FaultKind, message: impl Into<String>) -> Self {
        ProgressEvent::Failed {
            error_code,
            message: message.into(),
        }
    }

    pub fn from_error(error: &CloudError) -> Self {
        Self::failed(error.kind(), error.message())
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, ProgressEvent::InProgress { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProgressEvent::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProgressEvent::Failed { .. })
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }

    /// Fault kind of a failed event
    pub fn error_code(&self) -> Option<FaultKind> {
        match self {
            ProgressEvent::Failed { error_code, .. } => Some(*error_code),
            _ => None,
        }
    }

    pub fn delay_seconds(&self) -> Option<u64> {
        match self {
            ProgressEvent::InProgress {
                callback_delay_seconds,
                ..
            } => *callback_delay_seconds,
            _ => None,
        }
    }

    pub fn context(&self) -> Option<&CallbackContext> {
        match self {
            ProgressEvent::InProgress { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Split an in-progress event into the state the next stage needs.
    /// Terminal events come back as `Err` so the caller can return them as-is.
    pub fn proceed(self) -> std::result::Result<(M, CallbackContext), Self> {
        match self {
            ProgressEvent::InProgress { model, context, .. } => Ok((model, context)),
            terminal => Err(terminal),
        }
    }

    pub fn map_model<N, F>(self, mut f: F) -> ProgressEvent<N>
    where
        F: FnMut(M) -> N,
    {
        match self {
            ProgressEvent::InProgress {
                model,
                context,
                callback_delay_seconds,
            } => ProgressEvent::InProgress {
                model: f(model),
                context,
                callback_delay_seconds,
            },
            ProgressEvent::Success { model, models } => ProgressEvent::Success {
                model: model.map(&mut f),
                models: models.into_iter().map(f).collect(),
            },
            ProgressEvent::Failed {
                error_code,
                message,
            } => ProgressEvent::Failed {
                error_code,
                message,
            },
        }
    }
}
