//! Pending-operation store
//!
//! Persists the [`CallbackContext`] of in-flight lifecycle operations in
//! `.sailyard/pending.json` so that a driver process can be restarted
//! between ticks. Entries are removed once an operation reaches a terminal
//! state.

use crate::action::OperationKind;
use crate::context::CallbackContext;
use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STORE_VERSION: u32 = 1;
const STORE_DIR: &str = ".sailyard";
const STORE_FILE: &str = "pending.json";
const STORE_BACKUP: &str = "pending.json.backup";
const STORE_TEMP: &str = "pending.json.tmp";
const LOCK_FILE: &str = "tick.lock";

/// A lock whose holder has not released it within this window is abandoned
const LOCK_STALE_MINUTES: i64 = 60;

/// All in-flight operations, keyed by `type:identifier`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOperations {
    /// Store file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    pub operations: BTreeMap<String, PendingOperation>,
}

impl Default for PendingOperations {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            updated_at: Utc::now(),
            operations: BTreeMap::new(),
        }
    }
}

impl PendingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(resource_type: &str, identifier: &str) -> String {
        format!("{}:{}", resource_type, identifier)
    }

    pub fn get(&self, key: &str) -> Option<&PendingOperation> {
        self.operations.get(key)
    }

    pub fn set(&mut self, key: String, pending: PendingOperation) {
        self.operations.insert(key, pending);
        self.updated_at = Utc::now();
    }

    pub fn remove(&mut self, key: &str) -> Option<PendingOperation> {
        let result = self.operations.remove(key);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    /// Context to resume `op` with; empty when nothing (or a different
    /// operation) is pending for `key`
    pub fn resume(&self, key: &str, op: OperationKind) -> CallbackContext {
        match self.operations.get(key) {
            Some(pending) if pending.operation == op => pending.context.clone(),
            Some(pending) => {
                tracing::warn!(
                    "discarding pending {} for {}; starting {}",
                    pending.operation,
                    key,
                    op
                );
                CallbackContext::new()
            }
            None => CallbackContext::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PendingOperation)> {
        self.operations.iter()
    }
}

/// One in-flight operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOperation {
    pub operation: OperationKind,

    pub context: CallbackContext,

    /// When the operation started
    pub started_at: DateTime<Utc>,

    /// Last tick timestamp
    pub updated_at: DateTime<Utc>,
}

impl PendingOperation {
    pub fn new(operation: OperationKind, context: CallbackContext) -> Self {
        let now = Utc::now();
        Self {
            operation,
            context,
            started_at: now,
            updated_at: now,
        }
    }

    /// Carry the start time forward to the next tick's context
    pub fn advance(&self, context: CallbackContext) -> Self {
        Self {
            operation: self.operation,
            context,
            started_at: self.started_at,
            updated_at: Utc::now(),
        }
    }
}

/// Reads and writes the pending-operation file
pub struct ContextStore {
    /// Project root directory
    project_root: PathBuf,
}

impl ContextStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn store_dir(&self) -> PathBuf {
        self.project_root.join(STORE_DIR)
    }

    fn store_path(&self) -> PathBuf {
        self.store_dir().join(STORE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.store_dir().join(STORE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.store_dir().join(LOCK_FILE)
    }

    async fn ensure_store_dir(&self) -> Result<()> {
        let dir = self.store_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created store directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load pending operations
    pub async fn load(&self) -> Result<PendingOperations> {
        let path = self.store_path();
        if !path.exists() {
            tracing::debug!("Store file not found, returning empty store");
            return Ok(PendingOperations::new());
        }

        let content = fs::read_to_string(&path).await?;
        let pending: PendingOperations = serde_json::from_str(&content)?;

        if pending.version > STORE_VERSION {
            return Err(CloudError::StateError(format!(
                "Store file version {} is newer than supported version {}",
                pending.version, STORE_VERSION
            )));
        }

        tracing::debug!("Loaded {} pending operations", pending.len());
        Ok(pending)
    }

    /// Save pending operations. The previous file is kept as a backup and
    /// the new one is swapped in with a rename.
    pub async fn save(&self, pending: &PendingOperations) -> Result<()> {
        self.ensure_store_dir().await?;

        let path = self.store_path();
        let temp = self.store_dir().join(STORE_TEMP);
        fs::write(&temp, serde_json::to_string_pretty(pending)?).await?;

        if path.exists() {
            fs::copy(&path, self.backup_path()).await?;
        }
        fs::rename(&temp, &path).await?;

        tracing::debug!("Saved {} pending operations", pending.len());
        Ok(())
    }

    /// Current lock holder, if a tick is running
    pub async fn lock_holder(&self) -> Result<Option<TickLock>> {
        let lock_path = self.lock_path();
        if !lock_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&lock_path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Lock the store for one tick of `op` on the resource `key`
    pub async fn acquire_lock(&self, key: &str, op: OperationKind) -> Result<StoreLock> {
        self.ensure_store_dir().await?;

        if let Some(holder) = self.lock_holder().await? {
            if !holder.is_stale() {
                return Err(CloudError::LockError(format!(
                    "{} ({}) is being ticked by pid {} on {} since {}",
                    holder.key, holder.operation, holder.pid, holder.host, holder.acquired_at
                )));
            }
            tracing::warn!(key = %holder.key, pid = holder.pid, "Removing abandoned tick lock");
        }

        let holder = TickLock {
            key: key.to_string(),
            operation: op,
            pid: std::process::id(),
            host: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let lock_path = self.lock_path();
        fs::write(&lock_path, serde_json::to_string_pretty(&holder)?).await?;

        tracing::debug!(key, operation = %op, "Acquired tick lock");
        Ok(StoreLock {
            lock_path,
            released: false,
        })
    }
}

/// Who is ticking which operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickLock {
    pub key: String,
    pub operation: OperationKind,
    pub pid: u32,
    pub host: String,
    pub acquired_at: DateTime<Utc>,
}

impl TickLock {
    pub fn is_stale(&self) -> bool {
        Utc::now()
            .signed_duration_since(self.acquired_at)
            .num_minutes()
            >= LOCK_STALE_MINUTES
    }
}

/// RAII guard for the store lock
pub struct StoreLock {
    lock_path: PathBuf,
    released: bool,
}

impl StoreLock {
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released tick lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
