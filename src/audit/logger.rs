//! Buffered audit writer
//!
//! Entries are pushed into an in-memory queue by request handlers and written
//! to `audit_logs` in batches by a background task, either on a timer tick or
//! as soon as the queue reaches the configured threshold.

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

use super::{Audited, diff, redact};
use crate::domain::Actor;
use crate::infrastructure::config::AuditConfig;
use crate::models::audit_log;

/// An audit record waiting to be flushed
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor_id: Option<i32>,
    pub actor_username: Option<String>,
    pub changes: Option<Value>,
    pub created_at: String,
}

impl PendingEntry {
    fn into_active_model(self) -> audit_log::ActiveModel {
        audit_log::ActiveModel {
            entity_type: Set(self.entity_type),
            entity_id: Set(self.entity_id),
            action: Set(self.action),
            actor_id: Set(self.actor_id),
            actor_username: Set(self.actor_username),
            changes: Set(self.changes.map(|c| c.to_string())),
            created_at: Set(self.created_at),
            ..Default::default()
        }
    }
}

struct Inner {
    db: DatabaseConnection,
    buffer: Mutex<VecDeque<PendingEntry>>,
    notify: Notify,
    sensitive: HashSet<String>,
    config: AuditConfig,
}

/// Cheaply cloneable handle to the shared audit buffer
#[derive(Clone)]
pub struct AuditLogger {
    inner: Arc<Inner>,
}

impl AuditLogger {
    pub fn new(db: DatabaseConnection, config: AuditConfig) -> Self {
        let sensitive = redact::sensitive_set(&config.sensitive_fields);
        Self {
            inner: Arc::new(Inner {
                db,
                buffer: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
                sensitive,
                config,
            }),
        }
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<PendingEntry>> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of entries waiting to be flushed
    pub fn pending(&self) -> usize {
        self.buffer().len()
    }

    /// Redact and enqueue an entry, waking the flusher at the threshold
    pub fn record(&self, mut entry: PendingEntry) {
        if let Some(changes) = entry.changes.as_mut() {
            redact::redact(changes, &self.inner.sensitive);
        }

        let len = {
            let mut buffer = self.buffer();
            buffer.push_back(entry);
            buffer.len()
        };

        if len >= self.inner.config.flush_threshold {
            self.inner.notify.notify_one();
        }
    }

    fn entry(
        &self,
        actor: &Actor,
        entity_type: &str,
        entity_id: String,
        action: &str,
        changes: Option<Value>,
    ) -> PendingEntry {
        PendingEntry {
            entity_type: entity_type.to_string(),
            entity_id,
            action: action.to_string(),
            actor_id: actor.user_id,
            actor_username: actor.username.clone(),
            changes,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn snapshot<M: Audited>(model: &M) -> Option<Value> {
        match serde_json::to_value(model) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Failed to snapshot {} for audit: {}", M::ENTITY_TYPE, e);
                None
            }
        }
    }

    pub fn created<M: Audited>(&self, actor: &Actor, model: &M) {
        let entry = self.entry(
            actor,
            M::ENTITY_TYPE,
            model.audit_id(),
            "create",
            Self::snapshot(model),
        );
        self.record(entry);
    }

    /// Records only the changed fields; a no-op update is not recorded.
    pub fn updated<M: Audited>(&self, actor: &Actor, before: &M, after: &M) {
        let (Some(old), Some(new)) = (Self::snapshot(before), Self::snapshot(after)) else {
            return;
        };
        let changes = diff::diff(&old, &new);
        if changes.is_empty() {
            return;
        }
        let entry = self.entry(
            actor,
            M::ENTITY_TYPE,
            after.audit_id(),
            "update",
            Some(Value::Object(changes)),
        );
        self.record(entry);
    }

    pub fn deleted<M: Audited>(&self, actor: &Actor, model: &M) {
        let entry = self.entry(
            actor,
            M::ENTITY_TYPE,
            model.audit_id(),
            "delete",
            Self::snapshot(model),
        );
        self.record(entry);
    }

    pub fn restored<M: Audited>(&self, actor: &Actor, model: &M) {
        let entry = self.entry(
            actor,
            M::ENTITY_TYPE,
            model.audit_id(),
            "restore",
            Self::snapshot(model),
        );
        self.record(entry);
    }

    /// Free-form event (login, token reuse, stock adjustment, ...)
    pub fn event(
        &self,
        actor: &Actor,
        entity_type: &str,
        entity_id: impl ToString,
        action: &str,
        details: Option<Value>,
    ) {
        let entry = self.entry(actor, entity_type, entity_id.to_string(), action, details);
        self.record(entry);
    }

    /// Write everything currently buffered in one batch.
    ///
    /// On failure the batch is put back at the front of the queue, keeping at
    /// most `max_buffer` entries (oldest dropped first).
    pub async fn flush(&self) -> Result<usize, DbErr> {
        let batch: Vec<PendingEntry> = self.buffer().drain(..).collect();
        if batch.is_empty() {
            return Ok(0);
        }

        let count = batch.len();
        let models = batch.iter().cloned().map(PendingEntry::into_active_model);

        match audit_log::Entity::insert_many(models)
            .exec(&self.inner.db)
            .await
        {
            Ok(_) => {
                tracing::debug!("Flushed {} audit entries", count);
                Ok(count)
            }
            Err(e) => {
                tracing::error!("Audit flush of {} entries failed: {}", count, e);
                self.requeue(batch);
                Err(e)
            }
        }
    }

    fn requeue(&self, batch: Vec<PendingEntry>) {
        let mut buffer = self.buffer();
        for entry in batch.into_iter().rev() {
            buffer.push_front(entry);
        }

        let max = self.inner.config.max_buffer;
        if buffer.len() > max {
            let dropped = buffer.len() - max;
            buffer.drain(..dropped);
            tracing::warn!("Audit buffer over capacity, dropped {} oldest entries", dropped);
        }
    }

    /// Run the flush loop until `shutdown` flips to true, then flush once more.
    pub fn spawn_flusher(&self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let logger = self.clone();
        let period = logger.inner.config.flush_interval;

        tokio::spawn(async move {
            tracing::info!("Audit flusher started (every {:?})", period);
            let mut ticker = tokio::time::interval(period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = logger.inner.notify.notified() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
                // Errors are logged inside flush; entries stay queued for the next round.
                let _ = logger.flush().await;
            }

            if let Err(e) = logger.flush().await {
                tracing::error!("Final audit flush failed: {}", e);
            }
            tracing::info!("Audit flusher stopped");
        })
    }
}
