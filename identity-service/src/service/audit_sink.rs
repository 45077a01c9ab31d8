//! # Audit Sink
//!
//! A bounded, in-process queue in front of the `audit_entries` table. The
//! request pipeline submits entries from its final middleware layer;
//! submission never blocks the response — if the queue is full the entry is
//! dropped and logged, trading durability for latency.
//!
//! ```text
//! audit middleware ──try_send──▶ mpsc channel ──▶ worker pool ──▶ AuditRepository
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::warn;

use crate::domain::entities::NewAuditEntry;
use crate::repository::traits::AuditRepositoryTrait;

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle held by request handlers/middleware. Cheap to clone: wraps a
/// single `mpsc::Sender`.
#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::Sender<NewAuditEntry>,
}

impl AuditSink {
    /// Spawns `worker_count` workers draining a channel of `capacity` and
    /// returns the sink handle. Workers run for the lifetime of the process.
    pub fn spawn(repository: Arc<dyn AuditRepositoryTrait>, capacity: usize, worker_count: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        for worker_id in 0..worker_count.max(1) {
            let repository = repository.clone();
            let rx = rx.clone();
            tokio::spawn(async move {
                loop {
                    let entry = {
                        let mut rx = rx.lock().await;
                        rx.recv().await
                    };
                    let Some(entry) = entry else {
                        break;
                    };
                    match timeout(WRITE_TIMEOUT, repository.insert(entry)).await {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => warn!(worker_id, error = %e, "audit write failed"),
                        Err(_) => warn!(worker_id, "audit write timed out"),
                    }
                }
            });
        }

        Self { tx }
    }

    /// Enqueues an entry. Non-blocking: drops and logs if the queue is full.
    pub fn submit(&self, entry: NewAuditEntry) {
        if let Err(e) = self.tx.try_send(entry) {
            warn!(error = %e, "audit queue full, entry dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::traits::MockAuditRepositoryTrait;
    use serde_json::json;
    use uuid::Uuid;

    fn sample_entry() -> NewAuditEntry {
        NewAuditEntry {
            correlation_id: Uuid::new_v4().to_string(),
            user_id: None,
            action: "login".to_string(),
            entity_type: "user".to_string(),
            entity_id: None,
            ip_address: None,
            user_agent: None,
            status_code: 200,
            error_message: None,
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn submit_reaches_the_repository() {
        let mut mock = MockAuditRepositoryTrait::new();
        mock.expect_insert().returning(|entry| {
            Ok(crate::domain::entities::AuditEntry {
                entry_id: Uuid::new_v4(),
                correlation_id: entry.correlation_id,
                user_id: entry.user_id,
                action: entry.action,
                entity_type: entry.entity_type,
                entity_id: entry.entity_id,
                ip_address: entry.ip_address,
                user_agent: entry.user_agent,
                status_code: entry.status_code,
                error_message: entry.error_message,
                metadata: entry.metadata,
                created_at: chrono::Utc::now(),
            })
        });

        let sink = AuditSink::spawn(Arc::new(mock), 16, 1);
        sink.submit(sample_entry());

        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn submit_drops_silently_when_queue_is_full() {
        let mut mock = MockAuditRepositoryTrait::new();
        mock.expect_insert().returning(|_| {
            Err(shared::errors::ApiError::InternalError { message: "unreachable in this test".to_string() })
        });

        let sink = AuditSink::spawn(Arc::new(mock), 1, 0);
        for _ in 0..10 {
            sink.submit(sample_entry());
        }
    }
}
