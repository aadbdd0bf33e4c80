//! In-process registry of background analysis tasks
//!
//! Task ids are UUIDs; clients see them as url-safe base64 without padding
//! (22 characters).

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Task lifecycle as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Started,
    Success,
    Failure,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failure)
    }
}

/// State of one task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub status: TaskStatus,
    pub result: Option<f64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<Uuid, TaskRecord>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new PENDING task
    pub async fn create(&self) -> Uuid {
        let task_id = Uuid::new_v4();
        let now = Utc::now();
        self.tasks.write().await.insert(
            task_id,
            TaskRecord {
                status: TaskStatus::Pending,
                result: None,
                error: None,
                created_at: now,
                updated_at: now,
            },
        );
        task_id
    }

    pub async fn get(&self, task_id: Uuid) -> Option<TaskRecord> {
        self.tasks.read().await.get(&task_id).cloned()
    }

    pub async fn mark_started(&self, task_id: Uuid) {
        self.update(task_id, |record| record.status = TaskStatus::Started)
            .await;
    }

    pub async fn mark_success(&self, task_id: Uuid, uniqueness: f64) {
        self.update(task_id, |record| {
            record.status = TaskStatus::Success;
            record.result = Some(uniqueness);
        })
        .await;
    }

    pub async fn mark_failure(&self, task_id: Uuid, error: String) {
        self.update(task_id, |record| {
            record.status = TaskStatus::Failure;
            record.error = Some(error);
        })
        .await;
    }

    async fn update(&self, task_id: Uuid, apply: impl FnOnce(&mut TaskRecord)) {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task_id) {
            Some(record) => {
                apply(record);
                record.updated_at = Utc::now();
            }
            None => tracing::warn!(task_id = %task_id, "Update for unknown task ignored"),
        }
    }
}

/// Client-facing form of a task id
pub fn encode_task_id(task_id: Uuid) -> String {
    URL_SAFE_NO_PAD.encode(task_id.as_bytes())
}

/// Parse a client-facing task id; None unless it decodes to exactly 16 bytes
pub fn decode_task_id(encoded: &str) -> Option<Uuid> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    Uuid::from_slice(&bytes).ok()
}

pub fn is_valid_task_id(encoded: &str) -> bool {
    decode_task_id(encoded).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_encoding() {
        let task_id = Uuid::new_v4();
        let encoded = encode_task_id(task_id);

        assert_eq!(encoded.len(), 22);
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(decode_task_id(&encoded), Some(task_id));
    }

    #[test]
    fn test_invalid_task_ids() {
        assert!(!is_valid_task_id(""));
        assert!(!is_valid_task_id("not base64 at all!"));
        // Valid base64, wrong length
        assert!(!is_valid_task_id("AAAA"));
        assert!(!is_valid_task_id(&Uuid::new_v4().to_string()));
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let registry = TaskRegistry::new();
        let task_id = registry.create().await;

        assert_eq!(registry.get(task_id).await.unwrap().status, TaskStatus::Pending);

        registry.mark_started(task_id).await;
        let record = registry.get(task_id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Started);
        assert!(!record.status.is_finished());

        registry.mark_success(task_id, 0.5).await;
        let record = registry.get(task_id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Success);
        assert_eq!(record.result, Some(0.5));
        assert!(record.status.is_finished());
    }

    #[tokio::test]
    async fn test_failure_records_error() {
        let registry = TaskRegistry::new();
        let task_id = registry.create().await;
        registry.mark_failure(task_id, "boom".to_string()).await;

        let record = registry.get(task_id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Failure);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let registry = TaskRegistry::new();
        registry.mark_started(Uuid::new_v4()).await;
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&TaskStatus::Pending).unwrap(), "\"PENDING\"");
        assert_eq!(serde_json::to_string(&TaskStatus::Failure).unwrap(), "\"FAILURE\"");
    }
}
