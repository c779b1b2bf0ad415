//! Storage collaborator for task records.
//!
//! Handlers and the startup gate depend only on the [`TaskStore`] trait, so
//! they can be exercised against a fake store in tests. The production
//! implementation is [`sqlite::SqliteTaskStore`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::task::{NewTask, Task, TaskPatch, TaskStats};

pub mod sqlite;

pub use sqlite::SqliteTaskStore;

/// Result of a one-shot readiness probe against the store.
///
/// Produced fresh on every probe; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbHealth {
    pub status: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DbHealth {
    pub fn healthy(database: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            database: database.to_string(),
            error: None,
        }
    }

    pub fn unhealthy(database: &str, error: impl ToString) -> Self {
        Self {
            status: "unhealthy".to_string(),
            database: database.to_string(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Storage failure surfaced to handlers.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// CRUD interface over the task table.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Probe the store and report its current health.
    async fn health_check(&self) -> DbHealth;

    /// Return all tasks, newest first.
    async fn list(&self) -> Result<Vec<Task>, StorageError>;

    /// Return one task, or `None` if the id is absent.
    async fn get(&self, id: i64) -> Result<Option<Task>, StorageError>;

    /// Insert a task; the store assigns id and timestamps.
    async fn create(&self, new: NewTask) -> Result<Task, StorageError>;

    /// Apply a partial update. Returns `None` if the id is absent.
    async fn update(&self, id: i64, patch: TaskPatch) -> Result<Option<Task>, StorageError>;

    /// Remove a task. Returns `false` if the id was absent.
    async fn delete(&self, id: i64) -> Result<bool, StorageError>;

    /// Aggregate counts by status over the full set.
    async fn stats(&self) -> Result<TaskStats, StorageError>;
}
