//! SQLite-backed task store.
//!
//! Uses the bundled SQLite via `rusqlite`. The connection is serialized
//! behind a `tokio::sync::Mutex`; at the request volumes this service is
//! built for, a single connection is plenty.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;

use super::{DbHealth, StorageError, TaskStore};
use crate::task::{NewTask, Task, TaskPatch, TaskStats, TaskStatus};

const DATABASE_NAME: &str = "sqlite";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT,
    status      TEXT NOT NULL DEFAULT 'todo',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
)";

/// Task store over a single SQLite connection.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute(SCHEMA, [])?;
        tracing::info!("Opened SQLite database at {}", path.as_ref().display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database. Used by tests.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status_raw: String = row.get(3)?;
    let status: TaskStatus = status_raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status,
        created_at: parse_timestamp(4, row.get(4)?)?,
        updated_at: parse_timestamp(5, row.get(5)?)?,
    })
}

const TASK_COLUMNS: &str = "id, title, description, status, created_at, updated_at";

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn health_check(&self) -> DbHealth {
        let conn = self.conn.lock().await;
        match conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
            Ok(_) => DbHealth::healthy(DATABASE_NAME),
            Err(e) => DbHealth::unhealthy(DATABASE_NAME, e),
        }
    }

    async fn list(&self) -> Result<Vec<Task>, StorageError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks ORDER BY id DESC",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    async fn get(&self, id: i64) -> Result<Option<Task>, StorageError> {
        let conn = self.conn.lock().await;
        let task = conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    async fn create(&self, new: NewTask) -> Result<Task, StorageError> {
        let conn = self.conn.lock().await;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO tasks (title, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.title,
                new.description,
                new.status.to_string(),
                now.to_rfc3339(),
                now.to_rfc3339()
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Task {
            id,
            title: new.title,
            description: new.description,
            status: new.status,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, id: i64, patch: TaskPatch) -> Result<Option<Task>, StorageError> {
        let conn = self.conn.lock().await;
        let existing = conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![id],
                row_to_task,
            )
            .optional()?;

        let Some(mut task) = existing else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task.updated_at = Utc::now();

        conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, status = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                task.title,
                task.description,
                task.status.to_string(),
                task.updated_at.to_rfc3339(),
                id
            ],
        )?;
        Ok(Some(task))
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let conn = self.conn.lock().await;
        let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    async fn stats(&self) -> Result<TaskStats, StorageError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stats = TaskStats {
            total: 0,
            todo: 0,
            in_progress: 0,
            done: 0,
        };
        for (status, count) in rows {
            let count = count.max(0) as u64;
            stats.total += count;
            match status.parse::<TaskStatus>() {
                Ok(TaskStatus::Todo) => stats.todo += count,
                Ok(TaskStatus::InProgress) => stats.in_progress += count,
                Ok(TaskStatus::Done) => stats.done += count,
                Err(_) => tracing::warn!("Ignoring unknown status in stats: {}", status),
            }
        }
        Ok(stats)
    }
}
