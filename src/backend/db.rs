use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use command_center_common::{NewActivity, RegisteredUser, TaskPayload, TaskStatus};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

/// Async-safe handle to the board database.
///
/// Wraps `CommandDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O never
/// ties up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<CommandDb>>,
}

impl DbHandle {
    pub fn new(db: CommandDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&CommandDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

// ── Row types ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub assignee: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityRecord {
    pub id: i64,
    pub agent_id: String,
    pub action: String,
    pub details: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

const TASK_COLUMNS: &str =
    "id, title, description, assignee, priority, status, due_date, created_at";
const ACTIVITY_COLUMNS: &str = "id, agent_id, action, details, timestamp";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        assignee: row.get(3)?,
        priority: row.get(4)?,
        status: row.get(5)?,
        due_date: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityRecord> {
    Ok(ActivityRecord {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        action: row.get(2)?,
        details: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

pub struct CommandDb {
    conn: Connection,
}

impl CommandDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    assignee TEXT NOT NULL DEFAULT '',
                    priority TEXT NOT NULL DEFAULT 'medium',
                    status TEXT NOT NULL DEFAULT 'backlog',
                    due_date TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS activity_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    agent_id TEXT NOT NULL DEFAULT '',
                    action TEXT NOT NULL,
                    details TEXT,
                    timestamp TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);
                CREATE INDEX IF NOT EXISTS idx_activity_timestamp ON activity_log(timestamp);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Users ─────────────────────────────────────────────────────────

    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<RegisteredUser> {
        self.conn
            .query_row(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2) RETURNING id, username",
                params![username, password_hash],
                |row| {
                    Ok(RegisteredUser {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .context("Failed to insert user")
    }

    pub fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        self.conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(UserRecord {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                },
            )
            .optional()
            .context("Failed to query user")
    }

    // ── Tasks ─────────────────────────────────────────────────────────

    pub fn list_tasks(&self) -> Result<Vec<TaskRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM tasks ORDER BY created_at DESC, id DESC",
                TASK_COLUMNS
            ))
            .context("Failed to prepare list_tasks")?;
        let rows = stmt
            .query_map([], task_from_row)
            .context("Failed to query tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row.context("Failed to read task row")?);
        }
        Ok(tasks)
    }

    pub fn create_task(&self, payload: &TaskPayload) -> Result<TaskRecord> {
        let status = payload
            .status
            .as_deref()
            .unwrap_or(TaskStatus::Backlog.as_str());
        self.conn
            .query_row(
                &format!(
                    "INSERT INTO tasks (title, description, assignee, priority, due_date, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING {}",
                    TASK_COLUMNS
                ),
                params![
                    payload.title,
                    payload.description,
                    payload.assignee,
                    payload.priority,
                    payload.due_date,
                    status
                ],
                task_from_row,
            )
            .context("Failed to insert task")
    }

    /// Overwrite every editable field. A payload without a status keeps the
    /// stored one. Returns `None` when no row has this id.
    pub fn update_task(&self, id: i64, payload: &TaskPayload) -> Result<Option<TaskRecord>> {
        self.conn
            .query_row(
                &format!(
                    "UPDATE tasks
                     SET title = ?1, description = ?2, assignee = ?3, priority = ?4,
                         due_date = ?5, status = COALESCE(?6, status)
                     WHERE id = ?7 RETURNING {}",
                    TASK_COLUMNS
                ),
                params![
                    payload.title,
                    payload.description,
                    payload.assignee,
                    payload.priority,
                    payload.due_date,
                    payload.status,
                    id
                ],
                task_from_row,
            )
            .optional()
            .context("Failed to update task")
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .context("Failed to delete task")?;
        Ok(count > 0)
    }

    // ── Activity log ──────────────────────────────────────────────────

    /// Most recent entries first.
    pub fn list_activity(&self, limit: i64) -> Result<Vec<ActivityRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM activity_log ORDER BY timestamp DESC, id DESC LIMIT ?1",
                ACTIVITY_COLUMNS
            ))
            .context("Failed to prepare list_activity")?;
        let rows = stmt
            .query_map(params![limit], activity_from_row)
            .context("Failed to query activity")?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.context("Failed to read activity row")?);
        }
        Ok(entries)
    }

    pub fn create_activity(&self, entry: &NewActivity) -> Result<ActivityRecord> {
        self.conn
            .query_row(
                &format!(
                    "INSERT INTO activity_log (agent_id, action, details) VALUES (?1, ?2, ?3) RETURNING {}",
                    ACTIVITY_COLUMNS
                ),
                params![entry.agent_id, entry.action, entry.details],
                activity_from_row,
            )
            .context("Failed to insert activity")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: &str) -> TaskPayload {
        TaskPayload {
            title: title.to_string(),
            description: "desc".to_string(),
            assignee: "jeff".to_string(),
            priority: "high".to_string(),
            due_date: Some("2026-02-05".to_string()),
            status: None,
        }
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = CommandDb::new_in_memory().unwrap();
        db.run_migrations().unwrap();
        assert!(db.list_tasks().unwrap().is_empty());
    }

    #[test]
    fn test_create_task_defaults_to_backlog() {
        let db = CommandDb::new_in_memory().unwrap();
        let task = db.create_task(&payload("Scan")).unwrap();
        assert_eq!(task.status, "backlog");
        assert_eq!(task.title, "Scan");
        assert_eq!(task.due_date.as_deref(), Some("2026-02-05"));
    }

    #[test]
    fn test_create_task_honours_explicit_status() {
        let db = CommandDb::new_in_memory().unwrap();
        let mut p = payload("Scan");
        p.status = Some("active".to_string());
        assert_eq!(db.create_task(&p).unwrap().status, "active");
    }

    #[test]
    fn test_list_tasks_newest_first() {
        let db = CommandDb::new_in_memory().unwrap();
        let first = db.create_task(&payload("first")).unwrap();
        let second = db.create_task(&payload("second")).unwrap();
        let ids: Vec<i64> = db.list_tasks().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_update_task_overwrites_fields() {
        let db = CommandDb::new_in_memory().unwrap();
        let task = db.create_task(&payload("old")).unwrap();
        let mut p = payload("new");
        p.status = Some("complete".to_string());
        p.due_date = None;
        let updated = db.update_task(task.id, &p).unwrap().unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.status, "complete");
        assert_eq!(updated.due_date, None);
    }

    #[test]
    fn test_update_without_status_keeps_stored_status() {
        let db = CommandDb::new_in_memory().unwrap();
        let mut p = payload("t");
        p.status = Some("assigned".to_string());
        let task = db.create_task(&p).unwrap();
        let updated = db.update_task(task.id, &payload("t2")).unwrap().unwrap();
        assert_eq!(updated.status, "assigned");
    }

    #[test]
    fn test_update_missing_task_returns_none() {
        let db = CommandDb::new_in_memory().unwrap();
        assert!(db.update_task(999, &payload("x")).unwrap().is_none());
    }

    #[test]
    fn test_delete_task() {
        let db = CommandDb::new_in_memory().unwrap();
        let task = db.create_task(&payload("gone")).unwrap();
        assert!(db.delete_task(task.id).unwrap());
        assert!(!db.delete_task(task.id).unwrap());
        assert!(db.list_tasks().unwrap().is_empty());
    }

    #[test]
    fn test_activity_limit_and_order() {
        let db = CommandDb::new_in_memory().unwrap();
        for i in 0..5 {
            db.create_activity(&NewActivity {
                agent_id: "sam".to_string(),
                action: format!("action {}", i),
                details: None,
            })
            .unwrap();
        }
        let recent = db.list_activity(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].action, "action 4");
        assert_eq!(recent[2].action, "action 2");
    }

    #[test]
    fn test_duplicate_username_fails() {
        let db = CommandDb::new_in_memory().unwrap();
        let user = db.create_user("chuck", "hash").unwrap();
        assert_eq!(user.username, "chuck");
        assert!(db.create_user("chuck", "other").is_err());
    }

    #[test]
    fn test_find_user() {
        let db = CommandDb::new_in_memory().unwrap();
        db.create_user("sam", "hash").unwrap();
        let found = db.find_user("sam").unwrap().unwrap();
        assert_eq!(found.password_hash, "hash");
        assert!(db.find_user("nobody").unwrap().is_none());
    }
}
