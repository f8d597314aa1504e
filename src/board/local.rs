use std::path::{Path, PathBuf};

use async_trait::async_trait;
use command_center_common::{
    ActivityEntry, Agent, Roster, Task, TaskStatus, seed_tasks,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::adapter::{Committed, Mutation, PersistenceAdapter};
use crate::errors::BoardError;

pub const TASKS_KEY: &str = "cc_tasks";
pub const ACTIVITY_KEY: &str = "cc_activity";
pub const AGENTS_KEY: &str = "cc_agents";

/// Offline board: three JSON blobs in a data directory, rewritten after
/// every mutation.
pub struct LocalAdapter {
    dir: PathBuf,
    roster: Roster,
}

impl LocalAdapter {
    /// Open the blobs under `dir`, seeding the sample missions when no tasks
    /// are stored yet.
    pub async fn open(dir: &Path) -> Result<Self, BoardError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| BoardError::Storage {
                path: dir.to_path_buf(),
                source,
            })?;

        let mut adapter = Self {
            dir: dir.to_path_buf(),
            roster: Roster::default(),
        };

        let agents: Option<Vec<Agent>> = adapter.read_blob(AGENTS_KEY).await?;
        if let Some(agents) = agents.filter(|a| !a.is_empty()) {
            adapter.roster = Roster::new(agents);
        }

        let tasks: Vec<Task> = adapter.read_blob(TASKS_KEY).await?.unwrap_or_default();
        if tasks.is_empty() {
            let activity: Vec<ActivityEntry> =
                adapter.read_blob(ACTIVITY_KEY).await?.unwrap_or_default();
            tracing::info!(dir = %dir.display(), "Seeding offline board with sample missions");
            adapter.save_state(&seed_tasks(), &activity).await?;
        }

        Ok(adapter)
    }

    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    async fn read_blob<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, BoardError> {
        let path = self.blob_path(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(BoardError::Storage { path, source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| BoardError::Corrupt { path, source })
    }

    async fn write_blob<T: Serialize>(&self, key: &str, value: &T) -> Result<(), BoardError> {
        let path = self.blob_path(key);
        let json = serde_json::to_string_pretty(value).map_err(|source| BoardError::Corrupt {
            path: path.clone(),
            source,
        })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| BoardError::Storage { path, source })
    }

    async fn save_state(&self, tasks: &[Task], activity: &[ActivityEntry]) -> Result<(), BoardError> {
        let blob: Vec<BlobTask<'_>> = tasks.iter().map(BlobTask::from).collect();
        self.write_blob(TASKS_KEY, &blob).await?;
        self.write_blob(ACTIVITY_KEY, &activity).await?;
        self.write_blob(AGENTS_KEY, &self.roster.agents()).await
    }

    async fn read_state(&self) -> Result<(Vec<Task>, Vec<ActivityEntry>), BoardError> {
        let tasks = self.read_blob(TASKS_KEY).await?.unwrap_or_default();
        let activity = self.read_blob(ACTIVITY_KEY).await?.unwrap_or_default();
        Ok((tasks, activity))
    }
}

/// A task as the `cc_tasks` blob spells it. Reading goes through [`Task`],
/// which accepts either spelling of the due date.
#[derive(Serialize)]
struct BlobTask<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    assignee: &'a str,
    priority: &'a str,
    status: &'a str,
    #[serde(rename = "dueDate")]
    due_date: Option<&'a str>,
}

impl<'a> From<&'a Task> for BlobTask<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: &task.id,
            title: &task.title,
            description: &task.description,
            assignee: &task.assignee,
            priority: &task.priority,
            status: &task.status,
            due_date: task.due_date.as_deref(),
        }
    }
}

fn generated_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

#[async_trait]
impl PersistenceAdapter for LocalAdapter {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, BoardError> {
        Ok(self.read_blob(TASKS_KEY).await?.unwrap_or_default())
    }

    async fn fetch_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, BoardError> {
        let mut entries: Vec<ActivityEntry> =
            self.read_blob(ACTIVITY_KEY).await?.unwrap_or_default();
        let start = entries.len().saturating_sub(limit);
        Ok(entries.split_off(start))
    }

    async fn commit(&self, mutation: Mutation) -> Result<Committed, BoardError> {
        let (mut tasks, mut activity) = self.read_state().await?;

        let committed = match mutation {
            Mutation::CreateTask(payload) => {
                let task = Task {
                    id: generated_id("task"),
                    title: payload.title,
                    description: payload.description,
                    assignee: payload.assignee,
                    priority: payload.priority,
                    status: payload
                        .status
                        .unwrap_or_else(|| TaskStatus::Backlog.as_str().to_string()),
                    due_date: payload.due_date,
                };
                tasks.push(task.clone());
                Committed::Task(task)
            }
            Mutation::UpdateTask { id, payload } => {
                let task = tasks
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or(BoardError::TaskNotFound { id })?;
                task.title = payload.title;
                task.description = payload.description;
                task.assignee = payload.assignee;
                task.priority = payload.priority;
                task.due_date = payload.due_date;
                if let Some(status) = payload.status {
                    task.status = status;
                }
                Committed::Task(task.clone())
            }
            Mutation::DeleteTask { id } => {
                tasks.retain(|t| t.id != id);
                Committed::Deleted
            }
            Mutation::AppendActivity(entry) => {
                let entry = ActivityEntry {
                    id: generated_id("activity"),
                    timestamp: chrono::Local::now().to_rfc3339(),
                    agent: entry.agent_id,
                    action: entry.action,
                    details: entry.details,
                };
                activity.push(entry.clone());
                Committed::Activity(entry)
            }
        };

        self.save_state(&tasks, &activity).await?;
        Ok(committed)
    }

    fn roster(&self) -> Roster {
        self.roster.clone()
    }

    fn describe(&self) -> String {
        format!("local:{}", self.dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use command_center_common::{NewActivity, TaskPayload};
    use tempfile::TempDir;

    fn payload(title: &str) -> TaskPayload {
        TaskPayload {
            title: title.to_string(),
            description: String::new(),
            assignee: "sam".to_string(),
            priority: "low".to_string(),
            due_date: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_open_seeds_sample_missions() {
        let dir = TempDir::new().unwrap();
        let adapter = LocalAdapter::open(dir.path()).await.unwrap();
        let tasks = adapter.fetch_tasks().await.unwrap();
        assert_eq!(tasks, seed_tasks());
        assert!(adapter.blob_path(TASKS_KEY).exists());
        assert!(adapter.blob_path(ACTIVITY_KEY).exists());
        assert!(adapter.blob_path(AGENTS_KEY).exists());
    }

    #[tokio::test]
    async fn test_reopen_does_not_reseed() {
        let dir = TempDir::new().unwrap();
        let adapter = LocalAdapter::open(dir.path()).await.unwrap();
        adapter
            .commit(Mutation::DeleteTask { id: "task-1".into() })
            .await
            .unwrap();

        let reopened = LocalAdapter::open(dir.path()).await.unwrap();
        let ids: Vec<String> = reopened
            .fetch_tasks()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["task-2".to_string()]);
    }

    #[tokio::test]
    async fn test_reads_camel_case_blob() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("cc_tasks.json"),
            r#"[{"id":"task-9","title":"Old","description":"","assignee":"jeff","priority":"low","status":"active","dueDate":"2026-03-01"}]"#,
        )
        .unwrap();
        let adapter = LocalAdapter::open(dir.path()).await.unwrap();
        let tasks = adapter.fetch_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].due_date.as_deref(), Some("2026-03-01"));
    }

    #[tokio::test]
    async fn test_tasks_blob_spells_due_date_camel_case() {
        let dir = TempDir::new().unwrap();
        let adapter = LocalAdapter::open(dir.path()).await.unwrap();
        let blob = std::fs::read_to_string(adapter.blob_path(TASKS_KEY)).unwrap();
        let tasks: serde_json::Value = serde_json::from_str(&blob).unwrap();
        let first = &tasks[0];
        assert_eq!(first["dueDate"], "2026-02-05");
        assert!(first.get("due_date").is_none());
    }

    #[tokio::test]
    async fn test_create_defaults_to_backlog_with_generated_id() {
        let dir = TempDir::new().unwrap();
        let adapter = LocalAdapter::open(dir.path()).await.unwrap();
        let committed = adapter
            .commit(Mutation::CreateTask(payload("New")))
            .await
            .unwrap();
        match committed {
            Committed::Task(task) => {
                assert_eq!(task.status, "backlog");
                assert!(task.id.starts_with("task-"));
            }
            other => panic!("Expected Task, got {:?}", other),
        }
        assert_eq!(adapter.fetch_tasks().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_missing_task_fails() {
        let dir = TempDir::new().unwrap();
        let adapter = LocalAdapter::open(dir.path()).await.unwrap();
        let err = adapter
            .commit(Mutation::UpdateTask {
                id: "nope".into(),
                payload: payload("x"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::TaskNotFound { .. }));
    }

    #[tokio::test]
    async fn test_activity_is_newest_last_and_limited() {
        let dir = TempDir::new().unwrap();
        let adapter = LocalAdapter::open(dir.path()).await.unwrap();
        for i in 0..4 {
            adapter
                .commit(Mutation::AppendActivity(NewActivity {
                    agent_id: "sam".into(),
                    action: format!("Report {}", i),
                    details: None,
                }))
                .await
                .unwrap();
        }
        let recent = adapter.fetch_activity(2).await.unwrap();
        let actions: Vec<&str> = recent.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["Report 2", "Report 3"]);
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_reported() {
        let dir = TempDir::new().unwrap();
        let adapter = LocalAdapter::open(dir.path()).await.unwrap();
        std::fs::write(adapter.blob_path(TASKS_KEY), "not json").unwrap();
        let err = adapter.fetch_tasks().await.unwrap_err();
        assert!(matches!(err, BoardError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_open_writes_default_roster() {
        let dir = TempDir::new().unwrap();
        LocalAdapter::open(dir.path()).await.unwrap();
        let blob = std::fs::read_to_string(dir.path().join("cc_agents.json")).unwrap();
        let agents: Vec<Agent> = serde_json::from_str(&blob).unwrap();
        assert_eq!(agents, Roster::default().agents().to_vec());
    }
}
