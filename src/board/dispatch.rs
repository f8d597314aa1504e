use command_center_common::{NewActivity, Priority, TaskPayload, TaskStatus};

use super::adapter::Mutation;
use super::store::BoardStore;

pub const ACTION_CREATED: &str = "New Mission Assigned";
pub const ACTION_UPDATED: &str = "Updated Mission";
pub const ACTION_TERMINATED: &str = "Terminated Mission";
pub const ACTION_REPORT: &str = "Report";

pub fn moved_action(status: TaskStatus) -> String {
    format!("Moved mission to {}", status)
}

/// Asks the user to approve a destructive intent.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Approves everything (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Fields gathered for a new mission.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub assignee: String,
    pub priority: String,
    pub due_date: Option<String>,
    /// Never honoured: new missions always start in the backlog.
    pub status: Option<String>,
}

/// Edits to an existing mission. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    /// `Some("")` clears the due date.
    pub due_date: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Intent {
    CreateTask(TaskForm),
    EditTask { id: String, edit: TaskEdit },
    /// `column` is a column id (`col-active`) or a bare status.
    MoveTask { id: String, column: String },
    DeleteTask { id: String },
    Report { agent: String, description: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Written and reloaded.
    Applied,
    /// Nothing to write, e.g. a move onto the current column.
    Unchanged,
    /// Unknown task or column.
    Ignored,
    Declined,
    Failed,
}

/// Turns intents into commit + reload cycles against one store.
pub struct Dispatcher<'a> {
    store: &'a mut BoardStore,
    confirm: &'a dyn Confirm,
    operator: String,
}

impl<'a> Dispatcher<'a> {
    pub fn new(store: &'a mut BoardStore, confirm: &'a dyn Confirm, operator: &str) -> Self {
        Self {
            store,
            confirm,
            operator: operator.to_string(),
        }
    }

    pub async fn dispatch(&mut self, intent: Intent) -> Outcome {
        match intent {
            Intent::CreateTask(form) => self.create(form).await,
            Intent::EditTask { id, edit } => self.edit(&id, edit).await,
            Intent::MoveTask { id, column } => self.move_task(&id, &column).await,
            Intent::DeleteTask { id } => self.delete(&id).await,
            Intent::Report { agent, description } => {
                self.log(&agent, ACTION_REPORT, Some(description)).await;
                self.reload().await
            }
        }
    }

    async fn create(&mut self, form: TaskForm) -> Outcome {
        let priority = if form.priority.is_empty() {
            Priority::Medium.as_str().to_string()
        } else {
            form.priority
        };
        let payload = TaskPayload {
            title: form.title,
            description: form.description,
            assignee: form.assignee,
            priority,
            due_date: form.due_date,
            status: Some(TaskStatus::Backlog.as_str().to_string()),
        };
        let (assignee, title) = (payload.assignee.clone(), payload.title.clone());

        if self.store.commit(Mutation::CreateTask(payload)).await.is_none() {
            return Outcome::Failed;
        }
        self.log(&assignee, ACTION_CREATED, Some(title)).await;
        self.reload().await
    }

    async fn edit(&mut self, id: &str, edit: TaskEdit) -> Outcome {
        let Some(task) = self.store.task(id) else {
            tracing::debug!(task = id, "Edit for unknown task ignored");
            return Outcome::Ignored;
        };
        let current = task.to_payload();
        let payload = TaskPayload {
            title: edit.title.unwrap_or(current.title),
            description: edit.description.unwrap_or(current.description),
            assignee: edit.assignee.unwrap_or(current.assignee),
            priority: edit.priority.unwrap_or(current.priority),
            due_date: match edit.due_date {
                Some(due) if due.trim().is_empty() => None,
                Some(due) => Some(due),
                None => current.due_date,
            },
            status: current.status,
        };
        let title = payload.title.clone();

        let mutation = Mutation::UpdateTask {
            id: id.to_string(),
            payload,
        };
        if self.store.commit(mutation).await.is_none() {
            return Outcome::Failed;
        }
        let operator = self.operator.clone();
        self.log(&operator, ACTION_UPDATED, Some(title)).await;
        self.reload().await
    }

    async fn move_task(&mut self, id: &str, column: &str) -> Outcome {
        let Some(target) = TaskStatus::from_column_id(column) else {
            tracing::debug!(column, "Drop on unknown column ignored");
            return Outcome::Ignored;
        };
        let Some(task) = self.store.task(id) else {
            tracing::debug!(task = id, "Move for unknown task ignored");
            return Outcome::Ignored;
        };
        if task.status == target.as_str() {
            return Outcome::Unchanged;
        }

        let mut payload = task.to_payload();
        payload.status = Some(target.as_str().to_string());
        let (assignee, title) = (task.assignee.clone(), task.title.clone());

        let mutation = Mutation::UpdateTask {
            id: id.to_string(),
            payload,
        };
        if self.store.commit(mutation).await.is_none() {
            return Outcome::Failed;
        }
        self.log(&assignee, &moved_action(target), Some(title)).await;
        self.reload().await
    }

    async fn delete(&mut self, id: &str) -> Outcome {
        let Some(task) = self.store.task(id) else {
            tracing::debug!(task = id, "Delete for unknown task ignored");
            return Outcome::Ignored;
        };
        let title = task.title.clone();
        let prompt = format!(
            "Are you sure you want to delete mission \"{}\"? This cannot be undone.",
            title
        );
        if !self.confirm.confirm(&prompt) {
            return Outcome::Declined;
        }

        let mutation = Mutation::DeleteTask { id: id.to_string() };
        if self.store.commit(mutation).await.is_none() {
            return Outcome::Failed;
        }
        let operator = self.operator.clone();
        self.log(&operator, ACTION_TERMINATED, Some(title)).await;
        self.reload().await
    }

    /// The activity write is independent of the task write before it; a
    /// failure here is logged by the store and does not undo anything.
    async fn log(&mut self, agent: &str, action: &str, details: Option<String>) {
        self.store
            .commit(Mutation::AppendActivity(NewActivity {
                agent_id: agent.to_string(),
                action: action.to_string(),
                details,
            }))
            .await;
    }

    async fn reload(&mut self) -> Outcome {
        if self.store.load().await {
            Outcome::Applied
        } else {
            Outcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::local::LocalAdapter;
    use tempfile::TempDir;

    struct Deny;

    impl Confirm for Deny {
        fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    async fn loaded_store(dir: &TempDir) -> BoardStore {
        let mut store = BoardStore::new(Box::new(LocalAdapter::open(dir.path()).await.unwrap()));
        assert!(store.load().await);
        store
    }

    fn form() -> TaskForm {
        TaskForm {
            title: "T".into(),
            description: "d".into(),
            assignee: "jeff".into(),
            priority: "high".into(),
            due_date: Some("2026-02-05".into()),
            status: Some("complete".into()),
        }
    }

    fn actions(store: &BoardStore) -> Vec<String> {
        store.activity().iter().map(|e| e.action.clone()).collect()
    }

    #[tokio::test]
    async fn test_create_always_lands_in_backlog() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, "chuck");

        let outcome = dispatcher.dispatch(Intent::CreateTask(form())).await;
        assert_eq!(outcome, Outcome::Applied);

        let created = store
            .tasks()
            .iter()
            .find(|t| t.title == "T")
            .unwrap()
            .clone();
        assert_eq!(created.status, "backlog");
        assert_eq!(created.description, "d");
        assert_eq!(created.assignee, "jeff");
        assert_eq!(created.priority, "high");
        assert_eq!(created.due_date.as_deref(), Some("2026-02-05"));
        assert!(!created.id.is_empty());

        let last = store.activity().last().unwrap();
        assert_eq!(last.action, ACTION_CREATED);
        assert_eq!(last.agent, "jeff");
        assert_eq!(last.details.as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_move_to_same_column_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let before = store.activity().len();
        let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, "chuck");

        let outcome = dispatcher
            .dispatch(Intent::MoveTask {
                id: "task-1".into(),
                column: "col-assigned".into(),
            })
            .await;
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(store.activity().len(), before);
    }

    #[tokio::test]
    async fn test_move_logs_exactly_one_entry() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let before = store.activity().len();
        let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, "chuck");

        let outcome = dispatcher
            .dispatch(Intent::MoveTask {
                id: "task-1".into(),
                column: "col-active".into(),
            })
            .await;
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(store.task("task-1").unwrap().status, "active");
        assert_eq!(store.activity().len(), before + 1);

        let last = store.activity().last().unwrap();
        assert_eq!(last.action, "Moved mission to active");
        assert_eq!(last.agent, "jeff");
        assert_eq!(last.details.as_deref(), Some("Market Intelligence Scan"));
    }

    #[tokio::test]
    async fn test_move_to_unknown_column_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, "chuck");

        let outcome = dispatcher
            .dispatch(Intent::MoveTask {
                id: "task-1".into(),
                column: "col-archive".into(),
            })
            .await;
        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(store.task("task-1").unwrap().status, "assigned");
        assert!(store.activity().is_empty());
    }

    #[tokio::test]
    async fn test_delete_logs_pre_deletion_title() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, "sam");

        let outcome = dispatcher
            .dispatch(Intent::DeleteTask { id: "task-2".into() })
            .await;
        assert_eq!(outcome, Outcome::Applied);
        assert!(store.task("task-2").is_none());

        let terminated: Vec<_> = store
            .activity()
            .iter()
            .filter(|e| e.action == ACTION_TERMINATED)
            .collect();
        assert_eq!(terminated.len(), 1);
        assert_eq!(terminated[0].details.as_deref(), Some("Content Creation"));
        assert_eq!(terminated[0].agent, "sam");
    }

    #[tokio::test]
    async fn test_declined_delete_keeps_task() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let mut dispatcher = Dispatcher::new(&mut store, &Deny, "chuck");

        let outcome = dispatcher
            .dispatch(Intent::DeleteTask { id: "task-2".into() })
            .await;
        assert_eq!(outcome, Outcome::Declined);
        assert!(store.task("task-2").is_some());
        assert!(store.activity().is_empty());
    }

    #[tokio::test]
    async fn test_edit_keeps_status_and_unset_fields() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, "chuck");

        let outcome = dispatcher
            .dispatch(Intent::EditTask {
                id: "task-1".into(),
                edit: TaskEdit {
                    title: Some("Renamed".into()),
                    ..Default::default()
                },
            })
            .await;
        assert_eq!(outcome, Outcome::Applied);

        let task = store.task("task-1").unwrap();
        assert_eq!(task.title, "Renamed");
        assert_eq!(task.status, "assigned");
        assert_eq!(task.assignee, "jeff");
        assert_eq!(task.due_date.as_deref(), Some("2026-02-05"));
        assert_eq!(actions(&store), vec![ACTION_UPDATED.to_string()]);
        assert_eq!(store.activity()[0].agent, "chuck");
    }

    #[tokio::test]
    async fn test_edit_with_empty_due_date_clears_it() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, "chuck");

        let outcome = dispatcher
            .dispatch(Intent::EditTask {
                id: "task-1".into(),
                edit: TaskEdit {
                    due_date: Some(String::new()),
                    ..Default::default()
                },
            })
            .await;
        assert_eq!(outcome, Outcome::Applied);

        let task = store.task("task-1").unwrap();
        assert_eq!(task.due_date, None);
        assert_eq!(task.title, "Market Intelligence Scan");
    }

    #[tokio::test]
    async fn test_edit_unknown_task_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, "chuck");

        let outcome = dispatcher
            .dispatch(Intent::EditTask {
                id: "missing".into(),
                edit: TaskEdit::default(),
            })
            .await;
        assert_eq!(outcome, Outcome::Ignored);
    }

    #[tokio::test]
    async fn test_report_appends_entry() {
        let dir = TempDir::new().unwrap();
        let mut store = loaded_store(&dir).await;
        let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, "chuck");

        let outcome = dispatcher
            .dispatch(Intent::Report {
                agent: "barbara".into(),
                description: "Draft ready".into(),
            })
            .await;
        assert_eq!(outcome, Outcome::Applied);
        let last = store.activity().last().unwrap();
        assert_eq!(last.action, ACTION_REPORT);
        assert_eq!(last.agent, "barbara");
        assert_eq!(last.details.as_deref(), Some("Draft ready"));
    }
}
