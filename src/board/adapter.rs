use async_trait::async_trait;
use command_center_common::{ActivityEntry, NewActivity, Roster, Task, TaskPayload};

use crate::errors::BoardError;

/// One write against the authoritative source.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateTask(TaskPayload),
    UpdateTask { id: String, payload: TaskPayload },
    DeleteTask { id: String },
    AppendActivity(NewActivity),
}

impl Mutation {
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::CreateTask(_) => "create_task",
            Mutation::UpdateTask { .. } => "update_task",
            Mutation::DeleteTask { .. } => "delete_task",
            Mutation::AppendActivity(_) => "append_activity",
        }
    }
}

/// What the source acknowledged. Callers must not fold this into local
/// state; the next `load()` is the only way to observe a commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Committed {
    Task(Task),
    Activity(ActivityEntry),
    Deleted,
}

/// Synchronizes a board with wherever its tasks and activity live.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Every task, in the source's order.
    async fn fetch_tasks(&self) -> Result<Vec<Task>, BoardError>;

    /// The most recent `limit` activity entries, oldest first.
    async fn fetch_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, BoardError>;

    async fn commit(&self, mutation: Mutation) -> Result<Committed, BoardError>;

    fn roster(&self) -> Roster {
        Roster::default()
    }

    /// Short label used in log lines.
    fn describe(&self) -> String;
}
