use command_center_common::{ActivityEntry, Roster, Task};

use super::adapter::{Committed, Mutation, PersistenceAdapter};
use super::render::{self, BoardView};
use crate::errors::BoardError;

/// Activity entries fetched by every `load()`.
pub const ACTIVITY_LIMIT: usize = 50;

/// Client-side cache of the board.
///
/// State is only ever replaced wholesale by [`BoardStore::load`]. A commit
/// never touches the cache, so every write is followed by a reload before the
/// new state can be observed.
pub struct BoardStore {
    adapter: Box<dyn PersistenceAdapter>,
    roster: Roster,
    tasks: Vec<Task>,
    activity: Vec<ActivityEntry>,
    auth_required: bool,
}

impl BoardStore {
    pub fn new(adapter: Box<dyn PersistenceAdapter>) -> Self {
        let roster = adapter.roster();
        Self {
            adapter,
            roster,
            tasks: Vec::new(),
            activity: Vec::new(),
            auth_required: false,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Oldest first.
    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Set once the source has rejected our credentials. The session token
    /// has already been discarded by then.
    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    pub fn view(&self) -> BoardView {
        render::render_board(&self.tasks, &self.activity, &self.roster)
    }

    /// Refetch tasks and recent activity, replacing the cache. Returns
    /// `false` (leaving the cache as it was) if either fetch fails.
    pub async fn load(&mut self) -> bool {
        let tasks = match self.adapter.fetch_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                self.report("fetch tasks", &e);
                return false;
            }
        };
        let activity = match self.adapter.fetch_activity(ACTIVITY_LIMIT).await {
            Ok(activity) => activity,
            Err(e) => {
                self.report("fetch activity", &e);
                return false;
            }
        };
        tracing::debug!(
            source = %self.adapter.describe(),
            tasks = tasks.len(),
            activity = activity.len(),
            "Board loaded"
        );
        self.tasks = tasks;
        self.activity = activity;
        true
    }

    /// Send one write. `None` means nothing was committed.
    pub async fn commit(&mut self, mutation: Mutation) -> Option<Committed> {
        let kind = mutation.kind();
        match self.adapter.commit(mutation).await {
            Ok(committed) => {
                tracing::debug!(mutation = kind, "Committed");
                Some(committed)
            }
            Err(e) => {
                self.report(kind, &e);
                None
            }
        }
    }

    fn report(&mut self, operation: &str, error: &BoardError) {
        if error.is_auth() {
            self.auth_required = true;
        }
        tracing::error!(
            source = %self.adapter.describe(),
            operation,
            error = %error,
            "Board request failed"
        );
    }
}
