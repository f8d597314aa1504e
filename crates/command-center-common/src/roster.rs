use crate::models::{Agent, Task};

/// The static agent roster. Not editable at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    agents: Vec<Agent>,
}

impl Roster {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Display name for an agent id, or the id itself when unknown.
    pub fn agent_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|a| a.name.as_str()).unwrap_or(id)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(default_agents())
    }
}

fn agent(id: &str, name: &str, role: &str, status: &str, avatar: &str) -> Agent {
    Agent {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        status: status.to_string(),
        avatar: avatar.to_string(),
    }
}

pub fn default_agents() -> Vec<Agent> {
    vec![
        agent("chuck", "Chuck", "CEO", "online", "img/chuck.jpeg"),
        agent("sam", "Sam", "Chief of Staff", "active", "img/samantha.png"),
        agent(
            "jeff",
            "Jeff",
            "Market Intelligence",
            "standby",
            "img/jeff-avatar.png",
        ),
        agent(
            "barbara",
            "Barbara",
            "Writing Specialist",
            "standby",
            "img/barbara-avatar.png",
        ),
    ]
}

/// Sample missions written on the first run of the offline board.
pub fn seed_tasks() -> Vec<Task> {
    vec![
        Task {
            id: "task-1".to_string(),
            title: "Market Intelligence Scan".to_string(),
            description: "Comprehensive scan of email re-engagement tools and competitors"
                .to_string(),
            assignee: "jeff".to_string(),
            priority: "high".to_string(),
            status: "assigned".to_string(),
            due_date: Some("2026-02-05".to_string()),
        },
        Task {
            id: "task-2".to_string(),
            title: "Content Creation".to_string(),
            description: "Write marketing copy for new feature announcement".to_string(),
            assignee: "barbara".to_string(),
            priority: "medium".to_string(),
            status: "backlog".to_string(),
            due_date: Some("2026-02-10".to_string()),
        },
    ]
}
