use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// The four board columns, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    Assigned,
    Active,
    Complete,
}

impl TaskStatus {
    /// Authoritative column order. Rendering and move-target validation
    /// both derive from this list.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Backlog,
        TaskStatus::Assigned,
        TaskStatus::Active,
        TaskStatus::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Assigned => "assigned",
            Self::Active => "active",
            Self::Complete => "complete",
        }
    }

    /// Identifier of the column surface a card is dropped on (`col-<status>`).
    pub fn column_id(&self) -> String {
        format!("col-{}", self.as_str())
    }

    /// Resolve a drop target. Accepts both `col-active` and bare `active`.
    pub fn from_column_id(id: &str) -> Option<Self> {
        let id = id.trim();
        let name = id.strip_prefix("col-").unwrap_or(id);
        name.parse().ok()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Self::Backlog),
            "assigned" => Ok(Self::Assigned),
            "active" => Ok(Self::Active),
            "complete" => Ok(Self::Complete),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// A fixed persona tasks can be assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    pub status: String,
    pub avatar: String,
}

/// A mission on the board.
///
/// `status` stays a plain string so that rows carrying a value outside
/// [`TaskStatus::ALL`] still load and can be reported instead of failing the
/// whole fetch. Use [`Task::column`] for the typed view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, alias = "dueDate")]
    pub due_date: Option<String>,
}

impl Task {
    pub fn column(&self) -> Option<TaskStatus> {
        self.status.parse().ok()
    }

    /// Full write payload for this task, keeping its current status.
    pub fn to_payload(&self) -> TaskPayload {
        TaskPayload {
            title: self.title.clone(),
            description: self.description.clone(),
            assignee: self.assignee.clone(),
            priority: self.priority.clone(),
            due_date: self.due_date.clone(),
            status: Some(self.status.clone()),
        }
    }
}

/// One line of the append-only activity log.
///
/// The server names the agent column `agent_id`; the offline blob names it
/// `agent`. Both deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(alias = "agent_id")]
    pub agent: String,
    pub action: String,
    #[serde(default)]
    pub details: Option<String>,
}

// ── Wire payloads ─────────────────────────────────────────────────────

/// Body of `POST /api/tasks` and `PUT /api/tasks/{id}`.
///
/// `null` is accepted wherever a field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskPayload {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assignee: String,
    #[serde(default = "default_priority", deserialize_with = "null_as_default_priority")]
    pub priority: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Body of `POST /api/activity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewActivity {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub agent_id: String,
    pub action: String,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
}

fn default_priority() -> String {
    Priority::Medium.as_str().to_string()
}

fn default_status() -> String {
    TaskStatus::Backlog.as_str().to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_priority<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_priority))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

/// Server rows carry integer ids, offline blobs carry strings.
pub fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for s in &["backlog", "assigned", "active", "complete"] {
            let parsed: TaskStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_priority_rejects_unknown() {
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
        assert!("critical".parse::<Priority>().is_err());
    }

    #[test]
    fn test_column_id_accepts_prefixed_and_bare() {
        assert_eq!(
            TaskStatus::from_column_id("col-active"),
            Some(TaskStatus::Active)
        );
        assert_eq!(
            TaskStatus::from_column_id("complete"),
            Some(TaskStatus::Complete)
        );
        assert_eq!(TaskStatus::from_column_id("col-archive"), None);
        assert_eq!(TaskStatus::Assigned.column_id(), "col-assigned");
    }

    #[test]
    fn test_status_order_is_fixed() {
        let names: Vec<&str> = TaskStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["backlog", "assigned", "active", "complete"]);
    }

    #[test]
    fn test_task_accepts_server_row() {
        let json = serde_json::json!({
            "id": 7,
            "title": "T",
            "description": "d",
            "assignee": "jeff",
            "priority": "high",
            "status": "active",
            "due_date": "2026-02-05",
            "created_at": "2026-01-01 10:00:00"
        });
        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.id, "7");
        assert_eq!(task.column(), Some(TaskStatus::Active));
        assert_eq!(task.due_date.as_deref(), Some("2026-02-05"));
    }

    #[test]
    fn test_task_accepts_camel_case_due_date() {
        let json = serde_json::json!({
            "id": "task-1",
            "title": "T",
            "status": "backlog",
            "dueDate": "2026-02-10"
        });
        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.id, "task-1");
        assert_eq!(task.due_date.as_deref(), Some("2026-02-10"));
        assert_eq!(task.priority, "medium");
    }

    #[test]
    fn test_unknown_status_survives_deserialization() {
        let json = serde_json::json!({"id": 1, "title": "x", "status": "archived"});
        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.status, "archived");
        assert_eq!(task.column(), None);
    }

    #[test]
    fn test_activity_accepts_agent_id_alias() {
        let json = serde_json::json!({
            "id": 3,
            "timestamp": "2026-01-01 10:00:00",
            "agent_id": "sam",
            "action": "Report",
            "details": null
        });
        let entry: ActivityEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.agent, "sam");
        assert_eq!(entry.details, None);
    }

    #[test]
    fn test_payload_omits_absent_status() {
        let payload = TaskPayload {
            title: "T".into(),
            description: String::new(),
            assignee: "jeff".into(),
            priority: "low".into(),
            due_date: None,
            status: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("status").is_none());
    }

    #[test]
    fn test_payload_null_fields_fall_back_to_defaults() {
        let json = serde_json::json!({
            "title": "T",
            "description": null,
            "assignee": null,
            "priority": null,
            "due_date": null
        });
        let payload: TaskPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.description, "");
        assert_eq!(payload.assignee, "");
        assert_eq!(payload.priority, "medium");
        assert_eq!(payload.due_date, None);
    }
}
