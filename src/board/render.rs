//! Pure projection of board state into columns, cards and the activity feed.
//!
//! Nothing here performs I/O. [`to_text`] draws a [`BoardView`] for a
//! terminal; everything else produces plain data so the board can be printed
//! as JSON as well.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use command_center_common::{ActivityEntry, Agent, Roster, Task, TaskStatus};
use console::style;
use serde::Serialize;

/// Lines shown in the activity feed.
pub const FEED_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    High,
    Medium,
    Low,
}

impl PriorityClass {
    pub fn of(priority: &str) -> Self {
        match priority {
            "urgent" | "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: PriorityClass,
    pub assignee_name: String,
    /// `None` when the assignee is not on the roster.
    pub avatar: Option<String>,
    pub due: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnView {
    pub status: TaskStatus,
    pub column_id: String,
    pub count: usize,
    pub cards: Vec<TaskCard>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedLine {
    pub agent_name: String,
    pub time: String,
    pub action: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
    /// Tasks whose status matches no column.
    pub unplaced: Vec<TaskCard>,
    pub feed: Vec<FeedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

pub fn render_board(tasks: &[Task], activity: &[ActivityEntry], roster: &Roster) -> BoardView {
    let (columns, unplaced) = render_columns(tasks, roster);
    BoardView {
        columns,
        unplaced,
        feed: render_activity(activity, roster),
    }
}

/// One column per entry of [`TaskStatus::ALL`], cards in the order given.
/// The second value holds the tasks no column accepts.
pub fn render_columns(tasks: &[Task], roster: &Roster) -> (Vec<ColumnView>, Vec<TaskCard>) {
    let mut columns: Vec<ColumnView> = TaskStatus::ALL
        .iter()
        .map(|status| ColumnView {
            status: *status,
            column_id: status.column_id(),
            count: 0,
            cards: Vec::new(),
        })
        .collect();
    let mut unplaced = Vec::new();

    for task in tasks {
        let card = task_card(task, roster);
        match columns.iter_mut().find(|c| c.status.as_str() == task.status) {
            Some(column) => {
                column.cards.push(card);
                column.count += 1;
            }
            None => {
                tracing::warn!(task = %task.id, status = %task.status, "Task has no matching column");
                unplaced.push(card);
            }
        }
    }

    (columns, unplaced)
}

pub fn task_card(task: &Task, roster: &Roster) -> TaskCard {
    let agent = roster.get(&task.assignee);
    TaskCard {
        id: task.id.clone(),
        title: task.title.clone(),
        description: task.description.clone(),
        priority: PriorityClass::of(&task.priority),
        assignee_name: agent
            .map(|a| a.name.clone())
            .unwrap_or_else(|| task.assignee.clone()),
        avatar: agent.map(|a| a.avatar.clone()),
        due: task.due_date.as_deref().map(format_due).unwrap_or_default(),
        status: task.status.clone(),
    }
}

/// Newest first, at most [`FEED_LIMIT`] lines. `activity` is newest-last.
pub fn render_activity(activity: &[ActivityEntry], roster: &Roster) -> Vec<FeedLine> {
    activity
        .iter()
        .rev()
        .take(FEED_LIMIT)
        .map(|entry| FeedLine {
            agent_name: roster.agent_name(&entry.agent).to_string(),
            time: format_time(&entry.timestamp),
            action: entry.action.clone(),
            details: entry.details.clone(),
        })
        .collect()
}

/// Placeholder first, then every roster agent.
pub fn dropdown_options(roster: &Roster, placeholder: &str) -> Vec<SelectOption> {
    std::iter::once(SelectOption {
        value: String::new(),
        label: placeholder.to_string(),
    })
    .chain(roster.agents().iter().map(|a| SelectOption {
        value: a.id.clone(),
        label: a.name.clone(),
    }))
    .collect()
}

/// `HH:MM` in local time. SQLite `CURRENT_TIMESTAMP` values are UTC without
/// an offset. Anything unparseable is returned as-is.
pub fn format_time(timestamp: &str) -> String {
    if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S") {
        return Utc
            .from_utc_datetime(&naive)
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return dt.with_timezone(&Local).format("%H:%M").to_string();
    }
    timestamp.to_string()
}

/// `2026-02-05` -> `Feb 5`.
pub fn format_due(due: &str) -> String {
    match NaiveDate::parse_from_str(due, "%Y-%m-%d") {
        Ok(date) => date.format("%b %-d").to_string(),
        Err(_) => due.to_string(),
    }
}

pub fn to_text(view: &BoardView) -> String {
    let mut out = String::new();

    for column in &view.columns {
        out.push_str(&format!(
            "{} {}\n",
            style(column.status.as_str().to_uppercase()).bold().cyan(),
            style(format!("({})", column.count)).dim()
        ));
        if column.cards.is_empty() {
            out.push_str(&format!("  {}\n", style("(empty)").dim()));
        }
        for card in &column.cards {
            push_card(&mut out, card);
        }
        out.push('\n');
    }

    if !view.unplaced.is_empty() {
        out.push_str(&format!("{}\n", style("UNPLACED").bold().yellow()));
        for card in &view.unplaced {
            push_card(&mut out, card);
        }
        out.push('\n');
    }

    out.push_str(&format!("{}\n", style("ACTIVITY").bold().cyan()));
    if view.feed.is_empty() {
        out.push_str(&format!("  {}\n", style("(no activity)").dim()));
    }
    for line in &view.feed {
        out.push_str(&format!(
            "  {} {}: {}\n",
            style(&line.time).dim(),
            style(&line.agent_name).bold(),
            line.action
        ));
        if let Some(details) = &line.details {
            out.push_str(&format!("        {}\n", style(details).dim()));
        }
    }

    out
}

fn push_card(out: &mut String, card: &TaskCard) {
    let marker = match card.priority {
        PriorityClass::High => style("●").red(),
        PriorityClass::Medium => style("●").yellow(),
        PriorityClass::Low => style("●").green(),
    };
    out.push_str(&format!(
        "  {} {} {}\n",
        marker,
        style(&card.title).bold(),
        style(format!("[{}]", card.id)).dim()
    ));
    if !card.description.is_empty() {
        out.push_str(&format!("    {}\n", card.description));
    }
    let mut meta = card.assignee_name.clone();
    if !card.due.is_empty() {
        meta.push_str(&format!("  Due: {}", card.due));
    }
    out.push_str(&format!("    {}\n", style(meta).dim()));
}

pub fn agents_text(agents: &[Agent]) -> String {
    agents
        .iter()
        .map(|a| {
            format!(
                "{:<10} {:<22} {}\n",
                style(&a.id).bold(),
                a.role,
                style(&a.status).dim()
            )
        })
        .collect()
}
