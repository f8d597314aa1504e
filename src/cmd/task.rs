//! Mission commands: `command-center task ...`.

use std::io::IsTerminal;

use anyhow::{Context, Result, bail};
use command_center_common::Roster;
use dialoguer::Confirm as ConfirmPrompt;
use dialoguer::{Select, theme::ColorfulTheme};

use command_center::board::dispatch::{
    AssumeYes, Confirm, Dispatcher, Intent, Outcome, TaskEdit, TaskForm,
};
use command_center::board::render;
use command_center::config::Settings;

use super::super::TaskCommands;
use super::board::{fail, load_store};

/// Interactive yes/no on the terminal. Anything but an explicit yes declines.
struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        match ConfirmPrompt::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "Confirmation prompt failed");
                false
            }
        }
    }
}

/// Roster picker for `task create` without `--assignee`. Off a terminal the
/// mission stays unassigned.
fn choose_assignee(roster: &Roster) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        return Ok(String::new());
    }
    let options = render::dropdown_options(roster, "Unassigned");
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Assign to")
        .items(&labels)
        .default(0)
        .interact()
        .context("Assignee prompt failed")?;
    Ok(options
        .get(selection)
        .map(|o| o.value.clone())
        .unwrap_or_default())
}

pub async fn cmd_task(settings: &Settings, local: bool, command: TaskCommands) -> Result<()> {
    let mut store = load_store(settings, local).await?;

    let (intent, confirm, done): (Intent, &dyn Confirm, String) = match command {
        TaskCommands::Create {
            title,
            description,
            assignee,
            priority,
            due,
        } => (
            Intent::CreateTask(TaskForm {
                title: title.clone(),
                description,
                assignee: match assignee {
                    Some(assignee) => assignee,
                    None => choose_assignee(store.roster())?,
                },
                priority,
                due_date: due,
                status: None,
            }),
            &AssumeYes,
            format!("Mission \"{}\" created in backlog", title),
        ),
        TaskCommands::Edit {
            id,
            title,
            description,
            assignee,
            priority,
            due,
            clear_due,
        } => (
            Intent::EditTask {
                id: id.clone(),
                edit: TaskEdit {
                    title,
                    description,
                    assignee,
                    priority,
                    due_date: if clear_due { Some(String::new()) } else { due },
                },
            },
            &AssumeYes,
            format!("Mission {} updated", id),
        ),
        TaskCommands::Move { id, column } => (
            Intent::MoveTask {
                id: id.clone(),
                column: column.clone(),
            },
            &AssumeYes,
            format!("Moved mission {} to {}", id, column.trim_start_matches("col-")),
        ),
        TaskCommands::Delete { id, yes } => (
            Intent::DeleteTask { id: id.clone() },
            if yes {
                &AssumeYes as &dyn Confirm
            } else {
                &PromptConfirm
            },
            format!("Mission {} terminated", id),
        ),
    };

    let mut dispatcher = Dispatcher::new(&mut store, confirm, &settings.client.operator);
    let outcome = dispatcher.dispatch(intent).await;
    match outcome {
        Outcome::Applied => println!("{}", console::style(done).green()),
        Outcome::Unchanged => println!("Nothing to change."),
        Outcome::Declined => println!("Cancelled."),
        Outcome::Ignored => bail!("Unknown mission or column"),
        Outcome::Failed => fail(&store, "Board update failed")?,
    }
    Ok(())
}
