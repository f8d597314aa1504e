//! Account and session commands: `register`, `login`, `logout`.

use anyhow::{Context, Result};
use dialoguer::Password;

use command_center::board::http;
use command_center::board::session::{Session, SessionStore};
use command_center::config::Settings;
use command_center_common::Credentials;

fn read_password(given: Option<String>, confirm: bool) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }
    prompt.interact().context("Failed to read password")
}

pub async fn cmd_register(settings: &Settings, username: &str, password: Option<String>) -> Result<()> {
    let creds = Credentials {
        username: username.to_string(),
        password: read_password(password, true)?,
    };
    let user = http::register(&settings.client.server_url, &creds)
        .await
        .context("Registration failed")?;
    println!(
        "Registered {} (id {}). Run `command-center login {}` to start a session.",
        console::style(&user.username).bold(),
        user.id,
        user.username
    );
    Ok(())
}

pub async fn cmd_login(settings: &Settings, username: &str, password: Option<String>) -> Result<()> {
    let creds = Credentials {
        username: username.to_string(),
        password: read_password(password, false)?,
    };
    let resp = http::login(&settings.client.server_url, &creds)
        .await
        .context("Login failed")?;

    let sessions = SessionStore::new(&settings.data_dir());
    sessions.save(&Session {
        token: resp.token,
        username: resp.username.clone(),
    })?;
    tracing::debug!(path = %sessions.path().display(), "Session saved");
    println!(
        "Logged in as {} at {}",
        console::style(&resp.username).bold(),
        settings.client.server_url
    );
    Ok(())
}

pub fn cmd_logout(settings: &Settings) -> Result<()> {
    let sessions = SessionStore::new(&settings.data_dir());
    if sessions.clear()? {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}
