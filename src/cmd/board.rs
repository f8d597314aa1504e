//! Board view commands: `board`, `agents`, `report`.

use anyhow::{Context, Result, bail};

use command_center::board::dispatch::{AssumeYes, Dispatcher, Intent, Outcome};
use command_center::board::http::HttpAdapter;
use command_center::board::local::LocalAdapter;
use command_center::board::render;
use command_center::board::session::SessionStore;
use command_center::board::store::BoardStore;
use command_center::config::Settings;

/// Build a store over the offline blobs (`--local`) or the configured server.
pub async fn open_store(settings: &Settings, local: bool) -> Result<BoardStore> {
    let data_dir = settings.data_dir();
    if local {
        let adapter = LocalAdapter::open(&data_dir)
            .await
            .context("Failed to open offline board")?;
        return Ok(BoardStore::new(Box::new(adapter)));
    }
    let sessions = SessionStore::new(&data_dir);
    Ok(BoardStore::new(Box::new(HttpAdapter::from_session(
        &settings.client.server_url,
        sessions,
    ))))
}

/// Open and load, turning a failed load into an error the user can act on.
pub async fn load_store(settings: &Settings, local: bool) -> Result<BoardStore> {
    let mut store = open_store(settings, local).await?;
    if !store.load().await {
        fail(&store, "Failed to load the board")?;
    }
    Ok(store)
}

/// Always returns `Err`, with a login hint when credentials were rejected.
pub fn fail(store: &BoardStore, message: &str) -> Result<()> {
    if store.auth_required() {
        bail!("Not logged in or session expired. Run `command-center login <username>` first.");
    }
    bail!("{} (run with -v for details)", message)
}

pub async fn cmd_board(settings: &Settings, local: bool, json: bool) -> Result<()> {
    let store = load_store(settings, local).await?;
    let view = store.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render::to_text(&view));
    }
    Ok(())
}

pub async fn cmd_agents(settings: &Settings, local: bool) -> Result<()> {
    let store = open_store(settings, local).await?;
    print!("{}", render::agents_text(store.roster().agents()));
    Ok(())
}

pub async fn cmd_report(
    settings: &Settings,
    local: bool,
    agent: &str,
    description: &str,
) -> Result<()> {
    let mut store = load_store(settings, local).await?;
    if store.roster().get(agent).is_none() {
        tracing::warn!(agent, "Reporting agent is not on the roster");
    }
    let mut dispatcher = Dispatcher::new(&mut store, &AssumeYes, &settings.client.operator);
    let outcome = dispatcher
        .dispatch(Intent::Report {
            agent: agent.to_string(),
            description: description.to_string(),
        })
        .await;
    match outcome {
        Outcome::Applied => {
            println!("Report filed for {}", store.roster().agent_name(agent));
            Ok(())
        }
        _ => fail(&store, "Failed to file report"),
    }
}
