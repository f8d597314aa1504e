use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use command_center::config::Settings;

mod cmd;

const PRIORITIES: [&str; 4] = ["low", "medium", "high", "urgent"];

#[derive(Parser)]
#[command(name = "command-center")]
#[command(version, about = "Kanban command center for agent missions")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use the offline board in the data directory instead of a server
    #[arg(long, global = true)]
    pub local: bool,

    /// Board server URL (overrides config)
    #[arg(long, global = true, env = "COMMAND_CENTER_SERVER")]
    pub server: Option<String>,

    /// Directory holding the session token and offline board
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to config.toml (defaults to <data dir>/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the board server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Disable permissive CORS headers
        #[arg(long)]
        no_cors: bool,
    },
    /// Create the database schema and exit
    InitDb {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Create an account on the server
    Register {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in and save the session token
    Login {
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Discard the saved session token
    Logout,
    /// Show the board and recent activity
    Board {
        /// Print the board as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the agent roster
    Agents,
    /// File a status report for an agent
    Report { agent: String, description: String },
    /// Create, edit, move or delete missions
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum TaskCommands {
    /// Create a mission in the backlog
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Agent id; chosen from the roster on a terminal when omitted
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long, default_value = "medium", value_parser = PRIORITIES)]
        priority: String,
        /// Due date, YYYY-MM-DD
        #[arg(long, value_parser = parse_due)]
        due: Option<String>,
    },
    /// Edit a mission; omitted fields keep their current values
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long, value_parser = PRIORITIES)]
        priority: Option<String>,
        #[arg(long, value_parser = parse_due)]
        due: Option<String>,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
    },
    /// Move a mission to another column (e.g. `active` or `col-active`)
    Move { id: String, column: String },
    /// Delete a mission
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default config.toml
    Init,
}

fn parse_due(value: &str) -> Result<String, String> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| value.to_string())
        .map_err(|_| format!("expected YYYY-MM-DD, got '{}'", value))
}

impl Cli {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(server) = &self.server {
            settings.client.server_url = server.clone();
        }
        if let Some(dir) = &self.data_dir {
            settings.client.data_dir = Some(dir.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so `.env` can feed `--server`.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // `config init` may target a file that does not exist yet.
    let (mut settings, env_warnings) = match &cli.command {
        Commands::Config {
            command: Some(ConfigCommands::Init),
        } => (Settings::default(), Vec::new()),
        _ => Settings::load(cli.config.as_deref())?,
    };
    cli.apply_overrides(&mut settings);
    command_center::logging::init_tracing(&settings, cli.verbose)?;
    for warning in &env_warnings {
        tracing::warn!("{}", warning);
    }

    match &cli.command {
        Commands::Serve {
            port,
            db_path,
            no_cors,
        } => {
            if let Some(port) = port {
                settings.server.port = *port;
            }
            if let Some(db_path) = db_path {
                settings.server.db_path = db_path.clone();
            }
            if *no_cors {
                settings.server.cors = false;
            }
            cmd::cmd_serve(&settings).await?;
        }
        Commands::InitDb { db_path } => {
            if let Some(db_path) = db_path {
                settings.server.db_path = db_path.clone();
            }
            cmd::cmd_init_db(&settings)?;
        }
        Commands::Register { username, password } => {
            cmd::cmd_register(&settings, username, password.clone()).await?;
        }
        Commands::Login { username, password } => {
            cmd::cmd_login(&settings, username, password.clone()).await?;
        }
        Commands::Logout => cmd::cmd_logout(&settings)?,
        Commands::Board { json } => cmd::cmd_board(&settings, cli.local, *json).await?,
        Commands::Agents => cmd::cmd_agents(&settings, cli.local).await?,
        Commands::Report { agent, description } => {
            cmd::cmd_report(&settings, cli.local, agent, description).await?;
        }
        Commands::Task { command } => {
            cmd::cmd_task(&settings, cli.local, command.clone()).await?;
        }
        Commands::Config { command } => {
            cmd::cmd_config(&settings, cli.config.as_deref(), command.clone())?;
        }
    }

    Ok(())
}
