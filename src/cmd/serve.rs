//! Board server commands: `command-center serve` and `command-center init-db`.

use anyhow::Result;

use command_center::backend::server;
use command_center::config::Settings;

pub async fn cmd_serve(settings: &Settings) -> Result<()> {
    server::start_server(settings.server_config()).await
}

pub fn cmd_init_db(settings: &Settings) -> Result<()> {
    let path = &settings.server.db_path;
    server::open_database(path)?;
    println!("Board database initialized at {}", path.display());
    Ok(())
}
