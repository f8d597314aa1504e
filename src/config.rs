//! Layered configuration for the server and the board client.
//!
//! Values are resolved in order, later layers winning:
//! defaults, then `config.toml`, then environment (`.env` included), then
//! CLI flags.
//!
//! ```toml
//! [server]
//! port = 3000
//! db_path = "command-center.db"
//! jwt_secret = "change-me"
//! token_ttl_hours = 24
//! cors = true
//!
//! [client]
//! server_url = "http://127.0.0.1:3000"
//! data_dir = "/home/me/.command-center"
//! operator = "chuck"
//!
//! [logging]
//! level = "info"
//! file = false
//! directory = "/var/log/command-center"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use command_center_common::Roster;
use serde::{Deserialize, Serialize};

use crate::backend::server::ServerConfig;

pub const DEFAULT_JWT_SECRET: &str = "dev_secret";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_true")]
    pub cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("command-center.db")
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_true() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            cors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Session and offline blobs. Defaults to `~/.command-center`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Agent credited with edits and deletions.
    #[serde(default = "default_operator")]
    pub operator: String,
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_operator() -> String {
    "chuck".to_string()
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            data_dir: None,
            operator: default_operator(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,
    /// Also write logs to a file under `directory`.
    #[serde(default)]
    pub file: bool,
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: false,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config.toml")
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Read `explicit` if given (it must exist), otherwise
    /// `<default data dir>/config.toml` when present, then apply the
    /// process environment.
    ///
    /// Returns the environment warnings alongside, since this runs before
    /// the tracing subscriber exists.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Vec<String>)> {
        let mut settings = match explicit {
            Some(path) => Self::load_file(path)?,
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        let warnings = settings.apply_env_from(|key| std::env::var(key).ok());
        Ok((settings, warnings))
    }

    /// Overlay `PORT`, `JWT_SECRET` and `DATABASE_PATH`. Empty values are
    /// ignored; invalid ones are reported in the returned list.
    ///
    /// `COMMAND_CENTER_SERVER` is read by the `--server` flag.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut warnings = Vec::new();

        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warnings.push(format!("Ignoring invalid PORT '{}'", port)),
            }
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.server.jwt_secret = secret;
        }
        if let Some(path) = get("DATABASE_PATH") {
            self.server.db_path = PathBuf::from(path);
        }

        warnings
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.client.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .directory
            .clone()
            .unwrap_or_else(|| self.data_dir().join("logs"))
    }

    pub fn server_config(&self) -> ServerConfig {
        if self.server.jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("JWT_SECRET is not set; signing tokens with the development secret");
        }
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            db_path: self.server.db_path.clone(),
            jwt_secret: self.server.jwt_secret.clone(),
            token_ttl_hours: self.server.token_ttl_hours,
            cors: self.server.cors,
        }
    }

    /// Problems worth telling the user about. None of them are fatal.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.client.server_url.starts_with("http://")
            && !self.client.server_url.starts_with("https://")
        {
            warnings.push(format!(
                "server_url '{}' should start with http:// or https://",
                self.client.server_url
            ));
        }
        if Roster::default().get(&self.client.operator).is_none() {
            warnings.push(format!(
                "operator '{}' is not on the agent roster",
                self.client.operator
            ));
        }
        if self.server.token_ttl_hours <= 0 {
            warnings.push(format!(
                "token_ttl_hours must be positive, got {}",
                self.server.token_ttl_hours
            ));
        }

        warnings
    }
}

pub fn default_config_path() -> PathBuf {
    default_data_dir().join(CONFIG_FILE)
}

pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".command-center"))
        .unwrap_or_else(|| PathBuf::from(".command-center"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.db_path, PathBuf::from("command-center.db"));
        assert_eq!(settings.server.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(settings.server.token_ttl_hours, 24);
        assert!(settings.server.cors);
        assert_eq!(settings.client.server_url, "http://127.0.0.1:3000");
        assert_eq!(settings.client.operator, "chuck");
        assert_eq!(settings.logging.level, "info");
        assert!(!settings.logging.file);
    }

    #[test]
    fn test_parse_sections() {
        let content = r#"
[server]
port = 8080
cors = false

[client]
server_url = "https://board.example.com"
data_dir = "/tmp/cc"
operator = "sam"

[logging]
level = "debug"
file = true
"#;
        let settings = Settings::parse(content).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.server.cors);
        assert_eq!(settings.server.token_ttl_hours, 24);
        assert_eq!(settings.client.operator, "sam");
        assert_eq!(settings.data_dir(), PathBuf::from("/tmp/cc"));
        assert_eq!(settings.log_dir(), PathBuf::from("/tmp/cc/logs"));
        assert!(settings.logging.file);
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(Settings::parse("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut settings = Settings::parse("[server]\nport = 8080").unwrap();
        let vars = env(&[
            ("PORT", "9000"),
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_PATH", "/data/board.db"),
        ]);
        let warnings = settings.apply_env_from(|k| vars.get(k).cloned());

        assert!(warnings.is_empty());
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.jwt_secret, "s3cret");
        assert_eq!(settings.server.db_path, PathBuf::from("/data/board.db"));
    }

    #[test]
    fn test_env_ignores_empty_and_invalid() {
        let mut settings = Settings::default();
        let vars = env(&[("PORT", "not-a-port"), ("JWT_SECRET", "  ")]);
        let warnings = settings.apply_env_from(|k| vars.get(k).cloned());
        assert_eq!(warnings, vec!["Ignoring invalid PORT 'not-a-port'".to_string()]);
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.jwt_secret, DEFAULT_JWT_SECRET);
    }

    #[test]
    fn test_load_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[client]\noperator = \"jeff\"").unwrap();
        let (settings, _) = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.client.operator, "jeff");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.server.port = 4321;
        settings.client.data_dir = Some(dir.path().to_path_buf());
        settings.save(&path).unwrap();

        let loaded = Settings::load_file(&path).unwrap();
        assert_eq!(loaded.server.port, 4321);
        assert_eq!(loaded.data_dir(), dir.path());
    }

    #[test]
    fn test_server_config_carries_section() {
        let mut settings = Settings::default();
        settings.server.port = 4000;
        settings.server.token_ttl_hours = 2;
        let config = settings.server_config();
        assert_eq!(config.port, 4000);
        assert_eq!(config.token_ttl_hours, 2);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_validate() {
        assert!(Settings::default().validate().is_empty());

        let mut settings = Settings::default();
        settings.client.server_url = "board:3000".into();
        settings.client.operator = "nobody".into();
        settings.server.token_ttl_hours = 0;
        assert_eq!(settings.validate().len(), 3);
    }
}
