//! Kiwi configuration (`kiwi.toml`).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::engine::ConnectOptions;
use crate::error::{KiwiError, KiwiResult};

const FILE_NAME: &str = "kiwi.toml";

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub tables: TableNames,
}

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,

    /// Connection URL, takes precedence over the fields above.
    pub url: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "root".to_string(),
            password: String::new(),
            name: "kiwi".to_string(),
            url: None,
        }
    }
}

impl DatabaseConfig {
    pub fn options(&self) -> ConnectOptions {
        match &self.url {
            Some(url) => ConnectOptions::url(url),
            None => ConnectOptions::mysql(&self.host, &self.user, &self.password, &self.name),
        }
    }
}

/// `[tables]` section: logical name → physical table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub accounts: String,
    pub sessions: String,
    pub cards: String,
    pub rooms: String,
    pub languages: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            accounts: "accounts".to_string(),
            sessions: "sessions".to_string(),
            cards: "cards".to_string(),
            rooms: "rooms".to_string(),
            languages: "languages".to_string(),
        }
    }
}

impl TableNames {
    /// Physical table for a logical name. Unknown names pass through.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        match name {
            "accounts" => &self.accounts,
            "sessions" => &self.sessions,
            "cards" => &self.cards,
            "rooms" => &self.rooms,
            "languages" => &self.languages,
            other => other,
        }
    }
}

impl FromStr for Config {
    type Err = KiwiError;

    fn from_str(content: &str) -> KiwiResult<Self> {
        toml::from_str(content).map_err(|e| KiwiError::Config(e.to_string()))
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> KiwiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| KiwiError::Config(format!("{}: {}", path.display(), e)))?;
        content.parse()
    }

    /// Load `./kiwi.toml`, then `<config dir>/kiwi/kiwi.toml`, else defaults.
    pub fn discover() -> KiwiResult<Self> {
        match Self::candidates().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("kiwi").join(FILE_NAME));
        }
        paths
    }
}
