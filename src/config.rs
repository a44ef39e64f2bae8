//! Client configuration, layered defaults → `config.toml` → flags/environment.
//!
//! ```toml
//! api_url = "https://issues.example.com/api/v1"
//! data_dir = "/home/me/.local/share/issuedesk"
//! timeout_secs = 30
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SESSION_DB: &str = "session.db";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    data_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub timeout: Duration,
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let file = match &overrides.config_path {
            Some(path) => read_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_file(&path)?,
                _ => FileConfig::default(),
            },
        };
        Ok(Self::merge(file, overrides))
    }

    fn merge(file: FileConfig, overrides: &Overrides) -> Self {
        let api_url = overrides
            .api_url
            .clone()
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let data_dir = overrides
            .data_dir
            .clone()
            .or(file.data_dir)
            .unwrap_or_else(default_data_dir);
        let timeout = Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        Config {
            api_url,
            data_dir,
            timeout,
        }
    }

    pub fn session_db_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_DB)
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))
    }
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("issuedesk").join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("issuedesk")
}
