use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpendError};
use crate::paginate::DEFAULT_PAGE_SIZE;

pub const API_URL_ENV: &str = "SPENDLOG_API_URL";
pub const CONFIG_DIR_ENV: &str = "SPENDLOG_CONFIG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:3500".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_currency() -> String {
    "Rs".to_string()
}

fn default_export_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("spendlog")
        .join("exports")
        .to_string_lossy()
        .to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            currency: default_currency(),
            export_dir: default_export_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Settings {
    /// Base URL with the environment override applied and no trailing slash.
    pub fn effective_api_url(&self) -> String {
        let url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.api_url.clone());
        url.trim().trim_end_matches('/').to_string()
    }

    pub fn export_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.export_dir))
    }
}

pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("spendlog")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &std::path::Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("ignoring unreadable settings at {}: {e}", path.display());
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn save_settings_to(path: &std::path::Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SpendError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
