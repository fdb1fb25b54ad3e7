use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::deepl::DEFAULT_POLL_INTERVAL;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
pub const DEFAULT_SERVER_NAME: &str = "deepl-mcp-rust";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_name: String,
    pub server_url: Option<String>,
    pub poll_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            server_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    deepl: Option<DeeplSettings>,
    documents: Option<DocumentSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeeplSettings {
    server_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentSettings {
    poll_interval_ms: Option<u64>,
}

/// Merges the settings files that exist, later files winning:
/// `./settings.toml`, `./settings.local.toml`, the same pair under
/// `~/.deepl-mcp-rust`, then `extra_path`.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    ensure_home_settings_file()?;
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }
    load_settings_from(&ordered_paths)
}

pub fn load_settings_from(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server {
            if let Some(name) = server.name {
                if !name.trim().is_empty() {
                    self.server_name = name.trim().to_string();
                }
            }
        }
        if let Some(deepl) = incoming.deepl {
            if let Some(url) = deepl.server_url {
                if !url.trim().is_empty() {
                    self.server_url = Some(url.trim().to_string());
                }
            }
        }
        if let Some(documents) = incoming.documents {
            if let Some(interval) = documents.poll_interval_ms {
                if interval > 0 {
                    self.poll_interval = Duration::from_millis(interval);
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".deepl-mcp-rust"))
        }
    })
}
