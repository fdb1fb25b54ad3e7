use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub mod deepl;
pub mod error;
pub mod languages;
pub mod logging;
pub mod mcp;
pub mod schema;
pub mod server;
pub mod settings;
pub mod tools;

#[cfg(test)]
mod test_util;

pub use deepl::{DeeplApi, DeeplClient, DeeplConfig};
pub use error::{ApiError, ToolError};
pub use mcp::McpServer;
pub use settings::Settings;
pub use tools::{ToolContext, ToolRegistry, default_registry};

pub const API_KEY_ENV: &str = "DEEPL_API_KEY";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub key: Option<String>,
    pub server_url: Option<String>,
    pub settings_path: Option<String>,
    pub http: Option<String>,
    pub show_tools: bool,
}

pub async fn run(config: Config) -> Result<()> {
    if config.show_tools {
        let registry = default_registry()?;
        for descriptor in registry.descriptors() {
            println!("{}", descriptor.name);
        }
        return Ok(());
    }

    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let mcp_server = build_server(&config, &settings)?;
    match config.http.as_deref() {
        Some(addr) => server::run_http(mcp_server, addr).await,
        None => mcp::run_stdio(&mcp_server).await,
    }
}

/// Wires a DeepL client into the default tool registry. `--server-url` wins
/// over the settings file.
pub fn build_server(config: &Config, settings: &Settings) -> Result<McpServer> {
    let client = DeeplClient::new(deepl_config(config, settings)?)
        .context("failed to create DeepL client")?;
    info!("using DeepL API at {}", client.base_url());

    let registry = default_registry().context("failed to register tools")?;
    let context = ToolContext::new(Arc::new(client));
    Ok(McpServer::new(settings.server_name.clone(), registry, context))
}

fn deepl_config(config: &Config, settings: &Settings) -> Result<DeeplConfig> {
    let key = resolve_key(config.key.as_deref())
        .ok_or_else(|| anyhow!("no DeepL API key: pass --key or set {}", API_KEY_ENV))?;
    let mut deepl_config = DeeplConfig::new(key).with_poll_interval(settings.poll_interval);
    if let Some(url) = config.server_url.as_ref().or(settings.server_url.as_ref()) {
        deepl_config = deepl_config.with_server_url(url.clone());
    }
    Ok(deepl_config)
}

fn resolve_key(key: Option<&str>) -> Option<String> {
    key.map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}
