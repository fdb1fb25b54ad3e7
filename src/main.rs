use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "deepl-mcp-rust",
    version,
    about = "MCP server exposing DeepL translation tools"
)]
struct Cli {
    /// DeepL API key (overrides DEEPL_API_KEY)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// DeepL API base URL (e.g. a local mock or proxy)
    #[arg(long = "server-url")]
    server_url: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Serve MCP over HTTP on ADDR (e.g. 127.0.0.1:11400) instead of stdio
    #[arg(long = "http", value_name = "ADDR")]
    http: Option<String>,

    /// Print the registered tool names and exit
    #[arg(long = "show-tools")]
    show_tools: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    deepl_mcp_rust::logging::init(cli.verbose)?;
    deepl_mcp_rust::run(deepl_mcp_rust::Config {
        key: cli
            .key
            .or_else(|| std::env::var(deepl_mcp_rust::API_KEY_ENV).ok()),
        server_url: cli.server_url,
        settings_path: cli.read_settings,
        http: cli.http,
        show_tools: cli.show_tools,
    })
    .await
}
