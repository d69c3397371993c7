use anyhow::Result;
use clap::Parser;
use match_scoring::cli::{handle_match_command, MatchCli};
use match_scoring::config::MatchServiceConfig;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr so command output stays pipeable.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = MatchCli::parse();
    let config = MatchServiceConfig::from_env();

    handle_match_command(cli, config).await
}
