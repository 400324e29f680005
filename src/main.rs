mod bootstrap;
mod config;
mod download;
mod generate_config;
mod menu;
mod status_bar;

// Animations and logging
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::cli::{self, Commands};
use crate::config::settings::Settings;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> crate::Result<()> {
    // Start logging
    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(indicatif_layer.get_stderr_writer())
                .compact(),
        )
        .with(indicatif_layer)
        .init();

    let cli = <cli::Cli as clap::Parser>::parse();

    match cli.command {
        Commands::Menu { config_path } => {
            let settings = Settings::load_or_default(&config_path)?;
            bootstrap::ensure_ytdlp(&settings).await?;
            menu::run(&settings).await?;
        }
        Commands::Quick {
            url,
            mode,
            config_path,
        } => {
            let settings = Settings::load_or_default(&config_path)?;
            download::run_quick(&settings, url.as_str(), mode).await?;
        }
        Commands::Setup {} => {
            generate_config::generate_config().await?;
        }
    }

    Ok(())
}
