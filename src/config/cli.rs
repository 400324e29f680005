use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use url::Url;

#[derive(Parser, Debug)]
#[clap(author, version, about = "An interactive YouTube downloader built on yt-dlp")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[clap(about = "Run the interactive download menu")]
    Menu {
        #[clap(long, help = "Path to config", default_value = ".tube-dl-config.yml")]
        config_path: PathBuf,
    },

    #[clap(about = "Download a single URL with default options and exit")]
    Quick {
        #[clap(help = "URL of the video to fetch")]
        url: Url,

        #[clap(long, value_enum, default_value_t = QuickMode::Video, help = "What to fetch")]
        mode: QuickMode,

        #[clap(long, help = "Path to config", default_value = ".tube-dl-config.yml")]
        config_path: PathBuf,
    },

    #[clap(about = "Create a config file")]
    Setup {},
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum QuickMode {
    Video,
    Audio,
}
