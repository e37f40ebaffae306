use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::Feed;

#[derive(Parser, Debug)]
#[command(name = "wikiscroll")]
#[command(about = "An endless scroll through Wikipedia, in your terminal", long_about = None)]
pub struct Cli {
    /// Feed to start with (overrides the settings file)
    #[arg(short, long, value_enum)]
    pub feed: Option<Feed>,

    /// Force dark mode (overrides auto-detection)
    #[arg(long, conflicts_with = "light")]
    pub dark: bool,

    /// Force light mode (overrides auto-detection)
    #[arg(long, conflicts_with = "dark")]
    pub light: bool,

    /// Custom config directory (default: ~/.config/wikiscroll)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging (prints log path, sets DEBUG level)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the settings file location
    Path,
    /// Print the effective settings as TOML
    Show,
}
