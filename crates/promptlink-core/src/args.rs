use crate::config::Config;
use clap::{ArgAction, Args};
use std::path::PathBuf;

// Global flags shared across every subcommand.
//
//   -c / --config      Path to a config.toml file
//   --settings-dir     Settings directory override
//   --page-url         Page the share links point at
//   --no-color         Disable coloured terminal output
//   -v / --verbose     Debug logging
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Path to a config.toml file
    #[arg(
        short = 'c',
        long,
        value_name = "PATH",
        env = "PROMPTLINK_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// Settings directory (default: ~/.promptlink)
    #[arg(
        long,
        value_name = "DIR",
        env = "PROMPTLINK_SETTINGS_DIR",
        global = true
    )]
    pub settings_dir: Option<PathBuf>,

    /// Public URL of the link page
    #[arg(long, value_name = "URL", env = "PROMPTLINK_PAGE_URL", global = true)]
    pub page_url: Option<String>,

    /// Disable coloured terminal output
    #[arg(long = "no-color", action = ArgAction::SetTrue, global = true)]
    pub no_color: bool,

    /// Debug logging on stderr
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(config) = &self.config {
            return Some(config.clone());
        }

        if let Some(settings_dir) = &self.settings_dir {
            return Some(settings_dir.join("config.toml"));
        }

        None
    }

    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(settings_dir) = &self.settings_dir {
            config.settings_dir = settings_dir.clone();
        }

        if let Some(page_url) = &self.page_url {
            config.page_url = page_url.clone();
        }
    }
}
