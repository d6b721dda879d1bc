use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::WorkflowConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bazarr API key, overrides the config file
    #[arg(long, env = "BAZARR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and translate subtitles for wanted episodes
    Episodes {
        #[command(flatten)]
        options: RunOptions,
    },

    /// Fetch and translate subtitles for wanted movies
    Movies {
        #[command(flatten)]
        options: RunOptions,
    },

    /// Run episodes, then movies
    All {
        #[command(flatten)]
        options: RunOptions,
    },

    /// Write a default configuration file
    Init {
        /// Output file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunOptions {
    /// Never search providers, only translate existing subtitles
    #[arg(long)]
    pub no_search: bool,

    /// Minimum provider score required to download
    #[arg(long)]
    pub min_score: Option<f64>,
}

impl RunOptions {
    pub fn apply(&self, workflow: &mut WorkflowConfig) {
        if self.no_search {
            workflow.search = false;
        }
        if let Some(min_score) = self.min_score {
            workflow.minimum_score = min_score;
        }
    }
}
