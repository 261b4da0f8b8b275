//! CLI for the Reptyle download renamer.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reptyle_core::config;
use std::path::PathBuf;

use commands::{run_completions, run_exclusions, run_filename, run_scrape, run_serve};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "reptyle")]
#[command(about = "Reptyle: rename members-area video downloads from page metadata", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run as the browser's native-messaging host (download coordinator).
    Serve {
        /// Directory for directly downloaded videos (default: config, then current dir).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Print the filename built from the given metadata.
    Filename {
        #[arg(long, default_value = "")]
        network: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        date: String,
        /// Actor names; joined with single spaces.
        #[arg(long, num_args = 0..)]
        actors: Vec<String>,
    },

    /// Show or edit the actor exclusion list.
    Exclusions {
        #[command(subcommand)]
        action: ExclusionsAction,
    },

    /// Run the page agent against a saved movie page.
    Scrape {
        /// Path to the saved HTML page.
        path: PathBuf,

        /// URL the page was saved from (resolves relative links).
        #[arg(long)]
        url: String,

        /// Log what would be downloaded without downloading.
        #[arg(long)]
        dry_run: bool,

        /// Directory for downloaded videos (default: config, then current dir).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ExclusionsAction {
    /// List excluded actors.
    List,
    /// Add an actor (no-op if already present, any casing).
    Add { name: String },
    /// Remove an actor (any casing).
    Remove { name: String },
    /// Restore the built-in default list.
    Reset,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Serve { download_dir } => run_serve(&cfg, download_dir).await?,
            CliCommand::Filename {
                network,
                title,
                date,
                actors,
            } => run_filename(&network, &title, &date, &actors),
            CliCommand::Exclusions { action } => run_exclusions(action)?,
            CliCommand::Scrape {
                path,
                url,
                dry_run,
                download_dir,
            } => run_scrape(&cfg, &path, &url, dry_run, download_dir).await?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

/// Download directory: flag, then config, then the current directory.
fn resolve_download_dir(cfg: &config::ReptyleConfig, flag: Option<PathBuf>) -> Result<PathBuf> {
    match flag.or_else(|| cfg.download_dir.clone()) {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

#[cfg(test)]
mod tests;
