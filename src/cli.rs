use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;
use crate::installer::Strategy;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "caskbatch",
    about = "Install a whole category of Homebrew casks, skipping ones that failed before",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Working directory holding exclusion lists and exported Brewfiles
    #[arg(short = 'C', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Settings file (default: caskbatch.toml in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Download the cask index from this URL
    #[arg(long, global = true, conflicts_with = "index_file")]
    pub index_url: Option<String>,

    /// Read the cask index from a local JSON file instead of downloading it
    #[arg(long, global = true)]
    pub index_file: Option<PathBuf>,

    /// Source path fragment selecting the casks to install (e.g. Casks/font/)
    #[arg(long, global = true)]
    pub category: Option<String>,

    /// Homebrew executable
    #[arg(long, global = true)]
    pub brew: Option<String>,
}

impl GlobalOpts {
    /// Settings overrides carried by these options.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            dir: self.dir.clone(),
            config: self.config.clone(),
            index_url: self.index_url.clone(),
            index_file: self.index_file.clone(),
            category: self.category.clone(),
            brew: self.brew.clone(),
            timeout_secs: None,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the index, build the manifest, and install it
    Install(InstallOpts),
    /// Show what would be installed without installing anything
    Plan,
    /// Show the latest exclusion list
    History,
    /// Print version information
    Version,
    /// Generate shell completions
    Completions(CompletionsOpts),
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct InstallOpts {
    /// Skip the menu and use this strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Seconds allowed for each single-cask install (0 = no limit)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
