//! CLI parse: clap types for treesync. No behavior; definitions only.

use crate::cli::output::OutputFormat;
use crate::types::ProjectId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// treesync - persisted file-tree index of git repositories
#[derive(Parser, Debug)]
#[command(name = "treesync")]
#[command(about = "Keep a persisted, LFS-aware file-tree index in sync with git working copies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (replaces global and workspace config files)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (used when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage indexed projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Refresh the file tree of one or more projects from git
    Sync {
        /// Project ids to sync
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        ids: Vec<ProjectId>,
        /// Sync every stored project
        #[arg(long)]
        all: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Remove every indexed entry of a project and reset its commit marker
    Purge {
        id: ProjectId,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// List indexed entries under a directory
    Ls {
        id: ProjectId,
        /// Directory to list
        #[arg(long, default_value = "/")]
        path: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Register a project
    Add {
        #[arg(long)]
        id: ProjectId,
        #[arg(long)]
        name: String,
        /// Clone URL (may be empty; such projects are skipped by sync)
        #[arg(long, default_value = "")]
        url: String,
    },
    /// List registered projects
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Remove a project and its entries (the working copy stays on disk)
    Remove { id: ProjectId },
}
