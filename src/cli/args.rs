//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Drill-down bubble tree over a flat catalog of parent-linked items
#[derive(Parser, Debug)]
#[command(name = "bubbletree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Item catalog: TOML file with [[item]] tables
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the forest as trees
    Tree,

    /// List root nodes
    Roots,

    /// List all nodes in flat-list order
    List,

    /// List direct children of a node
    Children {
        /// Element id
        id: i64,
    },

    /// List all descendants of a node (pre-order)
    Descendants {
        /// Element id
        id: i64,
    },

    /// Case-insensitive label search
    Search {
        /// Text to look for (empty lists the unfiltered scope)
        query: String,
        /// Search only below this element
        #[arg(short, long)]
        within: Option<i64>,
        /// Maximum number of hits (default from config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Replay bubble taps from top level and show the resulting view
    Browse {
        /// Element ids tapped in order
        taps: Vec<i64>,
        /// Tap in selection mode (every tap selects)
        #[arg(short, long)]
        select: bool,
        /// Go up this many levels after the taps
        #[arg(short, long, default_value_t = 0)]
        up: usize,
        /// Search from the final position
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Report elements that do not resolve to a root
    Check,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a config template
    Template,
    /// Show config file locations
    Path,
}
