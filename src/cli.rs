//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for trpc using the `clap` crate.
//! Each subcommand owns a statically typed set of options; the filter flags
//! are shared through [`FilterArgs`].
//!
//! # Commands
//!
//! - **list**: one line per selected torrent plus a total line (default)
//! - **which**: which torrent, and which file in it, a path belongs to
//! - **errors**: torrents the daemon reports an error for
//! - **files**: per-file progress of selected torrents
//! - **info**: detailed view of selected torrents
//! - **start** / **stop**: resume or pause selected torrents
//! - **verify**: hash check selected torrents
//! - **rm**: remove selected torrents, optionally with their data
//!
//! Torrents are selected by id (`12`), by path (`~/dl/Show/ep1.mkv`) or by
//! filter (`-f 'size > 1_000_000 and not complete'`).
//!
//! # Examples
//!
//! ```
//! use clap::Parser;
//! use trpc::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_from(["trpc", "list", "-i", "--sort", "size", "3"]);
//! assert!(matches!(cli.get_command(), Commands::List { .. }));
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::filter::FilterOptions;
use crate::select::{Sort, SortField};

/// Shared arguments for selecting torrents by filter
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterArgs {
    /// Filter expression; repeat to require several (e.g. -f 'size > 1000')
    #[arg(short = 'f', long = "filter", value_name = "EXPR")]
    pub filter: Vec<String>,

    /// Only torrents that are still downloading
    #[arg(short = 'i', long = "incomplete")]
    pub incomplete: bool,

    /// Only torrents whose short tracker name matches this text
    #[arg(short = 't', long = "tracker", value_name = "NAME")]
    pub tracker: Option<String>,
}

impl From<&FilterArgs> for FilterOptions {
    fn from(args: &FilterArgs) -> Self {
        Self {
            expressions: args.filter.clone(),
            incomplete: args.incomplete,
            tracker: args.tracker.clone(),
        }
    }
}

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "trpc")]
#[command(about = "Select, inspect and act on torrents on a Transmission daemon", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Suppress headers and informational output
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// More log output; repeat for more detail
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print what start, stop, verify and rm would do without doing it
    #[arg(long = "dry-run", global = true)]
    pub dry_run: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List torrents (default)
    #[command(visible_alias = "ls")]
    List {
        /// Torrent ids or paths
        #[arg(value_name = "TORRENT")]
        torrents: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Sort by age, have, id, name, progress, ratio, size or uploaded
        #[arg(long = "sort", value_name = "FIELD")]
        sort: Option<String>,

        /// Reverse the sort order
        #[arg(short = 'r', long = "reverse")]
        reverse: bool,

        /// Do not print the total line
        #[arg(short = 'n', long = "no-totals")]
        no_totals: bool,
    },

    /// Show which torrent each path belongs to
    Which {
        /// Files or directories to look up
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,

        /// Only print paths that belong to no torrent
        #[arg(short = 'm', long = "missing")]
        missing: bool,
    },

    /// Show torrents with errors
    Errors {
        /// Torrent ids or paths
        #[arg(value_name = "TORRENT")]
        torrents: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show the files of torrents
    Files {
        /// Torrent ids or paths
        #[arg(value_name = "TORRENT")]
        torrents: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show details of torrents
    Info {
        /// Torrent ids or paths
        #[arg(value_name = "TORRENT")]
        torrents: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Start stopped torrents
    Start {
        /// Torrent ids or paths
        #[arg(value_name = "TORRENT")]
        torrents: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Start now, bypassing the download queue
        #[arg(long = "now")]
        now: bool,
    },

    /// Stop running torrents
    Stop {
        /// Torrent ids or paths
        #[arg(value_name = "TORRENT")]
        torrents: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Hash check torrents
    Verify {
        /// Torrent ids or paths
        #[arg(value_name = "TORRENT")]
        torrents: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Really verify all torrents when none are named
        #[arg(long = "force-all")]
        force_all: bool,
    },

    /// Remove torrents from the daemon
    #[command(visible_alias = "remove")]
    Rm {
        /// Torrent ids or paths
        #[arg(value_name = "TORRENT")]
        torrents: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Really allow removing all torrents when none are named
        #[arg(long = "force-all")]
        force_all: bool,

        /// Delete the downloaded data as well
        #[arg(long = "nuke")]
        nuke: bool,
    },
}

impl Commands {
    /// Sort order requested by `list`, if any
    #[must_use]
    pub fn get_sort(&self) -> Option<Sort> {
        match self {
            Self::List { sort, reverse, .. } => sort
                .as_deref()
                .map(|field| Sort::new(SortField::parse(field), *reverse)),
            _ => None,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the command, defaulting to List if none specified
    #[must_use]
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::List {
            torrents: Vec::new(),
            filter: FilterArgs::default(),
            sort: None,
            reverse: false,
            no_totals: false,
        })
    }
}
