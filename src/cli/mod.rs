//! CLI module - operator command line for Curatarr
//!
//! A thin host over the catalog services, using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::EntryKind;

/// Curatarr - movie and series catalog curation
#[derive(Parser)]
#[command(name = "curatarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a provider id to a movie or a series
    Resolve {
        /// Numeric provider id
        id: String,
    },

    /// Backfill every season of a stored series
    Sync {
        /// Series id
        id: String,
    },

    /// Refresh every stored entry (and its seasons)
    SyncAll,

    /// Search the catalog and the provider
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
        /// Only show this kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Only show entries already in the catalog
        #[arg(long)]
        catalog_only: bool,
    },

    /// Manage the trash
    Trash {
        #[command(subcommand)]
        command: TrashCommands,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum TrashCommands {
    /// List trashed records
    #[command(alias = "ls")]
    List,
    /// Move a stored entry (or request, with --request) to the trash
    #[command(alias = "rm")]
    Add {
        /// Entry id, or request id with --request
        id: String,
        #[arg(long)]
        request: bool,
    },
    /// Restore a trashed record into the catalog
    Restore {
        /// Trashed id
        id: String,
    },
    /// Permanently delete one trashed record
    Purge {
        /// Trashed id
        id: String,
    },
    /// Permanently delete everything in the trash
    Empty,
    /// Purge records older than the retention period
    Cleanup,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Movie,
    Series,
}

impl From<KindArg> for EntryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => Self::Movie,
            KindArg::Series => Self::Series,
        }
    }
}

pub use commands::*;
