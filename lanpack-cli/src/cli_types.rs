//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lanpack_model::{RootKind, StorageLocationType};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lanpack")]
#[command(about = "Export and import portable game-library packages", long_about = None)]
pub(crate) struct Cli {
    /// Library database (defaults to the path in settings.toml)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Root kinds as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum KindArg {
    Game,
    #[value(alias = "redist")]
    Redistributable,
    Server,
    Tool,
}

impl From<KindArg> for RootKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Game => RootKind::Game,
            KindArg::Redistributable => RootKind::Redistributable,
            KindArg::Server => RootKind::Server,
            KindArg::Tool => RootKind::Tool,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LocationTypeArg {
    Archive,
    Media,
    Save,
}

impl From<LocationTypeArg> for StorageLocationType {
    fn from(t: LocationTypeArg) -> Self {
        match t {
            LocationTypeArg::Archive => StorageLocationType::Archive,
            LocationTypeArg::Media => StorageLocationType::Media,
            LocationTypeArg::Save => StorageLocationType::Save,
        }
    }
}

/// Sub-record selection shared by export and import.
#[derive(Args, Clone)]
pub(crate) struct SelectionArgs {
    /// Only these sub-record ids (comma-separated); default is everything
    #[arg(long, value_delimiter = ',')]
    pub only: Option<Vec<Uuid>>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Export a root record and its dependents to a package
    Export {
        /// Root kind
        #[arg(value_enum)]
        kind: KindArg,

        /// Root id
        id: Uuid,

        /// Package file to write
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import a package into the library
    Import {
        /// Package file to read
        package: PathBuf,

        /// Storage location that receives archive payloads
        #[arg(long)]
        storage: Option<Uuid>,

        /// Delete stored sub-records and links the package does not list
        #[arg(long)]
        prune: bool,

        /// Import and report without saving library rows (payload files are still written)
        #[arg(short = 'n', long)]
        dry_run: bool,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what a package contains without touching the library
    Inspect {
        /// Package file to read
        package: PathBuf,

        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// List root records in the library
    List {
        /// Restrict to one root kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage payload storage locations
    Storage {
        #[command(subcommand)]
        action: StorageAction,
    },

    /// Manage lanpack settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum StorageAction {
    /// List storage locations
    List,

    /// Register a directory as a storage location
    Add {
        /// Directory holding payload files
        path: PathBuf,

        /// Payload type stored there
        #[arg(long = "type", value_enum, default_value = "archive")]
        location_type: LocationTypeArg,

        /// Make this the default location for its type
        #[arg(long)]
        default: bool,
    },

    /// Remove a storage location (payload files are left on disk)
    Remove {
        /// Storage location id
        id: Uuid,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show current settings and the file they come from
    Show,

    /// Print the settings file path
    Path,

    /// Set the library database path
    SetDb {
        /// Database file
        path: PathBuf,
    },

    /// Set the default import storage location
    SetStorage {
        /// Storage location id
        id: Uuid,
    },
}
