//! lanpack CLI
//!
//! Command-line front end for exporting and importing game-library packages.

mod cli_types;
mod commands;
mod error;
mod progress;
mod settings;

use std::io::Write;

use clap::Parser;
use log::LevelFilter;

use cli_types::{Cli, Commands, ConfigAction, StorageAction};
use error::CliError;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    if let Err(e) = run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

/// Install the logger. `RUST_LOG` still overrides the level derived from the flags.
fn init_logging(quiet: bool, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .target(env_logger::Target::Stdout)
        .parse_default_env();
    if !verbose {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }
    builder.init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = settings::load_settings();
    let db_path = settings::resolve_database_path(cli.db, &settings);
    let quiet = cli.quiet;

    match cli.command {
        Commands::Export {
            kind,
            id,
            output,
            selection,
            json,
        } => {
            let conn = commands::open_library(&db_path)?;
            commands::export::run_export(&conn, kind.into(), id, &output, selection, json, quiet)
        }
        Commands::Import {
            package,
            storage,
            prune,
            dry_run,
            selection,
            json,
        } => {
            let conn = commands::open_library(&db_path)?;
            let storage = storage.or(settings.import.default_storage);
            let options = lanpack_sync::ImportOptions {
                prune: prune || settings.import.prune,
            };
            commands::import::run_import(
                &conn, &package, storage, options, selection, dry_run, json, quiet,
            )
        }
        Commands::Inspect { package, json } => commands::inspect::run_inspect(&package, json),
        Commands::List { kind, json } => {
            let conn = commands::open_library(&db_path)?;
            commands::list::run_list(&conn, kind.map(Into::into), json)
        }
        Commands::Storage { action } => {
            let conn = commands::open_library(&db_path)?;
            match action {
                StorageAction::List => commands::storage::run_storage_list(&conn),
                StorageAction::Add {
                    path,
                    location_type,
                    default,
                } => commands::storage::run_storage_add(&conn, &path, location_type.into(), default),
                StorageAction::Remove { id } => commands::storage::run_storage_remove(&conn, id),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(&settings, &db_path),
            ConfigAction::Path => commands::config::run_config_path(),
            ConfigAction::SetDb { path } => commands::config::run_config_set_db(settings, path),
            ConfigAction::SetStorage { id } => {
                commands::config::run_config_set_storage(settings, id)
            }
        },
    }
}
