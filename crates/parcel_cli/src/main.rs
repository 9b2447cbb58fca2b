//! Parcel tracker CLI.
//!
//! # Responsibility
//! - Expose `parcel_core` use-cases over a SQLite file for local operation.
//! - Print results as JSON on stdout and errors on stderr.

use clap::{Parser, Subcommand};
use parcel_core::db::open_db;
use parcel_core::{
    default_log_level, init_logging, ClientId, ParcelNumber, ParcelService, ParcelStatus,
    SqliteParcelStore,
};
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Track parcel shipments stored in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "parcel_cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database file (created when missing)
    #[arg(long, global = true, default_value = "tracker.db")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new parcel for a client
    Register { client: ClientId, address: String },
    /// Show one parcel
    Get { number: ParcelNumber },
    /// List all parcels of a client
    List { client: ClientId },
    /// Overwrite the status of a parcel
    SetStatus { number: ParcelNumber, status: String },
    /// Advance a parcel to its next status
    NextStatus { number: ParcelNumber },
    /// Change the address of a registered parcel
    SetAddress { number: ParcelNumber, address: String },
    /// Delete a registered parcel
    Delete { number: ParcelNumber },
    /// Check core linkage
    Ping,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<serde_json::Value, Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    match cli.command {
        Command::Ping => Ok(ping_output()),
        command => {
            let conn = open_db(&cli.db)?;
            let service = ParcelService::new(SqliteParcelStore::try_new(&conn)?);
            run_command(&service, command)
        }
    }
}

fn run_command(
    service: &ParcelService<SqliteParcelStore<'_>>,
    command: Command,
) -> Result<serde_json::Value, Box<dyn Error>> {
    let output = match command {
        Command::Register { client, address } => {
            serde_json::to_value(service.register(client, address)?)?
        }
        Command::Get { number } => serde_json::to_value(service.get(number)?)?,
        Command::List { client } => serde_json::to_value(service.client_parcels(client)?)?,
        Command::SetStatus { number, status } => {
            let status = ParcelStatus::from(status);
            service.set_status(number, &status)?;
            json!({ "number": number, "status": status })
        }
        Command::NextStatus { number } => {
            let status = service.next_status(number)?;
            json!({ "number": number, "status": status })
        }
        Command::SetAddress { number, address } => {
            service.change_address(number, &address)?;
            json!({ "number": number, "updated": "address" })
        }
        Command::Delete { number } => {
            service.delete(number)?;
            json!({ "number": number, "deleted": true })
        }
        Command::Ping => ping_output(),
    };

    Ok(output)
}

fn ping_output() -> serde_json::Value {
    json!({
        "ping": parcel_core::ping(),
        "version": parcel_core::core_version(),
    })
}
