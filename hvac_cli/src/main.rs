//! # hvac CLI
//!
//! Command-line front end for stored qualification reports: list them,
//! evaluate compliance, and export CSV or PDF documents.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hvac_core::store::{JsonFileStore, DEFAULT_STORE_FILE};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hvac",
    version,
    about = "Cleanroom HVAC qualification reports: compliance and documents"
)]
struct Cli {
    /// Report store file
    #[arg(long, global = true, env = "HVAC_STORE", default_value = DEFAULT_STORE_FILE)]
    store: PathBuf,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored reports with their overall outcome
    List,
    /// Evaluate a report room by room
    Evaluate {
        /// Report id
        id: String,
    },
    /// Show every test of every room of a report
    Summary {
        /// Report id
        id: String,
    },
    /// Export the report summary as CSV
    Csv {
        /// Report id
        id: String,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Render the report as PDF
    Pdf {
        /// Report id
        id: String,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Import reports from a JSON file (one report or an array)
    Import {
        /// JSON file to import
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hvac=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "hvac".to_string());
    let mut store = JsonFileStore::new(cli.store, user);

    let result = match cli.command {
        Commands::List => commands::list(&store, cli.json),
        Commands::Evaluate { id } => commands::evaluate(&store, &id, cli.json),
        Commands::Summary { id } => commands::summary(&store, &id, cli.json),
        Commands::Csv { id, output } => commands::csv(&store, &id, output),
        Commands::Pdf { id, output } => commands::pdf(&store, &id, &output),
        Commands::Import { file } => commands::import(&mut store, &file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
