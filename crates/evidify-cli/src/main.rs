//! Evidify CLI - build, inspect and verify export bundles offline.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{canonicalize, demo, inspect, verify};

#[derive(Parser)]
#[command(name = "evidify")]
#[command(about = "Evidify tamper-evident session ledger and bundle verifier")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify an export bundle directory
    Verify {
        /// Path to the export directory
        dir: PathBuf,
        /// Print the verifier output as JSON
        #[arg(long)]
        json: bool,
        /// Report timestamp regressions as warnings
        #[arg(long)]
        lenient_timestamps: bool,
        /// Verifier policy JSON file
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Write verifier_output.json into the bundle directory
        #[arg(long)]
        write_output: bool,
    },
    /// Show canonical bytes and content hash for input JSON
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<PathBuf>,
    },
    /// List the events of an export bundle
    Inspect {
        /// Path to the export directory
        dir: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a synthetic HUMAN_FIRST session bundle
    Demo {
        /// Output directory
        out_dir: PathBuf,
        /// Number of cases to read
        #[arg(long, default_value_t = 3)]
        cases: u32,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when embedded; keep going without ours.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Verify {
            dir,
            json,
            lenient_timestamps,
            policy,
            write_output,
        } => verify::run(dir, json, lenient_timestamps, policy, write_output),
        Commands::Canonicalize { input } => canonicalize::run(input),
        Commands::Inspect { dir, json } => inspect::run(dir, json),
        Commands::Demo { out_dir, cases } => demo::run(out_dir, cases),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
