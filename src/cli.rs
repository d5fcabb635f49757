use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::load::{self, LoadOptions};
use crate::commands::sync::{self, SyncOptions};
use crate::commands::verify::{self, VerifyOptions};
use crate::commands::{CommandReport, status};

#[derive(Debug, Parser)]
#[command(
    name = "passport-registrar",
    version,
    about = "Calibration-protocol intake and archive folder synchronization"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest protocol files from the inbox and attach them to passports.
    Load {
        /// Report what would happen without touching the registry.
        #[arg(long)]
        dry_run: bool,
    },
    /// Rename archive folders whose records' digests changed.
    Sync {
        /// Passport record to synchronize.
        record_id: Option<String>,
        /// Synchronize every record that has an archive path.
        #[arg(long)]
        all: bool,
    },
    /// Check archive folders against registry digests without renaming.
    Verify {
        /// Fail the report when any drift is found.
        #[arg(long)]
        strict: bool,
    },
    /// Show resolved locations, config and registry summary.
    Status,
}

fn print_report(report: &CommandReport) {
    for line in &report.details {
        println!("{line}");
    }
    for line in &report.issues {
        eprintln!("issue: {line}");
    }
    println!("command={} ok={}", report.command, report.ok);
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Load { dry_run } => load::run(&LoadOptions { dry_run })?,
        Command::Sync { record_id, all } => sync::run(&SyncOptions { record_id, all })?,
        Command::Verify { strict } => verify::run(&VerifyOptions { strict })?,
        Command::Status => status::run()?,
    };

    print_report(&report);
    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}
