//! # kyc CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kyc_cli::flow::{run_flow, FlowArgs};
use kyc_cli::issue::{run_issue, IssueArgs};
use kyc_cli::proof::{run_verify_proof, VerifyProofArgs};

/// KYC credential pipeline CLI
///
/// Issues holder-bound credentials against a simulated chain, drives the
/// Identity, Human and Age verification flows, and verifies Merkle
/// inclusion proofs offline.
#[derive(Parser, Debug)]
#[command(name = "kyc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue a credential from a YAML or JSON payload file.
    Issue(IssueArgs),

    /// Run a verification flow end to end and issue its credential.
    Flow(FlowArgs),

    /// Verify an inclusion proof file.
    VerifyProof(VerifyProofArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Issue(args) => run_issue(&args),
        Commands::Flow(args) => run_flow(&args),
        Commands::VerifyProof(args) => run_verify_proof(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
