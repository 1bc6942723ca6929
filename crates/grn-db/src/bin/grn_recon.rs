//! # grn-recon
//!
//! Audits (and optionally repairs) one GRN and prints a JSON report.
//!
//! ## Usage
//! ```bash
//! # Read-only: UID audit + payment check
//! grn-recon GRN-2025-11-001
//!
//! # Repair catalog references and correct payment_status
//! grn-recon GRN-2025-11-001 --apply
//!
//! # ...and issue UIDs when the GRN has none
//! grn-recon GRN-2025-11-001 --apply --generate-uids
//!
//! # Payment calculator, no database
//! grn-recon payment 1000 100 900 500
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); the report goes to
//! stdout.

use std::env;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use grn_core::reconcile::{reconcile_payment, PaymentFigures};
use grn_db::{Database, ReconConfig, ReconcileOptions};

const USAGE: &str = "\
Usage:
  grn-recon <GRN-NUMBER> [--apply] [--generate-uids]
  grn-recon payment <GROSS> <DEBIT-NOTE> <NET-PAYABLE> [PAID]

Options:
  --apply            Repair line catalog references and payment status
  --generate-uids    Issue UIDs for a GRN that has accepted stock but none
  -h, --help         Show this help message";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let result = match args.first().map(String::as_str) {
        None | Some("--help") | Some("-h") => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Some("payment") => payment(&args[1..]),
        Some(_) => reconcile(&args).await,
    };

    match result {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "grn-recon failed");
            ExitCode::FAILURE
        }
    }
}

/// `payment <gross> <debit> <net> [paid]`
fn payment(args: &[String]) -> Result<String, Box<dyn std::error::Error>> {
    let [gross, debit_note, net_payable, rest @ ..] = args else {
        return Err(format!("expected GROSS DEBIT-NOTE NET-PAYABLE [PAID]\n\n{USAGE}").into());
    };
    if rest.len() > 1 {
        return Err(format!("unexpected argument: {}", rest[1]).into());
    }

    let figures = PaymentFigures::parse(
        gross,
        debit_note,
        net_payable,
        rest.first().map(String::as_str),
    )?;
    let recon = reconcile_payment(&figures)?;

    Ok(serde_json::to_string_pretty(&recon)?)
}

/// `<GRN-NUMBER> [--apply] [--generate-uids]`
async fn reconcile(args: &[String]) -> Result<String, Box<dyn std::error::Error>> {
    let config = ReconConfig::load()?;

    let mut grn_number = None;
    let mut options = ReconcileOptions::read_only();

    for arg in args {
        match arg.as_str() {
            "--apply" => options.apply = true,
            "--generate-uids" => options.generate_uids = Some(config.uid.clone()),
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option: {flag}\n\n{USAGE}").into());
            }
            number => {
                if grn_number.replace(number).is_some() {
                    return Err(format!("only one GRN number allowed\n\n{USAGE}").into());
                }
            }
        }
    }

    let grn_number = grn_number.ok_or_else(|| format!("missing GRN number\n\n{USAGE}"))?;

    let db = Database::connect(config.db_config()).await?;
    info!(grn_number, apply = options.apply, "Connected");

    let report = db.reconciler().reconcile(grn_number, &options).await;
    db.close().await;
    let report = report?;

    if report.needs_attention() {
        info!(grn_number = %report.grn_number, "GRN still needs attention");
    }

    Ok(serde_json::to_string_pretty(&report)?)
}
