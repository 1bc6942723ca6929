//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and GRNs carrying the
//! defects the reconciler repairs.
//!
//! ## Usage
//! ```bash
//! # Generate 12 GRNs (default) into DATABASE_URL
//! cargo run -p grn-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p grn-db --bin seed -- --grns 50
//!
//! # Specify database
//! cargo run -p grn-db --bin seed -- --db sqlite://./data/grn.db?mode=rwc
//! ```
//!
//! ## Generated Data
//! - Catalog items across raw material, component, sub-assembly and
//!   finished-good categories
//! - GRNs with 2-4 lines each. Every GRN is seeded in one of these states:
//!   - lines without `item_id` (all of them start unlinked)
//!   - a line whose code is not in the catalog
//!   - fully / partially / un-paid, with a stale `payment_status`
//! - No UIDs: every GRN with accepted stock starts out `Missing`

use chrono::Utc;
use std::env;

use grn_core::{CatalogItem, Grn, GrnLineItem, GrnStatus, PaymentStatus};
use grn_db::repository::grn::generate_id;
use grn_db::{Database, ReconConfig};

const TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Catalog: (code, name, category, rate in cents)
const CATALOG: &[(&str, &str, &str, i64)] = &[
    ("RM-CU-001", "Copper Wire 2.5mm", "RAW MATERIAL", 45_000),
    ("RM-AL-002", "Aluminium Sheet 1mm", "RAW MATERIAL", 32_050),
    ("RM-PVC-003", "PVC Granules", "RAW MATERIAL", 12_000),
    ("RM-STL-004", "Steel Rod 8mm", "RAW MATERIAL", 27_500),
    ("CP-PCB-010", "Controller PCB v2", "COMPONENT - PCB", 89_900),
    ("CP-RES-011", "Resistor Pack 10k", "COMPONENT", 1_250),
    ("CP-CAP-012", "Capacitor 470uF", "COMPONENT", 2_075),
    ("SA-MTR-020", "Motor Sub-Assembly", "SUB ASSEMBLY", 310_000),
    ("SA-HSG-021", "Housing Sub-Assembly", "SUB ASSEMBLY", 54_000),
    ("FG-FAN-030", "Ceiling Fan 1200mm", "FINISHED GOODS", 420_000),
];

/// Codes that appear on receipts but never made it into the catalog.
const UNKNOWN_CODES: &[&str] = &["RM-XX-999", "CP-OLD-404"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ReconConfig::load()?;

    let args: Vec<String> = env::args().collect();

    let mut grn_count: usize = 12;
    let mut database_url = config.database_url.clone();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--grns" | "-g" => {
                if i + 1 < args.len() {
                    grn_count = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    database_url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("GRN Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -g, --grns <N>     Number of GRNs to generate (default: 12)");
                println!("  -d, --db <URL>     Database URL (default: DATABASE_URL)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("GRN Seed Data Generator");
    println!("=======================");
    println!("Database: {}", database_url);
    println!("GRNs:     {}", grn_count);
    println!();

    let db = Database::connect(config.db_config().database_url(database_url)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} catalog items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (code, name, category, _) in CATALOG {
        db.catalog()
            .insert(&CatalogItem {
                id: generate_id(),
                tenant_id: TENANT_ID.to_string(),
                code: code.to_string(),
                name: name.to_string(),
                category: Some(category.to_string()),
                created_at: Utc::now(),
            })
            .await?;
    }
    println!("✓ Inserted {} catalog items", CATALOG.len());

    println!();
    println!("Generating GRNs...");

    for seed in 0..grn_count {
        let grn_number = db.grns().next_grn_number(Utc::now()).await?;
        let (grn, lines) = generate_grn(&grn_number, seed);

        db.grns().insert(&grn).await?;
        for line in &lines {
            db.grns().insert_item(line).await?;
        }

        let unlinked = lines.iter().filter(|l| l.needs_repair()).count();
        println!(
            "  {}  lines={} unlinked={} net={} paid={}",
            grn.grn_number,
            lines.len(),
            unlinked,
            grn.net_payable(),
            grn.paid()
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one GRN and its lines. `seed` picks items, quantities and the
/// defects to plant.
fn generate_grn(grn_number: &str, seed: usize) -> (Grn, Vec<GrnLineItem>) {
    let now = Utc::now();
    let grn_id = generate_id();

    let line_count = 2 + seed % 3;
    let mut lines = Vec::with_capacity(line_count);

    for n in 0..line_count {
        let (code, name, _, rate) = CATALOG[(seed * 3 + n * 7) % CATALOG.len()];
        let received = 5 + ((seed + n) * 11 % 40) as i64;
        let rejected = if (seed + n) % 4 == 0 { 2 } else { 0 };

        // Every fifth GRN carries a code the catalog has never seen.
        let item_code = if seed % 5 == 3 && n == 0 {
            UNKNOWN_CODES[seed % UNKNOWN_CODES.len()]
        } else {
            code
        };

        lines.push(GrnLineItem {
            id: generate_id(),
            grn_id: grn_id.clone(),
            item_code: item_code.to_string(),
            item_name: name.to_string(),
            item_id: None,
            accepted_qty: received - rejected,
            rejected_qty: rejected,
            rate_cents: rate,
            rejection_amount_cents: rate * rejected,
            batch_number: Some(format!("B{}-{:02}", now.format("%y%m"), seed)),
        });
    }

    let gross: i64 = lines
        .iter()
        .map(|l| (l.accepted_qty + l.rejected_qty) * l.rate_cents)
        .sum();
    let debit_note: i64 = lines.iter().map(|l| l.rejection_amount_cents).sum();
    let net_payable = gross - debit_note;

    let paid = match seed % 4 {
        0 => None,
        1 => Some(net_payable / 2),
        _ => Some(net_payable),
    };

    let grn = Grn {
        id: grn_id,
        tenant_id: TENANT_ID.to_string(),
        grn_number: grn_number.to_string(),
        status: GrnStatus::Completed,
        gross_amount_cents: gross,
        debit_note_amount_cents: debit_note,
        net_payable_amount_cents: net_payable,
        paid_amount_cents: paid,
        // Stale on purpose for paid GRNs; the reconciler corrects it.
        payment_status: PaymentStatus::Unpaid,
        created_at: now,
        updated_at: now,
    };

    (grn, lines)
}
