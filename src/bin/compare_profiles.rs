//! Price the same work lines under every cost profile
//!
//! Usage: cargo run --bin compare_profiles -- --lines data/lines.json --eur-usd 1.08 --usd-local 950

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::Parser;

use equipment_pricing::profile::{load_profiles, loader::DEFAULT_PROFILES_PATH, ProfileId};
use equipment_pricing::{BatchOrchestrator, ExchangeRateSet, ProfileStore, WorkLine};

/// Compare headline prices across cost profiles
#[derive(Parser, Debug)]
#[command(name = "compare_profiles")]
#[command(version, about, long_about = None)]
struct Args {
    /// Work lines to price (JSON array)
    #[arg(short, long, value_name = "FILE")]
    lines: PathBuf,

    /// Cost profile sheet (CSV)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_PROFILES_PATH)]
    profiles: PathBuf,

    /// EUR to USD market rate
    #[arg(long)]
    eur_usd: f64,

    /// USD to local currency market rate
    #[arg(long)]
    usd_local: f64,

    /// Pricing year (defaults to the current year)
    #[arg(long)]
    current_year: Option<i32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let profiles = load_profiles(&args.profiles)
        .with_context(|| format!("loading profiles from {}", args.profiles.display()))?;
    let store = ProfileStore::from_profiles(profiles).context("building profile store")?;

    let raw = fs::read_to_string(&args.lines)
        .with_context(|| format!("reading {}", args.lines.display()))?;
    let lines: Vec<WorkLine> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing work lines in {}", args.lines.display()))?;

    let current_year = args.current_year.unwrap_or_else(|| Utc::now().year());
    let rates = ExchangeRateSet::new(args.eur_usd, args.usd_local);

    let listed = store.list();
    let profile_ids: Vec<ProfileId> = listed.iter().map(|p| p.id.clone()).collect();

    println!(
        "Comparing {} lines across {} profiles (pricing year {})",
        lines.len(),
        profile_ids.len(),
        current_year
    );

    let start = Instant::now();
    let orchestrator = BatchOrchestrator::new(&store);
    let comparison = orchestrator
        .compare_profiles(&lines, &profile_ids, &rates, current_year)
        .context("pricing batch")?;
    println!("Priced in {:?}\n", start.elapsed());

    println!("{:<28} {:>20} {:>8} {:>8}", "Profile", "Batch total", "Priced", "Failed");
    println!("{}", "-".repeat(68));
    for (profile, (_, result)) in listed.iter().zip(&comparison) {
        println!(
            "{:<28} {:>20.2} {:>8} {:>8}",
            profile.name,
            result.total_price(),
            result.success_count(),
            result.failure_count()
        );
    }

    // Per-line detail, one column per profile
    println!();
    print!("{:<16}", "Line");
    for profile in &listed {
        print!(" {:>20}", profile.name);
    }
    println!();
    for line in &lines {
        print!("{:<16}", line.line_id());
        for (_, result) in &comparison {
            match result.line_summary(line.line_id()) {
                Some(summary) => print!(" {:>20.2}", summary.total_price),
                None => print!(" {:>20}", "-"),
            }
        }
        println!();
    }

    Ok(())
}
