//! Equipment Pricing CLI
//!
//! Prices a JSON list of work lines against a cost profile sheet and prints
//! one row per line, or the full keyed results with `--json`.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::Parser;

use equipment_pricing::pricing::{ImportVatTreatment, NationalTransportRate};
use equipment_pricing::profile::{load_profiles, loader::DEFAULT_PROFILES_PATH};
use equipment_pricing::{
    BatchOrchestrator, BatchOutcome, EngineConfig, FixedRateProvider, HistorySnapshotBuilder,
    ProfileStore, StandardPricingEngine, WorkLine,
};

/// Price equipment quotes from factory cost to customer price
#[derive(Parser, Debug)]
#[command(name = "quote")]
#[command(version, about, long_about = None)]
struct Args {
    /// Work lines to price (JSON array)
    #[arg(short, long, value_name = "FILE")]
    lines: PathBuf,

    /// Cost profile sheet (CSV)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_PROFILES_PATH)]
    profiles: PathBuf,

    /// Profile applied to lines without an override
    #[arg(short = 'd', long)]
    default_profile: String,

    /// EUR to USD market rate
    #[arg(long)]
    eur_usd: f64,

    /// USD to local currency market rate
    #[arg(long)]
    usd_local: f64,

    /// Pricing year (defaults to the current year)
    #[arg(long)]
    current_year: Option<i32>,

    /// Convert inland transport at the buffered USD/local rate
    #[arg(long)]
    buffered_transport: bool,

    /// Add import VAT to landed cost instead of treating it as recoverable
    #[arg(long)]
    capitalize_import_vat: bool,

    /// Write a history snapshot of the batch to this file
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Print the keyed results as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            national_transport_rate: if self.buffered_transport {
                NationalTransportRate::Buffered
            } else {
                NationalTransportRate::Unbuffered
            },
            import_vat: if self.capitalize_import_vat {
                ImportVatTreatment::Capitalized
            } else {
                ImportVatTreatment::Recoverable
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let profiles = load_profiles(&args.profiles)
        .with_context(|| format!("loading profiles from {}", args.profiles.display()))?;
    let store = ProfileStore::from_profiles(profiles).context("building profile store")?;
    log::info!("Loaded {} cost profiles", store.len());

    let raw = fs::read_to_string(&args.lines)
        .with_context(|| format!("reading {}", args.lines.display()))?;
    let lines: Vec<WorkLine> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing work lines in {}", args.lines.display()))?;

    let current_year = args.current_year.unwrap_or_else(|| Utc::now().year());
    let provider = FixedRateProvider::new(args.eur_usd, args.usd_local);

    let engine = StandardPricingEngine::new(args.engine_config());
    let orchestrator = BatchOrchestrator::with_engine(Box::new(engine), &store);
    let result = orchestrator
        .run_batch_with_provider(&lines, &args.default_profile, &provider, current_year)
        .context("pricing batch")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Equipment Pricing v{}", env!("CARGO_PKG_VERSION"));
        println!("Pricing year {}, {} lines\n", current_year, lines.len());
        println!(
            "{:<16} {:<24} {:>18} {:>18} {:>18} {:>6}",
            "Line", "Profile", "Principal", "Optionals", "Total", "Failed"
        );
        println!("{}", "-".repeat(105));
        for summary in result.line_summaries() {
            let profile_name = store
                .get_by_id(&summary.profile_id)
                .map(|p| p.name.as_str())
                .unwrap_or(summary.profile_id.as_str());
            let principal = summary
                .principal_price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "error".to_string());
            println!(
                "{:<16} {:<24} {:>18} {:>18.2} {:>18.2} {:>6}",
                summary.line_id,
                profile_name,
                principal,
                summary.optionals_price,
                summary.total_price,
                summary.failed_items
            );
        }
        println!("{}", "-".repeat(105));
        println!("{:<41} {:>56.2}", "Batch total", result.total_price());

        for (key, item) in result.items() {
            if let Some(error) = item.error() {
                println!("  {}: {}", key, error);
            }
        }
    }

    if let Some(path) = &args.snapshot {
        let used = orchestrator.profiles_used(&lines, &args.default_profile);
        let snapshot = HistorySnapshotBuilder::new().snapshot(&lines, &used, &result);
        fs::write(path, snapshot.to_json()?)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        log::info!("Snapshot written to {}", path.display());
    }

    if result.outcome() == BatchOutcome::AggregateFailure {
        bail!("every item in the batch failed to price");
    }

    Ok(())
}
