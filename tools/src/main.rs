//! seg-runner: headless driver for corporate card segmentation.
//!
//! Usage:
//!   seg-runner seed --db cards.db --seed 42 --customers 150
//!   seg-runner analyze --db cards.db --config segmentation.json
//!   seg-runner refresh --db cards.db
//!   seg-runner segments --db cards.db
//!   seg-runner customers --db cards.db
//!   seg-runner customers --db cards.db --segment "Travel-Heavy Corporates"
//!   seg-runner customer --db cards.db --id <customer-id>
//!   seg-runner dashboard --db cards.db
//!
//! Every command prints its result as JSON on stdout.

use anyhow::{bail, Result};
use cardseg_core::{
    report::{customer_detail, customers_in_segment, dashboard_stats, list_customers, list_segments},
    seed::reset_and_seed,
    SeedConfig, SegmentationConfig, SegmentationEngine, SqliteStore,
};
use serde::Serialize;
use std::env;

#[derive(Serialize)]
struct SeedOutput {
    customers_created: usize,
    transactions_created: usize,
    segments_created: usize,
    customers_segmented: usize,
}

#[derive(Serialize)]
struct AnalyzeOutput {
    segments_created: usize,
    customers_segmented: usize,
    inertia: f64,
}

#[derive(Serialize)]
struct RefreshOutput {
    customers_refreshed: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("dashboard");
    let db = flag_value(&args, "--db").unwrap_or("cardseg.db");

    let config = match flag_value(&args, "--config") {
        Some(path) => SegmentationConfig::load(path)?,
        None => SegmentationConfig::default(),
    };
    let seed = parse_arg(&args, "--seed", config.seed);
    let limit = config.fetch_limit;

    let store = SqliteStore::open(db)?;
    store.migrate()?;
    log::info!("seg-runner: command={command} db={db} seed={seed}");

    let engine = SegmentationEngine::new(store, config)?;

    match command {
        "seed" => {
            let seed_config = SeedConfig {
                customer_count: parse_arg(&args, "--customers", SeedConfig::default().customer_count),
                ..Default::default()
            };
            let report = reset_and_seed(engine.store(), &seed_config, seed, chrono::Utc::now())?;
            let summary = engine.run_segmentation()?;
            print_json(&SeedOutput {
                customers_created: report.customers_created,
                transactions_created: report.transactions_created,
                segments_created: summary.segments_created,
                customers_segmented: summary.customers_segmented,
            })?;
        }
        "analyze" => {
            let summary = engine.run_segmentation()?;
            print_json(&AnalyzeOutput {
                segments_created: summary.segments_created,
                customers_segmented: summary.customers_segmented,
                inertia: summary.inertia,
            })?;
        }
        "refresh" => {
            let customers_refreshed = engine.refresh_customer_statistics()?;
            print_json(&RefreshOutput { customers_refreshed })?;
        }
        "segments" => print_json(&list_segments(engine.store(), limit)?)?,
        "customers" => match flag_value(&args, "--segment") {
            Some(segment) => print_json(&customers_in_segment(engine.store(), segment, limit)?)?,
            None => print_json(&list_customers(engine.store(), limit)?)?,
        },
        "customer" => {
            let Some(id) = flag_value(&args, "--id") else {
                bail!("customer requires --id <customer-id>");
            };
            match customer_detail(engine.store(), id, limit)? {
                Some(detail) => print_json(&detail)?,
                None => bail!("customer '{id}' not found"),
            }
        }
        "dashboard" => print_json(&dashboard_stats(engine.store(), limit)?)?,
        other => bail!(
            "unknown command '{other}' (expected seed|analyze|refresh|segments|customers|customer|dashboard)"
        ),
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
