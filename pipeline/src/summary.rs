// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Standalone cascade summary
//!
//! Reloads a persisted unified dataset and prints per-stratum cascade
//! statistics, optionally restricted to one veracity class.

use anyhow::{Context, Result};
use clap::Parser;
use misinfo_cascades::cascade::{CascadeBuilder, ParentInference};
use misinfo_cascades::integrate::UnifiedDataset;
use misinfo_cascades::metrics::MetricsEngine;
use misinfo_cascades::pipeline::DATASET_FILE;
use misinfo_cascades::records::Veracity;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cascade-summary")]
#[command(about = "Summarize cascades from a persisted unified dataset")]
#[command(version)]
struct Args {
    /// Run output directory or a unified_dataset.csv file
    #[arg(default_value = "output")]
    input: PathBuf,

    /// Only stories with this verdict (fake, real, unverified)
    #[arg(long, value_parser = parse_veracity)]
    veracity: Option<Veracity>,

    /// Parent inference (explicit_only, most_recent_prior)
    #[arg(long, default_value = "explicit_only")]
    parent_inference: String,

    /// Reach curve sampling interval in seconds
    #[arg(long, default_value_t = 3600)]
    interval: u64,

    /// Number of reach curve samples after the root
    #[arg(long, default_value_t = 48)]
    samples: usize,

    /// Also print the quality counters found during reconstruction
    #[arg(long)]
    structure: bool,
}

fn parse_veracity(raw: &str) -> Result<Veracity, String> {
    match raw.trim().to_lowercase().as_str() {
        "fake" => Ok(Veracity::Fake),
        "real" => Ok(Veracity::Real),
        "unverified" => Ok(Veracity::Unverified),
        other => Err(format!("unknown veracity '{}', expected fake, real or unverified", other)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let path = if args.input.is_dir() {
        args.input.join(DATASET_FILE)
    } else {
        args.input.clone()
    };
    let inference = ParentInference::parse(&args.parent_inference)
        .with_context(|| format!("Unknown parent inference '{}'", args.parent_inference))?;
    if args.interval == 0 || args.samples == 0 {
        anyhow::bail!("Interval and sample count must be positive");
    }

    let mut dataset = UnifiedDataset::read_csv(&path)?;
    tracing::info!("Loaded {} records from {}", dataset.len(), path.display());

    if let Some(wanted) = args.veracity {
        dataset.records.retain(|r| r.veracity == wanted);
        tracing::info!("{} records with veracity {:?}", dataset.len(), wanted);
    }
    if dataset.is_empty() {
        println!("No records to summarize.");
        return Ok(());
    }

    let stats = dataset.statistics();
    println!("\nDataset: {}", path.display());
    println!("  Records: {}", stats.total_records);
    println!("  Stories: {}", stats.stories);
    println!("  Authors: {}", stats.unique_authors);

    println!("\nAuthor labels:");
    for (name, count) in [
        ("bot", stats.bot_records),
        ("human", stats.human_records),
        ("unknown", stats.unknown_records),
    ] {
        println!("  {}: {} ({:.1}%)", name, count, count as f64 / stats.total_records as f64 * 100.0);
    }

    let (cascades, issues) = CascadeBuilder::new(inference).build_all(&dataset, true);
    let report = MetricsEngine::new(args.interval, args.samples).compute(&cascades);

    println!("\n{}", "=".repeat(70));
    println!("CASCADES BY ROOT STRATUM");
    println!("{}", "=".repeat(70));
    println!(
        "{:<10} {:>7} {:>13} {:>13} {:>11} {:>11}",
        "Stratum", "Trees", "Reach mean", "Reach median", "Depth max", "Vel/h mean"
    );
    println!("{:-<70}", "");
    for (stratum, summary) in &report.summaries {
        println!(
            "{:<10} {:>7} {:>13.2} {:>13.1} {:>11.0} {:>11.3}",
            stratum.as_str(),
            summary.reach.count,
            summary.reach.mean,
            summary.reach.median,
            summary.depth.max,
            summary.velocity.mean
        );
    }
    println!("{:-<70}", "");
    println!("\n{}", report.format());

    if args.structure {
        println!("Reconstruction:");
        println!("  orphan promotions: {}", issues.orphan_promotions);
        println!("  non-monotonic:     {}", issues.non_monotonic_edges);
        println!("  self references:   {}", issues.self_references);
    }

    Ok(())
}
