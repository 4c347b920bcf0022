// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Cascade pipeline CLI
//!
//! Usage:
//!   cascade-pipeline --sources synthetic --seed 42
//!   cascade-pipeline --data-dir ./data --sources politifact,gossipcop,coaid --output ./out

use anyhow::{Context, Result};
use clap::Parser;
use misinfo_cascades::cascade::ParentInference;
use misinfo_cascades::datasets::DataSource;
use misinfo_cascades::error::PipelineError;
use misinfo_cascades::pipeline::{CascadePipeline, PipelineConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cascade-pipeline")]
#[command(about = "Integrate misinformation datasets and compute bot vs human cascade metrics")]
#[command(version)]
struct Args {
    /// JSON config file; flags given on the command line override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding FakeNewsNet/, CoAID/ and TwiBot-22/
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Sources to load (comma-separated: politifact, gossipcop, coaid, synthetic)
    #[arg(short, long)]
    sources: Option<String>,

    /// Seed for the synthetic corpus
    #[arg(long)]
    seed: Option<u64>,

    /// Stories in the synthetic corpus
    #[arg(long)]
    stories: Option<usize>,

    /// Parent inference (explicit_only, most_recent_prior)
    #[arg(long)]
    parent_inference: Option<String>,

    /// Reach curve sampling interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Number of reach curve samples after the root
    #[arg(long)]
    samples: Option<usize>,

    /// Output directory for all artifacts
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace an existing output directory
    #[arg(long)]
    overwrite: bool,

    /// Build cascades on a single thread
    #[arg(long)]
    sequential: bool,
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(ref dir) = args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(ref list) = args.sources {
        let mut sources = Vec::new();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let source = DataSource::parse(name).ok_or_else(|| PipelineError::InvalidConfig {
                message: format!("unknown source '{}'", name),
            })?;
            sources.push(source);
        }
        config.sources = sources;
    }
    if let Some(seed) = args.seed {
        config.synthetic.seed = seed;
    }
    if let Some(stories) = args.stories {
        config.synthetic.stories = stories;
    }
    if let Some(ref mode) = args.parent_inference {
        config.parent_inference = ParentInference::parse(mode).ok_or_else(|| PipelineError::InvalidConfig {
            message: format!("unknown parent inference '{}'", mode),
        })?;
    }
    if let Some(interval) = args.interval {
        config.velocity_interval_secs = interval;
    }
    if let Some(samples) = args.samples {
        config.velocity_samples = samples;
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }
    if args.overwrite {
        config.overwrite = true;
    }
    if args.sequential {
        config.parallel = false;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args).context("Invalid pipeline configuration")?;

    tracing::info!("Misinformation Cascade Pipeline");
    tracing::info!("===============================");
    tracing::info!("Sources: {:?}", config.sources);
    tracing::info!("Data dir: {}", config.data_dir.display());
    tracing::info!("Parent inference: {:?}", config.parent_inference);

    let output_dir = config.output_dir.clone();
    let artifacts = CascadePipeline::new(config).run()?;

    let stats = &artifacts.statistics;
    println!("\n{}", "=".repeat(70));
    println!("CASCADE SUMMARY");
    println!("{}", "=".repeat(70));
    println!(
        "\nRecords: {}  Stories: {}  Authors: {}  Labeled: {:.1}%",
        stats.total_records,
        stats.stories,
        stats.unique_authors,
        stats.labeled_fraction() * 100.0
    );
    println!("\nCascades by root stratum:");
    println!("{:-<70}", "");
    println!(
        "{:<10} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Stratum", "Trees", "Size", "Reach", "Depth", "Vel/h", "Virality"
    );
    println!("{:-<70}", "");
    for (stratum, summary) in &artifacts.metrics.summaries {
        println!(
            "{:<10} {:>8} {:>10.2} {:>10.2} {:>10.2} {:>10.3} {:>10.3}",
            stratum.as_str(),
            summary.size.count,
            summary.size.mean,
            summary.reach.mean,
            summary.depth.mean,
            summary.velocity.mean,
            summary.virality.mean
        );
    }
    println!("{:-<70}", "");

    let quality = &artifacts.quality;
    println!(
        "\nExcluded: {} ({:.2}%)  Unresolved authors: {:.2}%  Orphans: {}  Timestamp repairs: {}",
        quality.excluded(),
        quality.exclusion_rate() * 100.0,
        quality.unresolved_rate() * 100.0,
        quality.orphan_promotions,
        quality.non_monotonic_edges + quality.self_references
    );

    let saved = CascadePipeline::persist(&artifacts, &output_dir)?;
    println!("\nArtifacts saved to: {}", saved.display());
    println!("Dataset SHA-256: {}", artifacts.digest);
    println!("\nPipeline complete!");

    Ok(())
}
