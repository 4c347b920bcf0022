// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Dataset download utility for the cascade pipeline
//!
//! Downloads and extracts the public source repositories:
//! - FakeNewsNet: PolitiFact and GossipCop story lists and crawler
//! - CoAID: COVID-19 news, claims and tweet ids
//!
//! TwiBot-22 is gated behind a request form and is only described.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "download-datasets")]
#[command(about = "Download the public misinformation datasets")]
#[command(version)]
struct Args {
    /// Datasets to download (comma-separated: fakenewsnet,coaid or 'all')
    #[arg(short, long, default_value = "all")]
    datasets: String,

    /// Data directory the pipeline reads from
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Expected archive digest as id=sha256hex (repeatable)
    #[arg(long = "expect", value_parser = parse_expectation)]
    expectations: Vec<(String, String)>,

    /// Force re-download even if files exist
    #[arg(short, long)]
    force: bool,
}

fn parse_expectation(raw: &str) -> Result<(String, String), String> {
    let (id, hash) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected id=sha256, got '{}'", raw))?;
    let hash = hash.trim().to_lowercase();
    if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("'{}' is not a SHA-256 hex digest", hash));
    }
    Ok((id.trim().to_lowercase(), hash))
}

struct DatasetDownload {
    id: &'static str,
    name: &'static str,
    url: &'static str,
    filename: &'static str,
    /// Directory under the data dir the loaders expect
    target_dir: &'static str,
}

const DATASETS: &[DatasetDownload] = &[
    DatasetDownload {
        id: "fakenewsnet",
        name: "FakeNewsNet",
        url: "https://github.com/KaiDMML/FakeNewsNet/archive/refs/heads/master.zip",
        filename: "FakeNewsNet-master.zip",
        target_dir: "FakeNewsNet",
    },
    DatasetDownload {
        id: "coaid",
        name: "CoAID",
        url: "https://github.com/cuilimeng/CoAID/archive/refs/heads/master.zip",
        filename: "CoAID-master.zip",
        target_dir: "CoAID",
    },
];

fn progress_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn download_file(url: &str, output_path: &Path) -> Result<()> {
    tracing::info!("Downloading from: {}", url);

    let mut response = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(600))
        .build()?
        .get(url)
        .send()
        .context("Failed to send request")?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status: {}", response.status());
    }

    let pb = match response.content_length() {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(progress_style(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            ));
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    // Write to a partial file so an interrupted download is never mistaken for an archive
    let partial = output_path.with_extension("part");
    let mut file = File::create(&partial).context("Failed to create output file")?;
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = response.read(&mut buffer).context("Failed to read response")?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])?;
        pb.inc(read as u64);
    }
    file.sync_all()?;
    std::fs::rename(&partial, output_path)
        .with_context(|| format!("Failed to move download to {}", output_path.display()))?;

    pb.finish_with_message("Downloaded");
    Ok(())
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Path inside the archive with the `<repo>-master/` prefix removed
fn strip_top_level(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(_)) => {}
        _ => return None,
    }
    let rest: PathBuf = components.collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}

fn extract_zip(archive_path: &Path, output_dir: &Path) -> Result<()> {
    tracing::info!("Extracting ZIP archive...");

    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).context("Not a valid ZIP archive")?;

    let pb = ProgressBar::new(archive.len() as u64);
    pb.set_style(progress_style("{spinner:.green} Extracting: [{wide_bar:.cyan/blue}] {pos}/{len}"));

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        pb.inc(1);

        // Entries escaping the target directory are skipped
        let Some(relative) = entry.enclosed_name().and_then(|p| strip_top_level(&p)) else {
            continue;
        };
        let outpath = output_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile =
                File::create(&outpath).with_context(|| format!("Failed to create {}", outpath.display()))?;
            std::io::copy(&mut entry, &mut outfile)?;
        }
    }

    pb.finish_with_message("Extracted");
    Ok(())
}

fn download_dataset(dataset: &DatasetDownload, args: &Args) -> Result<()> {
    tracing::info!("Processing dataset: {} ({})", dataset.name, dataset.id);

    let dataset_dir = args.output.join(dataset.target_dir);
    let archive_path = args.output.join(dataset.filename);

    if dataset_dir.exists() && !args.force {
        tracing::info!("Dataset directory already exists: {}", dataset_dir.display());
        tracing::info!("Use --force to re-download");
        return Ok(());
    }

    if !archive_path.exists() || args.force {
        download_file(dataset.url, &archive_path)?;
    } else {
        tracing::info!("Archive already exists: {}", archive_path.display());
    }

    let digest = sha256_file(&archive_path)?;
    tracing::info!("{} SHA-256: {}", dataset.filename, digest);
    if let Some((_, expected)) = args.expectations.iter().find(|(id, _)| id == dataset.id) {
        if *expected != digest {
            anyhow::bail!(
                "Checksum verification failed for {}: expected {}, got {}",
                dataset.filename,
                expected,
                digest
            );
        }
        tracing::info!("Checksum verified");
    }

    std::fs::create_dir_all(&dataset_dir)?;
    extract_zip(&archive_path, &dataset_dir)?;

    tracing::info!("Dataset ready: {}", dataset_dir.display());
    Ok(())
}

fn print_layout_notes(output: &Path) {
    println!("\n{}", "=".repeat(60));
    println!("Tweet Hydration Required");
    println!("{}", "=".repeat(60));
    println!("\nBoth repositories publish story lists and tweet ids only.");
    println!("Hydrate the tweets with the FakeNewsNet crawler, then arrange:");
    println!("  {}/FakeNewsNet/<politifact|gossipcop>/<fake|real>/<news_id>.json", output.display());
    println!("  {}/FakeNewsNet/<politifact|gossipcop>/tweets/<news_id>/<tweet_id>.json", output.display());
    println!("  {}/CoAID/news.csv, claims.csv, tweets.csv", output.display());
}

fn print_twibot_instructions(output: &Path) {
    println!("\n{}", "=".repeat(60));
    println!("TwiBot-22 - Manual Download Required");
    println!("{}", "=".repeat(60));
    println!("\nTwiBot-22 bot labels are distributed on request:");
    println!("  1. Visit: https://twibot22.github.io/");
    println!("  2. Submit the data access form");
    println!("  3. Download user.json and label.csv");
    println!("  4. Place them in: {}/TwiBot-22/\n", output.display());
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    tracing::info!("Dataset Download Utility");
    tracing::info!("========================");

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let requested: Vec<String> = if args.datasets == "all" {
        DATASETS.iter().map(|d| d.id.to_string()).collect()
    } else {
        args.datasets.split(',').map(|s| s.trim().to_lowercase()).collect()
    };

    let mut failures = 0;
    for dataset in DATASETS {
        if requested.iter().any(|r| r == dataset.id) {
            if let Err(e) = download_dataset(dataset, &args) {
                failures += 1;
                tracing::error!("Failed to download {}: {:#}", dataset.id, e);
                tracing::info!("Manual download for {}:", dataset.name);
                tracing::info!("  1. Visit: {}", dataset.url);
                tracing::info!("  2. Extract to: {}/{}/", args.output.display(), dataset.target_dir);
            }
        }
    }

    print_layout_notes(&args.output);
    print_twibot_instructions(&args.output);

    println!("{}", "=".repeat(60));
    println!("Dataset Preparation Complete");
    println!("{}", "=".repeat(60));
    println!("\nAvailable datasets in {}:", args.output.display());

    for entry in std::fs::read_dir(&args.output)?.flatten() {
        if entry.path().is_dir() {
            println!("  - {}", entry.file_name().to_string_lossy());
        }
    }

    if failures > 0 {
        anyhow::bail!("{} dataset download(s) failed", failures);
    }
    Ok(())
}
