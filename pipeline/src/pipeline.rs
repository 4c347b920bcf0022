// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Reproducible cascade pipeline
//!
//! Orchestrates:
//! - Dataset loading and identity table construction
//! - Integration into the unified dataset
//! - Cascade reconstruction
//! - Metrics computation
//! - Dataset card generation
//! - All-or-nothing persistence of every artifact

use crate::cascade::{Cascade, CascadeBuilder, ParentInference};
use crate::dataset_card::{DatasetCard, DatasetCardBuilder};
use crate::datasets::{load_coaid, load_fakenewsnet, load_synthetic, load_twibot22, DataSource, RawCorpus};
use crate::error::PipelineError;
use crate::identity::IdentityTable;
use crate::integrate::{DataIntegrator, DatasetStatistics, UnifiedDataset};
use crate::metrics::{MetricsEngine, MetricsReport};
use crate::quality::QualityReport;
use crate::records::SourceDataset;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub stories: usize,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self { stories: 200, seed: 42 }
    }
}

/// Configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root holding `FakeNewsNet/`, `CoAID/` and `TwiBot-22/`
    pub data_dir: PathBuf,
    pub sources: Vec<DataSource>,
    pub synthetic: SyntheticConfig,
    pub parent_inference: ParentInference,
    /// Reach curve sampling step
    pub velocity_interval_secs: u64,
    /// Reach curve points after the root sample
    pub velocity_samples: usize,
    pub output_dir: PathBuf,
    pub overwrite: bool,
    /// Build cascades on the rayon pool, one task per story
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            sources: vec![DataSource::Synthetic],
            synthetic: SyntheticConfig::default(),
            parent_inference: ParentInference::ExplicitOnly,
            velocity_interval_secs: 3600,
            velocity_samples: 48,
            output_dir: PathBuf::from("output"),
            overwrite: false,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; absent fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::unreadable(path, e))
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.sources.is_empty() {
            return Err(PipelineError::InvalidConfig {
                message: "no sources selected".to_string(),
            });
        }
        if self.velocity_interval_secs == 0 {
            return Err(PipelineError::InvalidConfig {
                message: "velocity interval must be positive".to_string(),
            });
        }
        if self.velocity_samples == 0 {
            return Err(PipelineError::InvalidConfig {
                message: "velocity sample count must be positive".to_string(),
            });
        }
        if self.sources.contains(&DataSource::Synthetic) && self.synthetic.stories == 0 {
            return Err(PipelineError::InvalidConfig {
                message: "synthetic source needs at least one story".to_string(),
            });
        }
        Ok(())
    }
}

/// Everything one run produces, held in memory until persisted
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub config: PipelineConfig,
    pub dataset: UnifiedDataset,
    pub statistics: DatasetStatistics,
    pub quality: QualityReport,
    pub cascades: Vec<Cascade>,
    pub metrics: MetricsReport,
    pub digest: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestCounts {
    pub raw_posts: usize,
    pub records: usize,
    pub stories: usize,
    pub cascade_trees: usize,
    pub authors: usize,
}

/// Provenance record written next to the artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub config: PipelineConfig,
    pub counts: ManifestCounts,
    /// SHA-256 of `unified_dataset.csv`
    pub dataset_sha256: String,
    pub artifacts: Vec<String>,
}

pub const DATASET_FILE: &str = "unified_dataset.csv";
pub const ARTIFACT_FILES: [&str; 9] = [
    DATASET_FILE,
    "cascades.json",
    "cascade_metrics.csv",
    "metrics.json",
    "quality_report.json",
    "report.md",
    "dataset_card.md",
    "dataset_card.json",
    "manifest.json",
];

pub struct CascadePipeline {
    config: PipelineConfig,
}

impl CascadePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every configured loader and merge in source order
    pub fn load_corpus(&self) -> Result<RawCorpus> {
        let data_dir = &self.config.data_dir;
        let mut corpus = RawCorpus::default();
        let mut needs_labels = false;

        for source in &self.config.sources {
            let loaded = match source {
                DataSource::Politifact => {
                    needs_labels = true;
                    load_fakenewsnet(data_dir, SourceDataset::FakeNewsNetPolitifact)?
                }
                DataSource::Gossipcop => {
                    needs_labels = true;
                    load_fakenewsnet(data_dir, SourceDataset::FakeNewsNetGossipcop)?
                }
                DataSource::Coaid => {
                    needs_labels = true;
                    load_coaid(data_dir)?
                }
                DataSource::Synthetic => {
                    tracing::info!(
                        "Generating synthetic corpus: {} stories, seed {}",
                        self.config.synthetic.stories,
                        self.config.synthetic.seed
                    );
                    load_synthetic(self.config.synthetic.stories, self.config.synthetic.seed)
                }
            };
            tracing::info!("{:?}: {} posts, {} stories", source, loaded.posts.len(), loaded.stories.len());
            corpus.merge(loaded);
        }

        if needs_labels {
            corpus.merge(load_twibot22(data_dir)?);
        }
        Ok(corpus)
    }

    /// Run every stage and return the in-memory artifacts
    pub fn run(&self) -> Result<RunArtifacts> {
        self.config.validate()?;

        let corpus = self.load_corpus()?;
        if corpus.posts.is_empty() {
            return Err(PipelineError::EmptyInput {
                message: format!("no posts loaded from {:?} under {}", self.config.sources, self.config.data_dir.display()),
            }
            .into());
        }

        let identities = IdentityTable::build(&corpus.accounts, &corpus.bot_labels);
        if identities.is_empty() {
            tracing::warn!("No bot labels loaded; every author will be unresolved");
        }

        let integration = DataIntegrator::new(&identities).integrate(&corpus);
        let dataset = integration.dataset;
        let mut quality = integration.quality;
        if dataset.is_empty() {
            return Err(PipelineError::EmptyInput {
                message: format!("all {} raw posts were excluded", quality.raw_posts),
            }
            .into());
        }

        let (cascades, issues) =
            CascadeBuilder::new(self.config.parent_inference).build_all(&dataset, self.config.parallel);
        quality.absorb_structure(&issues);

        let metrics = MetricsEngine::new(self.config.velocity_interval_secs, self.config.velocity_samples)
            .compute(&cascades);

        let statistics = dataset.statistics();
        let digest = dataset.digest()?;

        tracing::info!(
            "Run complete: {} records, {} stories, {} cascade trees, digest {}",
            dataset.len(),
            statistics.stories,
            metrics.per_cascade.len(),
            &digest[..12.min(digest.len())]
        );

        Ok(RunArtifacts {
            config: self.config.clone(),
            dataset,
            statistics,
            quality,
            cascades,
            metrics,
            digest,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub fn generate_dataset_card(artifacts: &RunArtifacts) -> DatasetCard {
        DatasetCardBuilder::new("Unified Misinformation Cascade Dataset", &artifacts.version)
            .description(
                "Posts sharing fact-checked stories, joined with TwiBot-22 bot labels and \
                 reconstructed into per-story propagation cascades.",
            )
            .digest(&artifacts.digest)
            .statistics(&artifacts.statistics)
            .quality(&artifacts.quality)
            .add_recommendation("Report label coverage and orphan rate alongside any stratified result")
            .add_recommendation("Treat unknown-stratum cascades as a separate group, not as human")
            .build()
    }

    pub fn manifest(artifacts: &RunArtifacts) -> RunManifest {
        RunManifest {
            version: artifacts.version.clone(),
            generated_at: artifacts.timestamp,
            config: artifacts.config.clone(),
            counts: ManifestCounts {
                raw_posts: artifacts.quality.raw_posts,
                records: artifacts.dataset.len(),
                stories: artifacts.statistics.stories,
                cascade_trees: artifacts.metrics.per_cascade.len(),
                authors: artifacts.statistics.unique_authors,
            },
            dataset_sha256: artifacts.digest.clone(),
            artifacts: ARTIFACT_FILES.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Generate a markdown report
    pub fn generate_report(artifacts: &RunArtifacts) -> String {
        let mut report = String::new();
        let stats = &artifacts.statistics;

        report.push_str("# Misinformation Cascade Report\n\n");
        report.push_str(&format!("**Generated:** {}\n\n", artifacts.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push_str(&format!("**Version:** {}\n\n", artifacts.version));
        report.push_str(&format!("**Dataset SHA-256:** `{}`\n\n", artifacts.digest));

        report.push_str("## Dataset\n\n");
        let sources: Vec<&str> = stats.sources.iter().map(|s| s.as_str()).collect();
        report.push_str(&format!("- **Sources:** {}\n", sources.join(", ")));
        report.push_str(&format!("- **Records:** {}\n", stats.total_records));
        report.push_str(&format!("- **Stories:** {}\n", stats.stories));
        report.push_str(&format!("- **Authors:** {}\n", stats.unique_authors));
        report.push_str(&format!(
            "- **Labels:** bot={}, human={}, unknown={} ({:.1}% labeled)\n",
            stats.bot_records,
            stats.human_records,
            stats.unknown_records,
            stats.labeled_fraction() * 100.0
        ));
        report.push_str(&format!(
            "- **Veracity:** fake={}, real={}, unverified={}\n\n",
            stats.fake_records, stats.real_records, stats.unverified_records
        ));

        report.push_str("## Cascades by Root Stratum\n\n");
        report.push_str("| Stratum | Trees | Mean Size | Mean Reach | Median Reach | Max Depth | Mean Velocity/h | Mean Virality |\n");
        report.push_str("|---------|-------|-----------|------------|--------------|-----------|-----------------|---------------|\n");
        for (stratum, summary) in &artifacts.metrics.summaries {
            report.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {:.1} | {:.0} | {:.3} | {:.3} |\n",
                stratum,
                summary.size.count,
                summary.size.mean,
                summary.reach.mean,
                summary.reach.median,
                summary.depth.max,
                summary.velocity.mean,
                summary.virality.mean
            ));
        }
        report.push('\n');

        report.push_str("## Metrics\n\n");
        report.push_str(&format!("```\n{}```\n\n", artifacts.metrics.format()));

        report.push_str("## Data Quality\n\n");
        report.push_str(&format!("```\n{}```\n\n", artifacts.quality.format()));

        report.push_str("## Configuration\n\n");
        report.push_str(&format!(
            "```json\n{}\n```\n",
            serde_json::to_string_pretty(&artifacts.config).unwrap_or_default()
        ));

        report
    }

    fn write_artifacts(artifacts: &RunArtifacts, dir: &Path) -> Result<()> {
        artifacts.dataset.write_csv(&dir.join(DATASET_FILE))?;
        write_synced(&dir.join("cascades.json"), serde_json::to_string(&artifacts.cascades)?.as_bytes())?;
        artifacts.metrics.write_cascade_csv(&dir.join("cascade_metrics.csv"))?;
        write_synced(&dir.join("metrics.json"), serde_json::to_string_pretty(&artifacts.metrics)?.as_bytes())?;
        write_synced(
            &dir.join("quality_report.json"),
            serde_json::to_string_pretty(&artifacts.quality)?.as_bytes(),
        )?;
        write_synced(&dir.join("report.md"), Self::generate_report(artifacts).as_bytes())?;

        let card = Self::generate_dataset_card(artifacts);
        card.save(&dir.join("dataset_card.md"))?;
        card.save_json(&dir.join("dataset_card.json"))?;

        write_synced(
            &dir.join("manifest.json"),
            serde_json::to_string_pretty(&Self::manifest(artifacts))?.as_bytes(),
        )?;
        Ok(())
    }

    /// Write every artifact, replacing `output_dir` only once all of them exist
    pub fn persist(artifacts: &RunArtifacts, output_dir: &Path) -> Result<PathBuf> {
        replace_dir(output_dir, artifacts.config.overwrite, |staging| {
            Self::write_artifacts(artifacts, staging)
        })?;
        tracing::info!("Artifacts saved to {}", output_dir.display());
        Ok(output_dir.to_path_buf())
    }
}

/// Fill a fresh directory with `write`, then swap it in as `target`
///
/// Files go to a staging directory beside the target and are fsynced
/// before a rename promotes the directory. On failure the staging
/// directory is removed and the target is left as it was.
fn replace_dir<F>(target: &Path, overwrite: bool, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if target.exists() && !overwrite {
        return Err(PipelineError::OutputExists {
            path: target.to_path_buf(),
        }
        .into());
    }

    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create output parent {}", parent.display()))?;

    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let pid = std::process::id();
    let staging = parent.join(format!(".{}.staging-{}", name, pid));
    let previous = parent.join(format!(".{}.previous-{}", name, pid));

    if staging.exists() {
        std::fs::remove_dir_all(&staging)
            .with_context(|| format!("Failed to clear stale staging dir {}", staging.display()))?;
    }
    std::fs::create_dir(&staging).with_context(|| format!("Failed to create {}", staging.display()))?;

    if let Err(e) = write(&staging) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e.context("Failed to write artifacts; output left untouched"));
    }
    sync_dir(&staging);

    if let Err(e) = promote(&staging, target, &previous) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }
    sync_dir(&parent);
    Ok(())
}

/// Rename `staging` onto `target`, restoring the old target on failure
fn promote(staging: &Path, target: &Path, previous: &Path) -> Result<()> {
    let replaced = target.exists();
    if replaced {
        std::fs::rename(target, previous).with_context(|| format!("Failed to move aside {}", target.display()))?;
    }
    if let Err(e) = std::fs::rename(staging, target) {
        if replaced {
            if let Err(restore) = std::fs::rename(previous, target) {
                tracing::error!("Could not restore {} from {}: {}", target.display(), previous.display(), restore);
            }
        }
        return Err(anyhow::Error::new(e).context(format!("Failed to promote {}", target.display())));
    }

    if replaced {
        let cleanup = if previous.is_dir() {
            std::fs::remove_dir_all(previous)
        } else {
            std::fs::remove_file(previous)
        };
        if let Err(e) = cleanup {
            tracing::warn!("Could not remove previous output {}: {}", previous.display(), e);
        }
    }
    Ok(())
}

pub(crate) fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    file.sync_all().with_context(|| format!("Failed to sync {}", path.display()))?;
    Ok(())
}

/// Best effort: directories cannot be opened for syncing on every platform
fn sync_dir(dir: &Path) {
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!("Directory sync skipped for {}: {}", dir.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_config(stories: usize) -> PipelineConfig {
        PipelineConfig {
            sources: vec![DataSource::Synthetic],
            synthetic: SyntheticConfig { stories, seed: 7 },
            velocity_interval_secs: 1800,
            velocity_samples: 6,
            ..Default::default()
        }
    }

    #[test]
    fn test_pipeline_synthetic() {
        let artifacts = CascadePipeline::new(synthetic_config(25)).run().unwrap();

        assert!(!artifacts.dataset.is_empty());
        assert_eq!(artifacts.quality.emitted_records, artifacts.dataset.len());
        assert_eq!(artifacts.quality.orphan_promotions, 1);
        assert!(artifacts.quality.duplicates > 0);
        assert!(artifacts.quality.missing_timestamp > 0);
        assert_eq!(artifacts.digest.len(), 64);
    }

    #[test]
    fn test_runs_are_reproducible() {
        let first = CascadePipeline::new(synthetic_config(15)).run().unwrap();
        let second = CascadePipeline::new(synthetic_config(15)).run().unwrap();
        let sequential = CascadePipeline::new(PipelineConfig {
            parallel: false,
            ..synthetic_config(15)
        })
        .run()
        .unwrap();

        assert_eq!(first.digest, second.digest);
        assert_eq!(first.cascades, sequential.cascades);
        assert_eq!(first.metrics.per_cascade, second.metrics.per_cascade);
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let zero_interval = PipelineConfig {
            velocity_interval_secs: 0,
            ..Default::default()
        };
        assert!(matches!(zero_interval.validate(), Err(PipelineError::InvalidConfig { .. })));

        let no_sources = PipelineConfig {
            sources: vec![],
            ..Default::default()
        };
        assert!(no_sources.validate().is_err());
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_real_data_is_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            sources: vec![DataSource::Politifact, DataSource::Coaid],
            ..Default::default()
        };

        let err = CascadePipeline::new(config).run().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_config_file_with_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"sources": ["coaid"], "velocity_samples": 12}"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.sources, vec![DataSource::Coaid]);
        assert_eq!(config.velocity_samples, 12);
        assert_eq!(config.velocity_interval_secs, 3600);
    }

    #[test]
    fn test_persist_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("run");
        let artifacts = CascadePipeline::new(synthetic_config(10)).run().unwrap();

        CascadePipeline::persist(&artifacts, &output).unwrap();

        for file in ARTIFACT_FILES {
            assert!(output.join(file).is_file(), "missing {}", file);
        }
        let reloaded = UnifiedDataset::read_csv(&output.join(DATASET_FILE)).unwrap();
        assert_eq!(reloaded.digest().unwrap(), artifacts.digest);

        let manifest: RunManifest =
            serde_json::from_str(&std::fs::read_to_string(output.join("manifest.json")).unwrap()).unwrap();
        assert_eq!(manifest.dataset_sha256, artifacts.digest);
        assert_eq!(manifest.counts.records, artifacts.dataset.len());

        // No staging leftovers beside the target
        let siblings: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(siblings.len(), 1);
    }

    #[test]
    fn test_persist_refuses_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("run");
        std::fs::create_dir(&output).unwrap();
        std::fs::write(output.join("keep.txt"), "old").unwrap();

        let artifacts = CascadePipeline::new(synthetic_config(5)).run().unwrap();
        let err = CascadePipeline::persist(&artifacts, &output).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::OutputExists { .. })
        ));
        assert!(output.join("keep.txt").is_file());
    }

    #[test]
    fn test_persist_overwrite_replaces_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("run");
        std::fs::create_dir(&output).unwrap();
        std::fs::write(output.join("keep.txt"), "old").unwrap();

        let mut artifacts = CascadePipeline::new(synthetic_config(5)).run().unwrap();
        artifacts.config.overwrite = true;
        CascadePipeline::persist(&artifacts, &output).unwrap();

        assert!(!output.join("keep.txt").exists());
        assert!(output.join("manifest.json").is_file());
    }

    fn sibling_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_failed_write_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("run");
        std::fs::create_dir(&output).unwrap();
        std::fs::write(output.join("keep.txt"), "old").unwrap();

        let err = replace_dir(&output, true, |staging| {
            std::fs::write(staging.join(DATASET_FILE), "partial").unwrap();
            anyhow::bail!("disk full")
        })
        .unwrap_err();

        assert!(format!("{:#}", err).contains("disk full"));
        assert_eq!(std::fs::read_to_string(output.join("keep.txt")).unwrap(), "old");
        assert!(!output.join(DATASET_FILE).exists());
        assert_eq!(sibling_names(dir.path()), vec!["run".to_string()]);
    }

    #[test]
    fn test_failed_write_creates_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("run");

        let result = replace_dir(&output, false, |_| anyhow::bail!("serialization failed"));

        assert!(result.is_err());
        assert!(!output.exists());
        assert!(sibling_names(dir.path()).is_empty());
    }

    #[test]
    fn test_failed_promotion_restores_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("run");
        std::fs::create_dir(&output).unwrap();
        std::fs::write(output.join("keep.txt"), "old").unwrap();
        let previous = dir.path().join(".run.previous");

        // Staging directory that was never created makes the rename fail
        let result = promote(&dir.path().join(".run.staging"), &output, &previous);

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(output.join("keep.txt")).unwrap(), "old");
        assert!(!previous.exists());
        assert_eq!(sibling_names(dir.path()), vec!["run".to_string()]);
    }

    #[test]
    fn test_overwrite_replaces_file_at_target() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("run");
        std::fs::write(&output, "not a directory").unwrap();

        let mut artifacts = CascadePipeline::new(synthetic_config(5)).run().unwrap();
        artifacts.config.overwrite = true;
        CascadePipeline::persist(&artifacts, &output).unwrap();

        assert!(output.join("manifest.json").is_file());
        assert_eq!(sibling_names(dir.path()), vec!["run".to_string()]);
    }

    #[test]
    fn test_generate_report() {
        let artifacts = CascadePipeline::new(synthetic_config(8)).run().unwrap();
        let report = CascadePipeline::generate_report(&artifacts);

        assert!(report.contains("Misinformation Cascade Report"));
        assert!(report.contains("Cascades by Root Stratum"));
        assert!(report.contains("Data Quality"));
    }
}
