// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Dataset card generation for the unified dataset
//!
//! Follows the "Datasheets for Datasets" framework (Gebru et al., 2021):
//! - Motivation and intended use
//! - Composition and label coverage
//! - Collection sources and preprocessing
//! - Known quality findings and caveats

use crate::integrate::DatasetStatistics;
use crate::pipeline::write_synced;
use crate::quality::QualityReport;
use crate::records::SourceDataset;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete datasheet for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetCard {
    pub details: DatasetDetails,
    pub intended_use: IntendedUse,
    pub composition: Composition,
    pub collection: Vec<CollectionSource>,
    pub preprocessing: Preprocessing,
    pub ethical_considerations: Vec<String>,
    pub caveats: Vec<String>,
    pub recommendations: Vec<String>,
    pub card_metadata: CardMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDetails {
    pub name: String,
    pub version: String,
    pub description: String,
    pub license: String,
    pub date: DateTime<Utc>,
    /// SHA-256 of the unified table
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntendedUse {
    pub primary_uses: Vec<String>,
    pub out_of_scope_uses: Vec<String>,
}

impl Default for IntendedUse {
    fn default() -> Self {
        Self {
            primary_uses: vec![
                "Comparing spread patterns of bot-initiated and human-initiated misinformation cascades".to_string(),
                "Studying reach, depth and velocity differences between fake and real stories".to_string(),
                "Reproducible research on coordinated inauthentic amplification".to_string(),
            ],
            out_of_scope_uses: vec![
                "Classifying individual accounts as bots for enforcement".to_string(),
                "Identifying or targeting individual users".to_string(),
                "Real-time moderation decisions".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Composition {
    pub records: usize,
    pub stories: usize,
    pub authors: usize,
    pub sources: Vec<SourceDataset>,
    pub fake_records: usize,
    pub real_records: usize,
    pub unverified_records: usize,
    pub bot_records: usize,
    pub human_records: usize,
    pub unlabeled_records: usize,
    pub label_coverage: f64,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

impl From<&DatasetStatistics> for Composition {
    fn from(stats: &DatasetStatistics) -> Self {
        Self {
            records: stats.total_records,
            stories: stats.stories,
            authors: stats.unique_authors,
            sources: stats.sources.clone(),
            fake_records: stats.fake_records,
            real_records: stats.real_records,
            unverified_records: stats.unverified_records,
            bot_records: stats.bot_records,
            human_records: stats.human_records,
            unlabeled_records: stats.unknown_records,
            label_coverage: stats.labeled_fraction(),
            earliest: stats.earliest,
            latest: stats.latest,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSource {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessing {
    pub steps: Vec<String>,
    pub quality: Option<QualityReport>,
}

impl Default for Preprocessing {
    fn default() -> Self {
        Self {
            steps: vec![
                "Required fields checked: post id, story id, timestamp, author, text".to_string(),
                "Duplicate (platform, post id) pairs removed, first occurrence kept".to_string(),
                "Authors matched to bot labels by exact user id, then by normalized username".to_string(),
                "Unmatched or ambiguous authors kept with a null label".to_string(),
                "Posts whose parent was not collected promoted to cascade roots".to_string(),
            ],
            quality: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardMetadata {
    pub schema_version: String,
    pub last_updated: DateTime<Utc>,
}

impl Default for CardMetadata {
    fn default() -> Self {
        Self {
            schema_version: "1.0".to_string(),
            last_updated: Utc::now(),
        }
    }
}

pub fn describe_source(source: SourceDataset) -> CollectionSource {
    let description = match source {
        SourceDataset::FakeNewsNetPolitifact => {
            "FakeNewsNet PolitiFact subset: political claims with fact-checked verdicts and the tweets sharing them"
        }
        SourceDataset::FakeNewsNetGossipcop => {
            "FakeNewsNet GossipCop subset: entertainment stories with fact-checked verdicts and the tweets sharing them"
        }
        SourceDataset::CoAid => "CoAID: COVID-19 news and claims with verdicts and related tweets",
        SourceDataset::Synthetic => "Seeded synthetic corpus used for testing and demonstration",
    };
    CollectionSource {
        name: source.as_str().to_string(),
        description: description.to_string(),
    }
}

impl DatasetCard {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            details: DatasetDetails {
                name: name.to_string(),
                version: version.to_string(),
                description: String::new(),
                license: "AGPL-3.0-or-later".to_string(),
                date: Utc::now(),
                digest: None,
            },
            intended_use: IntendedUse::default(),
            composition: Composition::default(),
            collection: Vec::new(),
            preprocessing: Preprocessing::default(),
            ethical_considerations: vec![
                "Bot labels come from TwiBot-22 and inherit its annotation errors".to_string(),
                "Post text is retained verbatim and may contain personal information".to_string(),
            ],
            caveats: vec![
                "Deleted or protected posts are absent, so some cascades are truncated".to_string(),
            ],
            recommendations: Vec::new(),
            card_metadata: CardMetadata::default(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# Dataset Card: {}\n\n", self.details.name));

        md.push_str("## Dataset Details\n\n");
        md.push_str(&format!("- **Version:** {}\n", self.details.version));
        md.push_str(&format!("- **License:** {}\n", self.details.license));
        md.push_str(&format!("- **Date:** {}\n", self.details.date.format("%Y-%m-%d")));
        if let Some(ref digest) = self.details.digest {
            md.push_str(&format!("- **SHA-256:** `{}`\n", digest));
        }
        if !self.details.description.is_empty() {
            md.push_str(&format!("\n{}\n", self.details.description));
        }
        md.push('\n');

        md.push_str("## Intended Use\n\n");
        for use_case in &self.intended_use.primary_uses {
            md.push_str(&format!("- {}\n", use_case));
        }
        md.push_str("\n### Out-of-Scope Uses\n\n");
        for oos in &self.intended_use.out_of_scope_uses {
            md.push_str(&format!("- {}\n", oos));
        }
        md.push('\n');

        let c = &self.composition;
        md.push_str("## Composition\n\n");
        md.push_str("| Field | Value |\n");
        md.push_str("|-------|-------|\n");
        md.push_str(&format!("| Records | {} |\n", c.records));
        md.push_str(&format!("| Stories | {} |\n", c.stories));
        md.push_str(&format!("| Authors | {} |\n", c.authors));
        md.push_str(&format!("| Fake / Real / Unverified | {} / {} / {} |\n", c.fake_records, c.real_records, c.unverified_records));
        md.push_str(&format!("| Bot / Human / Unlabeled | {} / {} / {} |\n", c.bot_records, c.human_records, c.unlabeled_records));
        md.push_str(&format!("| Label coverage | {:.1}% |\n", c.label_coverage * 100.0));
        if let (Some(first), Some(last)) = (c.earliest, c.latest) {
            md.push_str(&format!("| Time span | {} to {} |\n", first.format("%Y-%m-%d"), last.format("%Y-%m-%d")));
        }
        md.push('\n');

        md.push_str("## Collection\n\n");
        for source in &self.collection {
            md.push_str(&format!("- **{}:** {}\n", source.name, source.description));
        }
        md.push('\n');

        md.push_str("## Preprocessing\n\n");
        for step in &self.preprocessing.steps {
            md.push_str(&format!("- {}\n", step));
        }
        if let Some(ref quality) = self.preprocessing.quality {
            md.push_str("\n### Quality Findings\n\n");
            md.push_str(&format!("```\n{}```\n", quality.format()));
        }
        md.push('\n');

        md.push_str("## Ethical Considerations\n\n");
        for item in &self.ethical_considerations {
            md.push_str(&format!("- {}\n", item));
        }
        md.push('\n');

        md.push_str("## Caveats and Recommendations\n\n");
        for caveat in &self.caveats {
            md.push_str(&format!("- {}\n", caveat));
        }
        if !self.recommendations.is_empty() {
            md.push_str("\n### Recommendations\n\n");
            for rec in &self.recommendations {
                md.push_str(&format!("- {}\n", rec));
            }
        }
        md.push('\n');

        md.push_str("---\n\n");
        md.push_str(&format!(
            "*Dataset Card generated on {} (schema v{})*\n",
            self.card_metadata.last_updated.format("%Y-%m-%d"),
            self.card_metadata.schema_version
        ));

        md
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_synced(path, self.to_markdown().as_bytes())
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize dataset card")?;
        write_synced(path, json.as_bytes())
    }
}

/// Builder for dataset cards
pub struct DatasetCardBuilder {
    card: DatasetCard,
}

impl DatasetCardBuilder {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            card: DatasetCard::new(name, version),
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.card.details.description = desc.to_string();
        self
    }

    pub fn digest(mut self, digest: &str) -> Self {
        self.card.details.digest = Some(digest.to_string());
        self
    }

    /// Composition and collection sources from dataset statistics
    pub fn statistics(mut self, stats: &DatasetStatistics) -> Self {
        self.card.composition = Composition::from(stats);
        self.card.collection = stats.sources.iter().map(|s| describe_source(*s)).collect();
        self
    }

    /// Attach quality findings and derive caveats from them
    pub fn quality(mut self, quality: &QualityReport) -> Self {
        if quality.identity.total() > 0 && quality.unresolved_rate() > 0.5 {
            self.card.caveats.push(format!(
                "{:.1}% of posts have no bot label; stratified results cover a minority of activity",
                quality.unresolved_rate() * 100.0
            ));
        }
        if quality.orphan_promotions > 0 {
            self.card.caveats.push(format!(
                "{} posts reference uncollected parents and were promoted to cascade roots",
                quality.orphan_promotions
            ));
        }
        if quality.non_monotonic_edges + quality.self_references > 0 {
            self.card.caveats.push(format!(
                "{} parent references contradicted post timestamps and were dropped",
                quality.non_monotonic_edges + quality.self_references
            ));
        }
        self.card.preprocessing.quality = Some(quality.clone());
        self
    }

    pub fn add_recommendation(mut self, rec: &str) -> Self {
        self.card.recommendations.push(rec.to_string());
        self
    }

    pub fn build(self) -> DatasetCard {
        self.card
    }
}
