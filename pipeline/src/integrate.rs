// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Data integration: raw loader output to the unified dataset
//!
//! One record per post. Required fields are checked, duplicates removed
//! (first seen wins), authors resolved through the [`IdentityTable`] and story
//! verdicts attached by id. The output is sorted, so integrating the same
//! corpus twice yields byte-identical tables.

use crate::datasets::RawCorpus;
use crate::identity::IdentityTable;
use crate::pipeline::write_synced;
use crate::quality::QualityReport;
use crate::records::{
    clean_field, compare_post_ids, BotLabel, MatchSource, RawPost, SourceDataset, UnifiedRecord,
    Veracity,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

/// The integrated, analysis-ready table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedDataset {
    pub records: Vec<UnifiedRecord>,
}

/// Integrator output: the dataset plus what was dropped or repaired on the way
#[derive(Debug, Clone)]
pub struct Integration {
    pub dataset: UnifiedDataset,
    pub quality: QualityReport,
}

/// Descriptive statistics over an integrated dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub total_records: usize,
    pub unique_authors: usize,
    pub stories: usize,
    pub bot_records: usize,
    pub human_records: usize,
    pub unknown_records: usize,
    pub fake_records: usize,
    pub real_records: usize,
    pub unverified_records: usize,
    pub sources: Vec<SourceDataset>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

impl DatasetStatistics {
    pub fn labeled_fraction(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        (self.bot_records + self.human_records) as f64 / self.total_records as f64
    }
}

impl UnifiedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records grouped by story id, each group in dataset order
    pub fn by_story(&self) -> BTreeMap<&str, Vec<&UnifiedRecord>> {
        let mut groups: BTreeMap<&str, Vec<&UnifiedRecord>> = BTreeMap::new();
        for record in &self.records {
            groups.entry(record.story_id.as_str()).or_default().push(record);
        }
        groups
    }

    pub fn statistics(&self) -> DatasetStatistics {
        let mut stats = DatasetStatistics {
            total_records: self.records.len(),
            ..Default::default()
        };
        let mut authors = HashSet::new();
        let mut stories = HashSet::new();
        let mut sources = BTreeSet::new();

        for record in &self.records {
            authors.insert(record.author_id.as_str());
            stories.insert(record.story_id.as_str());
            sources.insert(record.source);
            match record.bot_label {
                Some(BotLabel::Bot) => stats.bot_records += 1,
                Some(BotLabel::Human) => stats.human_records += 1,
                None => stats.unknown_records += 1,
            }
            match record.veracity {
                Veracity::Fake => stats.fake_records += 1,
                Veracity::Real => stats.real_records += 1,
                Veracity::Unverified => stats.unverified_records += 1,
            }
            stats.earliest = Some(stats.earliest.map_or(record.timestamp, |t| t.min(record.timestamp)));
            stats.latest = Some(stats.latest.map_or(record.timestamp, |t| t.max(record.timestamp)));
        }

        stats.unique_authors = authors.len();
        stats.stories = stories.len();
        stats.sources = sources.into_iter().collect();
        stats
    }

    /// Serialize the table as CSV with a header row
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in &self.records {
            writer
                .serialize(record)
                .with_context(|| format!("Failed to serialize post {}", record.post_id))?;
        }
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e.error()))
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_synced(path, &self.to_csv_bytes()?)?;
        tracing::info!("Unified dataset written to {} ({} records)", path.display(), self.len());
        Ok(())
    }

    /// Load a previously persisted table
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open unified dataset {}", path.display()))?;
        let mut records = Vec::new();
        for (idx, row) in reader.deserialize::<UnifiedRecord>().enumerate() {
            let record = row.with_context(|| format!("Invalid record {} in {}", idx, path.display()))?;
            records.push(record);
        }
        Ok(Self { records })
    }

    /// SHA-256 of the serialized table, hex encoded
    pub fn digest(&self) -> Result<String> {
        let bytes = self.to_csv_bytes()?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Joins loader output into the unified dataset
pub struct DataIntegrator<'a> {
    identities: &'a IdentityTable,
}

impl<'a> DataIntegrator<'a> {
    pub fn new(identities: &'a IdentityTable) -> Self {
        Self { identities }
    }

    pub fn integrate(&self, corpus: &RawCorpus) -> Integration {
        let mut quality = QualityReport {
            raw_posts: corpus.posts.len(),
            malformed_rows: corpus.skipped_rows,
            ..Default::default()
        };

        let mut story_verdicts: HashMap<&str, Veracity> = HashMap::new();
        for story in &corpus.stories {
            story_verdicts.entry(story.id.as_str()).or_insert(story.veracity);
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut records = Vec::with_capacity(corpus.posts.len());

        for raw in &corpus.posts {
            let Some((record, match_source)) = self.integrate_post(raw, &story_verdicts, &mut quality) else {
                continue;
            };
            if !seen.insert((record.platform.clone(), record.post_id.clone())) {
                tracing::debug!("Dropping duplicate post {}/{}", record.platform, record.post_id);
                quality.duplicates += 1;
                continue;
            }
            if !story_verdicts.contains_key(record.story_id.as_str()) {
                quality.unknown_story += 1;
            }
            quality.identity.record(match_source);
            records.push(record);
        }

        records.sort_by(|a, b| {
            a.story_id
                .cmp(&b.story_id)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
                .then_with(|| compare_post_ids(&a.post_id, &b.post_id))
                .then_with(|| a.platform.cmp(&b.platform))
        });
        quality.emitted_records = records.len();

        tracing::info!(
            "Integrated {} of {} raw posts ({} excluded, {} duplicates, {} unresolved authors)",
            quality.emitted_records,
            quality.raw_posts,
            quality.excluded() - quality.duplicates,
            quality.duplicates,
            quality.identity.unresolved()
        );
        if quality.unknown_story > 0 {
            tracing::warn!("{} records reference stories with no verdict entry", quality.unknown_story);
        }

        Integration {
            dataset: UnifiedDataset { records },
            quality,
        }
    }

    /// Validate one raw post and build its record, counting the first failed check
    fn integrate_post(
        &self,
        raw: &RawPost,
        story_verdicts: &HashMap<&str, Veracity>,
        quality: &mut QualityReport,
    ) -> Option<(UnifiedRecord, MatchSource)> {
        let Some(post_id) = clean_field(raw.post_id.as_deref()) else {
            quality.missing_post_id += 1;
            return None;
        };
        let Some(story_id) = clean_field(raw.story_id.as_deref()) else {
            tracing::debug!("Post {} has no story id", post_id);
            quality.missing_story_id += 1;
            return None;
        };
        let Some(timestamp) = raw.timestamp else {
            tracing::debug!("Post {} has no parseable timestamp", post_id);
            quality.missing_timestamp += 1;
            return None;
        };

        let source = raw.source.unwrap_or(SourceDataset::Synthetic);
        let identity = self
            .identities
            .resolve(source, raw.user_id.as_deref(), raw.username.as_deref());
        let Some(author_id) = identity.user_id else {
            quality.missing_author += 1;
            return None;
        };
        let Some(text) = clean_field(raw.text.as_deref()) else {
            quality.missing_text += 1;
            return None;
        };

        let veracity = story_verdicts
            .get(story_id.as_str())
            .copied()
            .or(raw.veracity_hint)
            .unwrap_or(Veracity::Unverified);

        let record = UnifiedRecord {
            post_id,
            platform: clean_field(raw.platform.as_deref())
                .map(|p| p.to_lowercase())
                .unwrap_or_else(|| "twitter".to_string()),
            source,
            story_id,
            author_id,
            bot_label: identity.bot_label,
            label_source: identity.source.as_str().to_string(),
            veracity,
            timestamp,
            text,
            parent_id: clean_field(raw.parent_id.as_deref()),
        };
        Some((record, identity.source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{load_synthetic, AccountRecord, LabelRecord};
    use crate::records::Story;
    use chrono::TimeZone;

    fn post(id: &str, user: Option<&str>, secs: Option<i64>) -> RawPost {
        RawPost {
            source: Some(SourceDataset::CoAid),
            platform: Some("twitter".into()),
            post_id: Some(id.into()),
            story_id: Some("S".into()),
            user_id: user.map(String::from),
            username: None,
            text: Some(format!("text {}", id)),
            timestamp: secs.and_then(|s| Utc.timestamp_opt(s, 0).single()),
            parent_id: None,
            veracity_hint: None,
        }
    }

    fn corpus(posts: Vec<RawPost>) -> RawCorpus {
        RawCorpus {
            posts,
            stories: vec![Story {
                id: "S".into(),
                source: SourceDataset::CoAid,
                title: "story".into(),
                veracity: Veracity::Fake,
            }],
            accounts: vec![AccountRecord { user_id: Some("u1".into()), username: Some("a".into()) }],
            bot_labels: vec![LabelRecord { user_id: "u1".into(), label: BotLabel::Bot }],
            skipped_rows: 0,
        }
    }

    fn integrate(corpus: &RawCorpus) -> Integration {
        let table = IdentityTable::build(&corpus.accounts, &corpus.bot_labels);
        DataIntegrator::new(&table).integrate(corpus)
    }

    #[test]
    fn test_duplicates_yield_one_record() {
        let input = corpus(vec![post("1", Some("1"), Some(0)), post("1", Some("2"), Some(50))]);
        let result = integrate(&input);

        assert_eq!(result.dataset.len(), 1);
        assert_eq!(result.quality.duplicates, 1);
        // First seen wins
        assert_eq!(result.dataset.records[0].author_id, "1");
    }

    #[test]
    fn test_required_fields_are_counted() {
        let mut no_text = post("4", Some("1"), Some(10));
        no_text.text = None;
        let mut no_id = post("5", Some("1"), Some(10));
        no_id.post_id = None;
        let input = corpus(vec![
            post("1", Some("1"), Some(0)),
            post("2", Some("1"), None),
            post("3", None, Some(5)),
            no_text,
            no_id,
        ]);
        let result = integrate(&input);

        assert_eq!(result.dataset.len(), 1);
        assert_eq!(result.quality.missing_timestamp, 1);
        assert_eq!(result.quality.missing_author, 1);
        assert_eq!(result.quality.missing_text, 1);
        assert_eq!(result.quality.missing_post_id, 1);
        assert_eq!(result.quality.excluded(), 4);
        assert!(result.dataset.records.iter().all(|r| !r.post_id.is_empty()));
    }

    #[test]
    fn test_unresolved_author_has_null_label() {
        let input = corpus(vec![post("1", Some("1"), Some(0)), post("2", Some("77"), Some(5))]);
        let result = integrate(&input);

        let unresolved = result.dataset.records.iter().find(|r| r.author_id == "77").unwrap();
        assert_eq!(unresolved.bot_label, None);
        assert_eq!(unresolved.label_source, "unresolved_no_match");
        assert_eq!(result.quality.identity.unresolved(), 1);
        assert_eq!(result.quality.identity.exact_id, 1);
    }

    #[test]
    fn test_author_label_is_consistent_across_posts() {
        // 999 borrows the handle of labeled account 1 on one post only
        let mut borrowed = post("1", Some("999"), Some(0));
        borrowed.username = Some("a".into());
        let input = corpus(vec![borrowed, post("2", Some("999"), Some(5))]);
        let result = integrate(&input);

        let labels: HashSet<Option<BotLabel>> = result
            .dataset
            .records
            .iter()
            .filter(|r| r.author_id == "999")
            .map(|r| r.bot_label)
            .collect();
        assert_eq!(labels.len(), 1);
        assert!(labels.contains(&None));
        assert_eq!(result.quality.identity.ambiguous, 1);
    }

    #[test]
    fn test_story_verdict_join() {
        let mut orphan_story = post("2", Some("1"), Some(5));
        orphan_story.story_id = Some("elsewhere".into());
        orphan_story.veracity_hint = Some(Veracity::Real);
        let input = corpus(vec![post("1", Some("1"), Some(0)), orphan_story]);
        let result = integrate(&input);

        let by_id: HashMap<_, _> = result.dataset.records.iter().map(|r| (r.post_id.as_str(), r)).collect();
        assert_eq!(by_id["1"].veracity, Veracity::Fake);
        assert_eq!(by_id["2"].veracity, Veracity::Real);
        assert_eq!(result.quality.unknown_story, 1);
    }

    #[test]
    fn test_integration_is_idempotent() {
        let input = load_synthetic(30, 11);
        let first = integrate(&input);
        let second = integrate(&input);

        assert_eq!(first.dataset, second.dataset);
        assert_eq!(first.dataset.to_csv_bytes().unwrap(), second.dataset.to_csv_bytes().unwrap());
        assert_eq!(first.dataset.digest().unwrap(), second.dataset.digest().unwrap());
        assert_eq!(first.quality, second.quality);
    }

    #[test]
    fn test_csv_round_trip_through_file() {
        let input = load_synthetic(5, 3);
        let result = integrate(&input);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unified.csv");

        result.dataset.write_csv(&path).unwrap();
        let reloaded = UnifiedDataset::read_csv(&path).unwrap();

        assert_eq!(reloaded, result.dataset);
    }

    #[test]
    fn test_statistics() {
        let input = corpus(vec![post("1", Some("1"), Some(0)), post("2", Some("9"), Some(3600))]);
        let stats = integrate(&input).dataset.statistics();

        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.bot_records, 1);
        assert_eq!(stats.unknown_records, 1);
        assert_eq!(stats.human_records, 0);
        assert_eq!(stats.fake_records, 2);
        assert_eq!(stats.stories, 1);
        assert!((stats.labeled_fraction() - 0.5).abs() < 1e-9);
        assert_eq!(stats.latest.unwrap() - stats.earliest.unwrap(), chrono::Duration::hours(1));
    }
}
