// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Dataset loaders for FakeNewsNet, CoAID and TwiBot-22
//!
//! Each loader maps one publisher's file layout onto [`RawCorpus`]. Loaders
//! never validate beyond parsing: a malformed document or row is skipped and
//! counted, while a file that exists but cannot be read aborts the run.

use crate::error::PipelineError;
use crate::records::{clean_field, parse_timestamp, BotLabel, RawPost, SourceDataset, Story, Veracity};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A source the pipeline can be asked to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Politifact,
    Gossipcop,
    Coaid,
    Synthetic,
}

impl DataSource {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "politifact" | "fakenewsnet_politifact" => Some(DataSource::Politifact),
            "gossipcop" | "fakenewsnet_gossipcop" => Some(DataSource::Gossipcop),
            "coaid" => Some(DataSource::Coaid),
            "synthetic" => Some(DataSource::Synthetic),
            _ => None,
        }
    }
}

/// An account row from the TwiBot-22 user table
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub user_id: Option<String>,
    pub username: Option<String>,
}

/// A row of the TwiBot-22 label table
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRecord {
    pub user_id: String,
    pub label: BotLabel,
}

/// Everything the loaders produced for one run
#[derive(Debug, Clone, Default)]
pub struct RawCorpus {
    pub posts: Vec<RawPost>,
    pub stories: Vec<Story>,
    pub accounts: Vec<AccountRecord>,
    pub bot_labels: Vec<LabelRecord>,
    /// Documents or rows that could not be parsed at all
    pub skipped_rows: usize,
}

impl RawCorpus {
    /// Append another corpus, preserving load order
    pub fn merge(&mut self, other: RawCorpus) {
        self.posts.extend(other.posts);
        self.stories.extend(other.stories);
        self.accounts.extend(other.accounts);
        self.bot_labels.extend(other.bot_labels);
        self.skipped_rows += other.skipped_rows;
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Sorted directory listing so load order never depends on the filesystem
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::unreadable(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::unreadable(dir, e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect())
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PipelineError::unreadable(path, e).into())
}

fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| PipelineError::unreadable(path, e))?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

/// Read a string or number at a dotted path inside a JSON document
fn json_field(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    match current {
        Value::String(s) => clean_field(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_json_field(value: &Value, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| json_field(value, path))
}

/// Map a Twitter v1 status object onto a raw post
pub fn tweet_from_json(value: &Value, story_id: &str, source: SourceDataset) -> RawPost {
    let raw_time = first_json_field(value, &[&["created_at"], &["timestamp"]]);
    RawPost {
        source: Some(source),
        platform: Some("twitter".to_string()),
        post_id: first_json_field(value, &[&["id_str"], &["id"]]),
        story_id: Some(story_id.to_string()),
        user_id: first_json_field(value, &[&["user", "id_str"], &["user", "id"], &["user_id"]]),
        username: first_json_field(value, &[&["user", "screen_name"], &["screen_name"]]),
        text: first_json_field(value, &[&["full_text"], &["text"]]),
        timestamp: raw_time.as_deref().and_then(parse_timestamp),
        parent_id: first_json_field(
            value,
            &[
                &["retweeted_status", "id_str"],
                &["retweeted_status", "id"],
                &["in_reply_to_status_id_str"],
                &["in_reply_to_status_id"],
            ],
        ),
        veracity_hint: None,
    }
}

/// Load one FakeNewsNet subset (`politifact` or `gossipcop`)
///
/// Expects `FakeNewsNet/<subset>/{fake,real}/*.json` news documents and
/// `FakeNewsNet/<subset>/tweets/<news_id>/*.json` status objects.
pub fn load_fakenewsnet(data_dir: &Path, source: SourceDataset) -> Result<RawCorpus> {
    let subset = match source {
        SourceDataset::FakeNewsNetPolitifact => "politifact",
        SourceDataset::FakeNewsNetGossipcop => "gossipcop",
        other => anyhow::bail!("{} is not a FakeNewsNet subset", other),
    };
    let base = data_dir.join("FakeNewsNet").join(subset);
    let mut corpus = RawCorpus::default();

    if !base.exists() {
        tracing::warn!("FakeNewsNet {} directory not found at {}", subset, base.display());
        return Ok(corpus);
    }

    for (dir_name, veracity) in [("fake", Veracity::Fake), ("real", Veracity::Real)] {
        let dir = base.join(dir_name);
        if !dir.is_dir() {
            continue;
        }
        for path in json_files(&dir)? {
            let content = read_to_string(&path)?;
            let doc: Value = match serde_json::from_str(&content) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::debug!("Skipping malformed news file {}: {}", path.display(), e);
                    corpus.skipped_rows += 1;
                    continue;
                }
            };
            let stem = path.file_stem().map(|s| s.to_string_lossy().to_string());
            let Some(id) = json_field(&doc, &["id"]).or(stem) else {
                corpus.skipped_rows += 1;
                continue;
            };
            corpus.stories.push(Story {
                id,
                source,
                title: json_field(&doc, &["title"]).unwrap_or_default(),
                veracity,
            });
        }
    }

    let tweets_dir = base.join("tweets");
    if tweets_dir.is_dir() {
        for story_dir in sorted_entries(&tweets_dir)?.into_iter().filter(|p| p.is_dir()) {
            let story_id = story_dir
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            for path in json_files(&story_dir)? {
                let content = read_to_string(&path)?;
                match serde_json::from_str::<Value>(&content) {
                    Ok(Value::Array(items)) => corpus
                        .posts
                        .extend(items.iter().map(|item| tweet_from_json(item, &story_id, source))),
                    Ok(doc) => corpus.posts.push(tweet_from_json(&doc, &story_id, source)),
                    Err(e) => {
                        tracing::debug!("Skipping malformed tweet file {}: {}", path.display(), e);
                        corpus.skipped_rows += 1;
                    }
                }
            }
        }
    }

    tracing::info!(
        "Loaded FakeNewsNet {}: {} stories, {} posts ({} skipped)",
        subset,
        corpus.stories.len(),
        corpus.posts.len(),
        corpus.skipped_rows
    );
    Ok(corpus)
}

#[derive(Debug, Deserialize)]
struct CoaidStoryRow {
    #[serde(default, alias = "news_id", alias = "claim_id")]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoaidTweetRow {
    #[serde(default, alias = "id")]
    tweet_id: Option<String>,
    #[serde(default, alias = "claim_id", alias = "story_id")]
    news_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default, alias = "username")]
    screen_name: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "timestamp")]
    created_at: Option<String>,
    #[serde(default, alias = "retweeted_id", alias = "in_reply_to")]
    parent_id: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

/// Load CoAID `news.csv`, `claims.csv` and `tweets.csv`
pub fn load_coaid(data_dir: &Path) -> Result<RawCorpus> {
    let base = data_dir.join("CoAID");
    let mut corpus = RawCorpus::default();

    if !base.exists() {
        tracing::warn!("CoAID directory not found at {}", base.display());
        return Ok(corpus);
    }

    for component in ["news", "claims"] {
        let path = base.join(format!("{}.csv", component));
        if !path.exists() {
            continue;
        }
        let mut reader = open_csv(&path)?;
        for (idx, row) in reader.deserialize::<CoaidStoryRow>().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) if e.is_io_error() => {
                    return Err(e).with_context(|| format!("Failed to read {}", path.display()));
                }
                Err(e) => {
                    tracing::debug!("Skipping malformed row {} in {}: {}", idx, path.display(), e);
                    corpus.skipped_rows += 1;
                    continue;
                }
            };
            let Some(id) = clean_field(row.id.as_deref()) else {
                corpus.skipped_rows += 1;
                continue;
            };
            corpus.stories.push(Story {
                id,
                source: SourceDataset::CoAid,
                title: clean_field(row.title.as_deref()).unwrap_or_default(),
                veracity: row.label.as_deref().map(Veracity::parse).unwrap_or(Veracity::Unverified),
            });
        }
    }

    let tweets_path = base.join("tweets.csv");
    if tweets_path.exists() {
        let mut reader = open_csv(&tweets_path)?;
        for (idx, row) in reader.deserialize::<CoaidTweetRow>().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) if e.is_io_error() => {
                    return Err(e).with_context(|| format!("Failed to read {}", tweets_path.display()));
                }
                Err(e) => {
                    tracing::debug!("Skipping malformed row {} in {}: {}", idx, tweets_path.display(), e);
                    corpus.skipped_rows += 1;
                    continue;
                }
            };
            corpus.posts.push(RawPost {
                source: Some(SourceDataset::CoAid),
                platform: Some("twitter".to_string()),
                post_id: clean_field(row.tweet_id.as_deref()),
                story_id: clean_field(row.news_id.as_deref()),
                user_id: clean_field(row.user_id.as_deref()),
                username: clean_field(row.screen_name.as_deref()),
                text: clean_field(row.text.as_deref()),
                timestamp: row.created_at.as_deref().and_then(parse_timestamp),
                parent_id: clean_field(row.parent_id.as_deref()),
                veracity_hint: row.label.as_deref().map(Veracity::parse),
            });
        }
    }

    tracing::info!(
        "Loaded CoAID: {} stories, {} posts ({} skipped)",
        corpus.stories.len(),
        corpus.posts.len(),
        corpus.skipped_rows
    );
    Ok(corpus)
}

#[derive(Debug, Deserialize)]
struct LabelRow {
    #[serde(default, alias = "user_id")]
    id: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

fn account_from_json(value: &Value) -> AccountRecord {
    AccountRecord {
        user_id: first_json_field(value, &[&["id"], &["id_str"], &["user_id"]]),
        username: first_json_field(value, &[&["username"], &["screen_name"]]),
    }
}

/// Load the TwiBot-22 user table (`user.json`) and label table (`label.csv`)
///
/// `user.json` may be a single JSON array or JSON lines.
pub fn load_twibot22(data_dir: &Path) -> Result<RawCorpus> {
    let base = data_dir.join("TwiBot-22");
    let mut corpus = RawCorpus::default();

    if !base.exists() {
        tracing::warn!("TwiBot-22 directory not found at {}; all authors will be unresolved", base.display());
        return Ok(corpus);
    }

    let user_path = base.join("user.json");
    if user_path.exists() {
        let content = read_to_string(&user_path)?;
        if content.trim_start().starts_with('[') {
            match serde_json::from_str::<Vec<Value>>(&content) {
                Ok(users) => corpus.accounts.extend(users.iter().map(account_from_json)),
                Err(e) => {
                    tracing::warn!("Malformed user table {}: {}", user_path.display(), e);
                    corpus.skipped_rows += 1;
                }
            }
        } else {
            for (idx, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(line) {
                    Ok(user) => corpus.accounts.push(account_from_json(&user)),
                    Err(e) => {
                        tracing::debug!("Skipping malformed user line {}: {}", idx, e);
                        corpus.skipped_rows += 1;
                    }
                }
            }
        }
    } else {
        tracing::warn!("User data file not found at {}", user_path.display());
    }

    let label_path = base.join("label.csv");
    if label_path.exists() {
        let mut reader = open_csv(&label_path)?;
        for (idx, row) in reader.deserialize::<LabelRow>().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) if e.is_io_error() => {
                    return Err(e).with_context(|| format!("Failed to read {}", label_path.display()));
                }
                Err(e) => {
                    tracing::debug!("Skipping malformed label row {}: {}", idx, e);
                    corpus.skipped_rows += 1;
                    continue;
                }
            };
            match (clean_field(row.id.as_deref()), row.label.as_deref().and_then(BotLabel::parse)) {
                (Some(user_id), Some(label)) => corpus.bot_labels.push(LabelRecord { user_id, label }),
                _ => corpus.skipped_rows += 1,
            }
        }
    } else {
        tracing::warn!("Label file not found at {}", label_path.display());
    }

    tracing::info!(
        "Loaded TwiBot-22: {} users, {} labels ({} skipped)",
        corpus.accounts.len(),
        corpus.bot_labels.len(),
        corpus.skipped_rows
    );
    Ok(corpus)
}

/// Generate a seeded corpus for development and testing
///
/// Produces reshare trees with explicit parent links plus the defects real
/// exports contain: duplicate rows, a missing timestamp, an orphan parent
/// reference, handle-only authors and unlabeled accounts.
pub fn load_synthetic(stories: usize, seed: u64) -> RawCorpus {
    use chrono::{Duration, TimeZone, Utc};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut corpus = RawCorpus::default();

    let account_count = (stories * 4).max(8);
    for i in 0..account_count {
        let user_id = format!("{}", 10_000 + i);
        corpus.accounts.push(AccountRecord {
            user_id: Some(format!("u{}", user_id)),
            username: Some(format!("user_{}", i)),
        });
        // Roughly one in ten accounts never made it into the benchmark
        if rng.gen_bool(0.9) {
            let label = if rng.gen_bool(0.3) { BotLabel::Bot } else { BotLabel::Human };
            corpus.bot_labels.push(LabelRecord {
                user_id: format!("u{}", user_id),
                label,
            });
        }
    }
    // Two accounts sharing a handle make handle-only lookups ambiguous
    for offset in 0..2 {
        corpus.accounts.push(AccountRecord {
            user_id: Some(format!("u{}", 90_000 + offset)),
            username: Some("echo_chamber".to_string()),
        });
    }

    let epoch = Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).single().unwrap_or_default();
    let mut next_post_id: u64 = 1_000_000;

    for s in 0..stories {
        let story_id = format!("story_{:04}", s);
        let veracity = if rng.gen_bool(0.6) { Veracity::Fake } else { Veracity::Real };
        corpus.stories.push(Story {
            id: story_id.clone(),
            source: SourceDataset::Synthetic,
            title: format!("Synthetic story {}", s),
            veracity,
        });

        let root_time = epoch + Duration::minutes(rng.gen_range(0..60 * 24 * 30));
        let cascade_size = rng.gen_range(1..=12);
        let mut story_posts: Vec<(String, chrono::DateTime<Utc>)> = Vec::new();

        for k in 0..cascade_size {
            let author = rng.gen_range(0..account_count);
            let (parent_id, timestamp) = if k == 0 {
                (None, root_time)
            } else {
                let (pid, pts) = story_posts[rng.gen_range(0..story_posts.len())].clone();
                (Some(pid), pts + Duration::seconds(rng.gen_range(0..7200)))
            };
            let post_id = next_post_id.to_string();
            next_post_id += 1;

            let handle_only = rng.gen_bool(0.05);
            corpus.posts.push(RawPost {
                source: Some(SourceDataset::Synthetic),
                platform: Some("twitter".to_string()),
                post_id: Some(post_id.clone()),
                story_id: Some(story_id.clone()),
                user_id: if handle_only { None } else { Some(format!("{}", 10_000 + author)) },
                username: Some(format!("user_{}", author)),
                text: Some(format!("Post {} about story {}", k, s)),
                timestamp: Some(timestamp),
                parent_id,
                veracity_hint: Some(veracity),
            });
            story_posts.push((post_id, timestamp));
        }

        // Duplicate export row
        if s % 7 == 0 {
            if let Some(first) = corpus.posts.iter().rev().find(|p| p.story_id.as_deref() == Some(story_id.as_str())) {
                let duplicate = first.clone();
                corpus.posts.push(duplicate);
            }
        }
    }

    if stories > 0 {
        let story_id = "story_0000".to_string();
        let base_time = epoch + Duration::days(45);
        let extra = [
            // Reshare of a post that was never collected
            (Some("10001".to_string()), Some("user_1".to_string()), Some(base_time), Some("999999999".to_string())),
            // Row with no usable timestamp
            (Some("10002".to_string()), Some("user_2".to_string()), None, None),
            // Handle shared by two accounts
            (None, Some("echo_chamber".to_string()), Some(base_time + Duration::minutes(5)), None),
        ];
        for (user_id, username, timestamp, parent_id) in extra {
            corpus.posts.push(RawPost {
                source: Some(SourceDataset::Synthetic),
                platform: Some("twitter".to_string()),
                post_id: Some(next_post_id.to_string()),
                story_id: Some(story_id.clone()),
                user_id,
                username,
                text: Some("Synthetic edge case".to_string()),
                timestamp,
                parent_id,
                veracity_hint: None,
            });
            next_post_id += 1;
        }
    }

    tracing::debug!(
        "Generated synthetic corpus: {} stories, {} posts, {} accounts",
        corpus.stories.len(),
        corpus.posts.len(),
        corpus.accounts.len()
    );
    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_data_source_parse() {
        assert_eq!(DataSource::parse("PolitiFact"), Some(DataSource::Politifact));
        assert_eq!(DataSource::parse("coaid"), Some(DataSource::Coaid));
        assert_eq!(DataSource::parse("liar"), None);
    }

    #[test]
    fn test_tweet_from_json_retweet() {
        let doc: Value = serde_json::json!({
            "id_str": "200",
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "text": "RT something",
            "user": {"id": 42, "screen_name": "Someone"},
            "retweeted_status": {"id_str": "100"}
        });
        let post = tweet_from_json(&doc, "pf_1", SourceDataset::FakeNewsNetPolitifact);

        assert_eq!(post.post_id.as_deref(), Some("200"));
        assert_eq!(post.user_id.as_deref(), Some("42"));
        assert_eq!(post.username.as_deref(), Some("Someone"));
        assert_eq!(post.parent_id.as_deref(), Some("100"));
        assert!(post.timestamp.is_some());
    }

    #[test]
    fn test_load_fakenewsnet_layout() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("FakeNewsNet/politifact");
        write(&base.join("fake/pf_1.json"), r#"{"title": "Hoax"}"#);
        write(&base.join("real/pf_2.json"), r#"{"id": "pf_2", "title": "Report"}"#);
        write(&base.join("real/broken.json"), "{not json");
        write(
            &base.join("tweets/pf_1/1.json"),
            r#"{"id_str": "1", "text": "a", "created_at": "2020-01-01 00:00:00", "user": {"id_str": "7"}}"#,
        );
        write(
            &base.join("tweets/pf_1/2.json"),
            r#"[{"id_str": "2", "text": "b", "created_at": "2020-01-01 00:05:00", "user": {"id_str": "8"}, "in_reply_to_status_id_str": "1"}]"#,
        );

        let corpus = load_fakenewsnet(dir.path(), SourceDataset::FakeNewsNetPolitifact).unwrap();

        assert_eq!(corpus.stories.len(), 2);
        assert_eq!(corpus.stories[0].id, "pf_1");
        assert_eq!(corpus.stories[0].veracity, Veracity::Fake);
        assert_eq!(corpus.posts.len(), 2);
        assert_eq!(corpus.posts[1].parent_id.as_deref(), Some("1"));
        assert_eq!(corpus.skipped_rows, 1);
    }

    #[test]
    fn test_missing_source_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = load_coaid(dir.path()).unwrap();
        assert!(corpus.is_empty());
        assert!(corpus.stories.is_empty());
    }

    #[test]
    fn test_load_coaid_csv() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("CoAID/news.csv"),
            "news_id,title,label\nn1,Garlic cures it,fake\nn2,Wash hands,real\n,No id,fake\n",
        );
        write(
            &dir.path().join("CoAID/tweets.csv"),
            "tweet_id,news_id,user_id,screen_name,text,created_at,parent_id\n\
             10,n1,5,alice,hello,2020-04-01 10:00:00,\n\
             11,n1,6,bob,reply,2020-04-01 10:30:00,10\n",
        );

        let corpus = load_coaid(dir.path()).unwrap();

        assert_eq!(corpus.stories.len(), 2);
        assert_eq!(corpus.stories[0].veracity, Veracity::Fake);
        assert_eq!(corpus.skipped_rows, 1);
        assert_eq!(corpus.posts.len(), 2);
        assert_eq!(corpus.posts[0].parent_id, None);
        assert_eq!(corpus.posts[1].parent_id.as_deref(), Some("10"));
    }

    #[test]
    fn test_load_twibot22_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("TwiBot-22/user.json"),
            "{\"id\": \"u1\", \"username\": \"alice\"}\n{broken\n{\"id\": \"u2\", \"username\": \"bob\"}\n",
        );
        write(&dir.path().join("TwiBot-22/label.csv"), "id,label\nu1,human\nu2,bot\nu3,maybe\n");

        let corpus = load_twibot22(dir.path()).unwrap();

        assert_eq!(corpus.accounts.len(), 2);
        assert_eq!(corpus.bot_labels.len(), 2);
        assert_eq!(corpus.bot_labels[1].label, BotLabel::Bot);
        assert_eq!(corpus.skipped_rows, 2);
    }

    #[test]
    fn test_synthetic_is_reproducible() {
        let a = load_synthetic(20, 7);
        let b = load_synthetic(20, 7);

        assert_eq!(a.posts.len(), b.posts.len());
        assert_eq!(a.stories, b.stories);
        let ids_a: Vec<_> = a.posts.iter().map(|p| p.post_id.clone()).collect();
        let ids_b: Vec<_> = b.posts.iter().map(|p| p.post_id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_synthetic_contains_edge_cases() {
        let corpus = load_synthetic(10, 42);

        assert!(corpus.posts.iter().any(|p| p.timestamp.is_none()));
        assert!(corpus.posts.iter().any(|p| p.parent_id.as_deref() == Some("999999999")));
        assert!(corpus.posts.iter().any(|p| p.user_id.is_none()));
        assert_eq!(corpus.stories.len(), 10);
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut a = load_synthetic(2, 1);
        let b = load_synthetic(2, 2);
        let first_len = a.posts.len();
        let total = first_len + b.posts.len();
        let first_b = b.posts[0].post_id.clone();

        a.merge(b);

        assert_eq!(a.posts.len(), total);
        assert_eq!(a.posts[first_len].post_id, first_b);
    }
}
