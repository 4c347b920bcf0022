// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Core record types shared by every pipeline stage
//!
//! Loaders produce [`RawPost`] and [`Story`] values, the integrator turns them
//! into [`UnifiedRecord`] rows, and the cascade builder and metrics engine
//! only ever read those rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Upstream dataset a record was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDataset {
    FakeNewsNetPolitifact,
    FakeNewsNetGossipcop,
    CoAid,
    Synthetic,
}

impl SourceDataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDataset::FakeNewsNetPolitifact => "fakenewsnet_politifact",
            SourceDataset::FakeNewsNetGossipcop => "fakenewsnet_gossipcop",
            SourceDataset::CoAid => "coaid",
            SourceDataset::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for SourceDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fact-check verdict attached to a story or claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Veracity {
    Fake,
    Real,
    Unverified,
}

impl Veracity {
    /// Map a publisher label onto the three-way verdict
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "fake" | "false" | "0" | "misinformation" | "pants-fire" => Veracity::Fake,
            "real" | "true" | "1" | "verified" => Veracity::Real,
            _ => Veracity::Unverified,
        }
    }
}

/// Account classification from the bot-detection benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotLabel {
    Bot,
    Human,
}

impl BotLabel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "bot" | "1" => Some(BotLabel::Bot),
            "human" | "0" => Some(BotLabel::Human),
            _ => None,
        }
    }
}

/// Analysis stratum. Unlabeled authors form their own group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratum {
    Bot,
    Human,
    Unknown,
}

impl Stratum {
    pub const ALL: [Stratum; 3] = [Stratum::Bot, Stratum::Human, Stratum::Unknown];

    pub fn from_label(label: Option<BotLabel>) -> Self {
        match label {
            Some(BotLabel::Bot) => Stratum::Bot,
            Some(BotLabel::Human) => Stratum::Human,
            None => Stratum::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stratum::Bot => "bot",
            Stratum::Human => "human",
            Stratum::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an author could not be given a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    MissingId,
    NoMatch,
    Ambiguous,
}

/// How an author's label was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    ExactId,
    Username,
    Unresolved(UnresolvedReason),
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchSource::ExactId => "exact_id",
            MatchSource::Username => "username",
            MatchSource::Unresolved(UnresolvedReason::MissingId) => "unresolved_missing_id",
            MatchSource::Unresolved(UnresolvedReason::NoMatch) => "unresolved_no_match",
            MatchSource::Unresolved(UnresolvedReason::Ambiguous) => "unresolved_ambiguous",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "exact_id" => Some(MatchSource::ExactId),
            "username" => Some(MatchSource::Username),
            "unresolved_missing_id" => Some(MatchSource::Unresolved(UnresolvedReason::MissingId)),
            "unresolved_no_match" => Some(MatchSource::Unresolved(UnresolvedReason::NoMatch)),
            "unresolved_ambiguous" => Some(MatchSource::Unresolved(UnresolvedReason::Ambiguous)),
            _ => None,
        }
    }
}

/// Author of one or more posts, with the matched label (if any)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorIdentity {
    /// Normalized platform user id, or `@username` when only a handle was present
    pub user_id: Option<String>,
    pub bot_label: Option<BotLabel>,
    pub source: MatchSource,
}

impl AuthorIdentity {
    pub fn unresolved(user_id: Option<String>, reason: UnresolvedReason) -> Self {
        Self {
            user_id,
            bot_label: None,
            source: MatchSource::Unresolved(reason),
        }
    }
}

/// A news item or claim with its verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub source: SourceDataset,
    pub title: String,
    pub veracity: Veracity,
}

/// A post as read from an upstream file, before any validation
#[derive(Debug, Clone, Default)]
pub struct RawPost {
    pub source: Option<SourceDataset>,
    pub platform: Option<String>,
    pub post_id: Option<String>,
    pub story_id: Option<String>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub text: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
    /// Verdict implied by where the loader found the post
    pub veracity_hint: Option<Veracity>,
}

/// One row of the unified dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub post_id: String,
    pub platform: String,
    pub source: SourceDataset,
    pub story_id: String,
    pub author_id: String,
    pub bot_label: Option<BotLabel>,
    pub label_source: String,
    pub veracity: Veracity,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub parent_id: Option<String>,
}

impl UnifiedRecord {
    pub fn stratum(&self) -> Stratum {
        Stratum::from_label(self.bot_label)
    }
}

/// Turn an empty or placeholder cell into `None`
pub fn clean_field(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() {
        return None;
    }
    match value.to_lowercase().as_str() {
        "nan" | "null" | "none" | "n/a" => None,
        _ => Some(value.to_string()),
    }
}

/// Parse the timestamp formats found across the upstream datasets
///
/// Accepts Twitter `created_at` strings, RFC 3339, epoch seconds or
/// milliseconds, and naive `YYYY-MM-DD[ HH:MM:SS]` values (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let value: i64 = raw.parse().ok()?;
        // Twitter exports mix second and millisecond epochs
        return if raw.len() >= 13 {
            DateTime::from_timestamp_millis(value)
        } else {
            DateTime::from_timestamp(value, 0)
        };
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Total order on platform post ids
///
/// Digit-only ids compare numerically (so `"99" < "100"`), anything else
/// falls back to byte order. Numerically equal ids such as `"007"` and
/// `"7"` are still told apart by their raw bytes.
pub fn compare_post_ids(a: &str, b: &str) -> Ordering {
    let is_numeric = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());
    if is_numeric(a) && is_numeric(b) {
        let a_digits = a.trim_start_matches('0');
        let b_digits = b.trim_start_matches('0');
        a_digits
            .len()
            .cmp(&b_digits.len())
            .then_with(|| a_digits.cmp(b_digits))
            .then_with(|| a.cmp(b))
    } else {
        a.cmp(b)
    }
}
