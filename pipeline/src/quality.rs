// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Run quality report
//!
//! Nothing here aborts a run. Every exclusion, unresolved author and
//! structural repair is counted so a researcher can judge whether the
//! resulting dataset is fit for a given analysis.

use crate::identity::MatchStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Posts handed to the integrator
    pub raw_posts: usize,
    /// Documents or rows the loaders could not parse
    pub malformed_rows: usize,
    pub missing_post_id: usize,
    pub missing_story_id: usize,
    pub missing_timestamp: usize,
    pub missing_author: usize,
    pub missing_text: usize,
    /// Later copies of an already seen `(platform, post id)`
    pub duplicates: usize,
    /// Emitted posts whose story id has no story/claim entry
    pub unknown_story: usize,
    pub identity: MatchStats,
    pub orphan_promotions: usize,
    pub non_monotonic_edges: usize,
    pub self_references: usize,
    pub emitted_records: usize,
    /// Post ids promoted to roots because their parent was never collected
    pub orphaned_posts: Vec<String>,
}

impl QualityReport {
    pub fn excluded(&self) -> usize {
        self.missing_post_id
            + self.missing_story_id
            + self.missing_timestamp
            + self.missing_author
            + self.missing_text
            + self.duplicates
    }

    fn rate(numerator: usize, denominator: usize) -> f64 {
        if denominator == 0 {
            return 0.0;
        }
        numerator as f64 / denominator as f64
    }

    /// Share of raw posts that did not make it into the dataset
    pub fn exclusion_rate(&self) -> f64 {
        Self::rate(self.excluded(), self.raw_posts)
    }

    pub fn unresolved_rate(&self) -> f64 {
        Self::rate(self.identity.unresolved(), self.emitted_records)
    }

    pub fn orphan_rate(&self) -> f64 {
        Self::rate(self.orphan_promotions, self.emitted_records)
    }

    /// Share of emitted records involved in an integrity violation
    pub fn violation_rate(&self) -> f64 {
        Self::rate(self.non_monotonic_edges + self.self_references, self.emitted_records)
    }

    /// Fold in counts from cascade construction
    pub fn absorb_structure(&mut self, issues: &crate::cascade::StructuralIssues) {
        self.orphan_promotions += issues.orphan_promotions;
        self.non_monotonic_edges += issues.non_monotonic_edges;
        self.self_references += issues.self_references;
        self.orphaned_posts.extend(issues.orphaned_posts.iter().cloned());
    }

    pub fn format(&self) -> String {
        format!(
            r#"Quality Report
==============
Raw posts:            {}
Malformed rows:       {}
Excluded:             {} ({:.2}%)
  missing post id:    {}
  missing story id:   {}
  missing timestamp:  {}
  missing author:     {}
  missing text:       {}
  duplicates:         {}
Emitted records:      {}
Unknown story:        {}

Identity Resolution:
  exact id:           {}
  username:           {}
  missing id:         {}
  no match:           {}
  ambiguous:          {}
  unresolved rate:    {:.2}%

Cascade Structure:
  orphan promotions:  {} ({:.2}%)
  non-monotonic:      {}
  self references:    {}
  violation rate:     {:.2}%
"#,
            self.raw_posts,
            self.malformed_rows,
            self.excluded(),
            self.exclusion_rate() * 100.0,
            self.missing_post_id,
            self.missing_story_id,
            self.missing_timestamp,
            self.missing_author,
            self.missing_text,
            self.duplicates,
            self.emitted_records,
            self.unknown_story,
            self.identity.exact_id,
            self.identity.username,
            self.identity.missing_id,
            self.identity.no_match,
            self.identity.ambiguous,
            self.unresolved_rate() * 100.0,
            self.orphan_promotions,
            self.orphan_rate() * 100.0,
            self.non_monotonic_edges,
            self.self_references,
            self.violation_rate() * 100.0,
        )
    }
}
