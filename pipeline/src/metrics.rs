// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Spread metrics over reconstructed cascades
//!
//! Every tree in every story gets one [`CascadeMetrics`] row. Rows are
//! stratified by the label of the root author and exposed as paired raw
//! distributions; significance testing happens downstream.
//!
//! - Size: posts in the tree
//! - Reach: distinct authors in the tree
//! - Depth: longest root-to-leaf path
//! - Spread velocity: reach growth per hour since the root post
//! - Structural virality: mean pairwise distance between tree nodes

use crate::cascade::{Cascade, CascadeTree};
use crate::network::{AuthorCentrality, InteractionGraph};
use crate::pipeline::write_synced;
use crate::records::{Stratum, Veracity};
use anyhow::{Context, Result};
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Metrics for one cascade tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeMetrics {
    pub story_id: String,
    pub root_post_id: String,
    pub root_author: String,
    pub stratum: Stratum,
    pub veracity: Veracity,
    pub size: usize,
    pub reach: usize,
    pub depth: usize,
    pub duration_secs: i64,
    /// New authors per hour after the root; 0 when nothing spread
    pub velocity: f64,
    /// Distinct authors reached at `k * interval` after the root
    pub reach_curve: Vec<usize>,
    pub structural_virality: f64,
    pub bot_participants: usize,
    pub human_participants: usize,
    pub unknown_participants: usize,
    pub orphan_rooted: bool,
}

/// Flat CSV form of [`CascadeMetrics`]
#[derive(Debug, Serialize)]
struct CascadeMetricsRow<'a> {
    story_id: &'a str,
    root_post_id: &'a str,
    root_author: &'a str,
    stratum: Stratum,
    veracity: Veracity,
    size: usize,
    reach: usize,
    depth: usize,
    duration_secs: i64,
    velocity: f64,
    structural_virality: f64,
    bot_participants: usize,
    human_participants: usize,
    unknown_participants: usize,
    orphan_rooted: bool,
    reach_curve: String,
}

/// Paired raw per-cascade values for one stratum
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StratumDistribution {
    pub size: Vec<f64>,
    pub reach: Vec<f64>,
    pub depth: Vec<f64>,
    pub velocity: Vec<f64>,
    pub virality: Vec<f64>,
    pub duration_secs: Vec<f64>,
}

impl StratumDistribution {
    fn push(&mut self, metrics: &CascadeMetrics) {
        self.size.push(metrics.size as f64);
        self.reach.push(metrics.reach as f64);
        self.depth.push(metrics.depth as f64);
        self.velocity.push(metrics.velocity);
        self.virality.push(metrics.structural_virality);
        self.duration_secs.push(metrics.duration_secs as f64);
    }

    pub fn len(&self) -> usize {
        self.size.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
}

impl MetricSummary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        Self {
            count: n,
            mean: sorted.iter().sum::<f64>() / n as f64,
            median,
            max: sorted[n - 1],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StratumSummary {
    pub size: MetricSummary,
    pub reach: MetricSummary,
    pub depth: MetricSummary,
    pub velocity: MetricSummary,
    pub virality: MetricSummary,
    pub duration_secs: MetricSummary,
}

impl StratumSummary {
    fn from_distribution(dist: &StratumDistribution) -> Self {
        Self {
            size: MetricSummary::from_values(&dist.size),
            reach: MetricSummary::from_values(&dist.reach),
            depth: MetricSummary::from_values(&dist.depth),
            velocity: MetricSummary::from_values(&dist.velocity),
            virality: MetricSummary::from_values(&dist.virality),
            duration_secs: MetricSummary::from_values(&dist.duration_secs),
        }
    }
}

/// Who posted and who started cascades
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotAttribution {
    pub bot_posts: usize,
    pub human_posts: usize,
    pub unknown_posts: usize,
    pub bot_initiated: usize,
    pub human_initiated: usize,
    pub unknown_initiated: usize,
}

impl BotAttribution {
    fn percentage(part: usize, whole: usize) -> f64 {
        if whole == 0 {
            return 0.0;
        }
        part as f64 / whole as f64 * 100.0
    }

    pub fn total_posts(&self) -> usize {
        self.bot_posts + self.human_posts + self.unknown_posts
    }

    pub fn total_cascades(&self) -> usize {
        self.bot_initiated + self.human_initiated + self.unknown_initiated
    }

    pub fn bot_post_percentage(&self) -> f64 {
        Self::percentage(self.bot_posts, self.total_posts())
    }

    pub fn bot_cascade_percentage(&self) -> f64 {
        Self::percentage(self.bot_initiated, self.total_cascades())
    }

    pub fn human_cascade_percentage(&self) -> f64 {
        Self::percentage(self.human_initiated, self.total_cascades())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralityDistribution {
    pub degree: Vec<f64>,
    pub betweenness: Vec<f64>,
    pub closeness: Vec<f64>,
    pub pagerank: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralityReport {
    pub nodes: usize,
    pub edges: usize,
    pub authors: Vec<AuthorCentrality>,
    pub by_stratum: BTreeMap<Stratum, CentralityDistribution>,
}

impl CentralityReport {
    pub fn from_graph(graph: &InteractionGraph) -> Self {
        let authors = graph.centrality();
        let mut by_stratum: BTreeMap<Stratum, CentralityDistribution> = BTreeMap::new();
        for author in &authors {
            let dist = by_stratum.entry(author.stratum).or_default();
            dist.degree.push(author.degree);
            dist.betweenness.push(author.betweenness);
            dist.closeness.push(author.closeness);
            dist.pagerank.push(author.pagerank);
        }
        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            authors,
            by_stratum,
        }
    }
}

/// Everything the metrics stage produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub interval_secs: u64,
    pub per_cascade: Vec<CascadeMetrics>,
    pub distributions: BTreeMap<Stratum, StratumDistribution>,
    pub summaries: BTreeMap<Stratum, StratumSummary>,
    pub attribution: BotAttribution,
    /// Posts per UTC hour of day, by author stratum
    pub hourly_activity: BTreeMap<Stratum, [usize; 24]>,
    pub centrality: CentralityReport,
}

impl MetricsReport {
    /// One CSV row per cascade tree; the reach curve is `;`-joined
    pub fn cascade_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for m in &self.per_cascade {
            let curve = m.reach_curve.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(";");
            writer
                .serialize(CascadeMetricsRow {
                    story_id: &m.story_id,
                    root_post_id: &m.root_post_id,
                    root_author: &m.root_author,
                    stratum: m.stratum,
                    veracity: m.veracity,
                    size: m.size,
                    reach: m.reach,
                    depth: m.depth,
                    duration_secs: m.duration_secs,
                    velocity: m.velocity,
                    structural_virality: m.structural_virality,
                    bot_participants: m.bot_participants,
                    human_participants: m.human_participants,
                    unknown_participants: m.unknown_participants,
                    orphan_rooted: m.orphan_rooted,
                    reach_curve: curve,
                })
                .with_context(|| format!("Failed to serialize metrics for {}", m.root_post_id))?;
        }
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush metrics CSV buffer: {}", e.error()))
    }

    pub fn write_cascade_csv(&self, path: &Path) -> Result<()> {
        write_synced(path, &self.cascade_csv_bytes()?)
    }

    pub fn format(&self) -> String {
        let mut output = String::from("Cascade Metrics\n===============\n");
        output.push_str(&format!(
            "{:<8} {:>7} {:>9} {:>9} {:>7} {:>11} {:>9}\n",
            "Stratum", "Trees", "Size", "Reach", "Depth", "Velocity/h", "Virality"
        ));
        for (stratum, summary) in &self.summaries {
            output.push_str(&format!(
                "{:<8} {:>7} {:>9.2} {:>9.2} {:>7.2} {:>11.3} {:>9.3}\n",
                stratum.as_str(),
                summary.size.count,
                summary.size.mean,
                summary.reach.mean,
                summary.depth.mean,
                summary.velocity.mean,
                summary.virality.mean,
            ));
        }

        let a = &self.attribution;
        output.push_str(&format!(
            r#"
Bot Attribution:
  bot posts:          {} ({:.2}%)
  human posts:        {}
  unknown posts:      {}
  bot-initiated:      {} ({:.2}%)
  human-initiated:    {} ({:.2}%)
  unknown-initiated:  {}

Interaction Graph:
  authors:            {}
  edges:              {}
"#,
            a.bot_posts,
            a.bot_post_percentage(),
            a.human_posts,
            a.unknown_posts,
            a.bot_initiated,
            a.bot_cascade_percentage(),
            a.human_initiated,
            a.human_cascade_percentage(),
            a.unknown_initiated,
            self.centrality.nodes,
            self.centrality.edges,
        ));
        output
    }
}

/// Computes [`MetricsReport`]s with a fixed reach-curve sampling grid
#[derive(Debug, Clone, Copy)]
pub struct MetricsEngine {
    interval_secs: u64,
    samples: usize,
}

impl MetricsEngine {
    pub fn new(interval_secs: u64, samples: usize) -> Self {
        Self { interval_secs, samples }
    }

    /// Metrics for one tree of a cascade
    pub fn tree_metrics(&self, cascade: &Cascade, tree: &CascadeTree) -> CascadeMetrics {
        let root = cascade.root(tree);
        let root_ts = root.timestamp;

        let mut authors: HashSet<&str> = HashSet::new();
        let mut first_seen: Vec<i64> = Vec::new();
        let mut participants = [0usize; 3];
        let mut last_ts = root_ts;

        for node in cascade.tree_nodes(tree) {
            last_ts = last_ts.max(node.timestamp);
            if authors.insert(node.author_id.as_str()) {
                first_seen.push((node.timestamp - root_ts).num_seconds());
                match Stratum::from_label(node.bot_label) {
                    Stratum::Bot => participants[0] += 1,
                    Stratum::Human => participants[1] += 1,
                    Stratum::Unknown => participants[2] += 1,
                }
            }
        }

        let reach = authors.len();
        let duration_secs = (last_ts - root_ts).num_seconds();
        let velocity = if duration_secs > 0 && reach > 1 {
            (reach - 1) as f64 / (duration_secs as f64 / 3600.0)
        } else {
            0.0
        };

        // Members are in time order, so first_seen is non-decreasing
        let mut reach_curve = Vec::with_capacity(self.samples + 1);
        let mut reached = 0;
        for k in 0..=self.samples {
            let cutoff = (k as u64).saturating_mul(self.interval_secs) as i64;
            while reached < first_seen.len() && first_seen[reached] <= cutoff {
                reached += 1;
            }
            reach_curve.push(reached);
        }

        CascadeMetrics {
            story_id: cascade.story_id.clone(),
            root_post_id: tree.root_post_id.clone(),
            root_author: root.author_id.clone(),
            stratum: Stratum::from_label(root.bot_label),
            veracity: cascade.veracity,
            size: tree.size,
            reach,
            depth: tree.depth,
            duration_secs,
            velocity,
            reach_curve,
            structural_virality: structural_virality(cascade, tree),
            bot_participants: participants[0],
            human_participants: participants[1],
            unknown_participants: participants[2],
            orphan_rooted: root.orphaned,
        }
    }

    pub fn compute(&self, cascades: &[Cascade]) -> MetricsReport {
        let mut report = MetricsReport {
            interval_secs: self.interval_secs,
            ..Default::default()
        };

        for cascade in cascades {
            for node in &cascade.nodes {
                let stratum = Stratum::from_label(node.bot_label);
                match stratum {
                    Stratum::Bot => report.attribution.bot_posts += 1,
                    Stratum::Human => report.attribution.human_posts += 1,
                    Stratum::Unknown => report.attribution.unknown_posts += 1,
                }
                report.hourly_activity.entry(stratum).or_insert([0; 24])[node.timestamp.hour() as usize] += 1;
            }

            for tree in &cascade.trees {
                let metrics = self.tree_metrics(cascade, tree);
                match metrics.stratum {
                    Stratum::Bot => report.attribution.bot_initiated += 1,
                    Stratum::Human => report.attribution.human_initiated += 1,
                    Stratum::Unknown => report.attribution.unknown_initiated += 1,
                }
                report.distributions.entry(metrics.stratum).or_default().push(&metrics);
                report.per_cascade.push(metrics);
            }
        }

        report.summaries = report
            .distributions
            .iter()
            .map(|(stratum, dist)| (*stratum, StratumSummary::from_distribution(dist)))
            .collect();

        let graph = InteractionGraph::from_cascades(cascades);
        report.centrality = CentralityReport::from_graph(&graph);

        tracing::info!(
            "Computed metrics for {} cascade trees ({} bot-rooted, {} human-rooted)",
            report.per_cascade.len(),
            report.attribution.bot_initiated,
            report.attribution.human_initiated
        );
        report
    }
}

/// Mean shortest-path distance over all node pairs of a tree
///
/// Uses the Wiener index: each edge contributes `s * (n - s)` where `s` is
/// the size of the subtree below it.
pub fn structural_virality(cascade: &Cascade, tree: &CascadeTree) -> f64 {
    let n = tree.size;
    if n < 2 {
        return 0.0;
    }
    let mut subtree: BTreeMap<usize, usize> = tree.members.iter().map(|&idx| (idx, 1)).collect();
    let mut wiener = 0.0;
    // Children always follow their parent in member order
    for &idx in tree.members.iter().rev() {
        let below = subtree.get(&idx).copied().unwrap_or(1);
        if let Some(parent) = cascade.nodes[idx].parent {
            wiener += (below * (n - below)) as f64;
            *subtree.entry(parent).or_insert(1) += below;
        }
    }
    wiener / ((n * (n - 1)) as f64 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{CascadeBuilder, ParentInference};
    use crate::datasets::load_synthetic;
    use crate::identity::IdentityTable;
    use crate::integrate::DataIntegrator;
    use crate::records::{BotLabel, SourceDataset, UnifiedRecord};
    use chrono::{TimeZone, Utc};

    fn record(id: &str, author: &str, secs: i64, parent: Option<&str>, label: Option<BotLabel>) -> UnifiedRecord {
        UnifiedRecord {
            post_id: id.to_string(),
            platform: "twitter".to_string(),
            source: SourceDataset::Synthetic,
            story_id: "S".to_string(),
            author_id: author.to_string(),
            bot_label: label,
            label_source: "exact_id".to_string(),
            veracity: Veracity::Fake,
            timestamp: Utc.timestamp_opt(1_600_000_000 + secs, 0).single().unwrap(),
            text: "t".to_string(),
            parent_id: parent.map(String::from),
        }
    }

    fn cascade(records: &[UnifiedRecord]) -> Cascade {
        let refs: Vec<&UnifiedRecord> = records.iter().collect();
        CascadeBuilder::new(ParentInference::ExplicitOnly).build_story("S", &refs).0
    }

    #[test]
    fn test_single_post_cascade() {
        let c = cascade(&[record("1", "a", 0, None, Some(BotLabel::Bot))]);
        let m = MetricsEngine::new(3600, 4).tree_metrics(&c, &c.trees[0]);

        assert_eq!(m.size, 1);
        assert_eq!(m.reach, 1);
        assert_eq!(m.depth, 0);
        assert_eq!(m.velocity, 0.0);
        assert_eq!(m.structural_virality, 0.0);
        assert_eq!(m.reach_curve, vec![1, 1, 1, 1, 1]);
        assert_eq!(m.stratum, Stratum::Bot);
    }

    #[test]
    fn test_star_and_chain() {
        // a posts, b and c reshare within the first hour, a replies to c later
        let c = cascade(&[
            record("1", "a", 0, None, Some(BotLabel::Human)),
            record("2", "b", 600, Some("1"), Some(BotLabel::Bot)),
            record("3", "c", 1800, Some("1"), None),
            record("4", "a", 7200, Some("3"), Some(BotLabel::Human)),
        ]);
        let m = MetricsEngine::new(3600, 3).tree_metrics(&c, &c.trees[0]);

        assert_eq!(m.size, 4);
        assert_eq!(m.reach, 3);
        assert_eq!(m.depth, 2);
        assert_eq!(m.duration_secs, 7200);
        assert!((m.velocity - 1.0).abs() < 1e-9);
        assert_eq!(m.reach_curve, vec![1, 3, 3, 3]);
        assert_eq!((m.bot_participants, m.human_participants, m.unknown_participants), (1, 1, 1));
        // Pair distances: 1-2:1 1-3:1 1-4:2 2-3:2 2-4:3 3-4:1
        assert!((m.structural_virality - 10.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_orphan_rooted_tree_is_flagged() {
        let c = cascade(&[record("1", "a", 0, None, None), record("5", "b", 10, Some("404"), None)]);
        let report = MetricsEngine::new(60, 2).compute(&[c]);

        assert_eq!(report.per_cascade.len(), 2);
        assert!(!report.per_cascade[0].orphan_rooted);
        assert!(report.per_cascade[1].orphan_rooted);
    }

    #[test]
    fn test_summary_median() {
        let summary = MetricSummary::from_values(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(summary.count, 4);
        assert!((summary.median - 2.5).abs() < 1e-9);
        assert!((summary.mean - 2.5).abs() < 1e-9);
        assert_eq!(summary.max, 4.0);
        assert_eq!(MetricSummary::from_values(&[]), MetricSummary::default());
    }

    #[test]
    fn test_report_on_synthetic_data() {
        let corpus = load_synthetic(30, 11);
        let table = IdentityTable::build(&corpus.accounts, &corpus.bot_labels);
        let dataset = DataIntegrator::new(&table).integrate(&corpus).dataset;
        let (cascades, _) = CascadeBuilder::new(ParentInference::ExplicitOnly).build_all(&dataset, false);
        let report = MetricsEngine::new(1800, 8).compute(&cascades);

        assert_eq!(report.attribution.total_posts(), dataset.len());
        assert_eq!(report.attribution.total_cascades(), report.per_cascade.len());
        let paired: usize = report.distributions.values().map(|d| d.len()).sum();
        assert_eq!(paired, report.per_cascade.len());
        let hourly: usize = report.hourly_activity.values().flat_map(|h| h.iter()).sum();
        assert_eq!(hourly, dataset.len());

        for m in &report.per_cascade {
            assert!(m.reach >= 1 && m.reach <= m.size);
            assert_eq!(m.reach_curve.len(), 9);
            assert!(m.reach_curve.windows(2).all(|w| w[0] <= w[1]));
            assert!(*m.reach_curve.last().unwrap() <= m.reach);
            assert!(m.velocity >= 0.0);
        }
        assert!(report.format().contains("Bot Attribution"));
    }

    #[test]
    fn test_write_cascade_csv() {
        let c = cascade(&[record("1", "a", 0, None, None), record("2", "b", 60, Some("1"), None)]);
        let report = MetricsEngine::new(30, 2).compute(&[c]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cascade_metrics.csv");

        report.write_cascade_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("story_id,root_post_id"));
        assert!(text.contains("1;1;2"));
    }
}
