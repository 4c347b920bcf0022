// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Cascade reconstruction
//!
//! Turns the records of one story into a directed forest of reshares and
//! replies. Posts are ordered by `(timestamp, post id)` and a parent must come
//! earlier in that order, which keeps every story acyclic and every edge
//! monotone in time. References that cannot be honoured are repaired by
//! promoting the post to a root and counted in [`StructuralIssues`].

use crate::integrate::UnifiedDataset;
use crate::records::{compare_post_ids, BotLabel, UnifiedRecord, Veracity};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do with posts that carry no explicit parent reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentInference {
    /// Such posts start their own tree
    #[default]
    ExplicitOnly,
    /// Attach to the most recent earlier post of the same story
    MostRecentPrior,
}

impl ParentInference {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "explicit_only" | "explicit" => Some(ParentInference::ExplicitOnly),
            "most_recent_prior" | "inferred" => Some(ParentInference::MostRecentPrior),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeNode {
    pub post_id: String,
    pub author_id: String,
    pub bot_label: Option<BotLabel>,
    pub timestamp: DateTime<Utc>,
    /// Index of the parent node, `None` for roots
    pub parent: Option<usize>,
    pub parent_post_id: Option<String>,
    /// Child indices in `(timestamp, post id)` order
    pub children: Vec<usize>,
    pub depth: usize,
    /// Index into [`Cascade::trees`]
    pub tree: usize,
    /// Root only because its referenced parent was never collected
    pub orphaned: bool,
    pub inferred_parent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeTree {
    pub root: usize,
    pub root_post_id: String,
    pub size: usize,
    /// Longest root-to-leaf path in edges
    pub depth: usize,
    /// Node indices in `(timestamp, post id)` order, root first
    pub members: Vec<usize>,
}

/// Propagation forest for one story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    pub story_id: String,
    pub veracity: Veracity,
    pub nodes: Vec<CascadeNode>,
    pub trees: Vec<CascadeTree>,
}

impl Cascade {
    pub fn root(&self, tree: &CascadeTree) -> &CascadeNode {
        &self.nodes[tree.root]
    }

    pub fn tree_nodes<'a>(&'a self, tree: &'a CascadeTree) -> impl Iterator<Item = &'a CascadeNode> + 'a {
        tree.members.iter().map(move |&idx| &self.nodes[idx])
    }
}

/// Repairs made while building cascades
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralIssues {
    pub orphan_promotions: usize,
    pub non_monotonic_edges: usize,
    pub self_references: usize,
    pub orphaned_posts: Vec<String>,
}

impl StructuralIssues {
    pub fn merge(&mut self, other: StructuralIssues) {
        self.orphan_promotions += other.orphan_promotions;
        self.non_monotonic_edges += other.non_monotonic_edges;
        self.self_references += other.self_references;
        self.orphaned_posts.extend(other.orphaned_posts);
    }
}

pub struct CascadeBuilder {
    inference: ParentInference,
}

impl CascadeBuilder {
    pub fn new(inference: ParentInference) -> Self {
        Self { inference }
    }

    /// Build the forest for a single story
    pub fn build_story(&self, story_id: &str, records: &[&UnifiedRecord]) -> (Cascade, StructuralIssues) {
        let mut ordered: Vec<&UnifiedRecord> = records.to_vec();
        ordered.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| compare_post_ids(&a.post_id, &b.post_id))
        });

        let mut position: HashMap<&str, usize> = HashMap::with_capacity(ordered.len());
        for (idx, record) in ordered.iter().enumerate() {
            position.entry(record.post_id.as_str()).or_insert(idx);
        }

        let mut issues = StructuralIssues::default();
        let mut nodes: Vec<CascadeNode> = Vec::with_capacity(ordered.len());
        let mut trees: Vec<CascadeTree> = Vec::new();

        for (idx, record) in ordered.iter().enumerate() {
            let mut orphaned = false;
            let mut inferred_parent = false;

            let parent = match record.parent_id.as_deref() {
                Some(parent_id) if parent_id == record.post_id => {
                    tracing::warn!("Post {} in story {} references itself", record.post_id, story_id);
                    issues.self_references += 1;
                    None
                }
                Some(parent_id) => match position.get(parent_id) {
                    Some(&p) if p < idx => Some(p),
                    Some(_) => {
                        tracing::warn!(
                            "Post {} in story {} precedes its parent {}; promoted to root",
                            record.post_id,
                            story_id,
                            parent_id
                        );
                        issues.non_monotonic_edges += 1;
                        None
                    }
                    None => {
                        tracing::debug!(
                            "Parent {} of post {} missing from story {}; promoted to root",
                            parent_id,
                            record.post_id,
                            story_id
                        );
                        issues.orphan_promotions += 1;
                        issues.orphaned_posts.push(record.post_id.clone());
                        orphaned = true;
                        None
                    }
                },
                None if self.inference == ParentInference::MostRecentPrior && idx > 0 => {
                    inferred_parent = true;
                    Some(idx - 1)
                }
                None => None,
            };

            let (depth, tree) = match parent {
                Some(p) => {
                    let depth = nodes[p].depth + 1;
                    let tree = nodes[p].tree;
                    nodes[p].children.push(idx);
                    trees[tree].members.push(idx);
                    trees[tree].size += 1;
                    trees[tree].depth = trees[tree].depth.max(depth);
                    (depth, tree)
                }
                None => {
                    trees.push(CascadeTree {
                        root: idx,
                        root_post_id: record.post_id.clone(),
                        size: 1,
                        depth: 0,
                        members: vec![idx],
                    });
                    (0, trees.len() - 1)
                }
            };

            nodes.push(CascadeNode {
                post_id: record.post_id.clone(),
                author_id: record.author_id.clone(),
                bot_label: record.bot_label,
                timestamp: record.timestamp,
                parent,
                parent_post_id: parent.map(|p| ordered[p].post_id.clone()),
                children: Vec::new(),
                depth,
                tree,
                orphaned,
                inferred_parent,
            });
        }

        let veracity = ordered.first().map(|r| r.veracity).unwrap_or(Veracity::Unverified);
        let cascade = Cascade {
            story_id: story_id.to_string(),
            veracity,
            nodes,
            trees,
        };
        (cascade, issues)
    }

    /// Build every story's forest, optionally on the rayon pool
    ///
    /// Output is ordered by story id regardless of `parallel`.
    pub fn build_all(&self, dataset: &UnifiedDataset, parallel: bool) -> (Vec<Cascade>, StructuralIssues) {
        let groups: Vec<(&str, Vec<&UnifiedRecord>)> = dataset.by_story().into_iter().collect();

        let built: Vec<(Cascade, StructuralIssues)> = if parallel {
            groups
                .par_iter()
                .map(|(story_id, records)| self.build_story(story_id, records))
                .collect()
        } else {
            groups
                .iter()
                .map(|(story_id, records)| self.build_story(story_id, records))
                .collect()
        };

        let mut issues = StructuralIssues::default();
        let mut cascades = Vec::with_capacity(built.len());
        for (cascade, story_issues) in built {
            issues.merge(story_issues);
            cascades.push(cascade);
        }

        let trees: usize = cascades.iter().map(|c| c.trees.len()).sum();
        tracing::info!(
            "Built {} cascades ({} trees) from {} records",
            cascades.len(),
            trees,
            dataset.len()
        );
        if issues.orphan_promotions > 0 {
            tracing::warn!("{} posts promoted to roots after missing parents", issues.orphan_promotions);
        }
        (cascades, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::load_synthetic;
    use crate::identity::IdentityTable;
    use crate::integrate::DataIntegrator;
    use crate::records::SourceDataset;
    use chrono::TimeZone;

    fn record(id: &str, author: &str, secs: i64, parent: Option<&str>) -> UnifiedRecord {
        UnifiedRecord {
            post_id: id.to_string(),
            platform: "twitter".to_string(),
            source: SourceDataset::Synthetic,
            story_id: "S".to_string(),
            author_id: author.to_string(),
            bot_label: None,
            label_source: "unresolved_no_match".to_string(),
            veracity: Veracity::Fake,
            timestamp: Utc.timestamp_opt(secs, 0).single().unwrap(),
            text: "t".to_string(),
            parent_id: parent.map(String::from),
        }
    }

    fn build(records: &[UnifiedRecord], inference: ParentInference) -> (Cascade, StructuralIssues) {
        let refs: Vec<&UnifiedRecord> = records.iter().collect();
        CascadeBuilder::new(inference).build_story("S", &refs)
    }

    #[test]
    fn test_tie_break_orders_children_by_id() {
        // Input order deliberately scrambled
        let records = vec![
            record("P3", "c", 5, Some("P1")),
            record("P1", "a", 0, None),
            record("P2", "b", 5, Some("P1")),
        ];
        let (cascade, issues) = build(&records, ParentInference::ExplicitOnly);

        assert_eq!(cascade.trees.len(), 1);
        let tree = &cascade.trees[0];
        let root = cascade.root(tree);
        assert_eq!(root.post_id, "P1");
        let children: Vec<&str> = root.children.iter().map(|&i| cascade.nodes[i].post_id.as_str()).collect();
        assert_eq!(children, vec!["P2", "P3"]);
        assert_eq!(tree.depth, 1);
        assert_eq!(tree.size, 3);
        assert_eq!(issues, StructuralIssues::default());
    }

    #[test]
    fn test_missing_parent_is_promoted() {
        let records = vec![record("P1", "a", 0, None), record("P4", "b", 10, Some("P9"))];
        let (cascade, issues) = build(&records, ParentInference::ExplicitOnly);

        assert_eq!(cascade.trees.len(), 2);
        let p4 = cascade.nodes.iter().find(|n| n.post_id == "P4").unwrap();
        assert!(p4.orphaned);
        assert_eq!(p4.parent, None);
        assert_eq!(p4.depth, 0);
        assert_eq!(issues.orphan_promotions, 1);
        assert_eq!(issues.orphaned_posts, vec!["P4".to_string()]);
    }

    #[test]
    fn test_parent_after_child_is_repaired() {
        let records = vec![record("A", "a", 100, Some("B")), record("B", "b", 50, Some("A"))];
        let (cascade, issues) = build(&records, ParentInference::ExplicitOnly);

        // B comes first, so A -> B is kept and B -> A is rejected
        assert_eq!(issues.non_monotonic_edges, 1);
        assert_eq!(cascade.trees.len(), 1);
        assert_eq!(cascade.trees[0].root_post_id, "B");
    }

    #[test]
    fn test_self_reference() {
        let records = vec![record("A", "a", 0, Some("A"))];
        let (cascade, issues) = build(&records, ParentInference::ExplicitOnly);

        assert_eq!(issues.self_references, 1);
        assert_eq!(cascade.nodes[0].parent, None);
    }

    #[test]
    fn test_most_recent_prior_inference() {
        let records = vec![
            record("1", "a", 0, None),
            record("2", "b", 10, None),
            record("3", "c", 20, Some("1")),
            record("4", "d", 30, None),
        ];
        let (cascade, _) = build(&records, ParentInference::MostRecentPrior);

        assert_eq!(cascade.trees.len(), 1);
        assert_eq!(cascade.nodes[1].parent, Some(0));
        assert!(cascade.nodes[1].inferred_parent);
        assert_eq!(cascade.nodes[2].parent, Some(0));
        assert!(!cascade.nodes[2].inferred_parent);
        assert_eq!(cascade.nodes[3].parent, Some(2));
        assert_eq!(cascade.trees[0].depth, 2);

        let (explicit, _) = build(&records, ParentInference::ExplicitOnly);
        assert_eq!(explicit.trees.len(), 3);
    }

    #[test]
    fn test_single_post_story() {
        let records = vec![record("1", "a", 0, None)];
        let (cascade, _) = build(&records, ParentInference::ExplicitOnly);

        assert_eq!(cascade.trees.len(), 1);
        assert_eq!(cascade.trees[0].size, 1);
        assert_eq!(cascade.trees[0].depth, 0);
    }

    #[test]
    fn test_forest_invariants_on_synthetic_data() {
        let corpus = load_synthetic(40, 5);
        let table = IdentityTable::build(&corpus.accounts, &corpus.bot_labels);
        let dataset = DataIntegrator::new(&table).integrate(&corpus).dataset;
        let (cascades, issues) = CascadeBuilder::new(ParentInference::ExplicitOnly).build_all(&dataset, false);

        assert_eq!(issues.orphan_promotions, 1);
        for cascade in &cascades {
            let mut seen = 0;
            for tree in &cascade.trees {
                assert_eq!(cascade.root(tree).parent, None);
                seen += tree.size;
            }
            assert_eq!(seen, cascade.nodes.len());
            for node in &cascade.nodes {
                if let Some(p) = node.parent {
                    let parent = &cascade.nodes[p];
                    assert!(parent.timestamp <= node.timestamp);
                    assert_eq!(node.depth, parent.depth + 1);
                    assert_eq!(node.tree, parent.tree);
                }
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let corpus = load_synthetic(60, 9);
        let table = IdentityTable::build(&corpus.accounts, &corpus.bot_labels);
        let dataset = DataIntegrator::new(&table).integrate(&corpus).dataset;
        let builder = CascadeBuilder::new(ParentInference::ExplicitOnly);

        let (sequential, seq_issues) = builder.build_all(&dataset, false);
        let (parallel, par_issues) = builder.build_all(&dataset, true);

        assert_eq!(sequential, parallel);
        assert_eq!(seq_issues, par_issues);
    }
}
