// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Author interaction graph and centrality measures
//!
//! Every cascade edge induces an author edge from the resharing author to the
//! author being reshared. Self-interactions are dropped. Authors are indexed
//! in sorted id order so every measure is deterministic.

use crate::cascade::Cascade;
use crate::records::{BotLabel, Stratum};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

const PAGERANK_DAMPING: f64 = 0.85;
const PAGERANK_MAX_ITER: usize = 100;
const PAGERANK_TOLERANCE: f64 = 1.0e-6;

/// Centrality scores for one author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorCentrality {
    pub author_id: String,
    pub stratum: Stratum,
    pub degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
    pub pagerank: f64,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    authors: Vec<String>,
    labels: Vec<Option<BotLabel>>,
    /// Directed, weighted by interaction count: resharer -> reshared
    out_edges: Vec<BTreeMap<usize, usize>>,
    /// Undirected neighbour lists, sorted
    neighbors: Vec<Vec<usize>>,
}

impl InteractionGraph {
    pub fn from_cascades(cascades: &[Cascade]) -> Self {
        let mut labels_by_author: BTreeMap<&str, Option<BotLabel>> = BTreeMap::new();
        for cascade in cascades {
            for node in &cascade.nodes {
                let entry = labels_by_author.entry(node.author_id.as_str()).or_insert(None);
                if entry.is_none() {
                    *entry = node.bot_label;
                }
            }
        }

        let authors: Vec<String> = labels_by_author.keys().map(|a| a.to_string()).collect();
        let labels: Vec<Option<BotLabel>> = labels_by_author.values().copied().collect();
        let index: BTreeMap<&str, usize> = authors.iter().enumerate().map(|(i, a)| (a.as_str(), i)).collect();

        let n = authors.len();
        let mut out_edges: Vec<BTreeMap<usize, usize>> = vec![BTreeMap::new(); n];
        let mut undirected: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];

        for cascade in cascades {
            for node in &cascade.nodes {
                let Some(p) = node.parent else { continue };
                let from = index[node.author_id.as_str()];
                let to = index[cascade.nodes[p].author_id.as_str()];
                if from == to {
                    continue;
                }
                *out_edges[from].entry(to).or_insert(0) += 1;
                undirected[from].insert(to);
                undirected[to].insert(from);
            }
        }

        Self {
            authors,
            labels,
            out_edges,
            neighbors: undirected.into_iter().map(|s| s.into_iter().collect()).collect(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.authors.len()
    }

    /// Distinct undirected author pairs that interacted
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(|n| n.len()).sum::<usize>() / 2
    }

    pub fn degree_centrality(&self) -> Vec<f64> {
        let n = self.node_count();
        if n <= 1 {
            return vec![0.0; n];
        }
        self.neighbors.iter().map(|nb| nb.len() as f64 / (n - 1) as f64).collect()
    }

    /// Breadth-first distances from `source`, `None` when unreachable
    fn bfs(&self, source: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.node_count()];
        let mut queue = VecDeque::new();
        dist[source] = Some(0);
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            let d = dist[v].unwrap_or(0);
            for &w in &self.neighbors[v] {
                if dist[w].is_none() {
                    dist[w] = Some(d + 1);
                    queue.push_back(w);
                }
            }
        }
        dist
    }

    /// Closeness with the Wasserman-Faust correction for disconnected graphs
    pub fn closeness_centrality(&self) -> Vec<f64> {
        let n = self.node_count();
        (0..n)
            .map(|u| {
                let dist = self.bfs(u);
                let reachable = dist.iter().filter(|d| matches!(d, Some(x) if *x > 0)).count();
                let total: usize = dist.iter().flatten().sum();
                if total == 0 || n <= 1 {
                    0.0
                } else {
                    let r = reachable as f64;
                    (r / total as f64) * (r / (n - 1) as f64)
                }
            })
            .collect()
    }

    /// Brandes betweenness on the undirected graph, normalized
    pub fn betweenness_centrality(&self) -> Vec<f64> {
        let n = self.node_count();
        let mut betweenness = vec![0.0; n];

        for s in 0..n {
            let mut stack = Vec::with_capacity(n);
            let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
            let mut sigma = vec![0.0_f64; n];
            let mut dist: Vec<i64> = vec![-1; n];
            sigma[s] = 1.0;
            dist[s] = 0;

            let mut queue = VecDeque::new();
            queue.push_back(s);
            while let Some(v) = queue.pop_front() {
                stack.push(v);
                for &w in &self.neighbors[v] {
                    if dist[w] < 0 {
                        dist[w] = dist[v] + 1;
                        queue.push_back(w);
                    }
                    if dist[w] == dist[v] + 1 {
                        sigma[w] += sigma[v];
                        predecessors[w].push(v);
                    }
                }
            }

            let mut delta = vec![0.0_f64; n];
            while let Some(w) = stack.pop() {
                for &v in &predecessors[w] {
                    delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
                }
                if w != s {
                    betweenness[w] += delta[w];
                }
            }
        }

        // Each unordered pair was counted from both ends
        if n > 2 {
            let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
            betweenness.iter_mut().for_each(|b| *b *= scale);
        } else {
            betweenness.iter_mut().for_each(|b| *b = 0.0);
        }
        betweenness
    }

    /// Weighted PageRank over resharer -> reshared edges
    pub fn pagerank(&self) -> Vec<f64> {
        let n = self.node_count();
        if n == 0 {
            return Vec::new();
        }
        let out_weight: Vec<f64> = self
            .out_edges
            .iter()
            .map(|edges| edges.values().sum::<usize>() as f64)
            .collect();

        let uniform = 1.0 / n as f64;
        let mut rank = vec![uniform; n];

        for iteration in 0..PAGERANK_MAX_ITER {
            let dangling: f64 = (0..n).filter(|&i| out_weight[i] == 0.0).map(|i| rank[i]).sum();
            let base = (PAGERANK_DAMPING * dangling + (1.0 - PAGERANK_DAMPING)) * uniform;
            let mut next = vec![base; n];

            for (i, edges) in self.out_edges.iter().enumerate() {
                if out_weight[i] == 0.0 {
                    continue;
                }
                for (&j, &w) in edges {
                    next[j] += PAGERANK_DAMPING * rank[i] * w as f64 / out_weight[i];
                }
            }

            let change: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
            rank = next;
            if change < n as f64 * PAGERANK_TOLERANCE {
                tracing::debug!("PageRank converged after {} iterations", iteration + 1);
                break;
            }
        }
        rank
    }

    /// All four measures for every author, in author id order
    pub fn centrality(&self) -> Vec<AuthorCentrality> {
        let degree = self.degree_centrality();
        let betweenness = self.betweenness_centrality();
        let closeness = self.closeness_centrality();
        let pagerank = self.pagerank();

        self.authors
            .iter()
            .enumerate()
            .map(|(i, author)| AuthorCentrality {
                author_id: author.clone(),
                stratum: Stratum::from_label(self.labels[i]),
                degree: degree[i],
                betweenness: betweenness[i],
                closeness: closeness[i],
                pagerank: pagerank[i],
            })
            .collect()
    }
}
