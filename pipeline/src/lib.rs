// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Data pipeline for studying bot vs human misinformation cascades
//!
//! This crate provides:
//! - Loaders for FakeNewsNet, CoAID and TwiBot-22 plus a seeded synthetic corpus
//! - Author identity resolution against bot/human labels
//! - Integration into a deduplicated, deterministic unified dataset
//! - Cascade reconstruction with orphan and timestamp repair
//! - Spread metrics and author centrality, stratified by bot/human origin
//! - Quality reports, dataset cards and all-or-nothing artifact persistence

pub mod cascade;
pub mod dataset_card;
pub mod datasets;
pub mod error;
pub mod identity;
pub mod integrate;
pub mod metrics;
pub mod network;
pub mod pipeline;
pub mod quality;
pub mod records;

pub use cascade::{Cascade, CascadeBuilder, CascadeNode, CascadeTree, ParentInference, StructuralIssues};
pub use dataset_card::{DatasetCard, DatasetCardBuilder};
pub use datasets::{DataSource, RawCorpus};
pub use error::PipelineError;
pub use identity::{IdentityTable, MatchStats};
pub use integrate::{DataIntegrator, DatasetStatistics, Integration, UnifiedDataset};
pub use metrics::{CascadeMetrics, MetricsEngine, MetricsReport};
pub use network::{AuthorCentrality, InteractionGraph};
pub use pipeline::{CascadePipeline, PipelineConfig, RunArtifacts};
pub use quality::QualityReport;
pub use records::{BotLabel, MatchSource, Stratum, UnifiedRecord, Veracity};
