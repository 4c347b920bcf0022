// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Fatal pipeline errors
//!
//! Row-level problems are counted in the quality report and never surface
//! here. Only conditions that must abort a run get a variant.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input file unreadable: {path}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Empty input set: {message}")]
    EmptyInput { message: String },

    #[error("Output already exists: {path} (enable overwrite to replace it)")]
    OutputExists { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl PipelineError {
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::InputUnreadable {
            path: path.into(),
            source,
        }
    }
}
