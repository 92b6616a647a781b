// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for jamlog

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading jam logs or writing reports
///
/// Classification of individual lines never fails; only the edges of the
/// transformation (opening inputs, building pattern tables, writing output)
/// produce these.
#[derive(Debug, Error)]
pub enum JamLogError {
    /// Error reading from an already opened input
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A named input could not be opened
    #[error("Cannot open input {}: {source}", path.display())]
    Open {
        /// The input path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// None of the requested inputs could be read
    #[error("No readable input")]
    NoInput,

    /// A pattern table rule has a regex that does not compile
    #[error("Invalid pattern in rule '{rule}': {message}")]
    InvalidPattern {
        /// Name of the offending rule
        rule: String,
        /// Description from the regex engine
        message: String,
    },

    /// A pattern table file is not valid JSON
    #[error("Pattern table parse error: {0}")]
    PatternConfig(#[from] serde_json::Error),

    /// Writing the report document failed
    #[error("Failed to write report: {0}")]
    Write(#[source] std::io::Error),
}
