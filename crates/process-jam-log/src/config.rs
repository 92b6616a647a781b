// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for process-jam-log
//!
//! This module provides the command-line model: which logs to read, where the
//! report goes, the run metadata written onto the report, and logging options.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use jamlog::{Input, JamLogError, PatternTable, RunInfo};
use tracing::warn;

/// Process Jam Log - turn Boost.Jam build logs into regression reports
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "process-jam-log")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Jam log files to process, in order
    ///
    /// Standard input is read when no file is given.
    #[arg(value_name = "LOG")]
    pub inputs: Vec<PathBuf>,

    /// Jam log file to process, read after the positional logs (repeatable)
    #[arg(long = "input-file", value_name = "LOG")]
    pub input_files: Vec<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, env = "PROCESS_JAM_LOG_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Report document format
    #[arg(long, value_enum, default_value_t = OutputFormat::Xml)]
    pub format: OutputFormat,

    /// Identity of whoever ran the tests
    #[arg(long)]
    pub runner: Option<String>,

    /// Branch or tag that was tested
    #[arg(long)]
    pub tag: Option<String>,

    /// Platform the tests ran on
    #[arg(long)]
    pub platform: Option<String>,

    /// Where the tested sources came from (e.g. git, tarball)
    #[arg(long)]
    pub source: Option<String>,

    /// Revision that was tested
    #[arg(long)]
    pub revision: Option<String>,

    /// Mark the run as incremental rather than full
    #[arg(long, default_value = "false")]
    pub incremental: bool,

    /// File whose contents are embedded in the report as a comment
    #[arg(long, value_name = "FILE")]
    pub comment: Option<PathBuf>,

    /// Build directory prefix stripped from target names
    #[arg(long, value_name = "DIR")]
    pub locate_root: Option<String>,

    /// Echo every input line to stderr as it is consumed
    #[arg(long, default_value = "false")]
    pub echo: bool,

    /// JSON pattern table replacing the built-in Boost.Jam rules
    #[arg(long, value_name = "FILE", env = "PROCESS_JAM_LOG_PATTERNS")]
    pub patterns: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so they never mix with a report on stdout.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Report document formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Regression report XML
    #[default]
    Xml,
    /// The same document tree as JSON
    Json,
}

impl Config {
    /// The inputs to read, standard input when none were named
    ///
    /// Positional logs come first, then every `--input-file` in order.
    #[must_use]
    pub fn inputs(&self) -> Vec<Input> {
        let paths: Vec<PathBuf> = self
            .inputs
            .iter()
            .chain(&self.input_files)
            .cloned()
            .collect();
        Input::from_paths(&paths)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The pattern table file is specified but doesn't exist
    /// - The output file's parent directory doesn't exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref patterns) = self.patterns {
            if !patterns.is_file() {
                return Err(ConfigError::PatternsNotFound(patterns.clone()));
            }
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(ConfigError::OutputIsDirectory(output.clone()));
            }
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.is_dir() {
                    return Err(ConfigError::OutputDirectoryNotFound(parent.to_path_buf()));
                }
            }
        }

        Ok(())
    }

    /// Load the pattern table, the built-in one unless `--patterns` was given
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold a valid table.
    pub fn pattern_table(&self) -> Result<PatternTable, ConfigError> {
        let Some(ref path) = self.patterns else {
            return Ok(PatternTable::boost_jam());
        };
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::PatternsReadFailed(path.clone(), e))?;
        PatternTable::from_json(&json).map_err(|e| ConfigError::InvalidPatterns(path.clone(), e))
    }

    /// Run metadata for the report's root element
    ///
    /// An unreadable comment file is logged and left out of the report.
    #[must_use]
    pub fn run_info(&self, timestamp: DateTime<Utc>) -> RunInfo {
        RunInfo {
            source: self.source.clone(),
            runner: self.runner.clone(),
            platform: self.platform.clone(),
            tag: self.tag.clone(),
            revision: self.revision.clone(),
            incremental: self.incremental,
            timestamp: Some(timestamp),
            comment: self.comment.as_deref().and_then(read_comment),
        }
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

fn read_comment(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(comment) => Some(comment),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "comment file not readable; omitted");
            None
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Pattern table file not found
    #[error("Pattern table not found: {0}")]
    PatternsNotFound(PathBuf),

    /// Failed to read the pattern table file
    #[error("Failed to read pattern table {0}: {1}")]
    PatternsReadFailed(PathBuf, std::io::Error),

    /// Pattern table file is not a valid table
    #[error("Invalid pattern table {0}: {1}")]
    InvalidPatterns(PathBuf, JamLogError),

    /// Output path names a directory
    #[error("Output path is a directory: {0}")]
    OutputIsDirectory(PathBuf),

    /// Output file's directory does not exist
    #[error("Output directory not found: {0}")]
    OutputDirectoryNotFound(PathBuf),
}
