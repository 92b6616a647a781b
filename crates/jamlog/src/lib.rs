// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! jamlog: Boost.Jam build log processing
//!
//! This library crate turns the line-oriented log of a `b2`/`bjam` run into a
//! per-target report of build actions, and renders that report as XML for
//! regression dashboards.
//!
//! Processing is split into stages:
//!
//! - [`line`] reads raw input into numbered lines
//! - [`marker`] classifies each line against a pattern table
//! - [`tracker`] drives the per-target state machine and builds the [`Report`]
//! - [`assemble`] computes summary attributes into a document tree
//! - [`xml`] renders the tree with escaping
//!
//! # Example
//!
//! ```
//! use jamlog::{RunInfo, assemble, parse_str, render};
//!
//! let log = "\
//! gcc.compile.c++ bin/foo.o
//! foo.cpp:1: error: expected ';'
//! ...failed gcc.compile.c++ bin/foo.o...
//! ";
//! let parsed = parse_str(log);
//! let run = RunInfo::default();
//! let xml = render(&assemble(&parsed.report, &run));
//! assert!(xml.contains(r#"<target name="bin/foo.o" status="failed""#));
//! ```

pub mod assemble;
pub mod error;
pub mod line;
pub mod marker;
pub mod report;
pub mod tracker;
pub mod xml;

pub use assemble::{ActionCounts, ReportDocument, RunSummary, TargetNode, assemble};
pub use error::JamLogError;
pub use line::{Input, LineReader, LogLine, ReadSummary, read_inputs};
pub use marker::{Marker, PatternTable, Recognizer, RuleKind, RuleSpec};
pub use report::{
    ActionKind, ActionRecord, Outcome, Report, RunInfo, TargetRecord, TargetStatus,
};
pub use tracker::{JamLogParser, ParseStats, ParsedLog, StateTracker, parse_str};
pub use xml::{render, write_report};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::assemble::assemble;
    pub use crate::error::JamLogError;
    pub use crate::report::{Outcome, Report, RunInfo, TargetStatus};
    pub use crate::tracker::{JamLogParser, parse_str};
    pub use crate::xml::render;
}
