// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Target state tracking
//!
//! [`StateTracker`] consumes classified markers in log order and builds the
//! [`Report`]. Unmarked lines are attributed by explicit lookup: the tracker
//! remembers the *name* of the target whose action header was seen last and
//! appends output to that target's open action, never to "whatever was parsed
//! last".
//!
//! [`JamLogParser`] bundles a [`Recognizer`] with a tracker for line-at-a-time
//! use.
//!
//! # Example
//!
//! ```
//! use jamlog::tracker::JamLogParser;
//! use jamlog::report::TargetStatus;
//!
//! let mut parser = JamLogParser::new();
//! parser.begin_source("bjam.log");
//! parser.process_text("compile foo.o");
//! parser.process_text("...failed updating 1 target... foo.o");
//! let parsed = parser.finish();
//! assert_eq!(parsed.report.get("foo.o").unwrap().status, TargetStatus::Failed);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::line::LogLine;
use crate::marker::{Marker, PatternTable, Recognizer};
use crate::report::{ActionKind, ActionRecord, LineRef, Outcome, Report, TargetStatus};

/// Action module prefixes that say nothing about the toolset
const GENERIC_MODULES: &[&str] = &["testing", "common", "builtin", "notfile", "stage", "boostbook"];

// ============================================================================
// Statistics
// ============================================================================

/// Counters describing how the log was consumed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Lines processed
    pub lines: usize,
    /// Lines recognized as markers
    pub markers: usize,
    /// Lines that looked like markers but were missing fields
    pub malformed: usize,
    /// Output lines with no open action to receive them
    pub discarded: usize,
    /// Markers dropped because their target was already closed
    pub after_close: usize,
}

// ============================================================================
// State Tracker
// ============================================================================

/// Builds a [`Report`] from a marker stream
#[derive(Debug, Default)]
pub struct StateTracker {
    report: Report,
    context: Option<String>,
    toolset: Option<String>,
    locate_root: Option<String>,
    stats: ParseStats,
}

impl StateTracker {
    /// Create a tracker with an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip `root` from the front of target names
    #[must_use]
    pub fn with_locate_root(mut self, root: impl Into<String>) -> Self {
        let root = root.into();
        let root = root.trim_end_matches(['/', '\\']).to_string();
        self.locate_root = (!root.is_empty()).then_some(root);
        self
    }

    /// The report built so far
    #[must_use]
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Counters so far
    #[must_use]
    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Forget which action receives unmarked lines
    ///
    /// Called at input boundaries so one file's trailing output is never
    /// attributed to another file's action.
    pub fn reset_context(&mut self) {
        self.context = None;
    }

    /// Apply one classified line
    pub fn apply(&mut self, marker: Marker, origin: LineRef) {
        self.stats.lines += 1;
        if marker.is_marker() {
            self.stats.markers += 1;
        }

        match marker {
            Marker::ActionStart {
                kind,
                action,
                target,
                command,
                at,
            } => self.start_action(kind, &action, &target, command, at, origin),
            Marker::ActionEnd {
                target,
                outcome,
                note,
                at,
            } => self.end_target(&target, outcome, note, at),
            Marker::RunEnd => self.end_run(),
            Marker::Timing { elapsed_ms } => self.record_timing(elapsed_ms),
            Marker::Context { toolset } => {
                debug!(%toolset, "toolset context");
                self.toolset = Some(toolset);
            }
            Marker::Progress => {}
            Marker::OutputLine(text) => self.capture(&text),
            Marker::Unrecognized(text) => {
                self.stats.malformed += 1;
                debug!(line = origin.line, "malformed marker treated as output");
                self.capture(&text);
            }
        }
    }

    /// Finalize: targets still open become `Incomplete` and their open actions `Unknown`
    #[must_use]
    pub fn finish(mut self) -> (Report, ParseStats) {
        for target in self.report.targets_mut() {
            if target.status == TargetStatus::Open {
                debug!(target = %target.name, "no terminal marker before end of input");
                target.close(TargetStatus::Incomplete, Outcome::Unknown, false);
            }
        }
        (self.report, self.stats)
    }

    fn start_action(
        &mut self,
        kind: ActionKind,
        action: &str,
        raw_target: &str,
        command: Option<String>,
        at: Option<DateTime<Utc>>,
        origin: LineRef,
    ) {
        let name = self.target_name(raw_target);
        let toolset = derive_toolset(&name, action).or_else(|| self.toolset.clone());
        let target = self.report.entry(&name, || toolset);

        if target.status.is_closed() {
            self.stats.after_close += 1;
            debug!(target = %name, action, "action for closed target dropped");
            self.context = None;
            return;
        }

        let reuse = target
            .open_action_mut()
            .is_some_and(|open| open.kind == kind);
        if reuse {
            debug!(target = %name, action, "action already open");
        } else {
            let mut record = ActionRecord::start(kind, action, &name, origin);
            record.started_at = at;
            if let Some(command) = command {
                record.command = command;
                record.capture_line("");
            }
            target.actions.push(record);
        }
        self.context = Some(name);
    }

    fn end_target(
        &mut self,
        raw_target: &str,
        outcome: Outcome,
        note: Option<String>,
        at: Option<DateTime<Utc>>,
    ) {
        let name = self.target_name(raw_target);
        let toolset = derive_toolset(&name, "").or_else(|| self.toolset.clone());
        let target = self.report.entry(&name, || toolset);

        if target.status.is_closed() {
            self.stats.after_close += 1;
            debug!(target = %name, %outcome, "status for closed target dropped");
            return;
        }

        if let Some(action) = target.open_action_mut() {
            action.close(outcome, at);
        }
        target.notes.extend(note);
        target.close(
            TargetStatus::Succeeded,
            Outcome::Unknown,
            outcome == Outcome::Failed,
        );
        debug!(target = %name, status = %target.status, "target closed");
    }

    fn end_run(&mut self) {
        for target in self.report.targets_mut() {
            if target.status == TargetStatus::Open {
                target.close(TargetStatus::Succeeded, Outcome::Succeeded, false);
            }
        }
        self.context = None;
    }

    fn record_timing(&mut self, elapsed_ms: u64) {
        let Some(name) = self.context.as_deref() else {
            return;
        };
        if let Some(action) = self
            .report
            .get_mut(name)
            .and_then(|t| t.actions.last_mut())
        {
            if action.duration_ms.is_none() {
                action.duration_ms = Some(elapsed_ms);
            }
        }
    }

    fn capture(&mut self, text: &str) {
        let action = match self.context.as_deref() {
            Some(name) => self.report.get_mut(name).and_then(|t| t.open_action_mut()),
            None => None,
        };
        match action {
            Some(action) => action.capture_line(text),
            None => self.stats.discarded += 1,
        }
    }

    /// Normalize a target as printed by the build tool into a report key
    fn target_name(&self, raw: &str) -> String {
        let name = strip_grist(raw);
        match self.locate_root.as_deref() {
            Some(root) => match name.strip_prefix(root) {
                Some(rest) if rest.starts_with(['/', '\\']) => {
                    rest.trim_start_matches(['/', '\\']).to_string()
                }
                _ => name,
            },
            None => name,
        }
    }
}

/// Convert jam grist into a path: `<pbin/foo.test>foo.o` → `bin/foo.test/foo.o`
///
/// Non-path grist (`<x86>foo`) is dropped.
fn strip_grist(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.starts_with('<') {
        return raw.to_string();
    }
    let Some(close) = raw.find('>') else {
        return raw.to_string();
    };
    let (grist, name) = (&raw[1..close], &raw[close + 1..]);
    if name.is_empty() {
        return raw.to_string();
    }
    match grist.strip_prefix('p') {
        Some(dir) if !dir.is_empty() => format!("{}/{}", dir.trim_end_matches('/'), name),
        _ => name.to_string(),
    }
}

/// Derive a toolset from a target path or action verb
///
/// b2 places outputs under `<test>.test/<toolset>/<variant>/...`; otherwise the
/// action's module prefix (`gcc.compile.c++` → `gcc`) is used when it names a
/// toolset.
fn derive_toolset(target: &str, action: &str) -> Option<String> {
    let components: Vec<&str> = target.split(['/', '\\']).collect();
    for window in components.windows(3) {
        let (dir, toolset) = (window[0], window[1]);
        if dir.len() > ".test".len() && dir.ends_with(".test") && !toolset.is_empty() {
            return Some(toolset.to_string());
        }
    }

    let (module, _) = action.split_once('.')?;
    (!module.is_empty() && !GENERIC_MODULES.contains(&module)).then(|| module.to_string())
}

// ============================================================================
// Streaming Parser
// ============================================================================

/// Result of parsing one run
#[derive(Debug, Clone)]
pub struct ParsedLog {
    /// Targets and their actions
    pub report: Report,
    /// Consumption counters
    pub stats: ParseStats,
    /// Names of the inputs, indexed by [`LineRef::source`]
    pub sources: Vec<String>,
}

/// Line-at-a-time jam log parser
#[derive(Debug, Default)]
pub struct JamLogParser {
    recognizer: Recognizer,
    tracker: StateTracker,
    sources: Vec<String>,
    line: usize,
}

impl JamLogParser {
    /// Create a parser with the default Boost.Jam vocabulary
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser over a custom pattern table
    #[must_use]
    pub fn with_patterns(table: PatternTable) -> Self {
        Self {
            recognizer: Recognizer::new(table),
            ..Self::default()
        }
    }

    /// Strip `root` from the front of target names
    #[must_use]
    pub fn with_locate_root(mut self, root: impl Into<String>) -> Self {
        self.tracker = self.tracker.with_locate_root(root);
        self
    }

    /// Start a new input; returns its source index
    pub fn begin_source(&mut self, name: impl Into<String>) -> usize {
        self.tracker.reset_context();
        self.sources.push(name.into());
        self.line = 0;
        self.sources.len() - 1
    }

    /// Process a line read by a [`crate::line::LineReader`]
    pub fn process_line(&mut self, line: &LogLine) {
        let marker = self.recognizer.classify(&line.text);
        self.tracker.apply(
            marker,
            LineRef {
                source: line.source,
                line: line.number,
            },
        );
    }

    /// Process raw text as the next line of the current input
    pub fn process_text(&mut self, text: &str) {
        if self.sources.is_empty() {
            self.begin_source("<input>");
        }
        self.line += 1;
        let marker = self.recognizer.classify(text);
        self.tracker.apply(
            marker,
            LineRef {
                source: self.sources.len() - 1,
                line: self.line,
            },
        );
    }

    /// Counters so far
    #[must_use]
    pub fn stats(&self) -> ParseStats {
        self.tracker.stats()
    }

    /// Finalize the run
    #[must_use]
    pub fn finish(self) -> ParsedLog {
        let (report, stats) = self.tracker.finish();
        ParsedLog {
            report,
            stats,
            sources: self.sources,
        }
    }
}

/// Parse a complete log held in memory
#[must_use]
pub fn parse_str(log: &str) -> ParsedLog {
    let mut parser = JamLogParser::new();
    parser.begin_source("<input>");
    for line in log.lines() {
        parser.process_text(line);
    }
    parser.finish()
}
