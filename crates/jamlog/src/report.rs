// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Report data model
//!
//! A [`Report`] owns one [`TargetRecord`] per distinct target name seen in the
//! log, in first-seen order. Each target owns the [`ActionRecord`]s performed
//! against it, in log order.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a build action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Compiling a source file into an object
    Compile,
    /// Linking objects into an executable or shared library
    Link,
    /// Running a test executable
    Run,
    /// Archiving objects into a static library
    Lib,
    /// Any other jam action (mkdir, copy, ...)
    Unknown,
}

impl ActionKind {
    /// Classify a jam action verb such as `gcc.compile.c++` or `testing.capture-output`
    #[must_use]
    pub fn from_action(action: &str) -> Self {
        let action = action.to_ascii_lowercase();
        if action.contains("compile") {
            Self::Compile
        } else if action.contains("link") {
            Self::Link
        } else if action.contains("archive") || action == "lib" || action.ends_with(".lib") {
            Self::Lib
        } else if action.contains("capture-output")
            || action.contains("unit-test")
            || action == "run"
            || action.ends_with(".run")
        {
            Self::Run
        } else {
            Self::Unknown
        }
    }

    /// Lowercase name used in report documents
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Link => "link",
            Self::Run => "run",
            Self::Lib => "lib",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The action completed without a failure marker
    Succeeded,
    /// A failure marker was seen for the action
    Failed,
    /// The log ended before the action was resolved
    Unknown,
}

impl Outcome {
    /// Lowercase name used in report documents
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a target
///
/// `Open` is the only non-terminal state. `Incomplete` is reachable only from
/// `Open` when input ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    /// At least one marker seen, no terminal marker yet
    Open,
    /// Closed with no failed action
    Succeeded,
    /// Closed with a failure marker or a failed action
    Failed,
    /// Input ended before a terminal marker
    Incomplete,
}

impl TargetStatus {
    /// Whether the target can no longer change
    #[must_use]
    pub fn is_closed(self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Lowercase name used in report documents
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of an action unmarked lines are appended to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Capture {
    /// Command echo printed under the action header
    Command,
    /// Tool output following the command echo
    Output,
    /// The action has an outcome; nothing more is captured
    Closed,
}

/// Position of a line in the run's inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineRef {
    /// Index of the input the line came from
    pub source: usize,
    /// 1-based line number within that input
    pub line: usize,
}

/// One build action performed against one target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Classified kind
    pub kind: ActionKind,
    /// Verbatim action verb from the log, e.g. `gcc.compile.c++`
    pub action: String,
    /// Name of the owning target
    pub target: String,
    /// Command text echoed by the build tool
    pub command: String,
    /// Captured tool output
    pub output: String,
    /// Start time, when the log carries timestamps
    pub started_at: Option<DateTime<Utc>>,
    /// Elapsed time in milliseconds, when known
    pub duration_ms: Option<u64>,
    /// Outcome
    pub outcome: Outcome,
    /// Where the action header appeared
    pub origin: LineRef,
    #[serde(skip, default = "closed_capture")]
    pub(crate) capture: Capture,
}

fn closed_capture() -> Capture {
    Capture::Closed
}

impl ActionRecord {
    pub(crate) fn start(kind: ActionKind, action: &str, target: &str, origin: LineRef) -> Self {
        Self {
            kind,
            action: action.to_string(),
            target: target.to_string(),
            command: String::new(),
            output: String::new(),
            started_at: None,
            duration_ms: None,
            outcome: Outcome::Unknown,
            origin,
            capture: Capture::Command,
        }
    }

    /// Whether the action is still waiting for an outcome
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.capture != Capture::Closed
    }

    /// Append a line that followed the action header
    pub(crate) fn capture_line(&mut self, text: &str) {
        match self.capture {
            Capture::Command => {
                if text.trim().is_empty() {
                    if !self.command.is_empty() {
                        self.capture = Capture::Output;
                    }
                } else {
                    push_line(&mut self.command, text);
                }
            }
            Capture::Output => push_line(&mut self.output, text),
            Capture::Closed => {}
        }
    }

    pub(crate) fn close(&mut self, outcome: Outcome, at: Option<DateTime<Utc>>) {
        self.outcome = outcome;
        self.capture = Capture::Closed;
        if self.duration_ms.is_none() {
            if let (Some(start), Some(end)) = (self.started_at, at) {
                let elapsed = (end - start).num_milliseconds();
                self.duration_ms = u64::try_from(elapsed).ok();
            }
        }
    }
}

fn push_line(buf: &mut String, text: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(text);
}

/// Aggregate state of one named target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRecord {
    /// Target name, unique within a report
    pub name: String,
    /// Toolset identity, when it could be derived
    pub toolset: Option<String>,
    /// Actions in log order
    pub actions: Vec<ActionRecord>,
    /// Free-form notes from status markers (e.g. skip reasons)
    pub notes: Vec<String>,
    /// Lifecycle state
    pub status: TargetStatus,
}

impl TargetRecord {
    /// Create an open target with no actions
    #[must_use]
    pub fn new(name: impl Into<String>, toolset: Option<String>) -> Self {
        Self {
            name: name.into(),
            toolset,
            actions: Vec::new(),
            notes: Vec::new(),
            status: TargetStatus::Open,
        }
    }

    /// Whether any action of this target failed
    #[must_use]
    pub fn has_failed_action(&self) -> bool {
        self.actions.iter().any(|a| a.outcome == Outcome::Failed)
    }

    /// Most recent action still waiting for an outcome
    pub(crate) fn open_action_mut(&mut self) -> Option<&mut ActionRecord> {
        self.actions.iter_mut().rev().find(|a| a.is_open())
    }

    /// Close the target, resolving every open action to `pending`
    ///
    /// Failure propagates upward: the target is `Failed` whenever `failed` is
    /// set or any of its actions failed, regardless of `resolved`.
    pub(crate) fn close(&mut self, resolved: TargetStatus, pending: Outcome, failed: bool) {
        for action in self.actions.iter_mut().filter(|a| a.is_open()) {
            action.close(pending, None);
        }
        self.status = if failed || self.has_failed_action() {
            TargetStatus::Failed
        } else {
            resolved
        };
    }
}

/// Run metadata written on the report's root element
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunInfo {
    /// Source the tested tree came from (e.g. `git`, `tarball`)
    pub source: Option<String>,
    /// Identity of whoever ran the tests
    pub runner: Option<String>,
    /// Platform the tests ran on
    pub platform: Option<String>,
    /// Branch or tag tested
    pub tag: Option<String>,
    /// Revision tested
    pub revision: Option<String>,
    /// Whether the run was incremental
    pub incremental: bool,
    /// When the report was generated
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form comment embedded in the report
    pub comment: Option<String>,
}

impl RunInfo {
    /// Run type attribute value
    #[must_use]
    pub fn run_type(&self) -> &'static str {
        if self.incremental { "incremental" } else { "full" }
    }
}

/// Mapping from target name to target record, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct Report {
    targets: Vec<TargetRecord>,
    index: HashMap<String, usize>,
}

impl Report {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of targets
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether no target has been seen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets in first-seen order
    #[must_use]
    pub fn targets(&self) -> &[TargetRecord] {
        &self.targets
    }

    /// Look up a target by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TargetRecord> {
        self.index.get(name).map(|&i| &self.targets[i])
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut TargetRecord> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.targets[i]),
            None => None,
        }
    }

    /// Get the named target, creating it with `toolset` when unseen
    pub(crate) fn entry(
        &mut self,
        name: &str,
        toolset: impl FnOnce() -> Option<String>,
    ) -> &mut TargetRecord {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                let i = self.targets.len();
                self.targets.push(TargetRecord::new(name, toolset()));
                self.index.insert(name.to_string(), i);
                i
            }
        };
        &mut self.targets[i]
    }

    pub(crate) fn targets_mut(&mut self) -> impl Iterator<Item = &mut TargetRecord> {
        self.targets.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    #[test]
    fn test_action_kind_from_action() {
        assert_eq!(ActionKind::from_action("gcc.compile.c++"), ActionKind::Compile);
        assert_eq!(ActionKind::from_action("msvc.compile.c"), ActionKind::Compile);
        assert_eq!(ActionKind::from_action("gcc.link"), ActionKind::Link);
        assert_eq!(ActionKind::from_action("gcc.link.dll"), ActionKind::Link);
        assert_eq!(ActionKind::from_action("gcc.archive"), ActionKind::Lib);
        assert_eq!(ActionKind::from_action("lib"), ActionKind::Lib);
        assert_eq!(
            ActionKind::from_action("testing.capture-output"),
            ActionKind::Run
        );
        assert_eq!(ActionKind::from_action("testing.unit-test"), ActionKind::Run);
        assert_eq!(ActionKind::from_action("run"), ActionKind::Run);
        assert_eq!(ActionKind::from_action("compile"), ActionKind::Compile);
        assert_eq!(ActionKind::from_action("common.mkdir"), ActionKind::Unknown);
        assert_eq!(ActionKind::from_action("common.copy"), ActionKind::Unknown);
    }

    #[test]
    fn test_capture_command_then_output() {
        let mut action = ActionRecord::start(
            ActionKind::Compile,
            "gcc.compile.c++",
            "foo.o",
            LineRef::default(),
        );
        action.capture_line("");
        action.capture_line("    \"g++\" -c -o foo.o foo.cpp");
        action.capture_line("");
        action.capture_line("foo.cpp:1:1: error: expected ';'");
        action.capture_line("");
        action.capture_line("1 error generated.");

        assert_eq!(action.command, "    \"g++\" -c -o foo.o foo.cpp");
        assert_eq!(
            action.output,
            "foo.cpp:1:1: error: expected ';'\n\n1 error generated."
        );
    }

    #[test]
    fn test_closed_action_ignores_lines() {
        let mut action =
            ActionRecord::start(ActionKind::Link, "gcc.link", "foo", LineRef::default());
        action.close(Outcome::Succeeded, None);
        action.capture_line("late output");
        assert!(action.command.is_empty());
        assert!(action.output.is_empty());
        assert!(!action.is_open());
    }

    #[test]
    fn test_close_computes_duration_from_timestamps() {
        let mut action =
            ActionRecord::start(ActionKind::Run, "run", "foo.run", LineRef::default());
        action.started_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        action.close(
            Outcome::Failed,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 2).unwrap()),
        );
        assert_eq!(action.duration_ms, Some(2000));
    }

    #[test]
    fn test_target_close_propagates_failure() {
        let mut target = TargetRecord::new("foo", None);
        let mut failed =
            ActionRecord::start(ActionKind::Compile, "compile", "foo", LineRef::default());
        failed.close(Outcome::Failed, None);
        target.actions.push(failed);
        target.actions.push(ActionRecord::start(
            ActionKind::Link,
            "link",
            "foo",
            LineRef::default(),
        ));

        target.close(TargetStatus::Succeeded, Outcome::Succeeded, false);
        assert_eq!(target.status, TargetStatus::Failed);
        assert_eq!(target.actions[1].outcome, Outcome::Succeeded);
    }

    #[test]
    fn test_report_preserves_insertion_order() {
        let mut report = Report::new();
        report.entry("b.o", || None);
        report.entry("a.o", || Some("gcc".to_string()));
        report.entry("b.o", || Some("never".to_string()));

        let names: Vec<&str> = report.targets().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b.o", "a.o"]);
        assert_eq!(report.get("b.o").and_then(|t| t.toolset.clone()), None);
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_run_type() {
        let info = RunInfo::default();
        assert_eq!(info.run_type(), "full");
        let info = RunInfo {
            incremental: true,
            ..Default::default()
        };
        assert_eq!(info.run_type(), "incremental");
    }
}
