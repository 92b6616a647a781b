// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Report assembly
//!
//! Turns a finished [`Report`] into an ordered tree of borrowed nodes with the
//! summary attributes (action counts, overall status) computed on demand. The
//! report itself is not modified.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::report::{ActionKind, ActionRecord, Outcome, Report, RunInfo, TargetRecord, TargetStatus};

/// Number of actions per kind for one target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    /// Compile actions
    pub compile: usize,
    /// Link actions
    pub link: usize,
    /// Run actions
    pub run: usize,
    /// Archive actions
    pub lib: usize,
    /// Other actions
    pub unknown: usize,
}

impl ActionCounts {
    fn of(actions: &[ActionRecord]) -> Self {
        let mut counts = Self::default();
        for action in actions {
            match action.kind {
                ActionKind::Compile => counts.compile += 1,
                ActionKind::Link => counts.link += 1,
                ActionKind::Run => counts.run += 1,
                ActionKind::Lib => counts.lib += 1,
                ActionKind::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    /// Total number of actions
    #[must_use]
    pub fn total(&self) -> usize {
        self.compile + self.link + self.run + self.lib + self.unknown
    }
}

/// One action, ready to serialize
#[derive(Debug, Clone, Serialize)]
pub struct ActionNode<'a> {
    /// Classified kind
    pub kind: ActionKind,
    /// Verbatim action verb
    pub action: &'a str,
    /// Outcome
    pub outcome: Outcome,
    /// Start time, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Elapsed milliseconds, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Command text
    pub command: &'a str,
    /// Captured output
    pub output: &'a str,
}

impl<'a> From<&'a ActionRecord> for ActionNode<'a> {
    fn from(action: &'a ActionRecord) -> Self {
        Self {
            kind: action.kind,
            action: &action.action,
            outcome: action.outcome,
            started_at: action.started_at,
            duration_ms: action.duration_ms,
            command: &action.command,
            output: &action.output,
        }
    }
}

/// One target, ready to serialize
#[derive(Debug, Clone, Serialize)]
pub struct TargetNode<'a> {
    /// Target name
    pub name: &'a str,
    /// Overall status
    pub status: TargetStatus,
    /// Toolset identity, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolset: Option<&'a str>,
    /// Action counts by kind
    pub counts: ActionCounts,
    /// Notes from status markers
    #[serde(skip_serializing_if = "no_notes")]
    pub notes: &'a [String],
    /// Actions in log order
    pub actions: Vec<ActionNode<'a>>,
}

fn no_notes(notes: &&[String]) -> bool {
    notes.is_empty()
}

impl<'a> From<&'a TargetRecord> for TargetNode<'a> {
    fn from(target: &'a TargetRecord) -> Self {
        // Failure propagates upward even if a caller hands us a target that
        // was never closed through the tracker.
        let status = if target.has_failed_action() {
            TargetStatus::Failed
        } else {
            target.status
        };
        Self {
            name: &target.name,
            status,
            toolset: target.toolset.as_deref(),
            counts: ActionCounts::of(&target.actions),
            notes: &target.notes,
            actions: target.actions.iter().map(ActionNode::from).collect(),
        }
    }
}

/// Totals across all targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Number of targets
    pub targets: usize,
    /// Targets that succeeded
    pub succeeded: usize,
    /// Targets that failed
    pub failed: usize,
    /// Targets cut off by the end of input
    pub incomplete: usize,
}

impl RunSummary {
    /// Tally target statuses
    #[must_use]
    pub fn of(targets: &[TargetNode<'_>]) -> Self {
        let mut summary = Self {
            targets: targets.len(),
            ..Self::default()
        };
        for target in targets {
            match target.status {
                TargetStatus::Succeeded => summary.succeeded += 1,
                TargetStatus::Failed => summary.failed += 1,
                TargetStatus::Incomplete | TargetStatus::Open => summary.incomplete += 1,
            }
        }
        summary
    }
}

/// The complete document: run metadata, totals and the target tree
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument<'a> {
    /// Run metadata
    pub run: &'a RunInfo,
    /// Totals
    pub summary: RunSummary,
    /// Targets in first-seen order
    pub targets: Vec<TargetNode<'a>>,
}

/// Build the node sequence for `report`, one node per target in insertion order
#[must_use]
pub fn assemble<'a>(report: &'a Report, run: &'a RunInfo) -> ReportDocument<'a> {
    let targets: Vec<TargetNode<'a>> = report.targets().iter().map(TargetNode::from).collect();
    ReportDocument {
        run,
        summary: RunSummary::of(&targets),
        targets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::parse_str;
    use similar_asserts::assert_eq;

    const LOG: &str = "\
gcc.compile.c++ bin/t.test/gcc-9/debug/t.o
gcc.link bin/t.test/gcc-9/debug/t
testing.capture-output bin/t.test/gcc-9/debug/t.run
...failed testing.capture-output bin/t.test/gcc-9/debug/t.run...
gcc.compile.c++ bin/u.o
**passed** bin/u.o
gcc.archive bin/libx.a
";

    #[test]
    fn test_assemble_preserves_order_and_counts() {
        let parsed = parse_str(LOG);
        let run = RunInfo::default();
        let doc = assemble(&parsed.report, &run);

        let names: Vec<&str> = doc.targets.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "bin/t.test/gcc-9/debug/t.o",
                "bin/t.test/gcc-9/debug/t",
                "bin/t.test/gcc-9/debug/t.run",
                "bin/u.o",
                "bin/libx.a",
            ]
        );
        assert_eq!(doc.targets[2].counts.run, 1);
        assert_eq!(doc.targets[2].counts.total(), 1);
        assert_eq!(doc.targets[4].counts.lib, 1);
        assert_eq!(doc.targets[2].toolset, Some("gcc-9"));
    }

    #[test]
    fn test_summary_tallies_statuses() {
        let parsed = parse_str(LOG);
        let run = RunInfo::default();
        let doc = assemble(&parsed.report, &run);

        assert_eq!(
            doc.summary,
            RunSummary {
                targets: 5,
                succeeded: 1,
                failed: 1,
                incomplete: 3,
            }
        );
    }

    #[test]
    fn test_assemble_does_not_mutate_report() {
        let parsed = parse_str(LOG);
        let before = format!("{:?}", parsed.report);
        let run = RunInfo::default();
        let _ = assemble(&parsed.report, &run);
        assert_eq!(format!("{:?}", parsed.report), before);
    }

    #[test]
    fn test_counts_by_kind() {
        let parsed = parse_str(
            "compile x\nlink x\ncommon.mkdir x\nlink y\n...updated 3 targets...\n",
        );
        let run = RunInfo::default();
        let doc = assemble(&parsed.report, &run);
        assert_eq!(
            doc.targets[0].counts,
            ActionCounts {
                compile: 1,
                link: 1,
                run: 0,
                lib: 0,
                unknown: 1,
            }
        );
        assert_eq!(doc.summary.succeeded, 2);
    }

    #[test]
    fn test_json_shape() {
        let parsed = parse_str("compile foo.o\n...failed updating 1 target... foo.o\n");
        let run = RunInfo::default();
        let doc = assemble(&parsed.report, &run);
        let json = serde_json::to_value(&doc).expect("serialize");

        assert_eq!(json["targets"][0]["name"].as_str(), Some("foo.o"));
        assert_eq!(json["targets"][0]["status"].as_str(), Some("failed"));
        assert_eq!(json["targets"][0]["actions"][0]["kind"].as_str(), Some("compile"));
        assert_eq!(json["summary"]["failed"].as_u64(), Some(1));
        assert!(json["targets"][0].get("notes").is_none());
    }
}
