// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Marker recognition
//!
//! Classifies single log lines against an ordered [`PatternTable`]. The
//! recognizer is stateless: it never looks at neighbouring lines and never
//! fails. Lines that partially match a rule (its `trigger` matches but its
//! `pattern` does not) are reported as [`Marker::Unrecognized`].
//!
//! # Example
//!
//! ```
//! use jamlog::marker::{Marker, Recognizer};
//!
//! let recognizer = Recognizer::default();
//! match recognizer.classify("gcc.compile.c++ bin/foo.o") {
//!     Marker::ActionStart { target, .. } => assert_eq!(target, "bin/foo.o"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::JamLogError;
use crate::report::{ActionKind, Outcome};

/// Optional `[RFC 3339]` prefix any line may carry
static TIMESTAMP_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?P<ts>\d{4}-\d{2}-\d{2}[T ][0-9:.]+(?:Z|[+-]\d{2}:?\d{2})?)\]\s?").unwrap()
});

static BOOST_JAM: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::from_specs(boost_jam_rules()).expect("built-in jam patterns compile")
});

// ============================================================================
// Classification
// ============================================================================

/// Classification of one log line
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    /// An action header: the build tool starts updating `target`
    ActionStart {
        /// Classified action kind
        kind: ActionKind,
        /// Verbatim action verb
        action: String,
        /// Target being updated
        target: String,
        /// Command text carried on the header line itself
        command: Option<String>,
        /// Timestamp prefix, if present
        at: Option<DateTime<Utc>>,
    },
    /// A terminal status marker for `target`
    ActionEnd {
        /// Target the status applies to
        target: String,
        /// Reported outcome
        outcome: Outcome,
        /// Extra information such as a skip reason
        note: Option<String>,
        /// Timestamp prefix, if present
        at: Option<DateTime<Utc>>,
    },
    /// The build tool's end-of-run summary
    RunEnd,
    /// Resource usage of the action that just ran
    Timing {
        /// Elapsed wall-clock (or user + system) time
        elapsed_ms: u64,
    },
    /// A toolset announcement affecting subsequently created targets
    Context {
        /// Toolset identity, e.g. `gcc-9`
        toolset: String,
    },
    /// Build tool progress chatter carrying no target information
    Progress,
    /// Any line not matching a marker rule
    OutputLine(String),
    /// A line that looks like a marker but lacks required fields
    Unrecognized(String),
}

impl Marker {
    /// Whether the line was recognized as a marker
    #[must_use]
    pub fn is_marker(&self) -> bool {
        !matches!(self, Self::OutputLine(_) | Self::Unrecognized(_))
    }
}

// ============================================================================
// Pattern Table
// ============================================================================

/// What a matching rule produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// Captures `action`, `target` and optionally `command`
    ActionStart,
    /// Captures `target`
    ActionFailed,
    /// Captures `target` and optionally `reason`; the target counts as failed
    ActionSkipped,
    /// Captures `target`
    ActionSucceeded,
    /// No captures
    RunEnd,
    /// Captures `clock`, or `user` and `system`
    Timing,
    /// Captures `toolset`
    Context,
    /// No captures; the line is dropped
    Progress,
}

/// Serializable form of a rule, as found in pattern table files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Rule name used in diagnostics
    pub name: String,
    /// What a match produces
    pub kind: RuleKind,
    /// Cheap regex identifying lines meant to be this marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    /// Regex with named captures
    pub pattern: String,
}

impl RuleSpec {
    fn new(name: &str, kind: RuleKind, trigger: Option<&str>, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            trigger: trigger.map(str::to_string),
            pattern: pattern.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    name: String,
    kind: RuleKind,
    trigger: Option<Regex>,
    pattern: Regex,
}

/// Ordered list of marker rules; the first matching rule wins
#[derive(Debug, Clone)]
pub struct PatternTable {
    rules: Vec<Rule>,
}

impl PatternTable {
    /// Compile a table from rule specs, keeping their order
    ///
    /// # Errors
    ///
    /// Returns `JamLogError::InvalidPattern` if any trigger or pattern fails to compile.
    pub fn from_specs(specs: Vec<RuleSpec>) -> Result<Self, JamLogError> {
        let compile = |rule: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| JamLogError::InvalidPattern {
                rule: rule.to_string(),
                message: e.to_string(),
            })
        };

        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            let trigger = match spec.trigger.as_deref() {
                Some(t) => Some(compile(&spec.name, t)?),
                None => None,
            };
            let pattern = compile(&spec.name, &spec.pattern)?;
            rules.push(Rule {
                name: spec.name,
                kind: spec.kind,
                trigger,
                pattern,
            });
        }
        Ok(Self { rules })
    }

    /// Parse a JSON array of [`RuleSpec`]s
    ///
    /// # Errors
    ///
    /// Returns `JamLogError::PatternConfig` for malformed JSON and
    /// `JamLogError::InvalidPattern` for regexes that do not compile.
    pub fn from_json(json: &str) -> Result<Self, JamLogError> {
        let specs: Vec<RuleSpec> = serde_json::from_str(json)?;
        Self::from_specs(specs)
    }

    /// The Boost.Jam / b2 vocabulary
    #[must_use]
    pub fn boost_jam() -> Self {
        BOOST_JAM.clone()
    }

    /// Specs of the rules in priority order
    #[must_use]
    pub fn specs(&self) -> Vec<RuleSpec> {
        self.rules
            .iter()
            .map(|r| RuleSpec {
                name: r.name.clone(),
                kind: r.kind,
                trigger: r.trigger.as_ref().map(|t| t.as_str().to_string()),
                pattern: r.pattern.as_str().to_string(),
            })
            .collect()
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::boost_jam()
    }
}

/// Action header: a generic module rule (`common.mkdir`), a toolset-qualified
/// build verb (`gcc.compile.c++`, `msvc.link.dll`) or a bare verb (`compile`)
const ACTION_START: &str = concat!(
    r"^(?P<action>",
    r"(?:common|testing|builtin|notfile|stage|boostbook|quickbook|doxygen|xslt|symlink)(?:\.[\w+-]+)+",
    r"|[A-Za-z_][\w+-]*(?:\.[\w+-]+)*\.(?:compile|link|archive|capture-output|unit-test|run|lib|mkdir|copy|manifest|hardlink)(?:\.[\w+-]+)*",
    r"|compile|link|archive|lib|run",
    r")\s+(?P<target>\S+)\s*$",
);

/// Default rules for `b2 -d2` logs
///
/// Order matters: the run summary must be tried before the failure rules
/// because both start with `...failed updating`.
#[must_use]
pub fn boost_jam_rules() -> Vec<RuleSpec> {
    use RuleKind::*;

    vec![
        RuleSpec::new(
            "run-summary",
            RunEnd,
            None,
            r"^\.\.\.(?:failed updating|updated|skipped) \d+ targets?\.\.\.\s*$",
        ),
        RuleSpec::new(
            "progress",
            Progress,
            None,
            r"^\.\.\.(?:found \d+ targets?|updating \d+ targets?|on \d+\w* target|patience)\.*\s*$",
        ),
        RuleSpec::new(
            "failed-updating",
            ActionFailed,
            Some(r"^\.\.\.failed updating\b"),
            r"^\.\.\.failed updating \d+ targets?\.\.\.\s+(?P<target>\S.*?)\s*$",
        ),
        RuleSpec::new(
            "failed-action",
            ActionFailed,
            Some(r"^\.\.\.failed\b"),
            r"^\.\.\.failed (?P<action>\S+) (?P<target>\S.*?)\.\.\.\s*$",
        ),
        RuleSpec::new(
            "skipped",
            ActionSkipped,
            Some(r"^\.\.\.skipped\b"),
            r"^\.\.\.skipped (?P<target>\S+) for lack of (?P<reason>\S.*?)\.\.\.\s*$",
        ),
        RuleSpec::new(
            "succeeded",
            ActionSucceeded,
            Some(r"^\.\.\.succeeded\b"),
            r"^\.\.\.succeeded (?:(?P<action>\S+)\s+)?(?P<target>\S+?)\.\.\.\s*$",
        ),
        RuleSpec::new(
            "passed",
            ActionSucceeded,
            Some(r"^\*\*passed\*\*"),
            r"^\*\*passed\*\*\s+(?P<target>\S.*?)\s*$",
        ),
        RuleSpec::new(
            "timing",
            Timing,
            None,
            r"^\s*(?P<system>\d+(?:\.\d+)?) sec system; (?P<user>\d+(?:\.\d+)?) sec user(?:; (?P<clock>\d+(?:\.\d+)?) sec clock)?\s*$",
        ),
        RuleSpec::new(
            "toolset-notice",
            Context,
            None,
            r"^notice: will use '[^']*' for \S+, condition <toolset>(?P<toolset>\S+)\s*$",
        ),
        RuleSpec::new(
            "action",
            ActionStart,
            None,
            ACTION_START,
        ),
    ]
}

// ============================================================================
// Recognizer
// ============================================================================

/// Stateless line classifier
#[derive(Debug, Clone, Default)]
pub struct Recognizer {
    table: PatternTable,
}

impl Recognizer {
    /// Create a recognizer over the given pattern table
    #[must_use]
    pub fn new(table: PatternTable) -> Self {
        Self { table }
    }

    /// The pattern table in use
    #[must_use]
    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Classify one line. Never fails.
    #[must_use]
    pub fn classify(&self, line: &str) -> Marker {
        let (at, body) = split_timestamp(line);

        for rule in &self.table.rules {
            if let Some(caps) = rule.pattern.captures(body) {
                return build_marker(rule.kind, &caps, at)
                    .unwrap_or_else(|| Marker::Unrecognized(line.to_string()));
            }
            if rule.trigger.as_ref().is_some_and(|t| t.is_match(body)) {
                return Marker::Unrecognized(line.to_string());
            }
        }

        Marker::OutputLine(line.to_string())
    }
}

/// Strip a leading `[timestamp]`, returning it parsed alongside the remainder
///
/// A prefix that does not parse as RFC 3339 is left in place.
fn split_timestamp(line: &str) -> (Option<DateTime<Utc>>, &str) {
    let Some(caps) = TIMESTAMP_PREFIX.captures(line) else {
        return (None, line);
    };
    let raw = caps["ts"].replacen(' ', "T", 1);
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(ts) => (Some(ts.with_timezone(&Utc)), &line[caps[0].len()..]),
        Err(_) => (None, line),
    }
}

fn capture<'h>(caps: &Captures<'h>, name: &str) -> Option<&'h str> {
    caps.name(name)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn seconds_to_ms(value: &str) -> Option<u64> {
    let secs: f64 = value.parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some((secs * 1000.0).round() as u64)
    } else {
        None
    }
}

/// Turn a rule match into a marker, or `None` if required captures are missing
fn build_marker(kind: RuleKind, caps: &Captures<'_>, at: Option<DateTime<Utc>>) -> Option<Marker> {
    let marker = match kind {
        RuleKind::ActionStart => {
            let action = capture(caps, "action")?;
            Marker::ActionStart {
                kind: ActionKind::from_action(action),
                action: action.to_string(),
                target: capture(caps, "target")?.to_string(),
                command: capture(caps, "command").map(str::to_string),
                at,
            }
        }
        RuleKind::ActionFailed => Marker::ActionEnd {
            target: capture(caps, "target")?.to_string(),
            outcome: Outcome::Failed,
            note: None,
            at,
        },
        RuleKind::ActionSkipped => Marker::ActionEnd {
            target: capture(caps, "target")?.to_string(),
            outcome: Outcome::Failed,
            note: Some(match capture(caps, "reason") {
                Some(reason) => format!("skipped for lack of {reason}"),
                None => "skipped".to_string(),
            }),
            at,
        },
        RuleKind::ActionSucceeded => Marker::ActionEnd {
            target: capture(caps, "target")?.to_string(),
            outcome: Outcome::Succeeded,
            note: None,
            at,
        },
        RuleKind::RunEnd => Marker::RunEnd,
        RuleKind::Timing => {
            let elapsed_ms = match capture(caps, "clock") {
                Some(clock) => seconds_to_ms(clock)?,
                None => seconds_to_ms(capture(caps, "user")?)?
                    .checked_add(seconds_to_ms(capture(caps, "system")?)?)?,
            };
            Marker::Timing { elapsed_ms }
        }
        RuleKind::Context => Marker::Context {
            toolset: capture(caps, "toolset")?.to_string(),
        },
        RuleKind::Progress => Marker::Progress,
    };
    Some(marker)
}
