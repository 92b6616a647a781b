// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! XML rendering of assembled reports
//!
//! Every attribute value and text node passes through [`escape_attr`] or
//! [`escape_text`]; nothing else writes untrusted text into the document.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::io::Write;

use crate::assemble::{ActionNode, ReportDocument, TargetNode};
use crate::error::JamLogError;

const INDENT: &str = "  ";

/// Whether `c` may appear in an XML 1.0 document at all
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn escape(s: &str, attr: bool) -> Cow<'_, str> {
    let needs_escape = |c: char| {
        matches!(c, '&' | '<' | '>' | '"' | '\'' | '\r')
            || (attr && matches!(c, '\n' | '\t'))
            || !is_xml_char(c)
    };
    if !s.chars().any(needs_escape) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\r' => out.push_str("&#13;"),
            '\n' if attr => out.push_str("&#10;"),
            '\t' if attr => out.push_str("&#9;"),
            c if !is_xml_char(c) => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape a text node
///
/// Markup characters become entity references and CR becomes `&#13;` so it
/// survives line-ending normalization. Characters XML 1.0 cannot represent
/// are replaced with U+FFFD.
#[must_use]
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape(s, false)
}

/// Escape an attribute value
///
/// Like [`escape_text`], and additionally TAB and LF become character
/// references so attribute-value normalization leaves them intact.
#[must_use]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape(s, true)
}

/// Minimal indented element writer over a `String`
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        Self { out, depth: 0 }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn start_tag(&mut self, name: &str, attrs: &[(&str, Option<String>)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            if let Some(value) = value {
                let _ = write!(self.out, " {key}=\"{}\"", escape_attr(value));
            }
        }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, Option<String>)]) {
        self.start_tag(name, attrs);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, Option<String>)]) {
        self.start_tag(name, attrs);
        self.out.push_str("/>\n");
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        let _ = writeln!(self.out, "</{name}>");
    }

    /// Element whose content is exactly `text`, with no added whitespace
    fn text_element(&mut self, name: &str, text: &str) {
        self.indent();
        let _ = writeln!(self.out, "<{name}>{}</{name}>", escape_text(text));
    }

    fn finish(self) -> String {
        self.out
    }
}

fn some<T: ToString>(value: T) -> Option<String> {
    Some(value.to_string())
}

fn write_action(w: &mut XmlWriter, action: &ActionNode<'_>) {
    w.open(
        "action",
        &[
            ("kind", some(action.kind)),
            ("name", some(action.action)),
            ("outcome", some(action.outcome)),
            ("started", action.started_at.map(|t| t.to_rfc3339())),
            ("duration-ms", action.duration_ms.map(|d| d.to_string())),
        ],
    );
    w.text_element("command", action.command);
    w.text_element("output", action.output);
    w.close("action");
}

fn write_target(w: &mut XmlWriter, target: &TargetNode<'_>) {
    let counts = &target.counts;
    let attrs = [
        ("name", some(target.name)),
        ("status", some(target.status)),
        ("toolset", target.toolset.map(str::to_string)),
        ("actions", some(counts.total())),
        ("compile", some(counts.compile)),
        ("link", some(counts.link)),
        ("run", some(counts.run)),
        ("lib", some(counts.lib)),
        ("unknown", some(counts.unknown)),
    ];
    if target.actions.is_empty() && target.notes.is_empty() {
        w.empty("target", &attrs);
        return;
    }

    w.open("target", &attrs);
    for note in target.notes {
        w.text_element("note", note);
    }
    for action in &target.actions {
        write_action(w, action);
    }
    w.close("target");
}

/// Render the whole document as a string
#[must_use]
pub fn render(doc: &ReportDocument<'_>) -> String {
    let run = doc.run;
    let summary = &doc.summary;
    let mut w = XmlWriter::new();

    w.open(
        "test-run",
        &[
            ("source", run.source.clone()),
            ("runner", run.runner.clone()),
            ("timestamp", run.timestamp.map(|t| t.to_rfc3339())),
            ("platform", run.platform.clone()),
            ("tag", run.tag.clone()),
            ("revision", run.revision.clone()),
            ("run-type", some(run.run_type())),
            ("targets", some(summary.targets)),
            ("succeeded", some(summary.succeeded)),
            ("failed", some(summary.failed)),
            ("incomplete", some(summary.incomplete)),
        ],
    );
    if let Some(comment) = run.comment.as_deref() {
        w.text_element("comment", comment);
    }
    for target in &doc.targets {
        write_target(&mut w, target);
    }
    w.close("test-run");

    w.finish()
}

/// Render the document and write it to `out` in one piece
///
/// # Errors
///
/// Returns `JamLogError::Write` if the writer fails.
pub fn write_report<W: Write>(out: &mut W, doc: &ReportDocument<'_>) -> Result<(), JamLogError> {
    out.write_all(render(doc).as_bytes())
        .and_then(|()| out.flush())
        .map_err(JamLogError::Write)
}
