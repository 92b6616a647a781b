// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Run driver
//!
//! Wires the pieces together: inputs are read into a [`JamLogParser`], the
//! finished report is assembled with the run metadata, and the document is
//! written to the configured destination.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use jamlog::{
    JamLogError, JamLogParser, ParseStats, ReadSummary, ReportDocument, RunSummary, assemble,
    read_inputs, write_report,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigError, OutputFormat};

/// Exit code for a run that produced its report
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when no input could be read or the report could not be written
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for command-line and configuration errors
pub const EXIT_USAGE: i32 = 2;

/// What a completed run did
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Inputs opened and lines read
    pub read: ReadSummary,
    /// How the lines were consumed
    pub stats: ParseStats,
    /// Target totals written to the report
    pub summary: RunSummary,
}

/// Process jam logs as directed by `args`, returning the process exit code
///
/// `args` includes the program name, as `std::env::args_os` yields it. Logging
/// is installed on first use, at the level the arguments select.
pub fn process_jam_log<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Config::try_parse_from(args) {
        Ok(config) => {
            init_logging(&config);
            execute(&config)
        }
        Err(err) => usage_error(&err),
    }
}

/// Install the stderr log subscriber for `config`
///
/// Returns `false` when a global subscriber was already set, which is left
/// in place.
pub fn init_logging(config: &Config) -> bool {
    // Logs go to stderr; stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log_level().into()))
        .with_writer(io::stderr)
        .try_init()
        .is_ok()
}

/// Report a command-line parse failure and return its exit code
///
/// `--help` and `--version` also arrive here and exit successfully.
pub fn usage_error(err: &clap::Error) -> i32 {
    let _ = err.print();
    err.exit_code()
}

/// Run with an already parsed configuration, returning the process exit code
pub fn execute(config: &Config) -> i32 {
    match run(config) {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => {
            error!("{e:#}");
            exit_code(&e)
        }
    }
}

/// Exit code for a failed run
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if err.chain().any(|e| e.is::<ConfigError>()) {
        EXIT_USAGE
    } else {
        EXIT_FAILURE
    }
}

/// Read every input, build the report and write it out
///
/// # Errors
///
/// Fails when the configuration is invalid, when none of the inputs can be
/// opened, or when the report cannot be written.
pub fn run(config: &Config) -> anyhow::Result<RunOutcome> {
    config.validate()?;
    let table = config.pattern_table()?;

    let mut parser = JamLogParser::with_patterns(table);
    if let Some(ref root) = config.locate_root {
        parser = parser.with_locate_root(root.as_str());
    }

    let inputs = config.inputs();
    let echo = config.echo;
    let read = read_inputs(&inputs, &mut parser, |line| {
        if echo {
            eprintln!("{}", line.text);
        }
    })?;

    let parsed = parser.finish();
    let run_info = config.run_info(Utc::now());
    let doc = assemble(&parsed.report, &run_info);
    write_document(config, &doc)?;

    let stats = parsed.stats;
    info!(
        targets = doc.summary.targets,
        succeeded = doc.summary.succeeded,
        failed = doc.summary.failed,
        incomplete = doc.summary.incomplete,
        "report written"
    );
    info!(
        inputs = read.opened,
        lines = stats.lines,
        markers = stats.markers,
        malformed = stats.malformed,
        discarded = stats.discarded,
        after_close = stats.after_close,
        "log consumed"
    );

    Ok(RunOutcome {
        read,
        stats,
        summary: doc.summary,
    })
}

fn write_document(config: &Config, doc: &ReportDocument<'_>) -> anyhow::Result<()> {
    match config.output {
        Some(ref path) => {
            let file = File::create(path)
                .map_err(JamLogError::Write)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write_format(config.format, &mut out, doc)
                .with_context(|| format!("writing {}", path.display()))
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_format(config.format, &mut out, doc).context("writing stdout")
        }
    }
}

fn write_format<W: Write>(
    format: OutputFormat,
    out: &mut W,
    doc: &ReportDocument<'_>,
) -> Result<(), JamLogError> {
    match format {
        OutputFormat::Xml => write_report(out, doc),
        OutputFormat::Json => serde_json::to_writer_pretty(&mut *out, doc)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(out))
            .and_then(|()| out.flush())
            .map_err(JamLogError::Write),
    }
}
