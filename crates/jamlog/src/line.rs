// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Log line input
//!
//! Reads jam logs as a sequence of [`LogLine`]s. Bytes are decoded as UTF-8
//! with invalid sequences replaced, so arbitrary compiler output never stops
//! the read.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::JamLogError;
use crate::tracker::JamLogParser;

/// A single line of a log with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Index of the input the line came from
    pub source: usize,
    /// 1-based line number
    pub number: usize,
    /// Line text without the line terminator
    pub text: String,
}

/// Iterator over the lines of a buffered reader
pub struct LineReader<R> {
    reader: R,
    source: usize,
    number: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    /// Read lines from `reader`, tagging them with `source`
    pub fn new(reader: R, source: usize) -> Self {
        Self {
            reader,
            source,
            number: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<LogLine, JamLogError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                self.number += 1;
                Some(Ok(LogLine {
                    source: self.source,
                    number: self.number,
                    text: String::from_utf8_lossy(&self.buf).into_owned(),
                }))
            }
            Err(e) => Some(Err(JamLogError::Io(e))),
        }
    }
}

/// Where a log comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A file on disk
    Path(PathBuf),
    /// The process's standard input
    Stdin,
}

impl Input {
    /// Inputs for the given paths; standard input when there are none
    #[must_use]
    pub fn from_paths(paths: &[PathBuf]) -> Vec<Self> {
        if paths.is_empty() {
            vec![Self::Stdin]
        } else {
            paths.iter().cloned().map(Self::Path).collect()
        }
    }

    /// Display name used in reports and logs
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Stdin => "<stdin>".to_string(),
        }
    }

    /// Open the input for buffered reading
    ///
    /// # Errors
    ///
    /// Returns `JamLogError::Open` if the file cannot be opened.
    pub fn open(&self) -> Result<Box<dyn BufRead>, JamLogError> {
        match self {
            Self::Path(path) => open_file(path).map(|f| Box::new(f) as Box<dyn BufRead>),
            Self::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
        }
    }
}

fn open_file(path: &Path) -> Result<BufReader<File>, JamLogError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| JamLogError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Outcome of feeding inputs to a parser
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// Inputs successfully opened
    pub opened: usize,
    /// Inputs that could not be opened or read
    pub unreadable: Vec<String>,
    /// Lines read across all inputs
    pub lines: usize,
}

/// Feed every input, in order, to `parser`
///
/// `on_line` sees each line before the parser does. Inputs that cannot be
/// opened, or fail on their first read, are skipped with a warning. A later
/// read error ends the current input early; what was read so far is kept.
///
/// # Errors
///
/// Returns `JamLogError::NoInput` when inputs were given but none could be read.
pub fn read_inputs(
    inputs: &[Input],
    parser: &mut JamLogParser,
    mut on_line: impl FnMut(&LogLine),
) -> Result<ReadSummary, JamLogError> {
    let mut summary = ReadSummary::default();

    for input in inputs {
        let name = input.name();
        let mut reader = match input.open() {
            Ok(reader) => reader,
            Err(e) => {
                warn!(input = %name, error = %e, "skipping unreadable input");
                summary.unreadable.push(name);
                continue;
            }
        };
        // A directory opens fine on some platforms and only fails on read
        if let Err(e) = reader.fill_buf().map(|_| ()) {
            warn!(input = %name, error = %e, "skipping unreadable input");
            summary.unreadable.push(name);
            continue;
        }
        summary.opened += 1;

        let source = parser.begin_source(name.clone());
        let mut count = 0usize;
        for line in LineReader::new(reader, source) {
            match line {
                Ok(line) => {
                    on_line(&line);
                    parser.process_line(&line);
                    count += 1;
                }
                Err(e) => {
                    warn!(input = %name, error = %e, "read error; input truncated");
                    break;
                }
            }
        }
        info!(input = %name, lines = count, "processed input");
        summary.lines += count;
    }

    if !inputs.is_empty() && summary.opened == 0 {
        return Err(JamLogError::NoInput);
    }
    Ok(summary)
}
