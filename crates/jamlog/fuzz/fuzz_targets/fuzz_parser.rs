// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for the full pipeline
//!
//! Feeds arbitrary bytes through the line reader, parser, assembler and XML
//! renderer. None of them may panic.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;

use jamlog::{JamLogParser, LineReader, RunInfo, assemble, render};

fuzz_target!(|data: &[u8]| {
    let mut parser = JamLogParser::new();
    let source = parser.begin_source("fuzz");

    for line in LineReader::new(Cursor::new(data), source).flatten() {
        parser.process_line(&line);
    }

    let parsed = parser.finish();
    let run = RunInfo::default();
    let xml = render(&assemble(&parsed.report, &run));
    assert!(xml.ends_with("</test-run>\n"));
});
