// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! process-jam-log: Boost.Jam build log to regression report converter
//!
//! This binary reads the logs of a `b2` test run and writes an XML report of
//! every target, its actions and their outcomes to stdout.

use process_jam_log::process_jam_log;

fn main() {
    std::process::exit(process_jam_log(std::env::args_os()));
}
