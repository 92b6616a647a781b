// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! process-jam-log library
//!
//! This module exports the command-line model and run driver of
//! process-jam-log for use in integration tests and as a library.

pub mod config;
pub mod run;

pub use config::{Config, ConfigError, OutputFormat};
pub use run::{RunOutcome, execute, init_logging, process_jam_log, run};
