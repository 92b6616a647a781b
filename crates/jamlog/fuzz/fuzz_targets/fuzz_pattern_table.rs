// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for pattern table loading
//!
//! User-supplied pattern tables must be rejected with an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

use jamlog::PatternTable;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = PatternTable::from_json(input);
    }
});
