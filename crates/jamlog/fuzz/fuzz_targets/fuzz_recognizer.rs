// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for line classification
//!
//! `Recognizer::classify` must accept any line, including ones carrying
//! partial timestamps and half-formed status markers.

#![no_main]

use libfuzzer_sys::fuzz_target;

use jamlog::Recognizer;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let recognizer = Recognizer::default();
    let _ = recognizer.classify(&line);
});
