// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

use std::fmt::Write as _;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use jamlog::{Recognizer, RunInfo, assemble, parse_str, render};

/// A `b2 -d2` style log with `targets` compile/link pairs, every tenth failing
fn synthetic_log(targets: usize) -> String {
    let mut log = String::from("...found 4096 targets...\n");
    for i in 0..targets {
        let dir = format!("bin.v2/libs/lib{i}/test/t{i}.test/gcc-9/debug");
        let _ = writeln!(log, "gcc.compile.c++ {dir}/t{i}.o\n");
        let _ = writeln!(log, "    \"g++\" -O0 -g -c -o \"{dir}/t{i}.o\" \"libs/lib{i}/test/t{i}.cpp\"\n");
        if i % 10 == 0 {
            let _ = writeln!(log, "libs/lib{i}/test/t{i}.cpp:1:1: error: expected ';' & '>'");
            let _ = writeln!(log, "...failed gcc.compile.c++ {dir}/t{i}.o...");
        } else {
            let _ = writeln!(log, "gcc.link {dir}/t{i}\n");
            let _ = writeln!(log, "    \"g++\" -o \"{dir}/t{i}\" \"{dir}/t{i}.o\"\n");
        }
    }
    log.push_str("...updated 1000 targets...\n");
    log
}

fn jamlog_benchmark(c: &mut Criterion) {
    let log = synthetic_log(1000);
    let recognizer = Recognizer::default();

    c.bench_function("classify_lines", |b| {
        b.iter(|| {
            for line in log.lines() {
                black_box(recognizer.classify(black_box(line)));
            }
        })
    });

    c.bench_function("parse_log", |b| b.iter(|| parse_str(black_box(&log))));

    let parsed = parse_str(&log);
    let run = RunInfo::default();
    c.bench_function("render_xml", |b| {
        b.iter(|| render(&assemble(black_box(&parsed.report), &run)))
    });
}

criterion_group!(benches, jamlog_benchmark);
criterion_main!(benches);
