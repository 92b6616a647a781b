// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! End-to-end tests for process-jam-log
//!
//! These tests drive `process_jam_log` with real argument lists, reading logs
//! from and writing reports to temporary directories.

use std::fs;
use std::path::{Path, PathBuf};

use process_jam_log::config::Config;
use process_jam_log::process_jam_log;
use process_jam_log::run::{EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE, run};
use similar_asserts::assert_eq;
use tempfile::TempDir;

const FAILED_COMPILE: &str = "\
compile foo.o
cc -c foo.cpp -o foo.o
...failed updating 1 target... foo.o
";

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

/// Run with `args` plus `-o <dir>/report`, returning the exit code and report text
fn run_to_file(dir: &TempDir, args: &[&str]) -> (i32, Option<String>) {
    let report = dir.path().join("report");
    let report_arg = arg(&report);
    let mut argv = vec!["process-jam-log", "-q", "-o", report_arg.as_str()];
    argv.extend_from_slice(args);
    let code = process_jam_log(argv);
    (code, fs::read_to_string(&report).ok())
}

#[test]
fn test_empty_log_gives_empty_report() {
    let dir = TempDir::new().expect("temp dir");
    let log = arg(&write(&dir, "empty.log", ""));

    let (code, report) = run_to_file(&dir, &[&log]);
    assert_eq!(code, EXIT_SUCCESS);
    let xml = report.expect("report written");
    assert!(xml.contains("targets=\"0\""));
    assert!(!xml.contains("<target "));
    assert!(xml.trim_end().ends_with("</test-run>"));
}

#[test]
fn test_missing_log_fails() {
    let dir = TempDir::new().expect("temp dir");
    let missing = arg(&dir.path().join("missing.log"));

    let (code, report) = run_to_file(&dir, &[&missing]);
    assert_eq!(code, EXIT_FAILURE);
    assert!(report.is_none());
}

#[test]
fn test_failed_compile_scenario() {
    let dir = TempDir::new().expect("temp dir");
    let log = arg(&write(&dir, "bjam.log", FAILED_COMPILE));

    let (code, report) = run_to_file(&dir, &[&log, "--runner", "ci-linux"]);
    assert_eq!(code, EXIT_SUCCESS);
    let xml = report.expect("report written");
    assert!(xml.contains("runner=\"ci-linux\""));
    assert!(xml.contains("failed=\"1\""));
    assert!(xml.contains(
        "<target name=\"foo.o\" status=\"failed\" actions=\"1\" compile=\"1\" link=\"0\" run=\"0\" lib=\"0\" unknown=\"0\">"
    ));
    assert!(xml.contains("<action kind=\"compile\" name=\"compile\" outcome=\"failed\">"));
    assert!(xml.contains("<command>cc -c foo.cpp -o foo.o</command>"));
}

#[test]
fn test_missing_log_among_readable_ones_is_skipped() {
    let dir = TempDir::new().expect("temp dir");
    let log = arg(&write(&dir, "bjam.log", FAILED_COMPILE));
    let missing = arg(&dir.path().join("missing.log"));

    let (code, report) = run_to_file(&dir, &[&missing, &log]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(report.expect("report written").contains("targets=\"1\""));
}

#[test]
fn test_json_format() {
    let dir = TempDir::new().expect("temp dir");
    let log = arg(&write(&dir, "bjam.log", FAILED_COMPILE));

    let (code, report) = run_to_file(&dir, &[&log, "--format", "json", "--tag", "develop"]);
    assert_eq!(code, EXIT_SUCCESS);
    let json: serde_json::Value =
        serde_json::from_str(&report.expect("report written")).expect("valid JSON");
    assert_eq!(json["run"]["tag"].as_str(), Some("develop"));
    assert_eq!(json["summary"]["targets"].as_u64(), Some(1));
    assert_eq!(json["targets"][0]["status"].as_str(), Some("failed"));
    assert_eq!(json["targets"][0]["actions"][0]["outcome"].as_str(), Some("failed"));
}

#[test]
fn test_comment_is_embedded_escaped() {
    let dir = TempDir::new().expect("temp dir");
    let log = arg(&write(&dir, "bjam.log", ""));
    let comment = arg(&write(&dir, "comment.html", "<b>nightly</b>"));

    let (code, report) = run_to_file(&dir, &[&log, "--comment", &comment, "--incremental"]);
    assert_eq!(code, EXIT_SUCCESS);
    let xml = report.expect("report written");
    assert!(xml.contains("<comment>&lt;b&gt;nightly&lt;/b&gt;</comment>"));
    assert!(xml.contains("run-type=\"incremental\""));
}

#[test]
fn test_locate_root_strips_prefix() {
    let dir = TempDir::new().expect("temp dir");
    let log = arg(&write(
        &dir,
        "bjam.log",
        "gcc.compile.c++ /build/bin.v2/libs/a/a.o\n**passed** /build/bin.v2/libs/a/a.o\n",
    ));

    let (code, report) = run_to_file(&dir, &[&log, "--locate-root", "/build/bin.v2"]);
    assert_eq!(code, EXIT_SUCCESS);
    let xml = report.expect("report written");
    assert!(xml.contains("<target name=\"libs/a/a.o\" status=\"succeeded\""));
}

#[test]
fn test_custom_pattern_table() {
    let dir = TempDir::new().expect("temp dir");
    let patterns = arg(&write(
        &dir,
        "rules.json",
        r#"[
  {"name": "start", "kind": "action-start", "pattern": "^BUILD (?P<action>\\S+) (?P<target>\\S+)$"},
  {"name": "ok", "kind": "action-succeeded", "pattern": "^OK (?P<target>\\S+)$"},
  {"name": "bad", "kind": "action-failed", "pattern": "^FAIL (?P<target>\\S+)$"}
]"#,
    ));
    let log = arg(&write(
        &dir,
        "custom.log",
        "BUILD compile a.o\nFAIL a.o\nBUILD link app\nOK app\n",
    ));

    let (code, report) = run_to_file(&dir, &[&log, "--patterns", &patterns]);
    assert_eq!(code, EXIT_SUCCESS);
    let xml = report.expect("report written");
    assert!(xml.contains("<target name=\"a.o\" status=\"failed\""));
    assert!(xml.contains("<target name=\"app\" status=\"succeeded\""));
}

#[test]
fn test_invalid_pattern_table_is_usage_error() {
    let dir = TempDir::new().expect("temp dir");
    let patterns = arg(&write(
        &dir,
        "rules.json",
        r#"[{"name": "broken", "kind": "action-start", "pattern": "(unclosed"}]"#,
    ));
    let log = arg(&write(&dir, "bjam.log", FAILED_COMPILE));

    let (code, report) = run_to_file(&dir, &[&log, "--patterns", &patterns]);
    assert_eq!(code, EXIT_USAGE);
    assert!(report.is_none());
}

#[test]
fn test_directory_input_fails() {
    let dir = TempDir::new().expect("temp dir");
    let logs = dir.path().join("logs");
    fs::create_dir(&logs).expect("create dir");

    let (code, report) = run_to_file(&dir, &[&arg(&logs)]);
    assert_eq!(code, EXIT_FAILURE);
    assert!(report.is_none());
}

#[test]
fn test_directory_among_readable_logs_is_skipped() {
    let dir = TempDir::new().expect("temp dir");
    let logs = dir.path().join("logs");
    fs::create_dir(&logs).expect("create dir");
    let log = arg(&write(&dir, "bjam.log", FAILED_COMPILE));

    let (code, report) = run_to_file(&dir, &[&arg(&logs), &log]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(report.expect("report written").contains("targets=\"1\""));
}

#[test]
fn test_input_file_flag_reads_log() {
    let dir = TempDir::new().expect("temp dir");
    let log = arg(&write(&dir, "bjam.log", FAILED_COMPILE));

    let (code, report) = run_to_file(&dir, &["--locate-root", "/build", "--input-file", &log]);
    assert_eq!(code, EXIT_SUCCESS);
    let xml = report.expect("report written");
    assert!(xml.contains("<target name=\"foo.o\" status=\"failed\""));
}

#[test]
fn test_repeated_runs_in_one_process() {
    let dir = TempDir::new().expect("temp dir");
    let log = arg(&write(&dir, "bjam.log", FAILED_COMPILE));

    assert_eq!(run_to_file(&dir, &[&log]).0, EXIT_SUCCESS);
    assert_eq!(run_to_file(&dir, &["--input-file", &log]).0, EXIT_SUCCESS);
}

#[test]
fn test_unknown_flag_is_usage_error() {
    assert_eq!(process_jam_log(["process-jam-log", "--bogus"]), EXIT_USAGE);
}

#[test]
fn test_run_reports_outcome() {
    let dir = TempDir::new().expect("temp dir");
    let first = write(&dir, "one.log", "compile a.o\n");
    let second = write(&dir, "two.log", FAILED_COMPILE);
    let config = Config {
        inputs: vec![first, second],
        output: Some(dir.path().join("report.xml")),
        ..Default::default()
    };

    let outcome = run(&config).expect("run succeeds");
    assert_eq!(outcome.read.opened, 2);
    assert_eq!(outcome.read.lines, 4);
    assert_eq!(outcome.summary.targets, 2);
    assert_eq!(outcome.summary.incomplete, 1);
    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.stats.markers, 3);
}
