// CLI integration tests, driving the `tomasulo_sim` binary the way a user
// would: a program file on disk, flags controlling the processor shape,
// and either a human summary on stderr or a JSON snapshot on stdout (kept
// separate so piping `--json` output never mixes with log lines).

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn write_program(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn help_lists_the_core_flags() {
    let mut cmd = Command::cargo_bin("tomasulo_sim").unwrap();
    cmd.arg("--help");
    cmd.assert().success().stdout(predicate::str::contains("--rob-size")).stdout(predicate::str::contains("--no-speculation"));
}

#[test]
fn missing_input_file_fails_cleanly() {
    let mut cmd = Command::cargo_bin("tomasulo_sim").unwrap();
    cmd.arg("--input").arg("/nonexistent/path/does-not-exist.asm");
    cmd.assert().failure();
}

#[test]
fn malformed_program_reports_a_parse_error_and_fails() {
    let dir = tempdir().unwrap();
    let path = write_program(&dir, "bad.asm", "ADD R1, R2\n");
    let mut cmd = Command::cargo_bin("tomasulo_sim").unwrap();
    cmd.arg("--input").arg(&path);
    cmd.assert().failure().stderr(predicate::str::contains("parse error"));
}

#[test]
fn cli_run_reports_the_same_committed_count_as_a_direct_processor_run() {
    let dir = tempdir().unwrap();
    let program_text = "LD R1, 0(R0)\nLD R2, 4(R0)\nADD R3, R1, R2\nSUB R4, R3, R1\n";
    let path = write_program(&dir, "program.asm", program_text);

    let mut cmd = Command::cargo_bin("tomasulo_sim").unwrap();
    cmd.arg("--input").arg(&path);
    cmd.assert().success().stderr(predicate::str::contains("committed=4/4"));

    let instructions = tomasulo_sim::parse_program(program_text).unwrap();
    let mut processor = tomasulo_sim::Processor::new(tomasulo_sim::ProcessorConfig::new());
    processor.load(instructions);
    let metrics = processor.run().unwrap();
    assert_eq!(metrics.committed_instructions, 4);
}

#[test]
fn json_flag_emits_a_parseable_state_snapshot() {
    let dir = tempdir().unwrap();
    let path = write_program(&dir, "program.asm", "ADD R1, R0, R0\nSUB R2, R1, R0\n");

    let mut cmd = Command::cargo_bin("tomasulo_sim").unwrap();
    cmd.arg("--input").arg(&path).arg("--json");
    let output = cmd.assert().success().get_output().stdout.clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("stdout should be valid JSON");
    assert_eq!(value["metrics"]["committed_instructions"], 2);
}

#[test]
fn no_speculation_flag_disables_speculative_flushing() {
    let dir = tempdir().unwrap();
    let path = write_program(&dir, "program.asm", "ADD R1, R0, R0\nBEQ R1, R0, 1\nADD R2, R0, R0\nADD R3, R1, R1\n");

    let mut cmd = Command::cargo_bin("tomasulo_sim").unwrap();
    cmd.arg("--input").arg(&path).arg("--no-speculation").arg("--json");
    let output = cmd.assert().success().get_output().stdout.clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["metrics"]["speculative_instructions_flushed"], 0);
}

#[test]
fn output_flag_writes_the_summary_to_a_file_instead_of_stdout() {
    let dir = tempdir().unwrap();
    let program_path = write_program(&dir, "program.asm", "ADD R1, R0, R0\n");
    let log_path = dir.path().join("run.log");

    let mut cmd = Command::cargo_bin("tomasulo_sim").unwrap();
    cmd.arg("--input").arg(&program_path).arg("--output").arg(&log_path);
    cmd.assert().success();

    let log_content = fs::read_to_string(&log_path).unwrap();
    assert!(log_content.contains("committed=1/1"));
}
