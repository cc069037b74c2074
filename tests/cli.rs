use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SAMPLE_CSV: &str = "employee_id,score,date
E001,65,2023-12-17
E001,60,2023-12-22
E001,55,2023-12-27
E002,85,2023-12-17
E002,88,2023-12-22
E002,90,2023-12-27
";

fn workspace() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("scores.csv"), SAMPLE_CSV).expect("write scores");
    dir
}

fn command(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo_bin_cmd!("pip-autofire");
    cmd.current_dir(dir.path())
        .env_remove("PIP_KILL_SWITCH")
        .env_remove("PIP_AUDIT_DIR")
        .env_remove("PIP_THRESHOLD")
        .env_remove("PIP_CONSECUTIVE_LOW")
        .env_remove("PIP_GRACE_DAYS")
        .env_remove("PIP_MIN_IMPROVEMENT")
        .env("APP_LOG_LEVEL", "warn");
    cmd
}

#[test]
fn test_cli_help() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace();
    command(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn detect_lists_flagged_employee_with_coaching() {
    let dir = workspace();
    command(&dir)
        .args(["detect", "--scores", "scores.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- E001 (latest 55)"))
        .stdout(predicate::str::contains("tone and rubric adherence"))
        .stdout(predicate::str::contains("E002").not());
}

#[test]
fn cycle_writes_pip_audit_record() {
    let dir = workspace();
    command(&dir)
        .args(["cycle", "--scores", "scores.csv", "--now", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PIP issued for E001"))
        .stdout(predicate::str::contains("2024-01-01 -> 2024-01-22"));

    let log = fs::read_to_string(dir.path().join("audit").join("pip_log.jsonl"))
        .expect("pip log written");
    assert_eq!(log.lines().count(), 1);
    assert!(log.starts_with("{\"employee_id\":\"E001\",\"start_date\":\"2024-01-01\""));
}

#[test]
fn evaluate_terminates_without_improvement() {
    let dir = workspace();
    let mut csv = SAMPLE_CSV.to_string();
    csv.push_str("E001,58,2024-01-23\n");
    fs::write(dir.path().join("scores.csv"), csv).expect("write scores");

    command(&dir)
        .args([
            "evaluate",
            "--scores",
            "scores.csv",
            "--employee",
            "E001",
            "--pip-start",
            "2024-01-01",
            "--now",
            "2024-01-23",
            "--audit-dir",
            "logs",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("-3.33%"));

    let log = fs::read_to_string(dir.path().join("logs").join("termination_log.jsonl"))
        .expect("termination log written");
    assert!(log.contains("\"date\":\"2024-01-22\""));
}

#[test]
fn kill_switch_skips_engine_entirely() {
    let dir = workspace();
    command(&dir)
        .args(["--kill-switch", "cycle", "--scores", "scores.csv", "--now", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kill-switch activated"));

    assert!(!dir.path().join("audit").exists());
}

#[test]
fn invalid_configuration_exits_nonzero() {
    let dir = workspace();
    command(&dir)
        .args(["detect", "--scores", "scores.csv", "--consecutive-low", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn summary_reports_trend() {
    let dir = workspace();
    command(&dir)
        .args(["summary", "--scores", "scores.csv", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"direction\": \"declining\""));
}

fn evaluate_args() -> [&'static str; 11] {
    [
        "evaluate",
        "--scores",
        "scores.csv",
        "--employee",
        "E001",
        "--pip-start",
        "2024-01-01",
        "--now",
        "2024-01-23",
        "--audit-dir",
        "logs",
    ]
}

#[test]
fn repeated_evaluate_records_one_termination() {
    let dir = workspace();
    let mut csv = SAMPLE_CSV.to_string();
    csv.push_str("E001,58,2024-01-23\n");
    fs::write(dir.path().join("scores.csv"), csv).expect("write scores");

    command(&dir).args(evaluate_args()).assert().success();
    command(&dir)
        .args(evaluate_args())
        .assert()
        .success()
        .stdout(predicate::str::contains("already concluded"));

    let log = fs::read_to_string(dir.path().join("logs").join("termination_log.jsonl"))
        .expect("termination log written");
    assert_eq!(log.lines().count(), 1);
}

#[test]
fn repeated_cycle_does_not_reissue_pip() {
    let dir = workspace();
    command(&dir)
        .args(["cycle", "--scores", "scores.csv", "--now", "2024-01-01"])
        .assert()
        .success();
    command(&dir)
        .args(["cycle", "--scores", "scores.csv", "--now", "2024-01-08"])
        .assert()
        .success()
        .stdout(predicate::str::contains("E001 already has a PIP case"))
        .stdout(predicate::str::contains("No PIPs issued"));

    let log = fs::read_to_string(dir.path().join("audit").join("pip_log.jsonl"))
        .expect("pip log written");
    assert_eq!(log.lines().count(), 1);
}

#[test]
fn oversized_grace_period_is_a_configuration_error() {
    let dir = workspace();
    command(&dir)
        .args([
            "cycle",
            "--scores",
            "scores.csv",
            "--now",
            "2024-01-01",
            "--grace-days",
            "4294967295",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));

    assert!(!dir.path().join("audit").join("pip_log.jsonl").exists());
}
