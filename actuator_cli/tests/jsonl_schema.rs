use assert_cmd::prelude::*;
use rstest::rstest;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[device]
index = 1
stroke_length_mm = 100.0

[runner]
refresh_hz = 100

[oscillation]
min = 200
max = 800
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_cmd(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("actuator_cli").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(cfg);
    cmd
}

fn parse_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("not JSON: {l:?}: {e}")))
        .collect()
}

/// Every stdout line is a JSON object: events, telemetry, then stats.
#[rstest]
fn jsonl_run_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg)
        .args(["run", "--duration-ms", "300", "--print-every-ms", "20", "--stats"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let lines = parse_lines(&out);

    assert_eq!(lines.first().map(|v| v["event"].clone()), Some("connected".into()));

    let telemetry: Vec<&Value> = lines.iter().filter(|v| v.get("raw_position").is_some()).collect();
    assert!(!telemetry.is_empty(), "no telemetry lines: {lines:?}");
    for t in &telemetry {
        assert!(t["timestamp_ms"].is_u64());
        assert!(t["dt_ms"].is_u64());
        assert!(t["raw_position"].is_u64());
        assert!(t["position_mm"].is_f64());
        assert!(t["raw_velocity"].is_i64());
        assert!(t["velocity_percent"].is_f64());
        assert!(t["real_velocity_mm_s"].is_f64());
        assert!(t["refresh_hz"].is_null() || t["refresh_hz"].is_f64());
        assert_eq!(t["oscillating"], false);
    }
    // Default speed 600 of 1024.
    assert_eq!(telemetry[0]["raw_velocity"], 600);

    let stats = lines.last().unwrap();
    assert!(stats["stats"]["cycles"].as_u64().unwrap() > 0);
    assert!(stats["stats"]["overruns"].is_u64());
}

#[rstest]
fn jsonl_oscillation_uses_configured_bounds() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg)
        .args(["run", "--duration-ms", "300", "--print-every-ms", "0", "--oscillate"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let lines = parse_lines(&out);

    assert!(
        lines
            .iter()
            .any(|v| v["event"] == "oscillation" && v["active"] == true),
        "no oscillation event: {lines:?}"
    );
    assert!(lines.iter().any(|v| v["oscillating"] == true));
}

#[rstest]
#[case("ACTUATOR_TEST_SIM_NO_DEVICE", "1", 2, "Connection")]
#[case("ACTUATOR_TEST_SIM_FAIL_AFTER", "3", 3, "Transport")]
fn jsonl_error_schema(
    #[case] key: &str,
    #[case] value: &str,
    #[case] code: i32,
    #[case] reason: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg)
        .env(key, value)
        .args(["run", "--duration-ms", "5000"])
        .assert()
        .code(code)
        .get_output()
        .stdout
        .clone();
    let lines = parse_lines(&out);
    let err = lines.last().unwrap();
    assert_eq!(err["reason"], reason);
    assert_eq!(err["exit_code"], code);
    assert!(err["message"].as_str().unwrap().starts_with("What happened:"));
}

#[rstest]
fn jsonl_fault_is_reported_as_event_before_error() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg)
        .env("ACTUATOR_TEST_SIM_FAIL_AFTER", "5")
        .args(["run", "--duration-ms", "5000", "--print-every-ms", "0"])
        .assert()
        .code(3)
        .get_output()
        .stdout
        .clone();
    let lines = parse_lines(&out);
    let fault = lines
        .iter()
        .position(|v| v["event"] == "loop_fault")
        .expect("loop_fault event");
    let err = lines.iter().position(|v| v.get("exit_code").is_some()).unwrap();
    assert!(fault < err);
    assert!(
        lines[fault]["reason"]
            .as_str()
            .unwrap()
            .contains("timeout")
    );
}
