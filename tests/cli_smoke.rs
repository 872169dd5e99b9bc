//! CLI smoke tests: the `eyesuite` binary driven with piped stdin.

mod common;

use serde_json::Value;

fn json_line(stdout: &str) -> Value {
    let line = stdout.lines().last().expect("at least one stdout line");
    serde_json::from_str(line).expect("stdout ends with a JSON line")
}

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"], "");
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: eyesuite [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn list_json_has_six_tests() {
    let result = common::run_cli_case("list_json_has_six_tests", &["list", "--json"], "");
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    let tests = payload["tests"].as_array().expect("tests array");
    assert_eq!(tests.len(), 6);
    assert_eq!(tests[1]["id"], "color-blind");
    assert_eq!(tests[1]["trial_count"], 15);
}

#[test]
fn run_acuity_reports_outcome() {
    let result = common::run_cli_case(
        "run_acuity_reports_outcome",
        &["run", "visual-acuity", "--json"],
        "smaller\ntoo small\n",
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["completed"], true);
    assert_eq!(payload["outcome"], "Readable down to size 2/5");
}

#[test]
fn run_unknown_test_is_user_error() {
    let result = common::run_cli_case("run_unknown_test_is_user_error", &["run", "hearing"], "");
    assert_eq!(
        result.status.code(),
        Some(1),
        "log: {}",
        result.log_path.display()
    );
    assert!(result.stderr.contains("EVS-2001"));
}

#[test]
fn run_back_records_nothing() {
    let result = common::run_cli_case(
        "run_back_records_nothing",
        &["run", "color-blind", "--json"],
        "45\nback\n",
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert_eq!(json_line(&result.stdout)["completed"], false);
}

#[test]
fn suite_json_summarizes_completed_tests() {
    let result = common::run_cli_case(
        "suite_json_summarizes_completed_tests",
        &["suite", "--json"],
        "contrast\nb\nquit\n",
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["summary"]["completed"], 1);
    assert_eq!(
        payload["results"]["contrast"]["outcome_text"],
        "Reduced contrast sensitivity"
    );
}

#[test]
fn analyze_reads_response_from_stdin() {
    let body = r#"{"prediction":"Diabetic Retinopathy Detected","confidence":0.62,"class_index":1,"all_probabilities":{"No Diabetic Retinopathy":0.38,"Diabetic Retinopathy Detected":0.62}}"#;
    let result = common::run_cli_case(
        "analyze_reads_response_from_stdin",
        &["analyze", "--kind", "retinopathy", "--json"],
        body,
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(
        payload["report"]["recommendation"],
        "Moderate signs detected. Schedule an eye exam soon."
    );
    assert!(
        payload["endpoint"]
            .as_str()
            .is_some_and(|url| url.ends_with("/api/predict/retinopathy"))
    );
}

#[test]
fn analyze_rejects_malformed_response() {
    let result = common::run_cli_case(
        "analyze_rejects_malformed_response",
        &["analyze", "--kind", "pink-eye"],
        r#"{"prediction":"Normal","confidence":3.0,"class_index":0,"all_probabilities":{}}"#,
    );
    assert_eq!(
        result.status.code(),
        Some(1),
        "log: {}",
        result.log_path.display()
    );
}

#[test]
fn tips_marks_done_entries() {
    let result = common::run_cli_case(
        "tips_marks_done_entries",
        &["tips", "--done", "1,3", "--json"],
        "",
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["tips"][0]["done"], true);
    assert_eq!(payload["tips"][1]["done"], false);
    assert!((payload["progress"].as_f64().unwrap() - 0.4).abs() < 1e-9);
}

#[test]
fn tips_rejects_out_of_range_index() {
    let result = common::run_cli_case(
        "tips_rejects_out_of_range_index",
        &["tips", "--done", "9"],
        "",
    );
    assert_eq!(
        result.status.code(),
        Some(1),
        "log: {}",
        result.log_path.display()
    );
}

#[test]
fn config_validate_rejects_bad_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[analysis]\nservice_url = \"ftp://nowhere\"\n").unwrap();
    let result = common::run_cli_case(
        "config_validate_rejects_bad_file",
        &["config", "validate", "--config", path.to_str().unwrap(), "--json"],
        "",
    );
    assert_eq!(
        result.status.code(),
        Some(1),
        "log: {}",
        result.log_path.display()
    );
    let payload = json_line(&result.stdout);
    assert_eq!(payload["valid"], false);
    assert_eq!(payload["code"], "EVS-1001");
}

#[test]
fn config_path_honors_override() {
    let result = common::run_cli_case(
        "config_path_honors_override",
        &["config", "path", "--config", "/tmp/eyesuite-none.toml", "--json"],
        "",
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["path"], "/tmp/eyesuite-none.toml");
}
