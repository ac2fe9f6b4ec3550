use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::fs;

/// Writes `buildbench.toml` into a fresh temp dir. Returns the temp dir
/// (must be kept alive).
fn setup_project(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("buildbench.toml"), config).unwrap();
    tmp
}

fn buildbench_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("buildbench").unwrap();
    cmd.current_dir(dir.path());
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("BUILDBENCH_LOG");
    cmd
}

const TWO_TARGETS: &str = r#"
runs = 2

[[target]]
label = "Slow Tool"
command = "mkdir -p dist && echo bundle > dist/index.js"

[[target]]
label = "Fast Tool"
command = "true"
"#;

// ---- Text report ----

#[test]
fn text_report_sections() {
    let tmp = setup_project(TWO_TARGETS);

    buildbench_cmd(&tmp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Measuring Slow Tool..."))
        .stdout(predicate::str::contains("  Run 1/2"))
        .stdout(predicate::str::contains("  Run 2/2"))
        .stdout(predicate::str::contains("BENCHMARK RESULTS (Average of 2 runs)"))
        .stdout(predicate::str::contains("Before (Slow Tool)"))
        .stdout(predicate::str::contains("After (Fast Tool)"))
        .stdout(predicate::str::contains("| Build Time (ms)"))
        .stdout(predicate::str::contains("DETAILED RESULTS"))
        .stdout(predicate::str::contains("Improvement:"));
}

#[test]
fn output_dir_removed_after_run() {
    let tmp = setup_project(TWO_TARGETS);
    fs::create_dir_all(tmp.path().join("dist")).unwrap();
    fs::write(tmp.path().join("dist").join("stale.js"), "old").unwrap();

    buildbench_cmd(&tmp).assert().success();
    assert!(!tmp.path().join("dist").exists());
}

#[test]
fn quiet_suppresses_progress() {
    let tmp = setup_project(TWO_TARGETS);

    buildbench_cmd(&tmp)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("Run 1/2").not())
        .stdout(predicate::str::contains("BENCHMARK RESULTS"));
}

// ---- JSON report ----

#[test]
fn json_output_valid() {
    let tmp = setup_project(TWO_TARGETS);

    let output = buildbench_cmd(&tmp).arg("--json").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(parsed["runs"], 2);
    let targets = parsed["targets"].as_array().expect("targets array");
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0]["label"], "Slow Tool");
    assert!(targets[0]["improvement_percent"].is_null());
    assert!(targets[1]["improvement_percent"].is_number());
    for t in targets {
        let samples = t["samples_ms"].as_array().unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.as_f64().unwrap() >= 0.0));
        let min = t["min_ms"].as_f64().unwrap();
        let avg = t["average_ms"].as_f64().unwrap();
        let max = t["max_ms"].as_f64().unwrap();
        assert!(min <= avg && avg <= max);
    }
}

#[test]
fn runs_flag_overrides_config() {
    let tmp = setup_project(TWO_TARGETS);

    let output = buildbench_cmd(&tmp)
        .args(["--json", "--runs", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["runs"], 3);
    assert_eq!(parsed["targets"][0]["samples_ms"].as_array().unwrap().len(), 3);
}

#[test]
fn acceleration_variable_passed_per_target() {
    let tmp = setup_project(
        r#"
runs = 1
acceleration_env = "BUILDBENCH_IT_ACCEL"

[[target]]
label = "plain"
command = 'test -z "${BUILDBENCH_IT_ACCEL+x}"'

[[target]]
label = "native"
command = 'test "$BUILDBENCH_IT_ACCEL" = true'
acceleration = "on"
"#,
    );

    // Ambient value must not leak into the target without acceleration.
    buildbench_cmd(&tmp)
        .env("BUILDBENCH_IT_ACCEL", "false")
        .arg("--quiet")
        .assert()
        .success();
}

// ---- Failures ----

#[test]
fn failing_command_exits_nonzero() {
    let tmp = setup_project(
        r#"
runs = 2

[[target]]
label = "Broken"
command = "exit 1"
"#,
    );

    buildbench_cmd(&tmp)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("'Broken' failed on run 1/2"))
        .stdout(predicate::str::contains("BENCHMARK RESULTS").not());
}

#[test]
fn later_target_failure_aborts_comparison() {
    let tmp = setup_project(
        r#"
runs = 1

[[target]]
label = "Good"
command = "true"

[[target]]
label = "Bad"
command = "echo 'missing config' >&2; exit 2"
"#,
    );

    buildbench_cmd(&tmp)
        .arg("--json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Bad' failed on run 1/1"))
        .stderr(predicate::str::contains("missing config"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn zero_runs_rejected() {
    let tmp = setup_project(TWO_TARGETS);

    buildbench_cmd(&tmp)
        .args(["--runs", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("runs must be at least 1"));
}

#[test]
fn runs_flag_repairs_invalid_file_value() {
    let tmp = setup_project(
        r#"
runs = 0

[[target]]
label = "Tool"
command = "true"
"#,
    );

    let output = buildbench_cmd(&tmp)
        .args(["--json", "--runs", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["targets"][0]["samples_ms"].as_array().unwrap().len(), 2);
}

#[test]
fn project_root_output_dir_rejected() {
    let tmp = setup_project(
        r#"
output_dir = "."

[[target]]
label = "Tool"
command = "true"
"#,
    );

    buildbench_cmd(&tmp)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("must name a subdirectory"));
    assert!(tmp.path().join("buildbench.toml").exists());
}

// ---- Config anchoring ----

#[test]
fn nested_invocation_anchors_to_config_directory() {
    let tmp = setup_project(
        r#"
runs = 1

[[target]]
label = "Tool"
command = "test -f buildbench.toml && mkdir -p dist && echo bundle > dist/index.js"
"#,
    );
    let nested = tmp.path().join("packages").join("app");
    fs::create_dir_all(nested.join("dist")).unwrap();
    fs::write(nested.join("dist").join("keep.js"), "user data").unwrap();
    fs::create_dir_all(tmp.path().join("dist")).unwrap();

    let mut cmd = Command::cargo_bin("buildbench").unwrap();
    cmd.current_dir(&nested)
        .env("NO_COLOR", "1")
        .arg("--quiet")
        .assert()
        .success();

    // The project's dist is cleared; the unrelated nested one is untouched.
    assert!(!tmp.path().join("dist").exists());
    assert!(nested.join("dist").join("keep.js").exists());
}

#[test]
fn output_dir_flag_is_relative_to_current_directory() {
    let tmp = setup_project(
        r#"
runs = 1

[[target]]
label = "Tool"
command = "true"
"#,
    );
    let nested = tmp.path().join("packages").join("app");
    fs::create_dir_all(nested.join("out")).unwrap();
    fs::create_dir_all(tmp.path().join("out")).unwrap();

    let mut cmd = Command::cargo_bin("buildbench").unwrap();
    cmd.current_dir(&nested)
        .env("NO_COLOR", "1")
        .args(["--quiet", "--output-dir", "out"])
        .assert()
        .success();

    assert!(!nested.join("out").exists());
    assert!(tmp.path().join("out").exists());
}

#[test]
fn invalid_config_reports_error() {
    let tmp = setup_project("runs = 3\n");

    buildbench_cmd(&tmp)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn missing_explicit_config_reports_path() {
    let tmp = setup_project(TWO_TARGETS);

    buildbench_cmd(&tmp)
        .args(["--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.toml"));
}

#[test]
fn cleanup_abort_escalates_blocked_output_dir() {
    let tmp = setup_project(
        r#"
runs = 1
cleanup = "abort"

[[target]]
label = "Tool"
command = "true"
"#,
    );
    fs::write(tmp.path().join("dist"), "a file, not a directory").unwrap();

    buildbench_cmd(&tmp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to remove output directory"));

    // The CLI flag relaxes it back to a warning.
    buildbench_cmd(&tmp)
        .args(["--cleanup", "warn", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::contains("failed to remove"));
}

// ---- init ----

#[test]
fn init_prints_parseable_default_config() {
    let tmp = TempDir::new().unwrap();

    let output = buildbench_cmd(&tmp).arg("init").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[[target]]"));
    assert!(stdout.contains("Vite (Standard)"));
    assert!(stdout.contains("ROLLDOWN_NATIVE"));

    let parsed: toml::Value = toml::from_str(&stdout).expect("init output should be valid TOML");
    assert_eq!(parsed["target"].as_array().unwrap().len(), 3);
}
