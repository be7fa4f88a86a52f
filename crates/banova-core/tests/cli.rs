//! CLI tests for the banova binary.
//!
//! Every command runs with `XDG_CONFIG_HOME` pointed at an empty temp dir so a
//! developer's own config file cannot leak into the results.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn banova(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("banova").expect("banova binary should exist");
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env_remove("BANOVA_CONFIG")
        .env_remove("BANOVA_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

const DATA_2X2: &str = r#"{
  "response": [1.0, 2.0, 3.0, 4.0, 1.4, 2.2, 3.1, 4.3],
  "factor1": ["a", "a", "b", "b", "a", "a", "b", "b"],
  "factor2": ["u", "v", "u", "v", "u", "v", "u", "v"]
}"#;

fn short_run_args<'a>(data: &'a str) -> Vec<&'a str> {
    vec![
        "run",
        "--data",
        data,
        "--chain-length",
        "400",
        "--burnin",
        "100",
        "--thin",
        "3",
        "--seed",
        "7",
    ]
}

mod run {
    use super::*;

    #[test]
    fn json_report_on_stdout() {
        let home = TempDir::new().unwrap();
        let data = write(home.path(), "data.json", DATA_2X2);
        let contrasts = write(home.path(), "c.json", r#"{"x1": {"AvB": [1, -1]}}"#);

        let output = banova(&home)
            .args(short_run_args(&data))
            .args(["--contrasts", &contrasts])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["seed"], 7);
        assert_eq!(report["sampler"]["retained"], 100);
        assert_eq!(report["contrasts"][0]["label"], "AvB");
        assert_eq!(report["config"]["config"]["chain_length"], 400);
        assert!(report.get("draws").is_none());
    }

    #[test]
    fn draws_flag_adds_raw_draws() {
        let home = TempDir::new().unwrap();
        let data = write(home.path(), "data.json", DATA_2X2);
        let contrasts = write(home.path(), "c.json", r#"{"x2": {"uvv": [1, -1]}}"#);

        let output = banova(&home)
            .args(short_run_args(&data))
            .args(["--contrasts", &contrasts, "--draws"])
            .output()
            .unwrap();
        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["draws"][0]["draws"].as_array().unwrap().len(), 100);
    }

    #[test]
    fn markdown_report() {
        let home = TempDir::new().unwrap();
        let data = write(home.path(), "data.json", DATA_2X2);
        banova(&home)
            .args(short_run_args(&data))
            .args(["--format", "md"])
            .assert()
            .success()
            .stdout(predicate::str::contains("# banova analysis"))
            .stdout(predicate::str::contains("| b1[a] |"));
    }

    #[test]
    fn config_file_supplies_settings() {
        let home = TempDir::new().unwrap();
        let data = write(home.path(), "data.json", DATA_2X2);
        let config = write(
            home.path(),
            "banova.toml",
            "chain_length = 300\nburnin = 50\nthin = 5\nseed = 3\n",
        );

        let output = banova(&home)
            .args(["run", "--data", &data, "--config", &config])
            .output()
            .unwrap();
        assert!(output.status.success());
        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["sampler"]["retained"], 50);
        assert_eq!(report["seed"], 3);
        assert!(report["config"]["hash"].as_str().unwrap().len() == 64);
    }

    #[test]
    fn contrast_dimension_error_is_structured() {
        let home = TempDir::new().unwrap();
        let data = write(home.path(), "data.json", DATA_2X2);
        let contrasts = write(home.path(), "c.json", r#"{"x1": {"bad": [1, -1, 0]}}"#);

        let output = banova(&home)
            .args(short_run_args(&data))
            .args(["--contrasts", &contrasts])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(14));
        let err: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(err["category"], "contrast");
        assert_eq!(err["context"]["exit_code"], "ERR_CONTRAST");
    }

    #[test]
    fn constant_response_is_a_data_error() {
        let home = TempDir::new().unwrap();
        let data = write(
            home.path(),
            "data.json",
            r#"{"response": [2, 2, 2, 2], "factor1": ["a", "a", "b", "b"], "factor2": ["u", "v", "u", "v"]}"#,
        );
        banova(&home)
            .args(short_run_args(&data))
            .assert()
            .code(12)
            .stdout(predicate::str::contains("zero variance"));
    }

    #[test]
    fn human_errors_go_to_stderr() {
        let home = TempDir::new().unwrap();
        let data = write(home.path(), "data.json", DATA_2X2);
        banova(&home)
            .args(["run", "--data", &data, "--chain-length", "400", "--burnin", "400"])
            .args(["--format", "summary"])
            .assert()
            .code(11)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("Configuration Error"));
    }

    #[test]
    fn unsupported_source_fails_explicitly() {
        let home = TempDir::new().unwrap();
        let data = write(home.path(), "data.json", DATA_2X2);
        banova(&home)
            .args(short_run_args(&data))
            .args(["--source", "Random"])
            .assert()
            .code(15)
            .stdout(predicate::str::contains("not yet implemented"));
    }

    #[test]
    fn unknown_source_is_rejected() {
        let home = TempDir::new().unwrap();
        let data = write(home.path(), "data.json", DATA_2X2);
        banova(&home)
            .args(short_run_args(&data))
            .args(["--source", "Iris"])
            .assert()
            .code(12)
            .stdout(predicate::str::contains("unknown data source"));
    }

    #[test]
    fn missing_data_file_is_io_error() {
        let home = TempDir::new().unwrap();
        let missing = home.path().join("nope.json").display().to_string();
        banova(&home)
            .args(short_run_args(&missing))
            .assert()
            .code(21);
    }
}

mod introspection {
    use super::*;

    #[test]
    fn sources_lists_all_four() {
        let home = TempDir::new().unwrap();
        let output = banova(&home).arg("sources").output().unwrap();
        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let names: Vec<_> = value["sources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["QianS2007", "Salary", "Random", "Ex19.3"]);
        assert_eq!(value["sources"][2]["status"], "not_implemented");
    }

    #[test]
    fn config_show_uses_defaults() {
        let home = TempDir::new().unwrap();
        let output = banova(&home).args(["config", "show"]).output().unwrap();
        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["using_defaults"], true);
        assert_eq!(value["config"]["chain_length"], 20000);
        assert_eq!(value["config"]["thin"], 50);
    }

    #[test]
    fn config_show_reads_xdg_default() {
        let home = TempDir::new().unwrap();
        std::fs::create_dir_all(home.path().join("banova")).unwrap();
        write(&home.path().join("banova"), "config.toml", "thin = 10\n");
        banova(&home)
            .args(["config", "show", "--format", "md"])
            .assert()
            .success()
            .stdout(predicate::str::contains("thin = 10"));
    }

    #[test]
    fn invalid_config_file_fails() {
        let home = TempDir::new().unwrap();
        let config = write(home.path(), "bad.toml", "thinning = 3\n");
        banova(&home)
            .args(["config", "show", "--config", &config])
            .assert()
            .code(11);
    }

    #[test]
    fn schema_for_report() {
        let home = TempDir::new().unwrap();
        banova(&home)
            .args(["schema", "AnalysisReport"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"contrasts\""));
    }

    #[test]
    fn unknown_schema_is_args_error() {
        let home = TempDir::new().unwrap();
        banova(&home)
            .args(["schema", "Plan"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("unknown schema type"));
    }

    #[test]
    fn version_reports_schema_version() {
        let home = TempDir::new().unwrap();
        banova(&home)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"schema_version\""));
    }

    #[test]
    fn unknown_command_fails() {
        let home = TempDir::new().unwrap();
        banova(&home)
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }
}
