use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use jpm_relay::{AppError, RelayConfig};

fn sample_toml() -> &'static str {
    r#"
script_path = "python/jpm_nlp.py"
script_args = ["-u"]
working_dir = "/srv/jpm"
max_line_bytes = 4096
kill_grace_ms = 250
shutdown_grace_ms = 1000
worker_threads = 4
log_level = "debug"

[interpreter]
primary = "python3.12"
secondary = "python3"
fallback = "python"
version_flag = "-V"
probe_timeout_ms = 1500
"#
}

#[test]
fn empty_toml_uses_defaults() {
    let config = RelayConfig::from_toml_str("").expect("defaults parse");

    assert_eq!(config, RelayConfig::default());
    assert_eq!(config.interpreter.primary, "python3");
    assert_eq!(config.interpreter.secondary, "python");
    assert_eq!(config.interpreter.fallback, "python");
    assert_eq!(config.interpreter.version_flag, "--version");
    assert_eq!(config.script_path, PathBuf::from("jpm_nlp.py"));
    assert_eq!(config.max_line_bytes, 1_048_576);
    assert_eq!(config.worker_threads, 2);
    assert_eq!(config.log_level, "info");
    assert!(config.working_dir.is_none());
}

#[test]
fn parses_full_config() {
    let config = RelayConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.interpreter.primary, "python3.12");
    assert_eq!(config.interpreter.version_flag, "-V");
    assert_eq!(config.interpreter.probe_timeout(), Duration::from_millis(1500));
    assert_eq!(config.script_path, PathBuf::from("python/jpm_nlp.py"));
    assert_eq!(config.script_args, vec!["-u".to_owned()]);
    assert_eq!(config.working_dir, Some(PathBuf::from("/srv/jpm")));
    assert_eq!(config.max_line_bytes, 4096);
    assert_eq!(config.kill_grace(), Duration::from_millis(250));
    assert_eq!(config.shutdown_grace(), Duration::from_secs(1));
    assert_eq!(config.worker_threads, 4);
    assert_eq!(config.log_level, "debug");
}

#[test]
fn partial_interpreter_table_keeps_other_defaults() {
    let config = RelayConfig::from_toml_str("[interpreter]\nprimary = \"py\"\n").expect("parses");
    assert_eq!(config.interpreter.primary, "py");
    assert_eq!(config.interpreter.secondary, "python");
    assert_eq!(config.interpreter.probe_timeout_ms, 3000);
}

#[test]
fn rejects_empty_script_path() {
    let err = RelayConfig::from_toml_str("script_path = \"\"").unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("script_path")));
}

#[test]
fn rejects_blank_interpreter_name() {
    let err = RelayConfig::from_toml_str("[interpreter]\nsecondary = \"  \"\n").unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("interpreter.secondary")));
}

#[test]
fn rejects_zero_limits() {
    let err = RelayConfig::from_toml_str("max_line_bytes = 0").unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("max_line_bytes")));

    let err = RelayConfig::from_toml_str("worker_threads = 0").unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("worker_threads")));
}

#[test]
fn rejects_invalid_toml() {
    let err = RelayConfig::from_toml_str("worker_threads = \"many\"").unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.starts_with("invalid config")));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(sample_toml().as_bytes()).expect("write config");

    let config = RelayConfig::load_from_path(file.path()).expect("load config");
    assert_eq!(config.worker_threads, 4);
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = RelayConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.starts_with("failed to read config")));
}
