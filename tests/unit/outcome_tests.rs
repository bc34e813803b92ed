//! Unit tests for exit outcome classification and error lines.

use jpm_relay::models::outcome::{ExitKind, ExitOutcome, SYNTHETIC_EXIT_CODE};

#[test]
fn normal_exit_has_no_error_line() {
    let outcome = ExitOutcome::normal();
    assert!(outcome.is_success());
    assert_eq!(outcome.code, 0);
    assert_eq!(outcome.error_line(), None);
}

#[test]
fn launch_failure_line_includes_reason() {
    let outcome = ExitOutcome::launch_failure("script not found: jpm_nlp.py");
    assert_eq!(outcome.kind, ExitKind::LaunchFailure);
    assert_eq!(outcome.code, SYNTHETIC_EXIT_CODE);
    assert_eq!(
        outcome.error_line().as_deref(),
        Some("Error: could not start worker process: script not found: jpm_nlp.py")
    );
}

#[test]
fn interrupted_line() {
    let outcome = ExitOutcome::interrupted();
    assert_eq!(outcome.kind, ExitKind::Interrupted);
    assert_eq!(outcome.error_line().as_deref(), Some("Error: request interrupted"));
    assert_eq!(outcome.to_string(), "interrupted");
}

#[cfg(unix)]
#[test]
fn from_status_classifies_codes_and_signals() {
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    let ok = ExitOutcome::from_status(ExitStatus::from_raw(0));
    assert_eq!(ok, ExitOutcome::normal());

    let failed = ExitOutcome::from_status(ExitStatus::from_raw(7 << 8));
    assert_eq!(failed.kind, ExitKind::NonZeroExit);
    assert_eq!(failed.code, 7);
    assert_eq!(
        failed.error_line().as_deref(),
        Some("Error: worker process exited with code 7")
    );

    // Raw status 9: killed by SIGKILL, no exit code.
    let killed = ExitOutcome::from_status(ExitStatus::from_raw(9));
    assert_eq!(killed.kind, ExitKind::NonZeroExit);
    assert_eq!(killed.code, SYNTHETIC_EXIT_CODE);
    assert_eq!(
        killed.error_line().as_deref(),
        Some("Error: worker process terminated by signal")
    );
}
