//! Unit tests for `AppError` display format.

use jpm_relay::AppError;

#[test]
fn display_uses_category_prefix() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Launch("bad".into()), "launch: bad"),
        (AppError::Io("bad".into()), "io: bad"),
        (AppError::Busy("bad".into()), "busy: bad"),
        (AppError::InvalidInput("bad".into()), "invalid input: bad"),
        (AppError::Shutdown("bad".into()), "shutdown: bad"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn io_errors_convert_to_io_variant() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
    let err: AppError = io.into();
    assert!(matches!(err, AppError::Io(ref msg) if msg == "pipe closed"));
}

#[test]
fn implements_std_error() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
    let err = AppError::Busy("request 1 is still running".into());
    assert_error(&err);
    assert!(format!("{err:?}").contains("Busy"));
}
