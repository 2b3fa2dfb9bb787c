//! Logging is process-global, so this binary holds a single sequential test.

use vigil_core::{init_logging, logging_status, LogLevel, LoggingError};

#[test]
fn init_logging_is_idempotent_and_rejects_conflicts() {
    assert!(logging_status().is_none());

    let dir = tempfile::tempdir().expect("temp dir");
    let log_dir = dir.path().join("logs");
    let log_dir_str = log_dir.to_str().expect("utf-8 temp dir").to_string();
    let other = dir.path().join("other");
    let other_str = other.to_str().expect("utf-8 temp dir").to_string();

    assert!(matches!(
        init_logging("info", "relative/logs"),
        Err(LoggingError::InvalidDirectory(_))
    ));

    init_logging("info", &log_dir_str).expect("first init should succeed");
    init_logging(" INFO ", &log_dir_str).expect("same config should be idempotent");
    assert!(log_dir.is_dir());

    let level_err = init_logging("debug", &log_dir_str).expect_err("level conflict");
    assert!(matches!(
        level_err,
        LoggingError::Conflict {
            setting: "level",
            ..
        }
    ));
    assert!(level_err.to_string().contains("refusing to switch"));

    let dir_err = init_logging("info", &other_str).expect_err("directory conflict");
    assert!(matches!(
        dir_err,
        LoggingError::Conflict {
            setting: "directory",
            ..
        }
    ));

    let (level, active_dir) = logging_status().expect("logging should be active");
    assert_eq!(level, LogLevel::Info);
    assert_eq!(active_dir, log_dir);

    log::info!("event=test_marker module=tests status=ok");
}
