use std::sync::Arc;
use vigil_core::{
    context, CoordinatorConfig, RecordingPresenter, TaskCoordinator, VisibilityTracker,
};
use vigil_ffi::api::{
    coordinator_status, drain_indicator_commands, indicator_queue_attached,
    notify_app_background, release_task, request_task,
};

// Single test: the process coordinator is installed once per test binary.
#[test]
fn host_installed_coordinator_keeps_its_own_presenter() {
    let presenter = Arc::new(RecordingPresenter::new());
    context::install(TaskCoordinator::new(
        VisibilityTracker::new(),
        presenter.clone(),
        CoordinatorConfig::default(),
    ))
    .expect("first install should succeed");

    assert!(!indicator_queue_attached());

    assert!(notify_app_background());
    request_task("Backup".to_string(), Some("sync".to_string()));
    assert_eq!(coordinator_status().phase, "active_shown");
    assert!(drain_indicator_commands().is_empty());
    assert_eq!(presenter.present_count(), 1);

    release_task();
    assert!(drain_indicator_commands().is_empty());
    assert_eq!(presenter.withdraw_count(), 1);
    assert!(!indicator_queue_attached());
}
