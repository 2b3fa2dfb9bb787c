//! Host-facing use-case API.
//!
//! # Responsibility
//! - Expose the process-wide task entry points and visibility feed.
//! - Queue indicator decisions for the host to render asynchronously.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Task calls are fire-and-forget; they never report errors.
//! - The bridge coordinator is created once, on first use.
//! - Indicator commands reach the host only when the bridge created the
//!   process coordinator. A coordinator installed earlier through
//!   `vigil_core::context::install` keeps its own presenter; see
//!   `indicator_queue_attached`.
//! - The indicator queue holds only the newest command, so an undrained
//!   queue never grows.

use log::warn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use vigil_core::context;
use vigil_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoordinatorConfig, CoordinatorSnapshot, IndicatorCommand, LogLevel, RecordingPresenter,
    TaskCoordinator, VisibilityTracker,
};

static BRIDGE_PRESENTER: OnceLock<Arc<RecordingPresenter>> = OnceLock::new();
static BRIDGE_OWNS_COORDINATOR: AtomicBool = AtomicBool::new(false);
static FOREIGN_COORDINATOR_REPORTED: AtomicBool = AtomicBool::new(false);

/// Minimal health-check API.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core file logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
///   Blank selects `debug` for debug builds and `info` for release builds.
/// - `log_dir`: absolute directory path for rolling logs.
///
/// # FFI contract
/// - Sync call; may create the log directory.
/// - Idempotent for the same `level + log_dir`.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = match level.trim() {
        "" => LogLevel::build_default().as_str(),
        explicit => explicit,
    };
    match init_logging_inner(level, log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Registers one background task.
///
/// `category = None` (or blank) uses the configured default category.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never fails; indicator changes are queued for `drain_indicator_commands`.
#[flutter_rust_bridge::frb(sync)]
pub fn request_task(title: String, category: Option<String>) {
    bridge_coordinator();
    context::request_task(title.as_str(), category.as_deref());
}

/// Releases one background task. Extra releases are ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn release_task() {
    bridge_coordinator();
    context::release_task();
}

/// Host lifecycle signal: the app came to the foreground.
///
/// Returns `true` when the signal was a real transition.
#[flutter_rust_bridge::frb(sync)]
pub fn notify_app_foreground() -> bool {
    bridge_coordinator().tracker().enter_foreground()
}

/// Host lifecycle signal: the app went to the background.
///
/// Returns `true` when the signal was a real transition.
#[flutter_rust_bridge::frb(sync)]
pub fn notify_app_background() -> bool {
    bridge_coordinator().tracker().enter_background()
}

/// Coordinator status for diagnostics UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorStatus {
    pub active_tasks: u64,
    /// `idle|active_hidden|active_shown`.
    pub phase: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub observer_attached: bool,
    pub app_visible: bool,
}

/// Indicator change the host must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorAction {
    /// `present|withdraw`.
    pub kind: String,
    pub title: Option<String>,
    pub category: Option<String>,
}

/// Returns current coordinator status.
#[flutter_rust_bridge::frb(sync)]
pub fn coordinator_status() -> CoordinatorStatus {
    to_status(bridge_coordinator().snapshot())
}

/// Returns current coordinator status as a JSON document.
///
/// Returns an empty string if serialization fails.
#[flutter_rust_bridge::frb(sync)]
pub fn coordinator_status_json() -> String {
    let snapshot = bridge_coordinator().snapshot();
    serde_json::to_string(&snapshot).unwrap_or_else(|err| {
        warn!("event=status_json module=ffi status=error error={err}");
        String::new()
    })
}

/// Removes and returns the queued indicator change, if any.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - At most one action is returned: the newest decision. Older undrained
///   decisions are superseded and dropped.
/// - Always empty when `indicator_queue_attached()` is `false`.
#[flutter_rust_bridge::frb(sync)]
pub fn drain_indicator_commands() -> Vec<IndicatorAction> {
    bridge_coordinator();
    bridge_presenter()
        .drain()
        .into_iter()
        .map(to_action)
        .collect()
}

/// Whether indicator decisions are queued for `drain_indicator_commands`.
///
/// `false` means another coordinator was installed before the bridge was
/// first used, and that coordinator's presenter receives the decisions.
#[flutter_rust_bridge::frb(sync)]
pub fn indicator_queue_attached() -> bool {
    bridge_coordinator();
    BRIDGE_OWNS_COORDINATOR.load(Ordering::SeqCst)
}

fn bridge_presenter() -> Arc<RecordingPresenter> {
    Arc::clone(BRIDGE_PRESENTER.get_or_init(|| Arc::new(RecordingPresenter::bounded(1))))
}

fn bridge_coordinator() -> TaskCoordinator {
    let coordinator = context::get_or_install_with(|| {
        let config = CoordinatorConfig::from_env().unwrap_or_else(|err| {
            warn!("event=config_load module=ffi status=error fallback=default error={err}");
            CoordinatorConfig::default()
        });
        BRIDGE_OWNS_COORDINATOR.store(true, Ordering::SeqCst);
        TaskCoordinator::new(VisibilityTracker::new(), bridge_presenter(), config)
    });
    if !BRIDGE_OWNS_COORDINATOR.load(Ordering::SeqCst)
        && !FOREIGN_COORDINATOR_REPORTED.swap(true, Ordering::SeqCst)
    {
        warn!(
            "event=bridge_coordinator module=ffi status=skip reason=foreign_coordinator_installed indicator_queue=detached"
        );
    }
    coordinator
}

fn to_status(snapshot: CoordinatorSnapshot) -> CoordinatorStatus {
    let (title, category) = match snapshot.descriptor {
        Some(descriptor) => (
            Some(descriptor.title().to_string()),
            Some(descriptor.category().to_string()),
        ),
        None => (None, None),
    };
    CoordinatorStatus {
        active_tasks: snapshot.active_tasks,
        phase: snapshot.phase.as_str().to_string(),
        title,
        category,
        observer_attached: snapshot.observer_attached,
        app_visible: snapshot.app_visible,
    }
}

fn to_action(command: IndicatorCommand) -> IndicatorAction {
    match command {
        IndicatorCommand::Present { title, category } => IndicatorAction {
            kind: "present".to_string(),
            title: Some(title),
            category: Some(category),
        },
        IndicatorCommand::Withdraw => IndicatorAction {
            kind: "withdraw".to_string(),
            title: None,
            category: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{
        coordinator_status, coordinator_status_json, core_version, drain_indicator_commands,
        indicator_queue_attached, init_logging, notify_app_background, notify_app_foreground,
        ping, release_task, request_task,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_blank_level_uses_build_default() {
        let error = init_logging("  ".to_string(), String::new());
        assert!(!error.contains("unsupported log level"));
        assert!(error.contains("log directory"));
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/vigil-logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    // Single test: the bridge coordinator is process-wide.
    #[test]
    fn bridge_flow_queues_indicator_actions() {
        assert!(indicator_queue_attached());
        notify_app_foreground();
        drain_indicator_commands();

        request_task("Backup".to_string(), Some("sync".to_string()));
        request_task("Upload".to_string(), None);
        assert!(drain_indicator_commands().is_empty());

        let status = coordinator_status();
        assert_eq!(status.active_tasks, 2);
        assert_eq!(status.phase, "active_hidden");
        assert_eq!(status.title.as_deref(), Some("Backup"));
        assert!(status.app_visible);

        assert!(notify_app_background());
        assert!(!notify_app_background());
        let actions = drain_indicator_commands();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, "present");
        assert_eq!(actions[0].category.as_deref(), Some("sync"));

        let json = coordinator_status_json();
        assert!(json.contains("\"phase\":\"active_shown\""));

        release_task();
        release_task();
        release_task();
        let actions = drain_indicator_commands();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, "withdraw");
        assert_eq!(coordinator_status().phase, "idle");

        // Undrained decisions collapse to the newest one.
        request_task("Restore".to_string(), Some("sync".to_string()));
        release_task();
        request_task("Restore".to_string(), Some("sync".to_string()));
        let actions = drain_indicator_commands();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, "present");
        assert_eq!(actions[0].title.as_deref(), Some("Restore"));
        release_task();
        drain_indicator_commands();
    }
}
