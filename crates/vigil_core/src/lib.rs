//! Core logic for Vigil, the foreground-task indicator coordinator.
//! This crate is the single source of truth for counting and visibility
//! invariants; host bridges only feed it signals and render its decisions.

pub mod config;
pub mod context;
pub mod coordinator;
pub mod indicator;
pub mod logging;
pub mod model;
pub mod visibility;

pub use config::{
    is_valid_category_id, ConfigError, CoordinatorConfig, PresentationPolicy, TitlePolicy,
    DEFAULT_CATEGORY,
};
pub use context::{release_task, request_task, ContextError};
pub use coordinator::{TaskCoordinator, TaskGuard};
pub use indicator::presenter::{
    IndicatorCommand, IndicatorError, IndicatorPresenter, IndicatorRequest, IndicatorResult,
    NullPresenter, RecordingPresenter,
};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::task::{CoordinatorSnapshot, IndicatorPhase, TaskDescriptor};
pub use visibility::{HostVisibility, Subscription, Transition, VisibilityListener, VisibilityTracker};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
