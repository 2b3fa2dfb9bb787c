//! Process-wide coordinator context.
//!
//! # Responsibility
//! - Hold the one coordinator a host process installs at startup.
//! - Expose fire-and-forget `request_task` / `release_task` entry points.
//!
//! # Invariants
//! - The context is installed at most once per process.
//! - Entry points never panic and never return errors; before installation
//!   they log and do nothing.
//! - Callers get a `TaskCoordinator` handle, never the cell itself.

use crate::coordinator::TaskCoordinator;
use log::{info, warn};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

static COORDINATOR: OnceCell<TaskCoordinator> = OnceCell::new();

/// Process context errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A coordinator was already installed for this process.
    AlreadyInstalled,
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyInstalled => write!(f, "task coordinator already installed"),
        }
    }
}

impl Error for ContextError {}

/// Installs `coordinator` as the process coordinator.
///
/// # Errors
/// - Returns `AlreadyInstalled` when called a second time; the first
///   coordinator stays in place.
pub fn install(coordinator: TaskCoordinator) -> Result<TaskCoordinator, ContextError> {
    COORDINATOR
        .set(coordinator.clone())
        .map_err(|_| ContextError::AlreadyInstalled)?;
    info!("event=context_install module=context status=ok");
    Ok(coordinator)
}

/// Returns the installed coordinator, building it with `init` on first use.
pub fn get_or_install_with(init: impl FnOnce() -> TaskCoordinator) -> TaskCoordinator {
    COORDINATOR
        .get_or_init(|| {
            info!("event=context_install module=context status=ok mode=lazy");
            init()
        })
        .clone()
}

/// Returns a handle to the installed coordinator.
pub fn coordinator() -> Option<TaskCoordinator> {
    COORDINATOR.get().cloned()
}

pub fn is_installed() -> bool {
    COORDINATOR.get().is_some()
}

/// Registers one task on the process coordinator.
///
/// `category = None` uses the coordinator's default category.
pub fn request_task(title: &str, category: Option<&str>) {
    match COORDINATOR.get() {
        Some(coordinator) => {
            let category = category.unwrap_or(coordinator.config().default_category.as_str());
            coordinator.start(title, category);
        }
        None => warn!("event=task_request module=context status=skip reason=not_installed"),
    }
}

/// Releases one task on the process coordinator.
pub fn release_task() {
    match COORDINATOR.get() {
        Some(coordinator) => coordinator.stop(),
        None => warn!("event=task_release module=context status=skip reason=not_installed"),
    }
}
