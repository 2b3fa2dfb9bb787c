//! Indicator collaborator contract.
//!
//! # Responsibility
//! - Abstract the host's persistent "background work" affordance behind two
//!   calls: present and withdraw.
//! - Provide in-process presenters for host bridges, tests and benchmarks.
//!
//! # Invariants
//! - `present` is safe to re-invoke (the host redraws).
//! - `withdraw` is safe to call when nothing is shown.
//! - Presenters must not call back into the coordinator.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// Presentation request handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub title: String,
    pub category: String,
}

impl IndicatorRequest {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
        }
    }
}

/// Host-side failure to show or remove the indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorError {
    /// Host refused because a permission is missing.
    PermissionDenied,
    /// Host throttled indicator updates.
    RateLimited,
    /// Host facility is not reachable.
    Unavailable(String),
}

impl IndicatorError {
    /// Stable code for structured log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::RateLimited => "rate_limited",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl Display for IndicatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "indicator permission denied by host"),
            Self::RateLimited => write!(f, "indicator update rate limited by host"),
            Self::Unavailable(details) => write!(f, "indicator host unavailable: {details}"),
        }
    }
}

impl Error for IndicatorError {}

pub type IndicatorResult = Result<(), IndicatorError>;

/// Host collaborator that renders the single persistent indicator.
pub trait IndicatorPresenter: Send + Sync {
    fn present(&self, request: &IndicatorRequest) -> IndicatorResult;
    fn withdraw(&self) -> IndicatorResult;
}

/// One call observed by a [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IndicatorCommand {
    Present { title: String, category: String },
    Withdraw,
}

/// Presenter that queues accepted calls in memory.
///
/// Host bridges drain the queue and render asynchronously; tests inspect it.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    commands: Mutex<VecDeque<IndicatorCommand>>,
    failures: Mutex<VecDeque<IndicatorError>>,
    // `None` keeps every command.
    capacity: Option<usize>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the newest `capacity` commands (at least one).
    ///
    /// With a capacity of one the queue holds just the state the host must
    /// converge to.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    /// Makes the next call (present or withdraw) fail with `error`.
    ///
    /// Failed calls are not recorded.
    pub fn fail_next(&self, error: IndicatorError) {
        lock_or_recover(&self.failures).push_back(error);
    }

    /// Returns recorded commands without consuming them.
    pub fn commands(&self) -> Vec<IndicatorCommand> {
        lock_or_recover(&self.commands).iter().cloned().collect()
    }

    /// Removes and returns recorded commands in call order.
    pub fn drain(&self) -> Vec<IndicatorCommand> {
        lock_or_recover(&self.commands).drain(..).collect()
    }

    pub fn present_count(&self) -> usize {
        lock_or_recover(&self.commands)
            .iter()
            .filter(|command| matches!(command, IndicatorCommand::Present { .. }))
            .count()
    }

    pub fn withdraw_count(&self) -> usize {
        lock_or_recover(&self.commands)
            .iter()
            .filter(|command| matches!(command, IndicatorCommand::Withdraw))
            .count()
    }

    pub fn clear(&self) {
        lock_or_recover(&self.commands).clear();
    }

    fn record(&self, command: IndicatorCommand) -> IndicatorResult {
        if let Some(error) = lock_or_recover(&self.failures).pop_front() {
            return Err(error);
        }
        let mut commands = lock_or_recover(&self.commands);
        commands.push_back(command);
        if let Some(capacity) = self.capacity {
            while commands.len() > capacity {
                commands.pop_front();
            }
        }
        Ok(())
    }
}

impl IndicatorPresenter for RecordingPresenter {
    fn present(&self, request: &IndicatorRequest) -> IndicatorResult {
        self.record(IndicatorCommand::Present {
            title: request.title.clone(),
            category: request.category.clone(),
        })
    }

    fn withdraw(&self) -> IndicatorResult {
        self.record(IndicatorCommand::Withdraw)
    }
}

/// Presenter that accepts and discards every call.
pub struct NullPresenter;

impl IndicatorPresenter for NullPresenter {
    fn present(&self, _request: &IndicatorRequest) -> IndicatorResult {
        Ok(())
    }

    fn withdraw(&self) -> IndicatorResult {
        Ok(())
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
