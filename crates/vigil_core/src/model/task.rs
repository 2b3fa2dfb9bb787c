//! Task descriptor and indicator phase model.
//!
//! # Responsibility
//! - Define the value shown by the indicator while tasks are active.
//! - Define the observable coordinator phase and diagnostics snapshot.
//!
//! # Invariants
//! - `TaskDescriptor` is immutable once built; replacing it means storing a
//!   new value.
//! - `category` is always a valid category id (see `config`).

use serde::{Deserialize, Serialize};

/// Title/category pair describing the task the indicator talks about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskDescriptor {
    title: String,
    category: String,
}

impl TaskDescriptor {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Opaque classification id used by the presenter for grouping.
    pub fn category(&self) -> &str {
        &self.category
    }
}

/// Coordinator state-machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorPhase {
    /// No active tasks.
    Idle,
    /// Tasks are active but the indicator is not shown.
    ActiveHidden,
    /// Tasks are active and the presenter accepted the indicator.
    ActiveShown,
}

impl IndicatorPhase {
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ActiveHidden => "active_hidden",
            Self::ActiveShown => "active_shown",
        }
    }
}

/// Point-in-time view of the coordinator for diagnostics and host bridges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorSnapshot {
    pub active_tasks: u64,
    pub descriptor: Option<TaskDescriptor>,
    pub phase: IndicatorPhase,
    /// Whether the coordinator still receives visibility transitions.
    pub observer_attached: bool,
    pub app_visible: bool,
}

#[cfg(test)]
mod tests {
    use super::{CoordinatorSnapshot, IndicatorPhase, TaskDescriptor};

    #[test]
    fn phase_reports_activity() {
        assert!(!IndicatorPhase::Idle.is_active());
        assert!(IndicatorPhase::ActiveHidden.is_active());
        assert!(IndicatorPhase::ActiveShown.is_active());
    }

    #[test]
    fn snapshot_serializes_phase_in_snake_case() {
        let snapshot = CoordinatorSnapshot {
            active_tasks: 2,
            descriptor: Some(TaskDescriptor::new("Backup", "sync")),
            phase: IndicatorPhase::ActiveShown,
            observer_attached: true,
            app_visible: false,
        };

        let json = serde_json::to_value(&snapshot).expect("snapshot should serialize");
        assert_eq!(json["phase"], "active_shown");
        assert_eq!(json["active_tasks"], 2);
        assert_eq!(json["descriptor"]["title"], "Backup");
        assert_eq!(json["descriptor"]["category"], "sync");
    }
}
