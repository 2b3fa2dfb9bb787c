//! Task coordination.
//!
//! # Responsibility
//! - Own the task counter and current descriptor.
//! - Be the single authority deciding indicator visibility.
//!
//! # See also
//! - `visibility` for the transition source.
//! - `indicator` for the presenter contract.

pub mod task_coordinator;

pub use task_coordinator::{TaskCoordinator, TaskGuard};
