//! Application visibility tracking.
//!
//! # Responsibility
//! - Answer "is the app in the foreground" for any thread.
//! - Deliver foreground/background edges to subscribers exactly once per
//!   transition.

pub mod tracker;

pub use tracker::{HostVisibility, Subscription, Transition, VisibilityListener, VisibilityTracker};
