//! Value types shared by the tracker, coordinator and host bridges.
//!
//! # Invariants
//! - Tasks are counted, never keyed by identity; the descriptor only names
//!   what the indicator currently says.

pub mod task;
