//! Host bridge for Vigil.
//!
//! The host (UI runtime) calls into `api`; generated bindings wrap these
//! functions and never see core types directly.

pub mod api;
