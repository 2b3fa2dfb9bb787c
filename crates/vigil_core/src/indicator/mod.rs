//! Host indicator collaborator.
//!
//! # Responsibility
//! - Define the present/withdraw contract consumed by the coordinator.
//! - Keep host rendering concerns (channels, icons, intents) out of core.

pub mod presenter;
