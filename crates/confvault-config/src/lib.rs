//! Confvault Config - Configuration editing services
//!
//! This crate provides:
//! - `LockManager`: the exclusive per-configuration edit lock
//! - `ConfigurationEditor`: lock-checked content edits recorded in history
//! - `PublishTracker`: marks a history snapshot as the live content

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::*;
pub use service::{ConfigurationEditor, LockManager, PublishTracker};
