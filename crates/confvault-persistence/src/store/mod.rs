//! Stores for the three configuration tables
//!
//! Each module exposes free functions generic over `ConnectionTrait`, so the
//! same code runs on a pooled connection or inside a caller's transaction,
//! and a thin handle type owning the connection for standalone use.

pub mod configuration;
pub mod history;
pub mod publish;

pub use configuration::ConfigurationStore;
pub use history::{HistoryLog, HistoryWithConfiguration};
pub use publish::PublishStore;
