//! Confvault Common - Shared types and constants
//!
//! This crate provides the foundational types used across all confvault components:
//! - Error taxonomy and error codes
//! - Lock and pagination constants

pub mod error;

// Re-exports for convenience
pub use error::{ConfVaultError, ErrorCode, PersistenceContext, Result};

/// Principal id stored in `lock_uid` when nobody holds the edit lock
pub const UNLOCKED_UID: i64 = 0;

/// Timestamp stored in `lock_at` / `publish_time` when unset
pub const UNSET_TIMESTAMP: i64 = 0;

/// Page number used when the caller passes 0
pub const DEFAULT_PAGE_NO: u64 = 1;

/// Page size used when the caller passes 0
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Entity names used in error context and log fields
pub const ENTITY_CONFIGURATION: &str = "configuration";
pub const ENTITY_CONFIGURATION_HISTORY: &str = "configuration_history";
pub const ENTITY_CONFIGURATION_PUBLISH: &str = "configuration_publish";
