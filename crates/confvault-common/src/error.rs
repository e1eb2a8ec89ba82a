//! Error types and error codes for confvault
//!
//! This module defines:
//! - `ConfVaultError`: the engine's error enum
//! - `PersistenceContext`: wraps storage failures with operation/entity context
//! - `ErrorCode`: structured codes an API layer can map errors onto

use serde::{Deserialize, Serialize};

/// Engine error taxonomy.
///
/// "Not found" is deliberately absent: lookups return `Option` and an empty
/// result is a normal outcome.
#[derive(thiserror::Error, Debug)]
pub enum ConfVaultError {
    #[error("configuration {config_id} lock conflict, current holder: {current_holder}")]
    LockConflict { config_id: i64, current_holder: i64 },

    #[error(
        "history {history_id} does not belong to configuration {config_id} (owner: {owner_id:?})"
    )]
    ReferentialMismatch {
        config_id: i64,
        history_id: i64,
        owner_id: Option<i64>,
    },

    #[error("configuration {0} not exist")]
    ConfigurationNotExist(i64),

    #[error("unknown field '{field}' for {entity}")]
    UnknownField { entity: String, field: String },

    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("{operation} {entity} (id: {entity_id:?}) failed: {source}")]
    Persistence {
        operation: &'static str,
        entity: String,
        entity_id: Option<i64>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

pub type Result<T> = std::result::Result<T, ConfVaultError>;

impl ConfVaultError {
    /// Holder reported by a lock conflict
    pub fn current_holder(&self) -> Option<i64> {
        match self {
            ConfVaultError::LockConflict { current_holder, .. } => Some(*current_holder),
            _ => None,
        }
    }

    /// Whether a caller may reasonably retry the same call later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConfVaultError::LockConflict { .. } | ConfVaultError::Persistence { .. }
        )
    }

    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            ConfVaultError::LockConflict { .. } => RESOURCE_CONFLICT,
            ConfVaultError::ReferentialMismatch { .. } => PARAMETER_MISMATCH,
            ConfVaultError::ConfigurationNotExist(_) => RESOURCE_NOT_FOUND,
            ConfVaultError::UnknownField { .. } | ConfVaultError::IllegalArgument(_) => {
                PARAMETER_VALIDATE_ERROR
            }
            ConfVaultError::Persistence { .. } => DATA_ACCESS_ERROR,
        }
    }
}

/// Extension trait attaching persistence context to storage results.
///
/// The failure is logged once here, where the operation and entity are known.
pub trait PersistenceContext<T> {
    fn persistence(
        self,
        operation: &'static str,
        entity: &str,
        entity_id: Option<i64>,
    ) -> Result<T>;
}

impl<T, E> PersistenceContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn persistence(
        self,
        operation: &'static str,
        entity: &str,
        entity_id: Option<i64>,
    ) -> Result<T> {
        self.map_err(|e| {
            tracing::error!(
                operation,
                entity,
                entity_id,
                error = %e,
                "Persistence operation failed"
            );
            ConfVaultError::Persistence {
                operation,
                entity: entity.to_string(),
                entity_id,
                source: Box::new(e),
            }
        })
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

pub const PARAMETER_MISMATCH: ErrorCode<'static> = ErrorCode {
    code: 20009,
    message: "parameter mismatch",
};
