//! Lock-aware services over the persistence stores

pub mod edit;
pub mod lock;
pub mod publish;

pub use edit::ConfigurationEditor;
pub use lock::LockManager;
pub use publish::PublishTracker;

use sea_orm::ConnectionTrait;

use confvault_common::{ConfVaultError, Result};
use confvault_persistence::store::configuration as configuration_store;

/// Explain why a guarded update on `config_id` touched no rows.
///
/// Reads the row through the same connection (or transaction) the update
/// used: a missing row is `ConfigurationNotExist`, otherwise the guard lost to
/// the current lock holder.
pub(crate) async fn guard_failure<C: ConnectionTrait>(db: &C, config_id: i64) -> Result<ConfVaultError> {
    Ok(match configuration_store::find_by_id(db, config_id).await? {
        None => ConfVaultError::ConfigurationNotExist(config_id),
        Some(current) => ConfVaultError::LockConflict {
            config_id,
            current_holder: current.lock_uid,
        },
    })
}

pub(crate) fn ensure_principal(principal: i64) -> Result<()> {
    if principal == confvault_common::UNLOCKED_UID {
        return Err(ConfVaultError::IllegalArgument(format!(
            "principal {principal} is reserved for the unlocked state"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_principal() {
        assert!(ensure_principal(1).is_ok());
        assert!(matches!(
            ensure_principal(0),
            Err(ConfVaultError::IllegalArgument(_))
        ));
    }
}
