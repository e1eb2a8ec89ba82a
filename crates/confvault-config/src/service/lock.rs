//! Configuration edit lock
//!
//! The lock is the `lock_uid` / `lock_at` pair on the configuration row.
//! Acquire and release are conditional UPDATEs, so when several principals
//! race for a free lock exactly one UPDATE matches and the others observe the
//! winner. Reclaiming a stale lock only succeeds while the row still carries
//! the exact pair that was judged stale. Nothing here waits: a lost race
//! returns `LockConflict` naming the holder.

use std::time::Duration;

use sea_orm::{ColumnTrait, Condition, DatabaseConnection};

use confvault_common::{ConfVaultError, Result, UNLOCKED_UID};
use confvault_persistence::entity::configuration;
use confvault_persistence::store::configuration as configuration_store;
use confvault_persistence::{ConfigurationPatch, LockPair, LockState, now_unix};

use crate::model::LockLease;

use super::{ensure_principal, guard_failure};

/// Attempts before a lock that keeps changing hands is reported as a conflict
const MAX_ACQUIRE_ATTEMPTS: usize = 3;

#[derive(Clone, Debug)]
pub struct LockManager {
    db: DatabaseConnection,
    stale_after: Option<Duration>,
}

impl LockManager {
    /// Lock manager whose locks never expire
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            stale_after: None,
        }
    }

    /// Allow taking over a lock held longer than `stale_after`; zero disables it
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = (!stale_after.is_zero()).then_some(stale_after);
        self
    }

    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Take the edit lock of `config_id` for `principal`.
    ///
    /// Succeeds when the lock is free or already held by `principal` (the
    /// timestamp is refreshed), and, with a staleness threshold configured,
    /// when the current lock is older than the threshold.
    pub async fn acquire(&self, config_id: i64, principal: i64) -> Result<LockLease> {
        ensure_principal(principal)?;

        for _ in 0..MAX_ACQUIRE_ATTEMPTS {
            let now = now_unix();
            let claimable = Condition::any()
                .add(configuration::Column::LockUid.eq(UNLOCKED_UID))
                .add(configuration::Column::LockUid.eq(principal));
            let changed = configuration_store::update_where(
                &self.db,
                config_id,
                ConfigurationPatch::new().lock(LockPair::held(principal, now)?),
                Some(claimable),
            )
            .await?;
            if changed > 0 {
                tracing::info!(config_id, principal, "Configuration lock acquired");
                return Ok(LockLease {
                    configuration_id: config_id,
                    holder: principal,
                    locked_at: now,
                    reclaimed_from: None,
                });
            }

            let Some(current) = configuration_store::find_by_id(&self.db, config_id).await? else {
                return Err(ConfVaultError::ConfigurationNotExist(config_id));
            };
            match next_step(&current, principal, self.stale_cutoff(now)) {
                AcquireStep::Held => {
                    // Some backends report 0 rows when nothing changed
                    return Ok(LockLease {
                        configuration_id: config_id,
                        holder: principal,
                        locked_at: current.lock_at,
                        reclaimed_from: None,
                    });
                }
                AcquireStep::Retry => {}
                AcquireStep::Reclaim { holder, since } => {
                    if self.reclaim(config_id, principal, holder, since, now).await? {
                        return Ok(LockLease {
                            configuration_id: config_id,
                            holder: principal,
                            locked_at: now,
                            reclaimed_from: Some(holder),
                        });
                    }
                }
                AcquireStep::Conflict { holder } => {
                    tracing::info!(
                        config_id,
                        principal,
                        current_holder = holder,
                        "Lock acquire rejected"
                    );
                    return Err(ConfVaultError::LockConflict {
                        config_id,
                        current_holder: holder,
                    });
                }
            }
        }

        let err = guard_failure(&self.db, config_id).await?;
        tracing::info!(
            config_id,
            principal,
            current_holder = ?err.current_holder(),
            "Lock acquire rejected after retries"
        );
        Err(err)
    }

    /// Take over the lock only if it is still exactly `holder` / `since`
    async fn reclaim(
        &self,
        config_id: i64,
        principal: i64,
        holder: i64,
        since: i64,
        now: i64,
    ) -> Result<bool> {
        let unchanged = Condition::all()
            .add(configuration::Column::LockUid.eq(holder))
            .add(configuration::Column::LockAt.eq(since));
        let changed = configuration_store::update_where(
            &self.db,
            config_id,
            ConfigurationPatch::new().lock(LockPair::held(principal, now)?),
            Some(unchanged),
        )
        .await?;

        if changed > 0 {
            tracing::warn!(
                config_id,
                principal,
                stale_holder = holder,
                "Stale configuration lock reclaimed"
            );
        }
        Ok(changed > 0)
    }

    /// Locks taken before the returned time are stale; `None` when nothing is
    fn stale_cutoff(&self, now: i64) -> Option<i64> {
        let stale_after = i64::try_from(self.stale_after?.as_secs()).ok()?;
        now.checked_sub(stale_after)
    }

    /// Release the edit lock; only the current holder may do so
    pub async fn release(&self, config_id: i64, principal: i64) -> Result<()> {
        ensure_principal(principal)?;

        let held_by_caller = Condition::all().add(configuration::Column::LockUid.eq(principal));
        let changed = configuration_store::update_where(
            &self.db,
            config_id,
            ConfigurationPatch::new().lock(LockPair::free()),
            Some(held_by_caller),
        )
        .await?;

        if changed == 0 {
            let err = guard_failure(&self.db, config_id).await?;
            tracing::info!(
                config_id,
                principal,
                current_holder = ?err.current_holder(),
                "Lock release rejected"
            );
            return Err(err);
        }

        tracing::info!(config_id, principal, "Configuration lock released");
        Ok(())
    }

    /// Current lock state, `None` when the configuration does not exist
    pub async fn state(&self, config_id: i64) -> Result<Option<LockState>> {
        Ok(configuration_store::find_by_id(&self.db, config_id)
            .await?
            .map(|m| m.lock_state()))
    }
}

/// What an acquire that lost its conditional update does next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AcquireStep {
    Held,
    Retry,
    Reclaim { holder: i64, since: i64 },
    Conflict { holder: i64 },
}

fn next_step(
    current: &configuration::Model,
    principal: i64,
    stale_cutoff: Option<i64>,
) -> AcquireStep {
    match current.lock_state() {
        LockState::Unlocked => AcquireStep::Retry,
        LockState::Locked { holder, .. } if holder == principal => AcquireStep::Held,
        LockState::Locked { holder, since } => match stale_cutoff {
            Some(cutoff) if since < cutoff => AcquireStep::Reclaim { holder, since },
            _ => AcquireStep::Conflict { holder },
        },
    }
}
