//! Domain model types for the persistence layer
//!
//! Inputs to the stores (`NewConfiguration`, `ConfigurationPatch`, ...) and
//! the paginated result wrapper.

use serde::{Deserialize, Serialize};

use confvault_common::{
    ConfVaultError, DEFAULT_PAGE_NO, DEFAULT_PAGE_SIZE, Result, UNLOCKED_UID, UNSET_TIMESTAMP,
};

/// Generic paginated result
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_count: u64,
    pub page_number: u64,
    pub pages_available: u64,
    pub page_items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total_count: u64, page_number: u64, page_size: u64, page_items: Vec<T>) -> Self {
        Self {
            total_count,
            page_number,
            pages_available: if page_size > 0 {
                total_count.div_ceil(page_size)
            } else {
                0
            },
            page_items,
        }
    }
}

/// Page selection; zero values fall back to page 1 and 10 rows per page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default)]
    pub page_no: u64,
    #[serde(default)]
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page_no: u64, page_size: u64) -> Self {
        Self { page_no, page_size }
    }

    pub fn normalize(self) -> Self {
        Self {
            page_no: if self.page_no == 0 {
                DEFAULT_PAGE_NO
            } else {
                self.page_no
            },
            page_size: if self.page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                self.page_size
            },
        }
    }

    /// Row offset of the first item; call on a normalized request
    pub fn offset(&self) -> u64 {
        self.page_no.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Lock status of a configuration as seen by readers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LockState {
    Unlocked,
    Locked { holder: i64, since: i64 },
}

impl LockState {
    pub fn holder(&self) -> i64 {
        match self {
            LockState::Unlocked => UNLOCKED_UID,
            LockState::Locked { holder, .. } => *holder,
        }
    }
}

/// The `lock_uid` / `lock_at` pair, always written together.
///
/// Either both columns are zero or both are set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockPair {
    uid: i64,
    at: i64,
}

impl LockPair {
    pub fn free() -> Self {
        Self {
            uid: UNLOCKED_UID,
            at: UNSET_TIMESTAMP,
        }
    }

    pub fn held(uid: i64, at: i64) -> Result<Self> {
        if uid == UNLOCKED_UID {
            return Err(ConfVaultError::IllegalArgument(format!(
                "lock holder uid must not be {UNLOCKED_UID}"
            )));
        }
        if at == UNSET_TIMESTAMP {
            return Err(ConfVaultError::IllegalArgument(format!(
                "lock timestamp must not be {UNSET_TIMESTAMP}"
            )));
        }
        Ok(Self { uid, at })
    }

    pub fn uid(&self) -> i64 {
        self.uid
    }

    pub fn at(&self) -> i64 {
        self.at
    }

    pub fn is_free(&self) -> bool {
        self.uid == UNLOCKED_UID
    }
}

/// Input for `ConfigurationStore::create`; new rows start unlocked and unpublished
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConfiguration {
    #[serde(default)]
    pub external_resource_id: i64,
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub format: String,
    #[serde(default)]
    pub version: String,
    pub uid: i64,
}

/// Partial update of a configuration row; unset fields are left alone
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigurationPatch {
    pub external_resource_id: Option<i64>,
    pub name: Option<String>,
    pub content: Option<String>,
    pub format: Option<String>,
    pub version: Option<String>,
    pub publish_time: Option<i64>,
    pub lock: Option<LockPair>,
}

impl ConfigurationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn external_resource_id(mut self, id: i64) -> Self {
        self.external_resource_id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn publish_time(mut self, publish_time: i64) -> Self {
        self.publish_time = Some(publish_time);
        self
    }

    pub fn lock(mut self, lock: LockPair) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Input for `HistoryLog::append`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistory {
    pub uid: i64,
    pub configuration_id: i64,
    pub change_log: String,
    pub content: String,
    pub version: String,
}

/// Input for `PublishStore::insert`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPublish {
    pub uid: i64,
    pub configuration_id: i64,
    pub configuration_history_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_page_request_defaults() {
        let page = PageRequest::new(0, 0).normalize();
        assert_eq!(page, PageRequest::new(1, 10));
        assert_eq!(page.offset(), 0);

        let page = PageRequest::new(3, 0).normalize();
        assert_eq!(page, PageRequest::new(3, 10));
        assert_eq!(page.offset(), 20);
    }

    #[test]
    fn test_page_pages_available() {
        let page: Page<i64> = Page::new(21, 1, 10, vec![]);
        assert_eq!(page.pages_available, 3);

        let page: Page<i64> = Page::new(0, 1, 10, vec![]);
        assert_eq!(page.pages_available, 0);
    }

    #[test]
    fn test_lock_pair_invariant() {
        assert!(LockPair::free().is_free());
        assert_eq!(LockPair::free().at(), 0);
        assert!(LockPair::held(0, 100).is_err());
        assert!(LockPair::held(1, 0).is_err());

        let pair = LockPair::held(1, 100).unwrap();
        assert_eq!((pair.uid(), pair.at()), (1, 100));
        assert!(!pair.is_free());
    }

    #[test]
    fn test_lock_state_holder() {
        assert_eq!(LockState::Unlocked.holder(), 0);
        assert_eq!(LockState::Locked { holder: 4, since: 9 }.holder(), 4);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ConfigurationPatch::new().is_empty());
        assert!(!ConfigurationPatch::new().content("a:1").is_empty());
        assert!(!ConfigurationPatch::new().lock(LockPair::free()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalize_never_zero(page_no in 0u64..1000, page_size in 0u64..1000) {
            let page = PageRequest::new(page_no, page_size).normalize();
            prop_assert!(page.page_no >= 1);
            prop_assert!(page.page_size >= 1);
            if page_no != 0 {
                prop_assert_eq!(page.page_no, page_no);
            }
            if page_size != 0 {
                prop_assert_eq!(page.page_size, page_size);
            }
            prop_assert_eq!(page.offset(), (page.page_no - 1) * page.page_size);
        }
    }
}
