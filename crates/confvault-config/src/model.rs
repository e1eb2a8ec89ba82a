//! Service-level request and result types

use serde::{Deserialize, Serialize};

use confvault_persistence::entity::{configuration_history, configuration_publish};

/// A content edit submitted by the lock holder
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChange {
    pub content: String,
    pub version: String,
    #[serde(default)]
    pub change_log: String,
    /// Replaces the format tag when set
    #[serde(default)]
    pub format: Option<String>,
}

impl ContentChange {
    pub fn new(content: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_change_log(mut self, change_log: impl Into<String>) -> Self {
        self.change_log = change_log.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Result of a successful lock acquisition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockLease {
    pub configuration_id: i64,
    pub holder: i64,
    pub locked_at: i64,
    /// Previous holder when a stale lock was taken over
    pub reclaimed_from: Option<i64>,
}

/// The live snapshot of a configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedSnapshot {
    pub publish: configuration_publish::Model,
    pub history: Option<configuration_history::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_change_builder() {
        let change = ContentChange::new("a:2", "v1")
            .with_change_log("bump a")
            .with_format("json");
        assert_eq!(change.content, "a:2");
        assert_eq!(change.version, "v1");
        assert_eq!(change.change_log, "bump a");
        assert_eq!(change.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_content_change_deserialize_defaults() {
        let change: ContentChange =
            serde_json::from_str(r#"{"content":"a:1","version":"v1"}"#).unwrap();
        assert_eq!(change, ContentChange::new("a:1", "v1"));
    }
}
