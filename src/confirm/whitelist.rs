//! Session whitelist of pre-approved operations

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Session whitelist snapshot for display
#[derive(Debug, Clone, Serialize)]
pub struct WhitelistStatus {
    /// Number of whitelisted operations
    pub whitelisted_count: usize,
    /// Human-readable labels of the whitelisted operations
    pub operations: Vec<String>,
}

/// Process-lifetime memory of operations a human has approved for
/// unattended reuse.
///
/// Membership is keyed by an opaque hash of `(tool_name, operation_key)`;
/// entries carry no payload and are never expired by time. The whitelist
/// is emptied only by [`clear`](Self::clear) or process exit.
#[derive(Default)]
pub struct SessionWhitelist {
    /// Entry hash → display label
    entries: RwLock<HashMap<String, String>>,
}

impl SessionWhitelist {
    /// Create an empty whitelist
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the operation has already been approved this session
    pub async fn is_whitelisted(&self, tool_name: &str, operation_key: &str) -> bool {
        let hash = entry_hash(tool_name, operation_key);
        self.entries.read().await.contains_key(&hash)
    }

    /// Remember an approved operation for the rest of the session
    pub async fn add(&self, tool_name: &str, operation_key: &str, label: impl Into<String>) {
        let hash = entry_hash(tool_name, operation_key);
        let label = label.into();
        tracing::info!(tool = tool_name, operation = operation_key, "Whitelisted for session");
        self.entries.write().await.insert(hash, label);
    }

    /// Forget every whitelisted operation
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        tracing::info!(cleared = count, "Session whitelist cleared");
    }

    /// Snapshot of the current whitelist for display
    pub async fn status(&self) -> WhitelistStatus {
        let entries = self.entries.read().await;
        let mut operations: Vec<String> = entries.values().cloned().collect();
        operations.sort();
        WhitelistStatus {
            whitelisted_count: entries.len(),
            operations,
        }
    }
}

/// Opaque membership key: `sha256(tool_name + ":" + operation_key)`
/// truncated to 16 hex chars.
fn entry_hash(tool_name: &str, operation_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tool_name.as_bytes());
    hasher.update(b":");
    hasher.update(operation_key.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_lookup() {
        let whitelist = SessionWhitelist::new();
        assert!(!whitelist.is_whitelisted("console", "killall").await);

        whitelist.add("console", "killall", "console: killall").await;
        assert!(whitelist.is_whitelisted("console", "killall").await);
        assert!(!whitelist.is_whitelisted("console", "slomo").await);
    }

    #[tokio::test]
    async fn test_key_includes_tool_name() {
        let whitelist = SessionWhitelist::new();
        whitelist.add("console", "slomo", "console: slomo").await;
        assert!(!whitelist.is_whitelisted("editor", "slomo").await);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let whitelist = SessionWhitelist::new();
        whitelist.add("console", "killall", "console: killall").await;
        whitelist.add("console", "slomo", "console: slomo").await;

        whitelist.clear().await;
        assert!(!whitelist.is_whitelisted("console", "killall").await);
        assert!(!whitelist.is_whitelisted("console", "slomo").await);
        assert_eq!(whitelist.status().await.whitelisted_count, 0);
    }

    #[tokio::test]
    async fn test_status_labels_sorted() {
        let whitelist = SessionWhitelist::new();
        whitelist.add("console", "slomo", "console: slomo").await;
        whitelist.add("console", "destroyall", "console: destroyall").await;

        let status = whitelist.status().await;
        assert_eq!(status.whitelisted_count, 2);
        assert_eq!(status.operations[0], "console: destroyall");
    }

    #[test]
    fn test_entry_hash_shape() {
        let hash = entry_hash("console", "killall");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
