use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

pub const DEFAULT_LOG_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub customer_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_text: String,
    pub bot_text: String,
}

impl LogEntry {
    pub fn now(customer_id: &str, user_text: &str, bot_text: &str) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            timestamp: Utc::now(),
            user_text: user_text.to_string(),
            bot_text: bot_text.to_string(),
        }
    }
}

/// Completed chat exchanges, oldest evicted first once `capacity` is reached.
pub struct ConversationLog {
    entries: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl ConversationLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub async fn record(&self, entry: LogEntry) {
        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Newest first, at most `limit` entries.
    pub async fn recent(&self, limit: usize) -> Vec<LogEntry> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
