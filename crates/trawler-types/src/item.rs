//! Per-URL extraction items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Extracted,
    Indexed,
    Failed,
}

/// One extracted unit per URL within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Record ID, normally the URL fingerprint.
    pub id: String,
    pub job_id: String,
    pub url: String,
    /// Serialized content payload as delivered to the indexer.
    pub content: String,
    pub state: ItemState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        job_id: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
        state: ItemState,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            job_id: job_id.into(),
            url: url.into(),
            content: content.into(),
            state,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a state change.
    pub fn set_state(&mut self, state: ItemState) {
        self.state = state;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_change_touches_updated_at() {
        let mut item = Item::new("fp", "job", "https://a.test/x", "{}", ItemState::Extracted);
        let before = item.updated_at;
        item.set_state(ItemState::Indexed);
        assert_eq!(item.state, ItemState::Indexed);
        assert!(item.updated_at >= before);
    }
}
