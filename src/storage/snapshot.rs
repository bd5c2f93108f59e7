use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::draft::OrderDraft;

/// Draft as written to storage, tagged with the build that wrote it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoredDraft {
    pub snapshot_id: Uuid,
    pub build_id: String,
    pub saved_at: DateTime<Utc>,
    pub draft: OrderDraft,
}

impl StoredDraft {
    pub fn new(build_id: impl Into<String>, draft: OrderDraft) -> Self {
        Self {
            snapshot_id: Uuid::now_v7(),
            build_id: build_id.into(),
            saved_at: Utc::now(),
            draft,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
