use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Which endpoint produced a persisted recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Youtube,
    Timeline,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Youtube => "youtube",
            RecordKind::Timeline => "timeline",
        }
    }
}

/// A persisted recommendation. Insert-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RecommendationRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub kind: String,
    pub current_skills: Vec<String>,
    pub target_job: String,
    pub timeframe_months: i32,
    pub additional_context: Value,
    /// Normalized recommendation document.
    pub recommendation: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecommendationRecord {
    pub user_id: Option<Uuid>,
    pub kind: RecordKind,
    pub current_skills: Vec<String>,
    pub target_job: String,
    pub timeframe_months: i32,
    pub additional_context: Value,
    pub recommendation: Value,
}
