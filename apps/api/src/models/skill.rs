use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserSkillRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// `technical` or `soft`.
    pub kind: String,
    pub level: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}
