//! Persistence Adapter.
//!
//! Recommendation writes are best-effort: callers go through
//! [`record_best_effort`], which logs and swallows every failure so an
//! already computed response is never downgraded by the database.

pub mod archive;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::recommendation::{NewRecommendationRecord, RecommendationRecord, RecordKind};
use crate::models::skill::UserSkillRow;
use crate::normalize::ExtractedSkill;

pub use archive::ResumeArchive;
pub use postgres::PgRecommendationStore;

/// Page size cap of every history query.
pub const HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn insert_recommendation(
        &self,
        record: NewRecommendationRecord,
    ) -> Result<RecommendationRecord, StoreError>;

    /// Records owned by `user_id`, newest first, at most `limit`.
    async fn recommendation_history(
        &self,
        user_id: Uuid,
        kind: RecordKind,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, StoreError>;

    /// Inserts the skills the user does not have yet, compared
    /// case-insensitively. Returns how many were added.
    async fn merge_skills(
        &self,
        user_id: Uuid,
        skills: &[ExtractedSkill],
    ) -> Result<usize, StoreError>;

    async fn skills(&self, user_id: Uuid) -> Result<Vec<UserSkillRow>, StoreError>;
}

/// Writes a recommendation record; failures are logged and dropped.
pub async fn record_best_effort(store: &dyn RecommendationStore, record: NewRecommendationRecord) {
    let kind = record.kind;
    match store.insert_recommendation(record).await {
        Ok(saved) => info!(
            "Saved {} recommendation {} for user {:?}",
            kind.as_str(),
            saved.id,
            saved.user_id
        ),
        Err(e) => warn!("Failed to save {} recommendation: {e}", kind.as_str()),
    }
}

/// Merges extracted skills into the user's profile; failures are logged and dropped.
pub async fn merge_skills_best_effort(
    store: &dyn RecommendationStore,
    user_id: Uuid,
    skills: &[ExtractedSkill],
) -> usize {
    match store.merge_skills(user_id, skills).await {
        Ok(added) => {
            info!("Merged {added} new skills for user {user_id}");
            added
        }
        Err(e) => {
            warn!("Failed to merge skills for user {user_id}: {e}");
            0
        }
    }
}
