use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RecommendationStore, StoreError};
use crate::models::recommendation::{NewRecommendationRecord, RecommendationRecord, RecordKind};
use crate::models::skill::UserSkillRow;
use crate::normalize::ExtractedSkill;

#[derive(Debug, Clone)]
pub struct PgRecommendationStore {
    pool: PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn insert_recommendation(
        &self,
        record: NewRecommendationRecord,
    ) -> Result<RecommendationRecord, StoreError> {
        Ok(sqlx::query_as::<_, RecommendationRecord>(
            r#"
            INSERT INTO recommendation_records
                (id, user_id, kind, current_skills, target_job, timeframe_months,
                 additional_context, recommendation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.user_id)
        .bind(record.kind.as_str())
        .bind(&record.current_skills)
        .bind(&record.target_job)
        .bind(record.timeframe_months)
        .bind(&record.additional_context)
        .bind(&record.recommendation)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn recommendation_history(
        &self,
        user_id: Uuid,
        kind: RecordKind,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, StoreError> {
        Ok(sqlx::query_as::<_, RecommendationRecord>(
            r#"
            SELECT * FROM recommendation_records
            WHERE user_id = $1 AND kind = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn merge_skills(
        &self,
        user_id: Uuid,
        skills: &[ExtractedSkill],
    ) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut added = 0;
        for skill in skills {
            let result = sqlx::query(
                r#"
                INSERT INTO user_skills (id, user_id, name, kind, level)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (user_id, (lower(name))) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&skill.name)
            .bind(skill.kind.as_str())
            .bind(&skill.level)
            .execute(&mut *tx)
            .await?;
            added += result.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(added)
    }

    async fn skills(&self, user_id: Uuid) -> Result<Vec<UserSkillRow>, StoreError> {
        Ok(sqlx::query_as::<_, UserSkillRow>(
            "SELECT * FROM user_skills WHERE user_id = $1 ORDER BY created_at, name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
