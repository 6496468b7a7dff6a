use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::skill::UserSkillRow;
use crate::normalize::normalize_extracted_skills;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveSkillsResponse {
    pub added: usize,
    pub skills: Vec<UserSkillRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkillsResponse {
    pub skills: Vec<UserSkillRow>,
}

/// POST /api/skills/extract
/// Accepts any extraction payload shape and saves the skills the user lacks.
pub async fn handle_save_extracted_skills(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<Value>,
) -> Result<Json<SaveSkillsResponse>, AppError> {
    let extracted = normalize_extracted_skills(&payload)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if extracted.is_empty() {
        return Err(AppError::Validation("No skills provided".to_string()));
    }

    let added = state.store.merge_skills(user_id, &extracted).await?;
    let skills = state.store.skills(user_id).await?;
    Ok(Json(SaveSkillsResponse { added, skills }))
}

/// GET /api/skills
pub async fn handle_list_skills(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SkillsResponse>, AppError> {
    let skills = state.store.skills(user_id).await?;
    Ok(Json(SkillsResponse { skills }))
}
