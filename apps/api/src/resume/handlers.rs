use std::collections::BTreeMap;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::MaybeUser;
use crate::errors::AppError;
use crate::normalize::{
    normalize_extracted_skills, normalize_recommendation, normalize_skill_categories,
    ExtractedSkill, NormalizedRecommendation,
};
use crate::resume::extractor::ResumeUpload;
use crate::resume::{allowed_extension, mime_for_extension, MAX_RESUME_BYTES};
use crate::state::AppState;
use crate::store::merge_skills_best_effort;

#[derive(Debug, Serialize, Deserialize)]
pub struct ResumeAnalysisResponse {
    pub extracted_info: Value,
    pub skills: Vec<ExtractedSkill>,
    pub skills_by_category: BTreeMap<String, Vec<String>>,
    pub recommendation: NormalizedRecommendation,
}

/// POST /api/resume/upload
pub async fn handle_resume_upload(
    State(state): State<AppState>,
    MaybeUser(user_id): MaybeUser,
    multipart: Multipart,
) -> Result<Json<ResumeAnalysisResponse>, AppError> {
    let (upload, extension) = read_upload(multipart).await?;
    let archived = upload.data.clone();
    let content_type = mime_for_extension(&extension);

    let payload = state.extractor.process(upload).await?;

    let skills = normalize_extracted_skills(&payload)?;
    let skills_by_category = normalize_skill_categories(&payload)?;
    let recommendation = normalize_recommendation(&payload)?;
    info!(
        "Resume processed: {} skills, {} roles",
        skills.len(),
        recommendation.recommended_roles.len()
    );

    if let Some(user_id) = user_id {
        merge_skills_best_effort(state.store.as_ref(), user_id, &skills).await;
    }
    if let Some(archive) = &state.archive {
        archive
            .store_best_effort(user_id, &extension, content_type, archived)
            .await;
    }

    Ok(Json(ResumeAnalysisResponse {
        extracted_info: payload
            .get("extracted_info")
            .filter(|v| v.is_object())
            .cloned()
            .unwrap_or_else(|| json!({})),
        skills,
        skills_by_category,
        recommendation,
    }))
}

async fn read_upload(mut multipart: Multipart) -> Result<(ResumeUpload, String), AppError> {
    let mut upload = ResumeUpload::default();
    let mut extension = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let ext = allowed_extension(&file_name).ok_or_else(|| {
                    AppError::Validation(
                        "Invalid file type. Only PDF, DOC and DOCX files are allowed".to_string(),
                    )
                })?;
                let data = field.bytes().await.map_err(multipart_error)?;
                if data.len() > MAX_RESUME_BYTES {
                    return Err(AppError::PayloadTooLarge(
                        "Resume must be 10MB or smaller".to_string(),
                    ));
                }
                upload.content_type = mime_for_extension(&ext).to_string();
                upload.file_name = file_name;
                upload.data = data;
                extension = Some(ext);
            }
            "industries" => {
                let text = field.text().await.map_err(multipart_error)?;
                upload.industries = parse_industries(&text);
            }
            "goals" => upload.goals = non_blank(field.text().await.map_err(multipart_error)?),
            "location" => upload.location = non_blank(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let extension = extension.ok_or_else(|| AppError::Validation("No resume uploaded".to_string()))?;
    Ok((upload, extension))
}

/// A JSON array of names, or a comma-separated list.
fn parse_industries(text: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Array(_)) => crate::normalize::lenient::texts(&value),
        _ => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Resume must be 10MB or smaller".to_string())
    } else {
        AppError::Validation(err.body_text())
    }
}
