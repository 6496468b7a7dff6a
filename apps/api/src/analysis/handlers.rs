use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::skill::UserSkillRow;
use crate::normalize::{lenient, normalize_recommendation, NormalizedRecommendation, SkillKind};
use crate::recommendations::validation::LenientJson;
use crate::resume::extractor::{CareerAnalysisRequest, CareerPreferences, SkillsByCategory};
use crate::state::AppState;

const DEFAULT_EXPERIENCE_LEVEL: &str = "intermediate";

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeExistingBody {
    #[serde(default, deserialize_with = "lenient::string")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub goals: Option<String>,
    #[serde(default, alias = "experienceLevel", deserialize_with = "lenient::string")]
    pub experience_level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeExistingResponse {
    pub message: String,
    /// Service payload as received.
    pub analysis: Value,
    pub recommendation: NormalizedRecommendation,
    pub user_skills: SkillsByCategory,
    pub preferences: CareerPreferences,
}

/// POST /api/ai/analyze-existing
pub async fn handle_analyze_existing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    LenientJson(body): LenientJson<AnalyzeExistingBody>,
) -> Result<Json<AnalyzeExistingResponse>, AppError> {
    let (Some(industry), Some(goals)) = (body.industry, body.goals) else {
        return Err(AppError::Validation(
            "Industry and goals are required".to_string(),
        ));
    };
    let experience_level = body
        .experience_level
        .unwrap_or_else(|| DEFAULT_EXPERIENCE_LEVEL.to_string());

    let user_skills = group_by_kind(&state.store.skills(user_id).await?);
    let preferences = CareerPreferences {
        industry,
        goals,
        experience_level: experience_level.clone(),
    };
    info!(
        "Analyzing {} stored skills for user {user_id} ({})",
        user_skills.technical.len() + user_skills.soft.len(),
        preferences.industry
    );

    let analysis = state
        .extractor
        .career_recommendations(&CareerAnalysisRequest {
            skills_by_category: user_skills.clone(),
            preferences: preferences.clone(),
            experience_level,
        })
        .await?;
    let recommendation = normalize_recommendation(&analysis)?;

    Ok(Json(AnalyzeExistingResponse {
        message: "Career analysis completed successfully".to_string(),
        analysis,
        recommendation,
        user_skills,
        preferences,
    }))
}

fn group_by_kind(rows: &[UserSkillRow]) -> SkillsByCategory {
    let mut grouped = SkillsByCategory::default();
    for row in rows {
        match SkillKind::from_label(&row.kind) {
            SkillKind::Soft => grouped.soft.push(row.name.clone()),
            SkillKind::Technical => grouped.technical.push(row.name.clone()),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::normalize::{ExtractedSkill, SkillKind};
    use crate::store::RecommendationStore;
    use crate::test_support::{post_json, TestApp};

    const ROUTE: &str = "/api/ai/analyze-existing";

    fn service_payload() -> serde_json::Value {
        json!({
            "analysis": {
                "recommendations": {
                    "recommended_roles": [{"title": "Data Analyst", "match_percentage": 85}],
                    "next_steps": ["Learn SQL window functions"]
                },
                "skill_gaps": [{"skill": "Tableau", "importance": "High"}]
            }
        })
    }

    #[tokio::test]
    async fn test_requires_auth() {
        let app = TestApp::with_extraction(service_payload());
        let (status, _) = app
            .send(post_json(ROUTE, json!({"industry": "Finance", "goals": "Lead"}), None))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_industry_or_goals_is_400() {
        let app = TestApp::with_extraction(service_payload());
        let token = app.token(uuid::Uuid::new_v4());
        for body in [json!({"industry": "Finance"}), json!({"goals": " "}), json!(null)] {
            let (status, body) = app.send(post_json(ROUTE, body, Some(&token))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Industry and goals are required");
        }
        assert!(app.extractor.last_analysis().is_none());
    }

    #[tokio::test]
    async fn test_stored_skills_flow_through_to_normalized_analysis() {
        let app = TestApp::with_extraction(service_payload());
        let user = uuid::Uuid::new_v4();
        app.store
            .merge_skills(
                user,
                &[
                    ExtractedSkill::new("SQL", SkillKind::Technical),
                    ExtractedSkill::new("Mentoring", SkillKind::Soft),
                ],
            )
            .await
            .unwrap();

        let (status, body) = app
            .send(post_json(
                ROUTE,
                json!({"industry": "Finance", "goals": "Lead a data team"}),
                Some(&app.token(user)),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"], service_payload());
        assert_eq!(body["recommendation"]["recommended_roles"][0]["title"], "Data Analyst");
        assert_eq!(body["recommendation"]["skill_gaps"][0]["skill"], "Tableau");
        assert_eq!(body["user_skills"], json!({"technical": ["SQL"], "soft": ["Mentoring"]}));
        assert_eq!(body["preferences"]["experienceLevel"], "intermediate");

        let sent = app.extractor.last_analysis().unwrap();
        assert_eq!(sent.skills_by_category.soft, vec!["Mentoring"]);
        assert_eq!(sent.preferences.industry, "Finance");
        assert_eq!(sent.experience_level, "intermediate");
    }

    #[tokio::test]
    async fn test_experience_level_is_forwarded() {
        let app = TestApp::with_extraction(service_payload());
        let token = app.token(uuid::Uuid::new_v4());
        let (status, _) = app
            .send(post_json(
                ROUTE,
                json!({"industry": "Health", "goals": "Switch", "experienceLevel": "senior"}),
                Some(&token),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.extractor.last_analysis().unwrap().experience_level, "senior");
    }

    #[tokio::test]
    async fn test_service_failure_is_502() {
        let app = TestApp::with_extraction_failure(503, "model offline");
        let token = app.token(uuid::Uuid::new_v4());
        let (status, body) = app
            .send(post_json(ROUTE, json!({"industry": "Finance", "goals": "Lead"}), Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body["error"].as_str().unwrap().contains("model offline"));
    }
}
