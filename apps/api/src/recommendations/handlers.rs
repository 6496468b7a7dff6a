use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::auth::{AuthUser, MaybeUser};
use crate::errors::AppError;
use crate::invoker::{AnalysisMode, AnalysisRequest};
use crate::models::recommendation::{NewRecommendationRecord, RecommendationRecord, RecordKind};
use crate::normalize::normalize_recommendation;
use crate::recommendations::validation::{AnalysisRequestBody, LenientJson};
use crate::state::AppState;
use crate::store::{record_best_effort, HISTORY_LIMIT};

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub records: Vec<RecommendationRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: Value,
    pub mermaid_code: Value,
    pub full_response: Value,
}

/// POST /api/youtube/recommendations
/// POST /api/youtube
pub async fn handle_youtube_recommendations(
    State(state): State<AppState>,
    MaybeUser(user_id): MaybeUser,
    LenientJson(body): LenientJson<AnalysisRequestBody>,
) -> Result<Json<Value>, AppError> {
    let request = body.validate()?;
    analyze_and_record(&state, user_id, request, AnalysisMode::Youtube, RecordKind::Youtube)
        .await
        .map(Json)
}

/// GET /api/youtube/history
pub async fn handle_youtube_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<HistoryResponse>, AppError> {
    history(&state, user_id, RecordKind::Youtube).await
}

/// POST /api/timeline/generate-timeline
pub async fn handle_generate_timeline(
    State(state): State<AppState>,
    MaybeUser(user_id): MaybeUser,
    LenientJson(body): LenientJson<AnalysisRequestBody>,
) -> Result<Json<Value>, AppError> {
    let request = body.validate()?;
    analyze_and_record(&state, user_id, request, AnalysisMode::Timeline, RecordKind::Timeline)
        .await
        .map(Json)
}

/// GET /api/timeline/history
pub async fn handle_timeline_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<HistoryResponse>, AppError> {
    history(&state, user_id, RecordKind::Timeline).await
}

/// POST /api/timeline/generate-plan
pub async fn handle_generate_plan(
    State(state): State<AppState>,
    LenientJson(body): LenientJson<AnalysisRequestBody>,
) -> Result<Json<PlanResponse>, AppError> {
    let request = body.validate()?;
    let output = state.runner.plan(&request).await?;

    if let Some(err) = output.get("error").filter(|e| !e.is_null()) {
        return Err(AppError::ExternalProcess(format!("plan script reported: {err}")));
    }

    let field = |key: &str| output.get(key).filter(|v| !is_blank(v)).cloned();
    match (field("plan"), field("mermaid_code")) {
        (Some(plan), Some(mermaid_code)) => Ok(Json(PlanResponse {
            plan,
            mermaid_code,
            full_response: output,
        })),
        _ => Err(AppError::MalformedResponse(format!(
            "plan output lacks plan or mermaid_code: {output}"
        ))),
    }
}

/// Null, empty strings and empty containers count as absent.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Runs the analysis, records the normalized form and hands back the
/// script output untouched. The write is awaited but cannot fail the call.
async fn analyze_and_record(
    state: &AppState,
    user_id: Option<uuid::Uuid>,
    request: AnalysisRequest,
    mode: AnalysisMode,
    kind: RecordKind,
) -> Result<Value, AppError> {
    info!(
        "Generating {} recommendations for '{}' over {} months",
        mode.as_arg(),
        request.target_job,
        request.timeframe_months
    );

    let output = state.runner.analyze(&request, mode).await?;
    let normalized = normalize_recommendation(&output)?;

    let record = NewRecommendationRecord {
        user_id,
        kind,
        current_skills: request.current_skills,
        target_job: request.target_job,
        timeframe_months: i32::try_from(request.timeframe_months).unwrap_or(i32::MAX),
        additional_context: request
            .additional_context
            .map(Value::Object)
            .unwrap_or_else(|| Value::Object(Default::default())),
        recommendation: serde_json::to_value(&normalized).unwrap_or_default(),
    };
    record_best_effort(state.store.as_ref(), record).await;

    Ok(output)
}

async fn history(
    state: &AppState,
    user_id: uuid::Uuid,
    kind: RecordKind,
) -> Result<Json<HistoryResponse>, AppError> {
    let records = state
        .store
        .recommendation_history(user_id, kind, HISTORY_LIMIT)
        .await?;
    Ok(Json(HistoryResponse { records }))
}
