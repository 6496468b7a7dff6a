pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::recommendations::handlers as recommendations;
use crate::resume::{handlers as resume, MAX_RESUME_BYTES};
use crate::skills::handlers as skills;
use crate::state::AppState;

/// Multipart framing and text fields on top of the file itself.
const UPLOAD_BODY_LIMIT: usize = MAX_RESUME_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // YouTube recommendations
        .route(
            "/api/youtube/recommendations",
            post(recommendations::handle_youtube_recommendations),
        )
        .route(
            "/api/youtube",
            post(recommendations::handle_youtube_recommendations),
        )
        .route(
            "/api/youtube/history",
            get(recommendations::handle_youtube_history),
        )
        // Timeline and career plan
        .route(
            "/api/timeline/generate-timeline",
            post(recommendations::handle_generate_timeline),
        )
        .route(
            "/api/timeline/generate-plan",
            post(recommendations::handle_generate_plan),
        )
        .route(
            "/api/timeline/history",
            get(recommendations::handle_timeline_history),
        )
        // Resume upload
        .route(
            "/api/resume/upload",
            post(resume::handle_resume_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        // Analysis of stored skills
        .route(
            "/api/ai/analyze-existing",
            post(analysis::handle_analyze_existing),
        )
        // Skills
        .route("/api/skills", get(skills::handle_list_skills))
        .route(
            "/api/skills/extract",
            post(skills::handle_save_extracted_skills),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::{get, TestApp};

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::default();
        let (status, body) = app.send(get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["resume_service"], "reachable");
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_resume_service() {
        let app = TestApp::default();
        app.extractor.go_down();
        let (status, body) = app.send(get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["resume_service"], "unreachable");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = TestApp::default();
        let (status, _) = app.send(get("/api/nope", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
