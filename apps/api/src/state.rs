use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::invoker::AnalysisRunner;
use crate::resume::extractor::ResumeExtractor;
use crate::store::{RecommendationStore, ResumeArchive};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Runs the analysis scripts. Default: ProcessInvoker.
    pub runner: Arc<dyn AnalysisRunner>,
    pub store: Arc<dyn RecommendationStore>,
    /// Client of the resume extraction service.
    pub extractor: Arc<dyn ResumeExtractor>,
    /// Resume archive; disabled unless S3 is configured.
    pub archive: Option<ResumeArchive>,
    pub auth: JwtKeys,
}
