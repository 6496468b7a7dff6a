//! In-memory fakes of the service seams and request helpers for router tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::JwtKeys;
use crate::invoker::{AnalysisMode, AnalysisRequest, AnalysisRunner, InvokeError};
use crate::models::recommendation::{NewRecommendationRecord, RecommendationRecord, RecordKind};
use crate::models::skill::UserSkillRow;
use crate::normalize::ExtractedSkill;
use crate::resume::extractor::{
    CareerAnalysisRequest, ExtractError, ResumeExtractor, ResumeUpload,
};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{RecommendationStore, StoreError};

const SECRET: &[u8] = b"test-secret";

pub struct FakeRunner {
    output: Result<Value, String>,
    calls: AtomicUsize,
    last_mode: Mutex<Option<AnalysisMode>>,
}

impl FakeRunner {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_mode(&self) -> Option<AnalysisMode> {
        *self.last_mode.lock().unwrap()
    }

    fn respond(&self) -> Result<Value, InvokeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.output
            .clone()
            .map_err(|message| InvokeError::ExternalProcess {
                message,
                exit_code: Some(1),
            })
    }
}

#[async_trait]
impl AnalysisRunner for FakeRunner {
    async fn analyze(
        &self,
        _request: &AnalysisRequest,
        mode: AnalysisMode,
    ) -> Result<Value, InvokeError> {
        *self.last_mode.lock().unwrap() = Some(mode);
        self.respond()
    }

    async fn plan(&self, _request: &AnalysisRequest) -> Result<Value, InvokeError> {
        self.respond()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<RecommendationRecord>>,
    skills: Mutex<Vec<UserSkillRow>>,
    fail: AtomicBool,
}

impl MemoryStore {
    /// Every later write fails with a database error.
    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<RecommendationRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn skill_names(&self, user_id: Uuid) -> Vec<String> {
        self.skills
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.name.clone())
            .collect()
    }

    /// Inserts `count` records a minute apart, in shuffled order.
    pub fn seed(&self, user_id: Uuid, kind: RecordKind, count: usize) {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut records = self.records.lock().unwrap();
        let odd = (0..count).filter(|i| i % 2 == 1);
        let even = (0..count).filter(|i| i % 2 == 0);
        for i in odd.chain(even) {
            records.push(RecommendationRecord {
                id: Uuid::new_v4(),
                user_id: Some(user_id),
                kind: kind.as_str().to_string(),
                current_skills: vec!["Python".to_string()],
                target_job: format!("job {i}"),
                timeframe_months: 6,
                additional_context: json!({}),
                recommendation: json!({}),
                created_at: base + chrono::Duration::minutes(i as i64),
            });
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecommendationStore for MemoryStore {
    async fn insert_recommendation(
        &self,
        record: NewRecommendationRecord,
    ) -> Result<RecommendationRecord, StoreError> {
        self.check()?;
        let saved = RecommendationRecord {
            id: Uuid::new_v4(),
            user_id: record.user_id,
            kind: record.kind.as_str().to_string(),
            current_skills: record.current_skills,
            target_job: record.target_job,
            timeframe_months: record.timeframe_months,
            additional_context: record.additional_context,
            recommendation: record.recommendation,
            created_at: Utc::now(),
        };
        self.records.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    async fn recommendation_history(
        &self,
        user_id: Uuid,
        kind: RecordKind,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, StoreError> {
        let mut records: Vec<_> = self
            .records()
            .into_iter()
            .filter(|r| r.user_id == Some(user_id) && r.kind == kind.as_str())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(records)
    }

    async fn merge_skills(
        &self,
        user_id: Uuid,
        skills: &[ExtractedSkill],
    ) -> Result<usize, StoreError> {
        self.check()?;
        let mut rows = self.skills.lock().unwrap();
        let mut added = 0;
        for skill in skills {
            let exists = rows
                .iter()
                .any(|r| r.user_id == user_id && r.name.eq_ignore_ascii_case(&skill.name));
            if !exists {
                rows.push(UserSkillRow {
                    id: Uuid::new_v4(),
                    user_id,
                    name: skill.name.clone(),
                    kind: skill.kind.as_str().to_string(),
                    level: skill.level.clone(),
                    verified: false,
                    created_at: Utc::now(),
                });
                added += 1;
            }
        }
        Ok(added)
    }

    async fn skills(&self, user_id: Uuid) -> Result<Vec<UserSkillRow>, StoreError> {
        Ok(self
            .skills
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}

pub struct FakeExtractor {
    response: Result<Value, (u16, String)>,
    last_upload: Mutex<Option<ResumeUpload>>,
    last_analysis: Mutex<Option<CareerAnalysisRequest>>,
    down: AtomicBool,
}

impl FakeExtractor {
    pub fn last_upload(&self) -> Option<ResumeUpload> {
        self.last_upload.lock().unwrap().clone()
    }

    pub fn last_analysis(&self) -> Option<CareerAnalysisRequest> {
        self.last_analysis.lock().unwrap().clone()
    }

    /// The service stops answering.
    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    fn respond(&self) -> Result<Value, ExtractError> {
        self.response
            .clone()
            .map_err(|(status, body)| ExtractError::Status { status, body })
    }
}

#[async_trait]
impl ResumeExtractor for FakeExtractor {
    async fn process(&self, upload: ResumeUpload) -> Result<Value, ExtractError> {
        *self.last_upload.lock().unwrap() = Some(upload);
        self.respond()
    }

    async fn career_recommendations(
        &self,
        request: &CareerAnalysisRequest,
    ) -> Result<Value, ExtractError> {
        *self.last_analysis.lock().unwrap() = Some(request.clone());
        self.respond()
    }

    async fn reachable(&self) -> bool {
        !self.down.load(Ordering::SeqCst)
    }
}

pub struct TestApp {
    pub router: Router,
    pub runner: Arc<FakeRunner>,
    pub store: Arc<MemoryStore>,
    pub extractor: Arc<FakeExtractor>,
    keys: JwtKeys,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::build(Ok(json!({})), Ok(json!({})))
    }
}

impl TestApp {
    pub fn with_output(output: Value) -> Self {
        Self::build(Ok(output), Ok(json!({})))
    }

    pub fn with_process_error(message: &str) -> Self {
        Self::build(Err(message.to_string()), Ok(json!({})))
    }

    pub fn with_extraction(payload: Value) -> Self {
        Self::build(Ok(json!({})), Ok(payload))
    }

    pub fn with_extraction_failure(status: u16, body: &str) -> Self {
        Self::build(Ok(json!({})), Err((status, body.to_string())))
    }

    fn build(output: Result<Value, String>, extraction: Result<Value, (u16, String)>) -> Self {
        let runner = Arc::new(FakeRunner {
            output,
            calls: AtomicUsize::new(0),
            last_mode: Mutex::new(None),
        });
        let store = Arc::new(MemoryStore::default());
        let extractor = Arc::new(FakeExtractor {
            response: extraction,
            last_upload: Mutex::new(None),
            last_analysis: Mutex::new(None),
            down: AtomicBool::new(false),
        });
        let keys = JwtKeys::new(SECRET);
        let state = AppState {
            runner: runner.clone(),
            store: store.clone(),
            extractor: extractor.clone(),
            archive: None,
            auth: keys.clone(),
        };
        Self {
            router: build_router(state),
            runner,
            store,
            extractor,
            keys,
        }
    }

    pub fn token(&self, user_id: Uuid) -> String {
        self.keys.issue(user_id, chrono::Duration::hours(1)).unwrap()
    }

    /// Sends one request; an empty or non-JSON body comes back as `Null`.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub struct UploadPart {
    name: String,
    file_name: Option<String>,
    data: Vec<u8>,
}

impl UploadPart {
    pub fn file(name: &str, file_name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            file_name: Some(file_name.to_string()),
            data,
        }
    }

    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            file_name: None,
            data: value.as_bytes().to_vec(),
        }
    }
}

pub fn multipart(uri: &str, parts: Vec<UploadPart>, token: Option<&str>) -> Request<Body> {
    const BOUNDARY: &str = "careernav-test-boundary";
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match &part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body)).unwrap()
}
