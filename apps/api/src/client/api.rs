use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use super::flow::ResumeFile;
use crate::invoker::AnalysisRequest;
use crate::models::recommendation::RecommendationRecord;
use crate::normalize::{normalize_recommendation, ExtractedSkill, NormalizeError, NormalizedRecommendation};
use crate::recommendations::handlers::HistoryResponse;
use crate::resume::handlers::ResumeAnalysisResponse;
use crate::skills::handlers::SaveSkillsResponse;

/// Deadline applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,

    #[error("could not reach server: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("sign in required")]
    Unauthenticated,

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[derive(Debug, Clone)]
pub struct CareerNavClient {
    http: reqwest::Client,
    base_url: String,
    resume_service_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl CareerNavClient {
    pub fn new(base_url: impl Into<String>, resume_service_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            resume_service_url: resume_service_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// POST /api/youtube/recommendations, returned as the server sent it.
    pub async fn youtube_recommendations(&self, request: &AnalysisRequest) -> Result<Value, ClientError> {
        self.send(self.post("/api/youtube/recommendations").json(request)).await
    }

    /// YouTube recommendations in canonical shape.
    pub async fn normalized_recommendations(
        &self,
        request: &AnalysisRequest,
    ) -> Result<NormalizedRecommendation, ClientError> {
        let raw = self.youtube_recommendations(request).await?;
        Ok(normalize_recommendation(&raw)?)
    }

    pub async fn generate_timeline(&self, request: &AnalysisRequest) -> Result<Value, ClientError> {
        self.send(self.post("/api/timeline/generate-timeline").json(request)).await
    }

    pub async fn youtube_history(&self) -> Result<Vec<RecommendationRecord>, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::Unauthenticated);
        }
        let history: HistoryResponse = decode(self.send(self.get("/api/youtube/history")).await?)?;
        Ok(history.records)
    }

    /// POST /api/resume/upload
    pub async fn upload_resume(&self, file: &ResumeFile) -> Result<ResumeAnalysisResponse, ClientError> {
        let form = Form::new().part("resume", resume_part(file)?);
        decode(self.send(self.post("/api/resume/upload").multipart(form)).await?)
    }

    /// Sends the file straight to the extraction service's `/extract-skills`.
    pub async fn extract_skills(&self, file: &ResumeFile) -> Result<Value, ClientError> {
        let form = Form::new().part("resume", resume_part(file)?);
        let url = format!("{}/extract-skills", self.resume_service_url);
        self.send(self.http.post(url).multipart(form)).await
    }

    /// Saves skills to the user's profile; returns how many were new.
    pub async fn save_skills(&self, skills: &[ExtractedSkill]) -> Result<usize, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::Unauthenticated);
        }
        let saved: SaveSkillsResponse = decode(
            self.send(self.post("/api/skills/extract").json(&json!({ "skills": skills })))
                .await?,
        )?;
        Ok(saved.added)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(format!("{}{path}", self.base_url)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.post(format!("{}{path}", self.base_url)))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, ClientError> {
        with_deadline(self.timeout, async move {
            let response = builder.send().await.map_err(ClientError::Connection)?;
            let status = response.status();
            let bytes = response.bytes().await.map_err(ClientError::Connection)?;
            let parsed = if bytes.is_empty() {
                Ok(Value::Null)
            } else {
                serde_json::from_slice::<Value>(&bytes)
            };

            if status == StatusCode::UNAUTHORIZED {
                return Err(ClientError::Unauthenticated);
            }
            if !status.is_success() {
                let message = parsed
                    .ok()
                    .as_ref()
                    .and_then(|body| body.get("error"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("request failed with status {status}"));
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            parsed.map_err(|e| ClientError::Decode(e.to_string()))
        })
        .await
    }
}

/// Runs `request` under `deadline`; expiry is reported as [`ClientError::Timeout`].
pub async fn with_deadline<T>(
    deadline: Duration,
    request: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    tokio::time::timeout(deadline, request).await.map_err(|_| {
        debug!("request aborted after {deadline:?}");
        ClientError::Timeout
    })?
}

fn resume_part(file: &ResumeFile) -> Result<Part, ClientError> {
    Part::bytes(file.data.to_vec())
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}
