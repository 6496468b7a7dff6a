use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::client::probe::ServiceProbe;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("resume service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("resume service returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// A resume file plus the optional preferences sent with it.
#[derive(Debug, Clone, Default)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
    pub industries: Vec<String>,
    pub goals: Option<String>,
    pub location: Option<String>,
}

/// Skill names grouped the way the analysis endpoint expects them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsByCategory {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerPreferences {
    pub industry: String,
    pub goals: String,
    #[serde(rename = "experienceLevel")]
    pub experience_level: String,
}

/// Body of `POST /ai/career-recommendations`.
#[derive(Debug, Clone, Serialize)]
pub struct CareerAnalysisRequest {
    pub skills_by_category: SkillsByCategory,
    pub preferences: CareerPreferences,
    pub experience_level: String,
}

/// Seam to the resume extraction service.
#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    /// Returns the service's raw JSON payload.
    async fn process(&self, upload: ResumeUpload) -> Result<Value, ExtractError>;

    /// Career analysis of skills already on file. Raw payload, not normalized.
    async fn career_recommendations(
        &self,
        request: &CareerAnalysisRequest,
    ) -> Result<Value, ExtractError>;

    /// Whether the service answers at all.
    async fn reachable(&self) -> bool;
}

/// HTTP client of the resume service: `/process` for uploads and
/// `/ai/career-recommendations` for analysis of stored skills.
#[derive(Debug, Clone)]
pub struct HttpResumeExtractor {
    http: reqwest::Client,
    base_url: String,
    probe: ServiceProbe,
}

impl HttpResumeExtractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            probe: ServiceProbe::new(format!("{base_url}/")),
            base_url,
        }
    }
}

async fn json_or_status(response: reqwest::Response) -> Result<Value, ExtractError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ExtractError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<Value>().await?)
}

#[async_trait]
impl ResumeExtractor for HttpResumeExtractor {
    async fn process(&self, upload: ResumeUpload) -> Result<Value, ExtractError> {
        let size = upload.data.len();
        let part = Part::bytes(upload.data.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;

        let mut form = Form::new()
            .part("resume", part)
            .text("industries", Value::from(upload.industries).to_string());
        if let Some(goals) = upload.goals {
            form = form.text("goals", goals);
        }
        if let Some(location) = upload.location {
            form = form.text("location", location);
        }

        info!("Forwarding resume '{}' ({size} bytes) to resume service", upload.file_name);

        let response = self
            .http
            .post(format!("{}/process", self.base_url))
            .multipart(form)
            .send()
            .await?;

        json_or_status(response).await
    }

    async fn career_recommendations(
        &self,
        request: &CareerAnalysisRequest,
    ) -> Result<Value, ExtractError> {
        info!(
            "Requesting career analysis for {} technical / {} soft skills",
            request.skills_by_category.technical.len(),
            request.skills_by_category.soft.len()
        );
        let response = self
            .http
            .post(format!("{}/ai/career-recommendations", self.base_url))
            .json(request)
            .send()
            .await?;
        json_or_status(response).await
    }

    async fn reachable(&self) -> bool {
        self.probe.check().await
    }
}
