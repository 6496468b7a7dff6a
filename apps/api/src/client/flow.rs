//! Request state and the resume upload → review → analysis flow.
//!
//! Transitions are plain methods so every path can be tested without a
//! server; [`ResumeFlow::upload`] and [`ResumeFlow::analyze`] wire them to a
//! [`CareerNavClient`].

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::api::{CareerNavClient, ClientError};
use crate::normalize::lenient;
use crate::normalize::skills::is_soft_skill;
use crate::normalize::{
    normalize_extracted_skills, normalize_recommendation, ExtractedSkill, NormalizedRecommendation,
    SkillKind,
};
use crate::resume::{ALLOWED_MIME_TYPES, MAX_RESUME_BYTES};

/// Pause before leaving the flow for the skills summary.
pub const NAVIGATION_DELAY: Duration = Duration::from_secs(3);

/// Upload cap of the career analysis flow.
pub const MAX_ANALYSIS_BYTES: u64 = 5 * 1024 * 1024;

/// State of one request as seen by a caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestState<T> {
    #[default]
    Idle,
    Submitting,
    Success(T),
    Error(String),
}

impl<T> RequestState<T> {
    /// Enters `Submitting`. Returns false if a request is already in flight.
    pub fn submit(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        *self = RequestState::Submitting;
        true
    }

    pub fn settle(&mut self, result: Result<T, ClientError>) {
        *self = match result {
            Ok(value) => RequestState::Success(value),
            Err(e) => RequestState::Error(e.to_string()),
        };
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, RequestState::Submitting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Upload followed by career analysis.
    Analysis,
    /// Upload straight to the skill extraction service.
    Extraction,
}

impl FlowKind {
    pub fn max_bytes(&self) -> u64 {
        match self {
            FlowKind::Analysis => MAX_ANALYSIS_BYTES,
            FlowKind::Extraction => MAX_RESUME_BYTES as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn meta(&self) -> FileMeta {
        FileMeta {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.data.len() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeStep {
    Upload,
    Parsing,
    Review,
    Analysis,
    Navigate,
}

impl fmt::Display for ResumeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResumeStep::Upload => "upload",
            ResumeStep::Parsing => "parsing",
            ResumeStep::Review => "review",
            ResumeStep::Analysis => "analysis",
            ResumeStep::Navigate => "navigate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FlowError {
    #[error("cannot {action} while in {from}")]
    InvalidTransition { from: ResumeStep, action: &'static str },

    #[error("{0}")]
    InvalidFile(String),

    #[error("Resume service is not running. Please start it and try again")]
    ServiceUnavailable,

    #[error("{0}")]
    Request(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, alias = "position", deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "lenient::string")]
    pub degree: Option<String>,
    #[serde(default, alias = "school", deserialize_with = "lenient::string")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub year: Option<String>,
}

/// Editable fields shown in the review step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub personal_info: PersonalInfo,
    pub skills: Vec<ExtractedSkill>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
}

impl ReviewDraft {
    /// Builds a draft from an extraction or upload payload.
    pub fn from_payload(payload: &Value) -> Result<Self, ClientError> {
        let skills = normalize_extracted_skills(payload)?;
        let info = payload.get("extracted_info").unwrap_or(&Value::Null);
        let text = |key: &str| info.get(key).and_then(lenient::scalar_text);

        Ok(ReviewDraft {
            personal_info: PersonalInfo {
                name: text("name"),
                email: text("email"),
                phone: text("phone"),
                location: text("location"),
            },
            skills,
            experience: entries(info.get("experience"), |title| ExperienceEntry {
                title: Some(title),
                ..Default::default()
            }),
            education: entries(info.get("education"), |degree| EducationEntry {
                degree: Some(degree),
                ..Default::default()
            }),
        })
    }

    /// Adds a skill unless present; the kind is inferred from the name.
    pub fn add_skill(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.skills.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            return false;
        }
        let kind = if is_soft_skill(name) {
            SkillKind::Soft
        } else {
            SkillKind::Technical
        };
        self.skills.push(ExtractedSkill::new(name, kind));
        true
    }

    pub fn remove_skill(&mut self, name: &str) {
        self.skills.retain(|s| !s.name.eq_ignore_ascii_case(name));
    }
}

fn entries<T>(value: Option<&Value>, from_text: impl Fn(String) -> T) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(_) => serde_json::from_value(item.clone()).ok(),
                    other => lenient::scalar_text(other).map(&from_text),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The multi-step resume flow.
///
/// `upload → parsing → review → analysis → navigate`. A failure in parsing
/// returns to `upload`, a failure in analysis to `review`; the message stays
/// in [`ResumeFlow::error`] until the next successful transition.
#[derive(Debug, Clone)]
pub struct ResumeFlow {
    kind: FlowKind,
    step: ResumeStep,
    error: Option<String>,
    file: Option<FileMeta>,
    draft: Option<ReviewDraft>,
    recommendation: Option<NormalizedRecommendation>,
}

impl ResumeFlow {
    pub fn new(kind: FlowKind) -> Self {
        Self {
            kind,
            step: ResumeStep::Upload,
            error: None,
            file: None,
            draft: None,
            recommendation: None,
        }
    }

    pub fn step(&self) -> ResumeStep {
        self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn file(&self) -> Option<&FileMeta> {
        self.file.as_ref()
    }

    pub fn draft(&self) -> Option<&ReviewDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut ReviewDraft> {
        self.draft.as_mut()
    }

    /// Recommendation returned with the upload, when the server sent one.
    pub fn recommendation(&self) -> Option<&NormalizedRecommendation> {
        self.recommendation.as_ref()
    }

    /// `upload → parsing`, gated on file checks and service reachability.
    pub fn select_file(&mut self, file: FileMeta, service_reachable: bool) -> Result<(), FlowError> {
        self.require_step(ResumeStep::Upload, "select a file")?;

        let checked = if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
            Err(FlowError::InvalidFile(
                "Please upload a PDF, DOC or DOCX file".to_string(),
            ))
        } else if file.size > self.kind.max_bytes() {
            Err(FlowError::InvalidFile(format!(
                "File size must be less than {}MB",
                self.kind.max_bytes() / (1024 * 1024)
            )))
        } else if !service_reachable {
            Err(FlowError::ServiceUnavailable)
        } else {
            Ok(())
        };

        match checked {
            Ok(()) => {
                self.file = Some(file);
                self.error = None;
                self.step = ResumeStep::Parsing;
                Ok(())
            }
            Err(e) => self.fail(ResumeStep::Upload, e),
        }
    }

    /// `parsing → review` on success, back to `upload` on failure.
    pub fn parsed(&mut self, result: Result<Value, ClientError>) -> Result<&ReviewDraft, FlowError> {
        self.require_step(ResumeStep::Parsing, "finish parsing")?;

        let draft = match result.and_then(|payload| {
            let draft = ReviewDraft::from_payload(&payload)?;
            Ok((draft, payload))
        }) {
            Ok((draft, payload)) => {
                self.recommendation = payload
                    .get("recommendation")
                    .and_then(|r| normalize_recommendation(r).ok());
                draft
            }
            Err(e) => return self.fail(ResumeStep::Upload, FlowError::Request(e.to_string())),
        };

        info!("Resume parsed: {} skills for review", draft.skills.len());
        self.error = None;
        self.step = ResumeStep::Review;
        let draft = self.draft.insert(draft);
        Ok(&*draft)
    }

    /// `review → analysis`, user triggered.
    pub fn start_analysis(&mut self) -> Result<&ReviewDraft, FlowError> {
        self.require_step(ResumeStep::Review, "start analysis")?;
        self.error = None;
        self.step = ResumeStep::Analysis;
        self.draft
            .as_ref()
            .ok_or(FlowError::InvalidTransition {
                from: ResumeStep::Review,
                action: "start analysis",
            })
    }

    /// `analysis → navigate` on success, returning the delay to wait before
    /// navigating; back to `review` on failure.
    pub fn analysis_finished(&mut self, result: Result<(), ClientError>) -> Result<Duration, FlowError> {
        self.require_step(ResumeStep::Analysis, "finish analysis")?;
        match result {
            Ok(()) => {
                self.step = ResumeStep::Navigate;
                Ok(NAVIGATION_DELAY)
            }
            Err(e) => self.fail(ResumeStep::Review, FlowError::Request(e.to_string())),
        }
    }

    /// Back to `upload`, dropping everything gathered so far.
    pub fn reset(&mut self) {
        *self = ResumeFlow::new(self.kind);
    }

    /// Validates and sends `file`, ending in `review` or back in `upload`.
    pub async fn upload(
        &mut self,
        client: &CareerNavClient,
        service_reachable: bool,
        file: &ResumeFile,
    ) -> Result<&ReviewDraft, FlowError> {
        self.select_file(file.meta(), service_reachable)?;
        let payload = match self.kind {
            FlowKind::Analysis => client.upload_resume(file).await.and_then(|response| {
                serde_json::to_value(response).map_err(|e| ClientError::Decode(e.to_string()))
            }),
            FlowKind::Extraction => client.extract_skills(file).await,
        };
        self.parsed(payload)
    }

    /// Saves the reviewed skills and waits out the navigation delay.
    pub async fn analyze(&mut self, client: &CareerNavClient) -> Result<(), FlowError> {
        let skills = self.start_analysis()?.skills.clone();
        let result = client.save_skills(&skills).await.map(|added| {
            info!("Saved {added} new skills");
        });
        let delay = self.analysis_finished(result)?;
        tokio::time::sleep(delay).await;
        Ok(())
    }

    fn require_step(&self, step: ResumeStep, action: &'static str) -> Result<(), FlowError> {
        if self.step == step {
            Ok(())
        } else {
            Err(FlowError::InvalidTransition {
                from: self.step,
                action,
            })
        }
    }

    fn fail<T>(&mut self, back_to: ResumeStep, error: FlowError) -> Result<T, FlowError> {
        warn!("Resume flow failed in {}: {error}", self.step);
        self.error = Some(error.to_string());
        self.step = back_to;
        Err(error)
    }
}
