use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::invoker::AnalysisRequest;
use crate::normalize::lenient;

/// Raw request body. Every field is optional here so that all missing
/// fields can be reported in one message instead of the first one serde hits.
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisRequestBody {
    #[serde(default)]
    pub current_skills: Option<Value>,
    #[serde(default)]
    pub target_job: Option<Value>,
    #[serde(default)]
    pub timeframe_months: Option<Value>,
    #[serde(default)]
    pub additional_context: Option<Value>,
}

/// JSON body extractor that never rejects on shape. A body that is not a
/// JSON object, or a request without a JSON content type, yields
/// `T::default()` so the handler's own validation names what is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for LenientJson<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json") || v.contains("+json"));
        if !is_json {
            return Ok(LenientJson(T::default()));
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(LenientJson(object_body(&bytes)))
    }
}

/// Decodes a JSON object body; anything else is `T::default()`.
pub fn object_body<T: DeserializeOwned + Default>(bytes: &[u8]) -> T {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    }
}

impl AnalysisRequestBody {
    pub fn validate(self) -> Result<AnalysisRequest, AppError> {
        let current_skills = self
            .current_skills
            .as_ref()
            .filter(|v| v.is_array())
            .map(lenient::texts)
            .filter(|skills| !skills.is_empty());
        let target_job = self.target_job.as_ref().and_then(lenient::scalar_text);
        let timeframe_months = self.timeframe_months.as_ref().and_then(positive_months);

        let mut missing = Vec::new();
        if current_skills.is_none() {
            missing.push("current_skills");
        }
        if target_job.is_none() {
            missing.push("target_job");
        }
        if timeframe_months.is_none() {
            missing.push("timeframe_months");
        }

        let additional_context = match self.additional_context {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                return Err(AppError::Validation(
                    "additional_context must be an object".to_string(),
                ))
            }
        };

        match (current_skills, target_job, timeframe_months) {
            (Some(current_skills), Some(target_job), Some(timeframe_months)) => {
                Ok(AnalysisRequest {
                    current_skills,
                    target_job,
                    timeframe_months,
                    additional_context,
                })
            }
            _ => Err(AppError::Validation(format!(
                "current_skills, target_job, and timeframe_months are required (missing: {})",
                missing.join(", ")
            ))),
        }
    }
}

/// Whole positive month counts, given as a number or a numeric string.
fn positive_months(value: &Value) -> Option<u32> {
    let months = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f > 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(months).ok().filter(|m| *m > 0)
}
