//! External Analysis Invoker: runs an analysis script once per request and
//! collects the JSON document it prints on stdout.
//!
//! The script contract is positional:
//! `<interpreter> <script> <skills-json> <target_job> <timeframe> <context-json> <mode>`.
//! Scripts may log freely on stderr; only lines carrying an error signal
//! (see [`contains_error_signal`]) can fail an invocation, and only when
//! stdout stayed empty.

mod outcome;
mod process;

use std::io;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use outcome::{contains_error_signal, ErrorSignal, Invocation};
pub use process::ProcessInvoker;

/// Recommendation flavour requested from the analysis script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Youtube,
    Timeline,
    Resume,
}

impl AnalysisMode {
    /// The literal the script expects as its mode argument.
    /// The timeline script calls its Gemini-backed timeline mode `ai`.
    pub fn as_arg(&self) -> &'static str {
        match self {
            AnalysisMode::Youtube => "youtube",
            AnalysisMode::Timeline => "ai",
            AnalysisMode::Resume => "resume",
        }
    }
}

/// A validated analysis request. Immutable once handed to the invoker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub current_skills: Vec<String>,
    pub target_job: String,
    pub timeframe_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<Map<String, Value>>,
}

impl AnalysisRequest {
    /// Positional arguments for the timeline script, in contract order.
    pub fn to_args(&self, mode: AnalysisMode) -> Vec<String> {
        let mut args = self.plan_args();
        args.push(
            self.additional_context
                .as_ref()
                .map(|ctx| Value::Object(ctx.clone()).to_string())
                .unwrap_or_else(|| "{}".to_string()),
        );
        args.push(mode.as_arg().to_string());
        args
    }

    /// The plan script only takes skills, target job and timeframe.
    pub fn plan_args(&self) -> Vec<String> {
        vec![
            Value::from(self.current_skills.clone()).to_string(),
            self.target_job.clone(),
            self.timeframe_months.to_string(),
        ]
    }
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while reading analysis output: {0}")]
    Io(#[from] io::Error),

    #[error("{message}")]
    ExternalProcess {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("malformed analysis output: {reason}")]
    MalformedResponse { reason: String, raw: String },
}

/// Seam between the endpoint layer and the process plumbing.
///
/// Carried in `AppState` as `Arc<dyn AnalysisRunner>`.
#[async_trait]
pub trait AnalysisRunner: Send + Sync {
    /// Runs the timeline script in the given mode.
    async fn analyze(
        &self,
        request: &AnalysisRequest,
        mode: AnalysisMode,
    ) -> Result<Value, InvokeError>;

    /// Runs the career plan script.
    async fn plan(&self, request: &AnalysisRequest) -> Result<Value, InvokeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            current_skills: vec!["Python".to_string(), "SQL".to_string()],
            target_job: "Data Analyst".to_string(),
            timeframe_months: 6,
            additional_context: None,
        }
    }

    #[test]
    fn test_args_follow_script_contract() {
        let args = request().to_args(AnalysisMode::Youtube);
        assert_eq!(
            args,
            vec![
                r#"["Python","SQL"]"#,
                "Data Analyst",
                "6",
                "{}",
                "youtube"
            ]
        );
    }

    #[test]
    fn test_context_is_serialized_as_json() {
        let mut req = request();
        req.additional_context = json!({"location": "Berlin"}).as_object().cloned();
        let args = req.to_args(AnalysisMode::Timeline);
        assert_eq!(args[3], r#"{"location":"Berlin"}"#);
        assert_eq!(args[4], "ai");
    }

    #[test]
    fn test_target_job_is_passed_as_plain_string() {
        let mut req = request();
        req.target_job = "ML \"Ops\" Engineer".to_string();
        assert_eq!(req.to_args(AnalysisMode::Youtube)[1], "ML \"Ops\" Engineer");
    }

    #[test]
    fn test_plan_args_have_three_positions() {
        assert_eq!(request().plan_args().len(), 3);
    }

    #[test]
    fn test_external_process_error_displays_message() {
        let err = InvokeError::ExternalProcess {
            message: "Error: quota exceeded".to_string(),
            exit_code: Some(1),
        };
        assert_eq!(err.to_string(), "Error: quota exceeded");
    }
}
