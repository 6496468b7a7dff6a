use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::info;

use super::outcome::{contains_error_signal, ErrorSignal, Invocation};
use super::{AnalysisMode, AnalysisRequest, AnalysisRunner, InvokeError};

/// Spawns the analysis scripts as child processes.
///
/// No timeout and no retry: the process runs to completion and the request
/// waits for it. A new process is started for every call.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    interpreter: String,
    timeline_script: PathBuf,
    plan_script: PathBuf,
    error_signal: ErrorSignal,
}

impl ProcessInvoker {
    pub fn new(
        interpreter: impl Into<String>,
        timeline_script: impl Into<PathBuf>,
        plan_script: impl Into<PathBuf>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeline_script: timeline_script.into(),
            plan_script: plan_script.into(),
            error_signal: contains_error_signal,
        }
    }

    /// Replaces the stderr error-signal predicate.
    pub fn with_error_signal(mut self, error_signal: ErrorSignal) -> Self {
        self.error_signal = error_signal;
        self
    }

    /// Runs `script` with `args` and returns the parsed stdout document.
    pub async fn invoke(&self, script: &Path, args: Vec<String>) -> Result<Value, InvokeError> {
        self.collect(script, args).await?.settle()
    }

    /// Runs the process to completion, streaming both pipes into an [`Invocation`].
    pub async fn collect(&self, script: &Path, args: Vec<String>) -> Result<Invocation, InvokeError> {
        info!(
            "Spawning {} {} with {} args",
            self.interpreter,
            script.display(),
            args.len()
        );

        let mut child = Command::new(&self.interpreter)
            .arg(script)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Spawn {
                program: self.interpreter.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("child stderr was not captured"))?;

        let mut invocation = Invocation::new(args);
        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let mut stdout_open = true;
        let mut stderr_open = true;

        // Both pipes are drained together so a chatty stderr cannot block the child.
        // Bytes are decoded lossily: a stray non-UTF-8 byte is noise, not a failure.
        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout.read_until(b'\n', &mut stdout_buf), if stdout_open => {
                    if read? == 0 {
                        stdout_open = false;
                    } else {
                        invocation.push_stdout(&String::from_utf8_lossy(&stdout_buf));
                        stdout_buf.clear();
                    }
                }
                read = stderr.read_until(b'\n', &mut stderr_buf), if stderr_open => {
                    if read? == 0 {
                        stderr_open = false;
                    } else {
                        let line = String::from_utf8_lossy(&stderr_buf);
                        let line = line.trim_end_matches(['\n', '\r']);
                        invocation.push_stderr_line(line, self.error_signal);
                        stderr_buf.clear();
                    }
                }
            }
        }

        let status = child.wait().await?;
        invocation.finish(status.code());
        Ok(invocation)
    }
}

#[async_trait]
impl AnalysisRunner for ProcessInvoker {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
        mode: AnalysisMode,
    ) -> Result<Value, InvokeError> {
        self.invoke(&self.timeline_script, request.to_args(mode)).await
    }

    async fn plan(&self, request: &AnalysisRequest) -> Result<Value, InvokeError> {
        self.invoke(&self.plan_script, request.plan_args()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn script(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn invoker(timeline: &NamedTempFile, plan: &NamedTempFile) -> ProcessInvoker {
        ProcessInvoker::new("sh", timeline.path(), plan.path())
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            current_skills: vec!["Python".to_string()],
            target_job: "Data Analyst".to_string(),
            timeframe_months: 6,
            additional_context: None,
        }
    }

    #[tokio::test]
    async fn test_positional_arguments_reach_the_script() {
        let timeline = script(
            r#"printf '{"skills":%s,"job":"%s","months":"%s","context":%s,"mode":"%s"}' "$1" "$2" "$3" "$4" "$5""#,
        );
        let plan = script("exit 1");
        let value = invoker(&timeline, &plan)
            .analyze(&request(), AnalysisMode::Youtube)
            .await
            .unwrap();
        assert_eq!(value["skills"][0], "Python");
        assert_eq!(value["job"], "Data Analyst");
        assert_eq!(value["months"], "6");
        assert!(value["context"].as_object().unwrap().is_empty());
        assert_eq!(value["mode"], "youtube");
    }

    #[tokio::test]
    async fn test_progress_on_stderr_does_not_fail() {
        let timeline = script(
            "echo 'Fetching 12 candidate videos...' >&2\n\
             echo '{\"youtube_resources\":[{\"title\":\"X\",\"url\":\"https://example.com\",\"channel\":\"Y\"}]}'\n",
        );
        let plan = script("exit 1");
        let inv = invoker(&timeline, &plan)
            .collect(timeline.path(), vec![])
            .await
            .unwrap();
        assert!(inv.diagnostics.contains("Fetching 12 candidate videos"));
        assert_eq!(inv.exit_code, Some(0));
        let value = inv.settle().unwrap();
        assert_eq!(value["youtube_resources"][0]["channel"], "Y");
    }

    #[tokio::test]
    async fn test_non_utf8_stderr_is_decoded_lossily() {
        let timeline = script(
            "printf 'progress \\377\\376 bytes\\n' >&2\n\
             echo '{\"youtube_resources\":[]}'\n",
        );
        let plan = script("exit 1");
        let inv = invoker(&timeline, &plan)
            .collect(timeline.path(), vec![])
            .await
            .unwrap();
        assert!(inv.diagnostics.contains("progress"));
        assert!(inv.diagnostics.contains('\u{FFFD}'));
        let value = inv.settle().unwrap();
        assert!(value["youtube_resources"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_utf8_stdout_is_malformed() {
        let timeline = script("printf '\\377\\376\\n'\n");
        let plan = script("exit 1");
        let err = invoker(&timeline, &plan)
            .analyze(&request(), AnalysisMode::Youtube)
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_error_signal_without_stdout_fails() {
        let timeline = script("echo 'Error: quota exceeded' >&2\nexit 1\n");
        let plan = script("exit 1");
        let err = invoker(&timeline, &plan)
            .analyze(&request(), AnalysisMode::Youtube)
            .await
            .unwrap_err();
        match err {
            InvokeError::ExternalProcess { message, exit_code } => {
                assert!(message.contains("quota exceeded"));
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("expected ExternalProcess, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_stdout_is_malformed() {
        let timeline = script("echo '{not valid json'\n");
        let plan = script("exit 1");
        let err = invoker(&timeline, &plan)
            .analyze(&request(), AnalysisMode::Timeline)
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_plan_uses_plan_script_with_three_args() {
        let timeline = script("exit 1");
        let plan = script(r#"printf '{"argc":%s,"plan":"p","mermaid_code":"graph TD"}' "$#""#);
        let value = invoker(&timeline, &plan).plan(&request()).await.unwrap();
        assert_eq!(value["argc"], 3);
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_spawn_error() {
        let timeline = script("exit 0");
        let plan = script("exit 0");
        let invoker = ProcessInvoker::new(
            "definitely-not-an-interpreter-on-path",
            timeline.path(),
            plan.path(),
        );
        let err = invoker
            .analyze(&request(), AnalysisMode::Youtube)
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Spawn { .. }));
    }
}
