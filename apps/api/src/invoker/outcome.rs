use serde_json::Value;
use tracing::{debug, info, warn};

use super::InvokeError;

/// Predicate deciding whether a stderr line is a failure signal.
pub type ErrorSignal = fn(&str) -> bool;

const GENERIC_FAILURE: &str = "Failed to generate recommendations";

/// Default stderr policy: a line signals failure iff it contains `error:` or
/// `exception:`, case-insensitively. Everything else is diagnostic noise.
///
/// Substring matching misfires on ordinary log text that happens to contain
/// those words; that is the documented behaviour scripts rely on.
pub fn contains_error_signal(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("error:") || lower.contains("exception:")
}

/// Output of one external process run.
/// Owned by a single request; appended to while the process runs.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub args: Vec<String>,
    pub stdout: String,
    /// stderr lines that carried an error signal.
    pub stderr: String,
    /// All other stderr lines.
    pub diagnostics: String,
    /// `None` until the process exits, and after exit when it was killed by a signal.
    pub exit_code: Option<i32>,
    finished: bool,
}

impl Invocation {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            ..Default::default()
        }
    }

    pub fn push_stdout(&mut self, chunk: &str) {
        debug!("analysis stdout: {chunk}");
        self.stdout.push_str(chunk);
    }

    pub fn push_stderr_line(&mut self, line: &str, error_signal: ErrorSignal) {
        if error_signal(line) {
            warn!("analysis stderr: {}", line.trim());
            self.stderr.push_str(line);
            self.stderr.push('\n');
        } else {
            info!("analysis log: {}", line.trim());
            self.diagnostics.push_str(line);
            self.diagnostics.push('\n');
        }
    }

    pub fn finish(&mut self, exit_code: Option<i32>) {
        self.exit_code = exit_code;
        self.finished = true;
    }

    /// Decides the outcome of a finished invocation.
    ///
    /// Non-empty stdout is always parsed, whatever the exit code or stderr
    /// said. Empty stdout fails with `ExternalProcess` when the exit code is
    /// non-zero or an error signal was seen, and with `MalformedResponse`
    /// otherwise.
    pub fn settle(self) -> Result<Value, InvokeError> {
        let exited_cleanly = self.finished && self.exit_code == Some(0);
        let has_error_signal = !self.stderr.trim().is_empty();

        info!(
            "analysis process finished: exit_code={:?} stdout_len={} error_signal={}",
            self.exit_code,
            self.stdout.len(),
            has_error_signal
        );

        if self.stdout.trim().is_empty() {
            if !exited_cleanly || has_error_signal {
                let message = if has_error_signal {
                    self.stderr.trim().to_string()
                } else {
                    GENERIC_FAILURE.to_string()
                };
                return Err(InvokeError::ExternalProcess {
                    message,
                    exit_code: self.exit_code,
                });
            }
            return Err(InvokeError::MalformedResponse {
                reason: "process produced no output".to_string(),
                raw: self.stdout,
            });
        }

        if !exited_cleanly {
            warn!(
                "analysis process exited with {:?} but produced output; parsing it anyway",
                self.exit_code
            );
        }

        serde_json::from_str(self.stdout.trim()).map_err(|e| InvokeError::MalformedResponse {
            reason: e.to_string(),
            raw: self.stdout,
        })
    }
}
