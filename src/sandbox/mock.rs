//! Scripted container runtime for tests.
//!
//! Returns predetermined responses and records every invocation so tests can
//! assert on what was (and was not) executed without a Docker daemon.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ContainerRuntime, RunOptions, RunOutput, SandboxError};

/// A single scripted response.
#[derive(Debug, Clone)]
pub(crate) enum MockResponse {
    /// Terminal exit with the given code and captured output.
    Output(i64, String),
    /// Behave as if the command hit its timeout.
    Timeout,
    /// Fail with an arbitrary sandbox operation error.
    Error(String),
}

impl MockResponse {
    /// Successful run with the given output.
    pub fn ok(output: &str) -> Self {
        Self::Output(0, output.to_string())
    }

    /// Failed run (non-zero exit) with the given output.
    pub fn exit(code: i64, output: &str) -> Self {
        Self::Output(code, output.to_string())
    }
}

/// One recorded `run` invocation.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRun {
    pub image: String,
    pub workspace: PathBuf,
    pub command: Vec<String>,
    pub capture_output: bool,
}

/// A mock runtime that cycles through scripted responses in order.
#[derive(Debug, Clone)]
pub(crate) struct MockRuntime {
    responses: Arc<Vec<MockResponse>>,
    call_count: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<RecordedRun>>>,
}

impl MockRuntime {
    /// Script the responses returned by successive `run` calls. Cycles if
    /// invoked more times than responses.
    pub fn new(responses: Vec<MockResponse>) -> Self {
        assert!(!responses.is_empty(), "script at least one response");
        Self {
            responses: Arc::new(responses),
            call_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A runtime whose every command succeeds with the given output.
    pub fn always_ok(output: &str) -> Self {
        Self::new(vec![MockResponse::ok(output)])
    }

    /// Number of `run` invocations so far.
    pub fn run_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Snapshot of every recorded `run` invocation.
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn ensure_image(&self, _image: &str) -> Result<(), SandboxError> {
        Ok(())
    }

    async fn run(
        &self,
        image: &str,
        workspace: &Path,
        command: &[String],
        options: RunOptions,
    ) -> Result<RunOutput, SandboxError> {
        self.calls.lock().expect("mock lock poisoned").push(RecordedRun {
            image: image.to_string(),
            workspace: workspace.to_path_buf(),
            command: command.to_vec(),
            capture_output: options.capture_output,
        });

        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        match &self.responses[count % self.responses.len()] {
            MockResponse::Output(exit_code, output) => Ok(RunOutput {
                exit_code: *exit_code,
                output: output.clone(),
            }),
            MockResponse::Timeout => Err(SandboxError::timeout(Duration::from_secs(30))),
            MockResponse::Error(message) => Err(SandboxError::operation_failed(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> RunOptions {
        RunOptions::captured(Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_mock_cycles_responses() {
        let runtime = MockRuntime::new(vec![
            MockResponse::ok("first"),
            MockResponse::exit(1, "second"),
        ]);
        let cmd = vec!["true".to_string()];

        let a = runtime.run("img", Path::new("/tmp"), &cmd, opts()).await.unwrap();
        let b = runtime.run("img", Path::new("/tmp"), &cmd, opts()).await.unwrap();
        let c = runtime.run("img", Path::new("/tmp"), &cmd, opts()).await.unwrap();

        assert!(a.success());
        assert_eq!(b.exit_code, 1);
        assert_eq!(c.output, "first");
        assert_eq!(runtime.run_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_records_invocations() {
        let runtime = MockRuntime::always_ok("");
        let cmd = vec!["sh".to_string(), "-c".to_string(), "echo hi".to_string()];
        runtime
            .run("python:3.11-slim", Path::new("/ws"), &cmd, opts())
            .await
            .unwrap();

        let runs = runtime.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].image, "python:3.11-slim");
        assert_eq!(runs[0].command, cmd);
        assert!(runs[0].capture_output);
    }

    #[tokio::test]
    async fn test_mock_timeout_response() {
        let runtime = MockRuntime::new(vec![MockResponse::Timeout]);
        let err = runtime
            .run("img", Path::new("/tmp"), &["true".to_string()], opts())
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
