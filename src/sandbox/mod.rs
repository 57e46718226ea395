//! Ephemeral, resource-constrained container execution.
//!
//! One container per command: created, started, raced against a timeout,
//! drained of output and force-removed. Containers never carry state from
//! one command to the next unless an adapter chains commands in a single
//! shell line.

mod docker;
mod error;

#[cfg(test)]
pub(crate) mod mock;

pub use docker::DockerRuntime;
pub use error::SandboxError;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Options for a single sandboxed command.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Wall-clock budget; the container is killed when it elapses.
    pub timeout: Duration,
    /// Whether to collect combined stdout+stderr after exit.
    pub capture_output: bool,
}

impl RunOptions {
    /// Capture output, with the given timeout.
    pub fn captured(timeout: Duration) -> Self {
        Self {
            timeout,
            capture_output: true,
        }
    }

    /// Discard output; used for setup steps and timed benchmark runs where
    /// log retrieval would pollute the wall-clock signal.
    pub fn uncaptured(timeout: Duration) -> Self {
        Self {
            timeout,
            capture_output: false,
        }
    }
}

/// Result of a sandboxed command that reached a terminal exit state.
///
/// A non-zero exit code is not an error at this layer; adapters decide what
/// it means (compile failure, failing tests, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// Exit code reported by the container wait endpoint.
    pub exit_code: i64,
    /// Combined stdout+stderr, empty when capture was disabled.
    pub output: String,
}

impl RunOutput {
    /// True when the command exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Isolated runtime controller: one implementation per container engine.
///
/// The production implementation is [`DockerRuntime`]; tests use a scripted
/// mock. Implementations must guarantee that every created instance is
/// removed on every path, including timeout.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Make sure the toolchain image is available locally, pulling it if
    /// absent. Idempotent; concurrent callers may pull redundantly, which
    /// costs bandwidth but never correctness.
    async fn ensure_image(&self, image: &str) -> Result<(), SandboxError>;

    /// Run one command in a fresh container with the workspace mounted at
    /// `/code`, memory/CPU ceilings applied and networking disabled.
    async fn run(
        &self,
        image: &str,
        workspace: &Path,
        command: &[String],
        options: RunOptions,
    ) -> Result<RunOutput, SandboxError>;
}
