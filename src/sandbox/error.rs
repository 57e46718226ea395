//! Domain-specific error types for sandbox operations.
//!
//! Typed errors enable the adapter and orchestrator layers to match on
//! specific failure modes rather than parsing error message strings.

use std::time::Duration;

/// Errors that can occur while driving the container engine.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Container engine is not running or not reachable.
    #[error("Container engine is not available: {message}")]
    EngineUnavailable {
        /// Underlying connection/ping failure.
        message: String,
    },

    /// The toolchain image could not be pulled.
    #[error("Failed to pull image '{image}': {message}")]
    ImagePullFailed {
        /// Image reference that was requested.
        image: String,
        /// Engine-reported pull failure.
        message: String,
    },

    /// The sandbox instance could not be created.
    #[error("Failed to create sandbox instance: {message}")]
    InstanceCreateFailed {
        /// Engine-reported create failure.
        message: String,
    },

    /// The command did not reach a terminal exit state in time. The instance
    /// has been killed; its exit code is not trusted after a forced kill.
    #[error("Execution timeout after {timeout_ms}ms")]
    Timeout {
        /// The budget that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// Any other engine operation failure (start, wait, log retrieval).
    #[error("Sandbox operation failed: {message}")]
    OperationFailed {
        /// Engine-reported failure.
        message: String,
    },
}

impl SandboxError {
    /// Creates an `EngineUnavailable` error.
    pub fn engine_unavailable(message: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            message: message.into(),
        }
    }

    /// Creates an `ImagePullFailed` error.
    pub fn image_pull_failed(image: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImagePullFailed {
            image: image.into(),
            message: message.into(),
        }
    }

    /// Creates an `InstanceCreateFailed` error.
    pub fn instance_create_failed(message: impl Into<String>) -> Self {
        Self::InstanceCreateFailed {
            message: message.into(),
        }
    }

    /// Creates a `Timeout` error from the elapsed budget.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout {
            timeout_ms: duration.as_millis() as u64,
        }
    }

    /// Creates an `OperationFailed` error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed {
            message: message.into(),
        }
    }

    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
