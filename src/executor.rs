//! Request-level orchestration: allocate workspace, validate, measure,
//! assemble, release.
//!
//! Nothing below this layer is retried; each request is a single attempt.
//! Adapter and sandbox failures are caught here and folded into a structured
//! result so callers never see a raw error for anything that happened inside
//! the sandbox.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::languages::adapter_for;
use crate::sandbox::ContainerRuntime;
use crate::types::{ExecutionRequest, ExecutionResult, ValidationResult};
use crate::workspace::Workspace;

/// Stateless per-request execution service.
pub struct Executor {
    runtime: Arc<dyn ContainerRuntime>,
    workspace_root: PathBuf,
}

impl Executor {
    /// Create an executor that allocates workspaces under `workspace_root`.
    pub fn new(runtime: Arc<dyn ContainerRuntime>, workspace_root: PathBuf) -> Self {
        Self {
            runtime,
            workspace_root,
        }
    }

    /// Validate the solution against its tests, then measure execution
    /// latency over `request.runs` iterations. Measurement is only attempted
    /// after a validation pass; timing numbers for wrong answers never
    /// exist. The workspace is reclaimed on every exit path.
    pub async fn execute_and_measure(&self, request: &ExecutionRequest) -> ExecutionResult {
        let workspace = match Workspace::create(&self.workspace_root).await {
            Ok(workspace) => workspace,
            Err(e) => {
                warn!(error = %e, "workspace allocation failed");
                return ExecutionResult::internal_error(format!("{e:#}"));
            }
        };

        let adapter = adapter_for(request.language);

        info!(language = %request.language, "validating solution");
        let validation = match adapter
            .validate(
                self.runtime.as_ref(),
                &workspace,
                &request.solution,
                &request.tests,
            )
            .await
        {
            Ok(validation) => validation,
            Err(e) => {
                warn!(language = %request.language, error = %e, "validation errored");
                return ExecutionResult::internal_error(format!("{e:#}"));
            }
        };

        info!(
            passed = validation.passed,
            tests_passed = validation.tests_passed,
            total_tests = validation.total_tests,
            "validation finished"
        );

        if !validation.passed {
            return ExecutionResult::validation_failed(validation);
        }

        info!(language = %request.language, runs = request.runs, "measuring performance");
        let measurement = match adapter
            .measure(self.runtime.as_ref(), &workspace, &request.solution, request.runs)
            .await
        {
            Ok(measurement) => measurement,
            Err(e) => {
                warn!(language = %request.language, error = %e, "measurement errored");
                return ExecutionResult::internal_error(format!("{e:#}"));
            }
        };

        info!(
            mean_ms = measurement.mean_execution_time,
            std_dev_ms = measurement.standard_deviation,
            "measurement finished"
        );

        ExecutionResult::assemble(&validation, &measurement)
    }

    /// Run only the validation phase, for fast feedback without the cost of
    /// N timing runs.
    pub async fn validate_only(&self, request: &ExecutionRequest) -> Result<ValidationResult> {
        let workspace = Workspace::create(&self.workspace_root)
            .await
            .context("Failed to allocate workspace")?;

        let adapter = adapter_for(request.language);
        adapter
            .validate(
                self.runtime.as_ref(),
                &workspace,
                &request.solution,
                &request.tests,
            )
            .await
    }
}
