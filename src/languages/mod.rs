//! Language adapters: one per supported toolchain.
//!
//! An adapter owns the toolchain image, the file layout written into the
//! workspace, the exact compile/test/run command lines, and the parser that
//! turns that toolchain's human-readable test-runner output into pass/fail
//! counts. These differences are the entire reason six adapters exist
//! instead of one.

mod cpp;
mod go;
mod java;
mod javascript;
mod python;
mod rust;

pub use cpp::CppAdapter;
pub use go::GoAdapter;
pub use java::JavaAdapter;
pub use javascript::JavaScriptAdapter;
pub use python::PythonAdapter;
pub use rust::RustAdapter;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::sandbox::{ContainerRuntime, RunOptions};
use crate::stats::statistics;
use crate::types::{Language, MeasurementResult, ValidationResult};
use crate::workspace::Workspace;

/// Default budget for a validation command.
pub(crate) const VALIDATE_TIMEOUT: Duration = Duration::from_secs(30);
/// Budget for dependency-install steps (test runner installation).
pub(crate) const SETUP_TIMEOUT: Duration = Duration::from_secs(60);
/// Budget for compiling slow toolchains (Rust in particular).
pub(crate) const COMPILE_TIMEOUT: Duration = Duration::from_secs(120);
/// Budget for a single in-process benchmark wrapper run.
pub(crate) const BENCH_WRAPPER_TIMEOUT: Duration = Duration::from_secs(60);
/// Budget for one timed invocation of a compiled binary.
pub(crate) const RUN_TIMEOUT: Duration = Duration::from_secs(10);

/// Strategy implementing validate/measure for one toolchain.
#[async_trait]
pub trait LanguageAdapter: Send + Sync {
    /// Toolchain image the adapter runs its commands in.
    fn image(&self) -> &'static str;

    /// Write the solution/tests into the workspace, run the toolchain's
    /// compile/test commands, and parse the output into structured counts.
    async fn validate(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        solution: &str,
        tests: &str,
    ) -> Result<ValidationResult>;

    /// Build the solution in optimized mode and produce `runs` timing
    /// samples. Only called after a validation pass, against the same
    /// workspace.
    async fn measure(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        solution: &str,
        runs: u32,
    ) -> Result<MeasurementResult>;
}

/// Map a language to its adapter. TypeScript shares the JavaScript adapter.
pub fn adapter_for(language: Language) -> &'static dyn LanguageAdapter {
    match language {
        Language::Python => &PythonAdapter,
        Language::JavaScript | Language::TypeScript => &JavaScriptAdapter,
        Language::Go => &GoAdapter,
        Language::Rust => &RustAdapter,
        Language::Java => &JavaAdapter,
        Language::Cpp => &CppAdapter,
    }
}

/// Build a `sh -c` command line.
pub(crate) fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

/// Build an argv-style command line.
pub(crate) fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| (*p).to_string()).collect()
}

/// Run a compiled artifact `runs` times, timing each invocation at the
/// controller boundary (wall clock around the container run). In-process
/// timing would miss the real startup/execution cost under sandbox
/// constraints, which is exactly what is being measured.
///
/// Iterations are strictly sequential: concurrent runs sharing the host's
/// CPU/memory ceilings would corrupt the timing signal. A single non-zero
/// exit aborts the whole phase; partial timing sets are never averaged.
pub(crate) async fn measure_binary(
    runtime: &dyn ContainerRuntime,
    image: &str,
    workspace: &Workspace,
    command: &[String],
    runs: u32,
) -> Result<MeasurementResult> {
    let mut times = Vec::with_capacity(runs as usize);

    for iteration in 0..runs {
        let started = Instant::now();
        let run = runtime
            .run(
                image,
                workspace.path(),
                command,
                RunOptions::uncaptured(RUN_TIMEOUT),
            )
            .await?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if !run.success() {
            anyhow::bail!(
                "Benchmark run {} of {runs} exited with status {}",
                iteration + 1,
                run.exit_code
            );
        }
        times.push(elapsed_ms);
    }

    measurement_from_samples(times)
}

/// Reduce a complete set of timing samples to a [`MeasurementResult`].
pub(crate) fn measurement_from_samples(times: Vec<f64>) -> Result<MeasurementResult> {
    let stats = statistics(&times).context("No timing samples collected")?;
    Ok(MeasurementResult {
        mean_execution_time: stats.mean,
        standard_deviation: stats.std_dev,
        execution_times: times,
    })
}

/// Payload printed by the in-process benchmark wrappers (Python/JavaScript).
#[derive(Debug, Deserialize)]
pub(crate) struct WrapperReport {
    #[serde(default)]
    pub times: Vec<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parse the JSON report emitted by a benchmark wrapper script.
pub(crate) fn parse_wrapper_report(output: &str) -> Result<Vec<f64>> {
    let report: WrapperReport =
        serde_json::from_str(output.trim()).context("Failed to parse benchmark results")?;
    if let Some(error) = report.error {
        anyhow::bail!("Benchmark wrapper reported an error: {error}");
    }
    Ok(report.times)
}

/// Build a passing/failing [`ValidationResult`] from a completed test run.
///
/// `total` falls back to 1 when the parser found no test markers, so a
/// misleading 0/0 is never reported for a run that actually executed.
pub(crate) fn validation_from_run(
    exit_code: i64,
    output: String,
    passed_count: u32,
    total_count: u32,
) -> ValidationResult {
    ValidationResult {
        passed: exit_code == 0,
        tests_passed: passed_count,
        total_tests: total_count.max(1),
        error: (exit_code != 0).then(|| output.clone()),
        output: Some(output),
    }
}
