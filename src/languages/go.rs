//! Go adapter: `go test` for validation, a compiled benchmark entry point
//! timed at the controller boundary for measurement.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{
    argv, measure_binary, validation_from_run, LanguageAdapter, COMPILE_TIMEOUT, VALIDATE_TIMEOUT,
};
use crate::sandbox::{ContainerRuntime, RunOptions};
use crate::types::{MeasurementResult, ValidationResult};
use crate::workspace::Workspace;

/// Minimal benchmark entry point; the timing happens outside the process,
/// wall-clock around each container run.
const BENCHMARK_MAIN: &str = "package main\n\nfunc main() {}\n";

/// Go / `go test`.
pub struct GoAdapter;

#[async_trait]
impl LanguageAdapter for GoAdapter {
    fn image(&self) -> &'static str {
        "golang:1.21-alpine"
    }

    async fn validate(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        solution: &str,
        tests: &str,
    ) -> Result<ValidationResult> {
        workspace.write_file("solution.go", solution).await?;
        workspace.write_file("solution_test.go", tests).await?;

        // The module manifest lands in the workspace and is reused by the
        // measurement build.
        runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["go", "mod", "init", "solution"]),
                RunOptions::uncaptured(VALIDATE_TIMEOUT),
            )
            .await?;

        let run = runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["go", "test", "-v"]),
                RunOptions::captured(VALIDATE_TIMEOUT),
            )
            .await?;

        let (passed, total) = parse_go_test_output(&run.output);
        Ok(validation_from_run(run.exit_code, run.output, passed, total))
    }

    async fn measure(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        _solution: &str,
        runs: u32,
    ) -> Result<MeasurementResult> {
        workspace.write_file("benchmark.go", BENCHMARK_MAIN).await?;

        let build = runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["go", "build", "-o", "benchmark", "benchmark.go", "solution.go"]),
                RunOptions::captured(COMPILE_TIMEOUT),
            )
            .await?;

        if !build.success() {
            anyhow::bail!("Build failed: {}", build.output);
        }

        measure_binary(runtime, self.image(), workspace, &argv(&["./benchmark"]), runs).await
    }
}

/// Parse `go test -v` output by counting "--- PASS:" / "--- FAIL:" lines.
fn parse_go_test_output(output: &str) -> (u32, u32) {
    static PASS: OnceLock<Regex> = OnceLock::new();
    static FAIL: OnceLock<Regex> = OnceLock::new();
    let pass_re = PASS.get_or_init(|| Regex::new(r"--- PASS:").expect("valid regex"));
    let fail_re = FAIL.get_or_init(|| Regex::new(r"--- FAIL:").expect("valid regex"));

    #[allow(clippy::cast_possible_truncation)]
    let passed = pass_re.find_iter(output).count() as u32;
    #[allow(clippy::cast_possible_truncation)]
    let failed = fail_re.find_iter(output).count() as u32;
    (passed, passed + failed)
}
