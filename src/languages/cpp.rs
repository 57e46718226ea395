//! C++ adapter: g++ compile + assertion-based test binary for validation,
//! an -O3 build run repeatedly for measurement.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{
    argv, measure_binary, sh, validation_from_run, LanguageAdapter, VALIDATE_TIMEOUT,
};
use crate::sandbox::{ContainerRuntime, RunOptions};
use crate::types::{MeasurementResult, ValidationResult};
use crate::workspace::Workspace;

/// C++17 / g++.
pub struct CppAdapter;

#[async_trait]
impl LanguageAdapter for CppAdapter {
    fn image(&self) -> &'static str {
        "gcc:latest"
    }

    async fn validate(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        solution: &str,
        tests: &str,
    ) -> Result<ValidationResult> {
        workspace.write_file("solution.cpp", solution).await?;
        workspace.write_file("test.cpp", tests).await?;

        let compile = runtime
            .run(
                self.image(),
                workspace.path(),
                &sh("g++ -std=c++17 -o test_solution test.cpp solution.cpp 2>&1"),
                RunOptions::captured(VALIDATE_TIMEOUT),
            )
            .await?;

        if !compile.success() {
            return Ok(ValidationResult::compile_failure(compile.output));
        }

        let run = runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["./test_solution"]),
                RunOptions::captured(VALIDATE_TIMEOUT),
            )
            .await?;

        let (passed, total) = parse_cpp_test_output(&run.output);
        Ok(validation_from_run(run.exit_code, run.output, passed, total))
    }

    async fn measure(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        _solution: &str,
        runs: u32,
    ) -> Result<MeasurementResult> {
        let compile = runtime
            .run(
                self.image(),
                workspace.path(),
                &sh("g++ -std=c++17 -O3 -o solution solution.cpp 2>&1"),
                RunOptions::captured(VALIDATE_TIMEOUT),
            )
            .await?;

        if !compile.success() {
            anyhow::bail!("Compilation failed: {}", compile.output);
        }

        measure_binary(runtime, self.image(), workspace, &argv(&["./solution"]), runs).await
    }
}

/// Count pass/fail tokens printed by the test binary. There is no standard
/// C++ runner format, so this stays deliberately permissive.
fn parse_cpp_test_output(output: &str) -> (u32, u32) {
    static PASS: OnceLock<Regex> = OnceLock::new();
    static FAIL: OnceLock<Regex> = OnceLock::new();
    let pass_re = PASS.get_or_init(|| Regex::new(r"(?i)PASS|✓").expect("valid regex"));
    let fail_re = FAIL.get_or_init(|| Regex::new(r"(?i)FAIL|✗").expect("valid regex"));

    #[allow(clippy::cast_possible_truncation)]
    let passed = pass_re.find_iter(output).count() as u32;
    #[allow(clippy::cast_possible_truncation)]
    let failed = fail_re.find_iter(output).count() as u32;
    (passed, passed + failed)
}
