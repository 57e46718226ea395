//! Java adapter: `javac` + a JUnit-style test class for validation, the
//! compiled `Solution` class run repeatedly for measurement.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{argv, measure_binary, validation_from_run, LanguageAdapter, VALIDATE_TIMEOUT};
use crate::sandbox::{ContainerRuntime, RunOptions};
use crate::types::{MeasurementResult, ValidationResult};
use crate::workspace::Workspace;

/// Java / `javac`.
pub struct JavaAdapter;

#[async_trait]
impl LanguageAdapter for JavaAdapter {
    fn image(&self) -> &'static str {
        "openjdk:21-slim"
    }

    async fn validate(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        solution: &str,
        tests: &str,
    ) -> Result<ValidationResult> {
        workspace.write_file("Solution.java", solution).await?;
        workspace.write_file("SolutionTest.java", tests).await?;

        let compile = runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["javac", "Solution.java", "SolutionTest.java"]),
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
                &argv(&["java", "SolutionTest"]),
                RunOptions::captured(VALIDATE_TIMEOUT),
            )
            .await?;

        let (passed, total) = parse_java_test_output(&run.output);
        Ok(validation_from_run(run.exit_code, run.output, passed, total))
    }

    async fn measure(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        _solution: &str,
        runs: u32,
    ) -> Result<MeasurementResult> {
        // Classes were compiled during validation; time the solution's main
        // entry point directly.
        measure_binary(
            runtime,
            self.image(),
            workspace,
            &argv(&["java", "Solution"]),
            runs,
        )
        .await
    }
}

/// Count pass/fail tokens in JUnit-style console output.
fn parse_java_test_output(output: &str) -> (u32, u32) {
    static PASS: OnceLock<Regex> = OnceLock::new();
    static FAIL: OnceLock<Regex> = OnceLock::new();
    let pass_re = PASS.get_or_init(|| Regex::new(r"(?i)PASSED|OK").expect("valid regex"));
    let fail_re = FAIL.get_or_init(|| Regex::new(r"(?i)FAILED|ERROR").expect("valid regex"));

    #[allow(clippy::cast_possible_truncation)]
    let passed = pass_re.find_iter(output).count() as u32;
    #[allow(clippy::cast_possible_truncation)]
    let failed = fail_re.find_iter(output).count() as u32;
    (passed, passed + failed)
}
