//! Python adapter: pytest for validation, an in-process timeit wrapper for
//! measurement.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{
    argv, measurement_from_samples, parse_wrapper_report, sh, validation_from_run,
    LanguageAdapter, BENCH_WRAPPER_TIMEOUT, VALIDATE_TIMEOUT,
};
use crate::sandbox::{ContainerRuntime, RunOptions};
use crate::types::{MeasurementResult, ValidationResult};
use crate::workspace::Workspace;

/// Benchmark wrapper: times the first public callable in the solution module
/// over `__RUNS__` in-process iterations and prints a JSON report.
const BENCHMARK_TEMPLATE: &str = r#"
import timeit
import sys
import json

import solution

function_to_test = None
for attr_name in dir(solution):
    attr = getattr(solution, attr_name)
    if callable(attr) and not attr_name.startswith('_'):
        function_to_test = attr
        break

if not function_to_test:
    print(json.dumps({"error": "No callable function found in solution"}))
    sys.exit(1)

times = []
for i in range(__RUNS__):
    start = timeit.default_timer()
    try:
        result = function_to_test()
    except TypeError:
        # Function needs arguments; measure call overhead only.
        pass
    end = timeit.default_timer()
    times.append((end - start) * 1000)

print(json.dumps({"times": times}))
"#;

/// Python 3 / pytest.
pub struct PythonAdapter;

#[async_trait]
impl LanguageAdapter for PythonAdapter {
    fn image(&self) -> &'static str {
        "python:3.11-slim"
    }

    async fn validate(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        solution: &str,
        tests: &str,
    ) -> Result<ValidationResult> {
        workspace.write_file("solution.py", solution).await?;
        workspace.write_file("test_solution.py", tests).await?;

        // Install the runner and execute tests in the same container; a
        // fresh instance per command would lose the installed package.
        let run = runtime
            .run(
                self.image(),
                workspace.path(),
                &sh("pip install -q pytest 2>/dev/null && python -m pytest test_solution.py -v --tb=short"),
                RunOptions::captured(VALIDATE_TIMEOUT),
            )
            .await?;

        let (passed, total) = parse_pytest_output(&run.output);
        Ok(validation_from_run(run.exit_code, run.output, passed, total))
    }

    async fn measure(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        _solution: &str,
        runs: u32,
    ) -> Result<MeasurementResult> {
        let wrapper = BENCHMARK_TEMPLATE.replace("__RUNS__", &runs.to_string());
        workspace.write_file("benchmark.py", &wrapper).await?;

        let run = runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["python", "benchmark.py"]),
                RunOptions::captured(BENCH_WRAPPER_TIMEOUT),
            )
            .await?;

        if !run.success() {
            anyhow::bail!("Benchmark failed: {}", run.output);
        }

        measurement_from_samples(parse_wrapper_report(&run.output)?)
    }
}

/// Parse a pytest summary such as "5 passed in 0.12s" or
/// "3 passed, 2 failed in 0.34s".
fn parse_pytest_output(output: &str) -> (u32, u32) {
    fn count(re: &Regex, output: &str) -> u32 {
        re.captures(output)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0)
    }

    static PASSED: OnceLock<Regex> = OnceLock::new();
    static FAILED: OnceLock<Regex> = OnceLock::new();
    let passed_re = PASSED.get_or_init(|| Regex::new(r"(\d+)\s+passed").expect("valid regex"));
    let failed_re = FAILED.get_or_init(|| Regex::new(r"(\d+)\s+failed").expect("valid regex"));

    let passed = count(passed_re, output);
    let failed = count(failed_re, output);
    (passed, passed + failed)
}
