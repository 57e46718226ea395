//! JavaScript/TypeScript adapter: Jest for validation, a perf_hooks wrapper
//! for measurement. TypeScript requests dispatch here as well.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{
    argv, measurement_from_samples, parse_wrapper_report, sh, validation_from_run,
    LanguageAdapter, BENCH_WRAPPER_TIMEOUT, SETUP_TIMEOUT, VALIDATE_TIMEOUT,
};
use crate::sandbox::{ContainerRuntime, RunOptions};
use crate::types::{MeasurementResult, ValidationResult};
use crate::workspace::Workspace;

/// Benchmark wrapper: times the first exported function of the solution
/// module over `__RUNS__` in-process iterations and prints a JSON report.
const BENCHMARK_TEMPLATE: &str = r#"
const { performance } = require('perf_hooks');
const solution = require('./solution.js');

let functionToTest = null;
for (const key in solution) {
  if (typeof solution[key] === 'function') {
    functionToTest = solution[key];
    break;
  }
}

if (!functionToTest) {
  console.log(JSON.stringify({ error: 'No function found in solution' }));
  process.exit(1);
}

const times = [];
for (let i = 0; i < __RUNS__; i++) {
  const start = performance.now();
  try {
    functionToTest();
  } catch (e) {
    // Function may need arguments; measure call overhead only.
  }
  const end = performance.now();
  times.push(end - start);
}

console.log(JSON.stringify({ times }));
"#;

/// Node.js / Jest.
pub struct JavaScriptAdapter;

#[async_trait]
impl LanguageAdapter for JavaScriptAdapter {
    fn image(&self) -> &'static str {
        "node:20-slim"
    }

    async fn validate(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        solution: &str,
        tests: &str,
    ) -> Result<ValidationResult> {
        workspace.write_file("solution.js", solution).await?;
        workspace.write_file("solution.test.js", tests).await?;

        let package_json = serde_json::json!({
            "name": "test",
            "type": "module",
            "scripts": {
                "test": "node --experimental-vm-modules node_modules/jest/bin/jest.js"
            }
        });
        workspace
            .write_file("package.json", &serde_json::to_string_pretty(&package_json)?)
            .await?;

        // Installed packages land in the workspace, so the test runner in
        // the next container sees them.
        runtime
            .run(
                self.image(),
                workspace.path(),
                &sh("npm install --silent jest 2>/dev/null"),
                RunOptions::uncaptured(SETUP_TIMEOUT),
            )
            .await?;

        let run = runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["npm", "test", "--", "--verbose"]),
                RunOptions::captured(VALIDATE_TIMEOUT),
            )
            .await?;

        let (passed, total) = parse_jest_output(&run.output);
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
        workspace.write_file("benchmark.js", &wrapper).await?;

        let run = runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["node", "benchmark.js"]),
                RunOptions::captured(BENCH_WRAPPER_TIMEOUT),
            )
            .await?;

        if !run.success() {
            anyhow::bail!("Benchmark failed: {}", run.output);
        }

        measurement_from_samples(parse_wrapper_report(&run.output)?)
    }
}

/// Parse a Jest summary such as "Tests: 2 passed, 2 total" or
/// "Tests: 1 failed, 2 passed, 3 total".
fn parse_jest_output(output: &str) -> (u32, u32) {
    static TOTAL: OnceLock<Regex> = OnceLock::new();
    static PASSED: OnceLock<Regex> = OnceLock::new();
    let total_re =
        TOTAL.get_or_init(|| Regex::new(r"Tests:.*?(\d+)\s+total").expect("valid regex"));
    let passed_re = PASSED.get_or_init(|| Regex::new(r"(\d+)\s+passed").expect("valid regex"));

    let total = total_re
        .captures(output)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    let passed = passed_re
        .captures(output)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    (passed, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::mock::{MockResponse, MockRuntime};
    use tempfile::tempdir;

    #[test]
    fn test_parse_all_passing() {
        let output = "Tests:       2 passed, 2 total";
        assert_eq!(parse_jest_output(output), (2, 2));
    }

    #[test]
    fn test_parse_mixed_results() {
        let output = "Tests:       1 failed, 2 passed, 3 total";
        assert_eq!(parse_jest_output(output), (2, 3));
    }

    #[test]
    fn test_parse_no_markers() {
        assert_eq!(parse_jest_output("SyntaxError: unexpected token"), (0, 0));
    }

    #[tokio::test]
    async fn test_validate_installs_then_runs_jest() {
        let root = tempdir().unwrap();
        let workspace = Workspace::create(root.path()).await.unwrap();
        let runtime = MockRuntime::new(vec![
            MockResponse::ok(""), // npm install
            MockResponse::ok("Tests:       4 passed, 4 total"),
        ]);

        let result = JavaScriptAdapter
            .validate(&runtime, &workspace, "module.exports = {}", "test('x', () => {})")
            .await
            .unwrap();

        assert!(result.passed);
        assert_eq!(result.tests_passed, 4);
        assert_eq!(result.total_tests, 4);

        let runs = runtime.runs();
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].capture_output); // install output discarded
        assert!(runs[1].capture_output);
        assert!(workspace.path().join("package.json").exists());
    }

    #[tokio::test]
    async fn test_validate_total_falls_back_to_one() {
        let root = tempdir().unwrap();
        let workspace = Workspace::create(root.path()).await.unwrap();
        let runtime = MockRuntime::new(vec![
            MockResponse::ok(""),
            MockResponse::exit(1, "Jest crashed before reporting"),
        ]);

        let result = JavaScriptAdapter
            .validate(&runtime, &workspace, "s", "t")
            .await
            .unwrap();

        assert!(!result.passed);
        assert_eq!(result.total_tests, 1);
    }

    #[tokio::test]
    async fn test_measure_embeds_runs() {
        let root = tempdir().unwrap();
        let workspace = Workspace::create(root.path()).await.unwrap();
        let runtime = MockRuntime::always_ok("{\"times\": [0.5, 0.7]}");

        let result = JavaScriptAdapter
            .measure(&runtime, &workspace, "s", 2)
            .await
            .unwrap();

        assert_eq!(result.execution_times.len(), 2);
        let wrapper = std::fs::read_to_string(workspace.path().join("benchmark.js")).unwrap();
        assert!(wrapper.contains("i < 2;"));
    }
}
