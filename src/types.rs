//! Shared data contracts between the HTTP surface, the orchestrator and the
//! language adapters.
//!
//! All result types serialize in camelCase to match the wire format consumed
//! by callers.

use serde::{Deserialize, Serialize};

/// Languages with a registered adapter.
///
/// The set is closed; extending it means adding an adapter under
/// [`crate::languages`] and a variant here. `typescript` is a distinct
/// variant but dispatches to the JavaScript adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Python 3, tests via pytest.
    Python,
    /// Node.js, tests via Jest.
    JavaScript,
    /// Alias for the JavaScript adapter.
    TypeScript,
    /// Go, tests via `go test`.
    Go,
    /// Rust, tests via `cargo test`.
    Rust,
    /// Java, JUnit-style test classes.
    Java,
    /// C++17, assertion-based test binaries.
    Cpp,
}

impl Language {
    /// All supported languages, in the order they are advertised to callers.
    pub const ALL: [Language; 7] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Go,
        Language::Rust,
        Language::Java,
        Language::Cpp,
    ];

    /// Lowercase name as it appears in requests.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Java => "java",
            Self::Cpp => "cpp",
        }
    }

    /// Comma-separated list of supported names, for error messages.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|l| l.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" => Ok(Self::Python),
            "javascript" => Ok(Self::JavaScript),
            "typescript" => Ok(Self::TypeScript),
            "go" => Ok(Self::Go),
            "rust" => Ok(Self::Rust),
            "java" => Ok(Self::Java),
            "cpp" => Ok(Self::Cpp),
            _ => anyhow::bail!(
                "Unsupported language: '{s}'. Supported: {}",
                Self::supported_list()
            ),
        }
    }
}

/// Number of measurement runs when the caller does not specify one.
pub const DEFAULT_RUNS: u32 = 100;

fn default_runs() -> u32 {
    DEFAULT_RUNS
}

/// Immutable per-request input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Solution source text.
    pub solution: String,
    /// Test suite source text.
    pub tests: String,
    /// Language adapter to dispatch to.
    pub language: Language,
    /// Number of timing iterations for the measurement phase.
    #[serde(default = "default_runs")]
    pub runs: u32,
}

/// Outcome of the validation phase: did the solution pass its test suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True when the test command exited zero.
    pub passed: bool,
    /// Tests the runner reported as passing.
    pub tests_passed: u32,
    /// Total tests the runner reported. Parsers guarantee at least 1 when a
    /// test run completed; the compile-failure short circuit reports 0.
    pub total_tests: u32,
    /// Raw tool output on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw combined stdout+stderr of the test run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ValidationResult {
    /// Short-circuit result for a failed compile step: no tests ran at all.
    pub fn compile_failure(output: String) -> Self {
        Self {
            passed: false,
            tests_passed: 0,
            total_tests: 0,
            error: Some(format!("Compilation failed: {output}")),
            output: Some(output),
        }
    }
}

/// Outcome of the measurement phase.
///
/// Only produced from a complete set of successful runs; a single failed
/// iteration aborts the phase instead of contaminating the sample set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementResult {
    /// Population mean of the samples, milliseconds, rounded to 2 decimals.
    pub mean_execution_time: f64,
    /// Population standard deviation, milliseconds, rounded to 2 decimals.
    pub standard_deviation: f64,
    /// Per-run wall-clock samples in milliseconds, one per iteration.
    pub execution_times: Vec<f64>,
}

/// The single externally visible artifact of a request.
///
/// Carries no reference to the workspace or any container; those are fully
/// reclaimed before the orchestrator returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// True only when validation passed and measurement completed.
    pub passed: bool,
    /// Tests passed during validation.
    pub tests_passed: u32,
    /// Total tests reported by validation.
    pub total_tests: u32,
    /// Mean timing in milliseconds; 0 when validation failed.
    pub mean_execution_time: f64,
    /// Standard deviation of the timing samples, when measured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_deviation: Option<f64>,
    /// Human-readable failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw tool output, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ExecutionResult {
    /// Result for a solution that failed validation; measurement never ran.
    pub fn validation_failed(validation: ValidationResult) -> Self {
        Self {
            passed: false,
            tests_passed: validation.tests_passed,
            total_tests: validation.total_tests,
            mean_execution_time: 0.0,
            standard_deviation: None,
            error: validation.error.or_else(|| Some("Tests failed".to_string())),
            output: validation.output,
        }
    }

    /// Result for an error caught at the orchestrator boundary.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            tests_passed: 0,
            total_tests: 0,
            mean_execution_time: 0.0,
            standard_deviation: None,
            error: Some(message.into()),
            output: None,
        }
    }

    /// Merge validation counts with measurement statistics.
    pub fn assemble(validation: &ValidationResult, measurement: &MeasurementResult) -> Self {
        Self {
            passed: true,
            tests_passed: validation.tests_passed,
            total_tests: validation.total_tests,
            mean_execution_time: measurement.mean_execution_time,
            standard_deviation: Some(measurement.standard_deviation),
            error: None,
            output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_display() {
        assert_eq!(format!("{}", Language::Python), "python");
        assert_eq!(format!("{}", Language::Cpp), "cpp");
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("Rust".parse::<Language>().unwrap(), Language::Rust);
        assert_eq!(
            "typescript".parse::<Language>().unwrap(),
            Language::TypeScript
        );
        let err = "cobol".parse::<Language>().unwrap_err();
        assert!(err.to_string().contains("Unsupported language"));
        assert!(err.to_string().contains("python"));
    }

    #[test]
    fn test_language_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Language::JavaScript).unwrap(),
            "\"javascript\""
        );
        let lang: Language = serde_json::from_str("\"cpp\"").unwrap();
        assert_eq!(lang, Language::Cpp);
    }

    #[test]
    fn test_request_default_runs() {
        let json = r#"{"solution": "s", "tests": "t", "language": "go"}"#;
        let req: ExecutionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.runs, 100);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = ExecutionResult::internal_error("boom");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"testsPassed\":0"));
        assert!(json.contains("\"meanExecutionTime\":0.0"));
        assert!(!json.contains("standardDeviation"));
        assert!(!json.contains("output"));
    }

    #[test]
    fn test_compile_failure_reports_zero_tests() {
        let result = ValidationResult::compile_failure("error: expected ';'".to_string());
        assert!(!result.passed);
        assert_eq!(result.tests_passed, 0);
        assert_eq!(result.total_tests, 0);
        assert!(result.error.unwrap().contains("Compilation failed"));
    }

    #[test]
    fn test_validation_failed_zeroes_timing() {
        let validation = ValidationResult {
            passed: false,
            tests_passed: 2,
            total_tests: 5,
            error: None,
            output: Some("2 passed, 3 failed".to_string()),
        };
        let result = ExecutionResult::validation_failed(validation);
        assert!(!result.passed);
        assert_eq!(result.mean_execution_time, 0.0);
        assert_eq!(result.tests_passed, 2);
        assert_eq!(result.error.as_deref(), Some("Tests failed"));
    }
}
