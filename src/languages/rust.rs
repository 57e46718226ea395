//! Rust adapter: `cargo test` for validation, a release build run repeatedly
//! under wall-clock timing for measurement.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{argv, measure_binary, validation_from_run, LanguageAdapter, COMPILE_TIMEOUT};
use crate::sandbox::{ContainerRuntime, RunOptions};
use crate::types::{MeasurementResult, ValidationResult};
use crate::workspace::Workspace;

const CARGO_MANIFEST: &str = "\
[package]
name = \"solution\"
version = \"0.1.0\"
edition = \"2021\"

[dependencies]
";

/// Minimal binary entry point so the release build produces
/// `target/release/solution`; timing happens at the controller boundary.
const BENCHMARK_MAIN: &str = "fn main() {}\n";

/// Rust / `cargo test`.
pub struct RustAdapter;

#[async_trait]
impl LanguageAdapter for RustAdapter {
    fn image(&self) -> &'static str {
        "rust:1.75-slim"
    }

    async fn validate(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        solution: &str,
        tests: &str,
    ) -> Result<ValidationResult> {
        workspace.write_file("Cargo.toml", CARGO_MANIFEST).await?;
        // Solution and test module share one compilation unit.
        let lib = format!("{solution}\n\n{tests}");
        workspace.write_file("src/lib.rs", &lib).await?;

        let run = runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["cargo", "test", "--", "--nocapture"]),
                // Compilation dominates; 30s is not enough for rustc.
                RunOptions::captured(COMPILE_TIMEOUT),
            )
            .await?;

        let (passed, total) = parse_cargo_test_output(&run.output);
        Ok(validation_from_run(run.exit_code, run.output, passed, total))
    }

    async fn measure(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        _solution: &str,
        runs: u32,
    ) -> Result<MeasurementResult> {
        // The entry point must exist before the release build, otherwise the
        // crate is library-only and no binary is produced.
        workspace.write_file("src/main.rs", BENCHMARK_MAIN).await?;

        let build = runtime
            .run(
                self.image(),
                workspace.path(),
                &argv(&["cargo", "build", "--release"]),
                RunOptions::captured(COMPILE_TIMEOUT),
            )
            .await?;

        if !build.success() {
            anyhow::bail!("Build failed: {}", build.output);
        }

        measure_binary(
            runtime,
            self.image(),
            workspace,
            &argv(&["./target/release/solution"]),
            runs,
        )
        .await
    }
}

/// Parse `cargo test` output: "test result: ok. 5 passed; 0 failed; ...",
/// falling back to counting individual "test <name> ... ok" lines.
fn parse_cargo_test_output(output: &str) -> (u32, u32) {
    static SUMMARY: OnceLock<Regex> = OnceLock::new();
    static PER_TEST: OnceLock<Regex> = OnceLock::new();
    let summary_re =
        SUMMARY.get_or_init(|| Regex::new(r"(\d+)\s+passed;\s+(\d+)\s+failed").expect("valid regex"));
    let per_test_re =
        PER_TEST.get_or_init(|| Regex::new(r"test \w+ \.\.\. ok").expect("valid regex"));

    if let Some(caps) = summary_re.captures(output) {
        let passed: u32 = caps[1].parse().unwrap_or(0);
        let failed: u32 = caps[2].parse().unwrap_or(0);
        return (passed, passed + failed);
    }

    #[allow(clippy::cast_possible_truncation)]
    let passed = per_test_re.find_iter(output).count() as u32;
    (passed, passed)
}
