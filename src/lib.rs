//! Sandboxed multi-language code validation and benchmarking.
//!
//! Untrusted solutions are checked against a caller-supplied test suite and
//! timed over repeated runs, all inside ephemeral Docker containers with
//! memory/CPU ceilings and no network access. The calling host never executes
//! the submitted code itself.
//!
//! Request flow: [`executor::Executor`] allocates a disposable
//! [`workspace::Workspace`], dispatches to the [`languages`] adapter selected
//! by the request, which drives the [`sandbox::ContainerRuntime`] once per
//! toolchain command and parses the captured output into the shared
//! [`types`] contracts.

pub mod config;
pub mod executor;
pub mod languages;
pub mod sandbox;
pub mod server;
pub mod stats;
pub mod types;
pub mod workspace;

pub use executor::Executor;
pub use types::{ExecutionRequest, ExecutionResult, Language, MeasurementResult, ValidationResult};
