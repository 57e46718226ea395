//! Docker implementation of the isolated runtime controller.
//!
//! Each `run` call is the full lifecycle of one container: create with
//! resource ceilings and no network, start, race completion against the
//! timeout, collect combined output, force-remove.

use anyhow::{Context, Result};
use bollard::container::{
    Config as ContainerConfig, CreateContainerOptions, KillContainerOptions, LogOutput,
    LogsOptions, RemoveContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures_util::StreamExt;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{ContainerRuntime, RunOptions, RunOutput, SandboxError};

/// Mount point of the workspace inside every container.
const WORKDIR: &str = "/code";

/// Runs untrusted commands in ephemeral Docker containers.
pub struct DockerRuntime {
    docker: Docker,
    memory_bytes: i64,
    nano_cpus: i64,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon and verify it responds.
    ///
    /// `memory` and `cpus` are human-readable ceilings applied to every
    /// container, e.g. `"512m"` and `"1"`.
    pub async fn connect(memory: &str, cpus: &str) -> Result<Self> {
        let memory_bytes = parse_memory_limit(memory)?;
        let nano_cpus = parse_cpu_limit(cpus)?;

        let docker = Docker::connect_with_local_defaults()
            .context("Failed to connect to Docker. Is Docker running?")?;
        docker
            .ping()
            .await
            .context("Cannot ping Docker daemon. Is Docker running?")?;

        Ok(Self {
            docker,
            memory_bytes,
            nano_cpus,
        })
    }

    fn container_config(&self, image: &str, workspace: &Path, command: &[String]) -> ContainerConfig<String> {
        ContainerConfig {
            image: Some(image.to_string()),
            cmd: Some(command.to_vec()),
            working_dir: Some(WORKDIR.to_string()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(bollard::service::HostConfig {
                binds: Some(vec![format!("{}:{}", workspace.display(), WORKDIR)]),
                memory: Some(self.memory_bytes),
                nano_cpus: Some(self.nano_cpus),
                // Untrusted code: no exfiltration, no dependency downloads,
                // no probing the host network.
                network_mode: Some("none".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Start the container, race completion against the timeout, and collect
    /// output. Removal is handled by the caller on every path.
    async fn execute(&self, name: &str, options: RunOptions) -> Result<RunOutput, SandboxError> {
        self.docker
            .start_container::<String>(name, None)
            .await
            .map_err(|e| SandboxError::operation_failed(format!("Failed to start container: {e}")))?;

        let mut wait_stream = self.docker.wait_container(
            name,
            Some(WaitContainerOptions {
                condition: "not-running",
            }),
        );

        let exit_code = tokio::select! {
            outcome = wait_stream.next() => match outcome {
                Some(Ok(response)) => response.status_code,
                // bollard reports non-zero exits through the wait error; the
                // code is still a legitimate result at this layer.
                Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => code,
                Some(Err(e)) => {
                    return Err(SandboxError::operation_failed(format!(
                        "Failed waiting for container: {e}"
                    )));
                }
                None => {
                    return Err(SandboxError::operation_failed(
                        "Container wait stream ended unexpectedly",
                    ));
                }
            },
            () = tokio::time::sleep(options.timeout) => {
                warn!(container = name, timeout_ms = options.timeout.as_millis() as u64,
                    "execution timed out, killing container");
                let _ = self
                    .docker
                    .kill_container(name, None::<KillContainerOptions<String>>)
                    .await;
                return Err(SandboxError::timeout(options.timeout));
            }
        };

        let output = if options.capture_output {
            self.collect_output(name).await?
        } else {
            String::new()
        };

        debug!(container = name, exit_code, "container finished");
        Ok(RunOutput { exit_code, output })
    }

    /// Collect combined stdout+stderr after the container has exited.
    ///
    /// The engine multiplexes both streams into length-prefixed frames
    /// (1-byte stream tag, 3 reserved bytes, 4-byte big-endian payload
    /// length); bollard decodes those headers into typed [`LogOutput`]
    /// values. Payload bytes are accumulated in arrival order and decoded
    /// once at the end, so a multi-byte character split across frames is
    /// never corrupted. No line-oriented stripping happens anywhere.
    async fn collect_output(&self, name: &str) -> Result<String, SandboxError> {
        let mut stream = self.docker.logs(
            name,
            Some(LogsOptions::<String> {
                stdout: true,
                stderr: true,
                follow: false,
                ..Default::default()
            }),
        );

        let mut combined: Vec<u8> = Vec::new();
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(LogOutput::StdOut { message } | LogOutput::StdErr { message }) => {
                    combined.extend_from_slice(&message);
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(SandboxError::operation_failed(format!(
                        "Failed to read container logs: {e}"
                    )));
                }
            }
        }

        Ok(String::from_utf8_lossy(&combined).into_owned())
    }
}

#[async_trait::async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ensure_image(&self, image: &str) -> Result<(), SandboxError> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }

        // Check-then-pull is deliberately unguarded across concurrent
        // requests; the worst case is a redundant pull, never incorrectness.
        info!(image, "pulling toolchain image");
        let mut stream = self.docker.create_image(
            Some(CreateImageOptions {
                from_image: image,
                ..Default::default()
            }),
            None,
            None,
        );

        while let Some(progress) = stream.next().await {
            progress.map_err(|e| SandboxError::image_pull_failed(image, e.to_string()))?;
        }

        info!(image, "image ready");
        Ok(())
    }

    async fn run(
        &self,
        image: &str,
        workspace: &Path,
        command: &[String],
        options: RunOptions,
    ) -> Result<RunOutput, SandboxError> {
        self.ensure_image(image).await?;

        let name = format!("proofbench-{}", uuid::Uuid::new_v4());
        let config = self.container_config(image, workspace, command);

        debug!(container = %name, image, ?command, "creating container");
        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name: name.clone(),
                    platform: None,
                }),
                config,
            )
            .await
            .map_err(|e| SandboxError::instance_create_failed(e.to_string()))?;

        let result = self.execute(&name, options).await;

        // Force removal on every path: success, non-zero exit, timeout.
        let _ = self
            .docker
            .remove_container(
                &name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await;

        result
    }
}

/// Parse memory limit string (e.g., "8g", "512m") to bytes.
pub fn parse_memory_limit(limit: &str) -> Result<i64> {
    let limit = limit.to_lowercase();

    if let Some(num) = limit.strip_suffix('g') {
        let gigs: i64 = num.parse().context("Invalid memory limit")?;
        Ok(gigs * 1024 * 1024 * 1024)
    } else if let Some(num) = limit.strip_suffix('m') {
        let megs: i64 = num.parse().context("Invalid memory limit")?;
        Ok(megs * 1024 * 1024)
    } else {
        limit.parse().context("Invalid memory limit")
    }
}

/// Parse a CPU-count string (e.g., "1", "0.5") to nano-CPUs.
pub fn parse_cpu_limit(cpus: &str) -> Result<i64> {
    let count: f64 = cpus.parse().context("Invalid CPU limit")?;
    if count <= 0.0 {
        anyhow::bail!("CPU limit must be positive: {cpus}");
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok((count * 1_000_000_000.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_limit() {
        assert_eq!(parse_memory_limit("8g").unwrap(), 8 * 1024 * 1024 * 1024);
        assert_eq!(parse_memory_limit("512m").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_memory_limit("1G").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_memory_limit("1048576").unwrap(), 1_048_576);
        assert!(parse_memory_limit("lots").is_err());
    }

    #[test]
    fn test_parse_cpu_limit() {
        assert_eq!(parse_cpu_limit("1").unwrap(), 1_000_000_000);
        assert_eq!(parse_cpu_limit("0.5").unwrap(), 500_000_000);
        assert!(parse_cpu_limit("0").is_err());
        assert!(parse_cpu_limit("many").is_err());
    }

    #[tokio::test]
    async fn test_connect_handles_missing_daemon() {
        // Passes whether or not a Docker daemon is present; when it is not,
        // the error must point at Docker rather than at a panic.
        match DockerRuntime::connect("512m", "1").await {
            Ok(_) => {}
            Err(e) => {
                let message = e.to_string();
                assert!(
                    message.contains("Docker") || message.contains("docker"),
                    "unexpected error: {message}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_limits() {
        assert!(DockerRuntime::connect("lots", "1").await.is_err());
        assert!(DockerRuntime::connect("512m", "zero").await.is_err());
    }
}
