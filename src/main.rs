use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use proofbench::config::Config;
use proofbench::sandbox::{ContainerRuntime, DockerRuntime};
use proofbench::server::build_server;
use proofbench::{Executor, Language};

#[derive(Parser)]
#[command(name = "proofbench")]
#[command(
    author,
    version,
    about = "Sandboxed code execution and benchmarking service"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP execution service
    Serve {
        /// Address to bind to (overrides config)
        #[arg(short, long)]
        bind: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory containing proofbench.toml
        #[arg(short, long, default_value = ".")]
        config: PathBuf,
    },

    /// Pull the container images for all supported languages
    PullImages {
        /// Pull only the image for one language
        #[arg(short, long)]
        language: Option<String>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("proofbench=debug")
    } else {
        EnvFilter::new("proofbench=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve { bind, port, config } => {
            serve(bind, port, &config).await?;
        }
        Commands::PullImages { language } => {
            pull_images(language.as_deref()).await?;
        }
    }

    Ok(())
}

async fn serve(bind: Option<String>, port: Option<u16>, config_dir: &std::path::Path) -> Result<()> {
    let config = Config::load(config_dir)?;

    let runtime = DockerRuntime::connect(&config.sandbox.memory, &config.sandbox.cpus).await?;

    let workspace_root = PathBuf::from(&config.executor.workspace_root);
    std::fs::create_dir_all(&workspace_root).with_context(|| {
        format!(
            "Failed to create workspace root: {}",
            workspace_root.display()
        )
    })?;

    let executor = Arc::new(Executor::new(Arc::new(runtime), workspace_root));

    let addr = (
        bind.unwrap_or(config.server.bind_address),
        port.unwrap_or(config.server.port),
    );
    info!(address = %addr.0, port = addr.1, "starting server");

    build_server(executor, addr)?.await?;
    Ok(())
}

async fn pull_images(language: Option<&str>) -> Result<()> {
    let config = Config::load(std::path::Path::new("."))?;
    let runtime = DockerRuntime::connect(&config.sandbox.memory, &config.sandbox.cpus).await?;

    // Several languages share an image; pull each one once.
    let images: BTreeSet<&str> = match language {
        Some(name) => {
            let language: Language = name.parse()?;
            std::iter::once(proofbench::languages::adapter_for(language).image()).collect()
        }
        None => Language::ALL
            .iter()
            .map(|&l| proofbench::languages::adapter_for(l).image())
            .collect(),
    };

    for image in images {
        info!(image, "pulling image");
        runtime.ensure_image(image).await?;
        info!(image, "image ready");
    }

    Ok(())
}
