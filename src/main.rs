use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use installer_core::{
    component_registry::{Architecture, DeploymentMode},
    templates, InstallAction, InstallRequest, RunStatus,
};
use monitoring_installer::{read_config_dir, ClientConfig, InstallerClient, PlanRequest};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Installer server base URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether Docker and Docker Compose are available on the server host
    Readiness,

    /// List the component catalog
    Components {
        #[arg(long)]
        arch: Option<Architecture>,
    },

    /// Published releases of a component
    Releases { component: String },

    /// Generate an install plan and optionally write it to disk
    Plan {
        #[arg(long, default_value = "single")]
        mode: DeploymentMode,

        /// Extra components on top of the resolved defaults
        #[arg(long = "component")]
        components: Vec<String>,

        /// Start from a predefined template instead of the defaults
        #[arg(long, conflicts_with = "components")]
        template: Option<String>,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Upload a written plan and install the given components
    Install {
        #[arg(long)]
        config_dir: PathBuf,

        #[arg(long = "component", required = true)]
        components: Vec<String>,
    },

    /// Container status of the given components
    Status {
        #[arg(long = "component", required = true)]
        components: Vec<String>,
    },

    /// Run a mock install and print its progress
    Simulate {
        #[arg(long = "component", required = true)]
        components: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(&cli.url).with_timeout(Duration::from_secs(cli.timeout));
    let client = InstallerClient::new(config)?;

    match cli.command {
        Command::Readiness => {
            let report = client.environment().await?;
            println!("docker:         {}", report.docker.version);
            println!("docker compose: {}", report.docker_compose.version);
            for container in &report.running_containers {
                println!("running:        {}", container);
            }
            println!("ready:          {}", report.ready);
        }
        Command::Components { arch } => {
            for component in client.components(arch).await? {
                println!(
                    "{:<16} {:<14} {:<10} {}",
                    component.id,
                    component.category,
                    component.latest_version.unwrap_or_default(),
                    component.download_url.unwrap_or_default()
                );
            }
        }
        Command::Releases { component } => {
            let releases = client.releases(&component).await?;
            info!("{} releases from {}", releases.name, releases.source);
            for release in &releases.versions {
                println!(
                    "{:<12} {:<22} {}",
                    release.version,
                    release.release_date.as_deref().unwrap_or("-"),
                    if release.is_latest { "latest" } else { "" }
                );
            }
        }
        Command::Plan {
            mode,
            components,
            template,
            out,
        } => {
            let request = match template {
                Some(id) => {
                    let template = templates::find(&id)
                        .with_context(|| format!("Unknown template: {}", id))?;
                    PlanRequest::new(
                        template.mode,
                        template.components.iter().map(|c| c.to_string()).collect(),
                    )
                }
                None => {
                    let mut selection = client.resolve(mode, &[], None).await?.selected;
                    for id in &components {
                        if !selection.contains(id) {
                            selection = client.resolve(mode, &selection, Some(id)).await?.selected;
                        }
                    }
                    PlanRequest::new(mode, selection)
                }
            };

            let report = client
                .check_versions(&request.components, &HashMap::new())
                .await?;
            for warning in &report.warnings {
                warn!("{}", warning);
            }

            let plan = client.generate_config(&request).await?;
            info!(
                "Plan has {} file(s) for {} component(s), about {} minute(s) to install",
                plan.summary.total_files,
                plan.summary.components,
                plan.summary.estimated_install_minutes
            );

            match out {
                Some(dir) => {
                    for file in &plan.files {
                        let path = dir.join(&file.filename);
                        if let Some(parent) = path.parent() {
                            tokio::fs::create_dir_all(parent).await?;
                        }
                        tokio::fs::write(&path, &file.content).await?;
                    }
                    println!("Wrote {} file(s) to {}", plan.files.len(), dir.display());
                }
                None => {
                    for file in &plan.files {
                        println!("{}  ({})", file.filename, file.description);
                    }
                }
            }
        }
        Command::Install {
            config_dir,
            components,
        } => {
            let configs = read_config_dir(&config_dir)
                .with_context(|| format!("Failed to read {}", config_dir.display()))?;
            if configs.is_empty() {
                bail!("No config files found in {}", config_dir.display());
            }

            let outcome = client
                .execute(&InstallRequest {
                    action: InstallAction::Install,
                    components,
                    configs: Some(configs),
                })
                .await?;

            print!("{}", outcome.output.unwrap_or_default());
            if !outcome.success {
                bail!("Install finished with errors: {}", outcome.errors.join("; "));
            }
        }
        Command::Status { components } => {
            let outcome = client
                .execute(&InstallRequest {
                    action: InstallAction::Status,
                    components,
                    configs: None,
                })
                .await?;
            for status in outcome.statuses.unwrap_or_default() {
                println!(
                    "{:<16} {:?} {}",
                    status.name,
                    status.status,
                    status.ports.join(", ")
                );
            }
        }
        Command::Simulate { components } => {
            let id = client.start_simulation(&components).await?;
            let mut printed = 0;
            loop {
                let progress = client.simulation(id).await?;
                for line in &progress.output[printed..] {
                    println!("{}", line);
                }
                printed = progress.output.len();

                if progress.is_finished() {
                    if progress.status != RunStatus::Completed {
                        bail!("Simulation ended as {:?}", progress.status);
                    }
                    break;
                }
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
        }
    }

    Ok(())
}
