use clap::Parser;
use installer_core::{InstallService, InstallerConfig, SimulatorConfig};
use installer_server::{create_app_with, releases::GITHUB_API_URL, run_server, ReleaseClient};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to listen on
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    /// Directory receiving one subdirectory per install
    #[arg(short, long, default_value = "monitoring-install")]
    work_dir: PathBuf,

    /// Docker network every service joins
    #[arg(short, long, default_value = "monitoring")]
    network: String,

    /// Maximum number of concurrent install actions
    #[arg(short, long, default_value = "4")]
    max_concurrent: usize,

    /// Time each simulated step spends running
    #[arg(long, default_value = "1000")]
    step_delay_ms: u64,

    /// Chance that a simulated step fails
    #[arg(long, default_value = "0.1")]
    failure_probability: f64,

    /// Seconds a finished simulation stays readable
    #[arg(long, default_value = "600")]
    simulation_retention_secs: u64,

    /// Base URL of the GitHub API used for live release versions
    #[arg(long, default_value = GITHUB_API_URL)]
    release_api: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = InstallerConfig {
        max_concurrent_actions: args.max_concurrent,
        simulator: SimulatorConfig {
            step_delay_ms: args.step_delay_ms,
            failure_probability: args.failure_probability,
            retention_secs: args.simulation_retention_secs,
        },
        ..InstallerConfig::default()
    }
    .with_work_root(args.work_dir)
    .with_network(args.network);

    let releases = ReleaseClient::new(args.release_api)?;
    let app = create_app_with(InstallService::with_docker(config), releases);
    run_server(app, args.addr).await?;

    Ok(())
}
