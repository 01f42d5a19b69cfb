use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod config;

use commands::app::DeployArgs;
use commands::task::LaunchArgs;

#[derive(Parser)]
#[command(
    name = "caravel",
    about = "Caravel — deploy apps and launch jobs on two-tier cluster orchestrators",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Configuration file (default: ./caravel.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage long-running apps on the grouped-app orchestrator
    App {
        #[command(subcommand)]
        action: AppAction,
    },
    /// Manage one-off jobs on the scheduler
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
}

#[derive(Subcommand)]
enum AppAction {
    /// Deploy an app
    Deploy(DeployArgs),
    /// Undeploy an app or an indexed group
    Undeploy { id: String },
    /// Show the normalized status of an app
    Status {
        id: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Launch a one-off job
    Launch(LaunchArgs),
    /// Kill a job's running tasks
    Cancel { id: String },
    /// Remove a job definition from the scheduler
    Cleanup { id: String },
    /// Show the launch state of a job
    Status {
        id: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Trigger an immediate run of an existing job
    Run { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("caravel=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = config::CaravelConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::App { action } => match action {
            AppAction::Deploy(args) => commands::app::deploy(&config, args).await,
            AppAction::Undeploy { id } => commands::app::undeploy(&config, &id).await,
            AppAction::Status { id, format } => commands::app::status(&config, &id, &format).await,
        },
        Commands::Task { action } => match action {
            TaskAction::Launch(args) => commands::task::launch(&config, args).await,
            TaskAction::Cancel { id } => commands::task::cancel(&config, &id).await,
            TaskAction::Cleanup { id } => commands::task::cleanup(&config, &id).await,
            TaskAction::Status { id, format } => {
                commands::task::status(&config, &id, &format).await
            }
            TaskAction::Run { name } => commands::task::run(&config, &name).await,
        },
    }
}
