//! Task subcommands against the job scheduler.

use std::collections::HashMap;

use clap::Args;

use caravel_chronos::{ChronosApi, ChronosClient, ChronosTaskLauncher};
use caravel_core::request::{CONSTRAINTS_PROPERTY_KEY, CPU_PROPERTY_KEY, MEMORY_PROPERTY_KEY};
use caravel_core::{AppDefinition, AppDeploymentRequest, TaskLauncher, parse_env_entries};

use crate::config::CaravelConfig;

#[derive(Debug, Args)]
pub struct LaunchArgs {
    /// Logical job name; the scheduler-side name gets a hash suffix
    pub name: String,
    /// Container image reference, e.g. myrepo/myjob:1.2
    pub image: String,
    /// Environment entry for the job, repeatable
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,
    /// Memory override in MiB
    #[arg(long)]
    pub memory: Option<f64>,
    /// Cpu share override
    #[arg(long)]
    pub cpu: Option<f64>,
    /// Placement constraint ("field op param?"), repeatable
    #[arg(long = "constraint", value_name = "CONSTRAINT")]
    pub constraints: Vec<String>,
    /// Command-line arguments for the container, after --
    #[arg(last = true)]
    pub args: Vec<String>,
}

fn client(config: &CaravelConfig) -> anyhow::Result<ChronosClient> {
    Ok(ChronosClient::new(
        &config.chronos.api_endpoint,
        config.chronos.auth_token.clone(),
    )?)
}

fn launcher(config: &CaravelConfig) -> anyhow::Result<ChronosTaskLauncher<ChronosClient>> {
    Ok(ChronosTaskLauncher::new(
        client(config)?,
        config.chronos.launcher_config(),
    ))
}

fn build_request(args: LaunchArgs) -> anyhow::Result<AppDeploymentRequest> {
    let mut definition = AppDefinition::new(args.name);
    definition.properties = parse_env_entries(&args.env)?;

    let mut options = HashMap::new();
    if let Some(memory) = args.memory {
        options.insert(MEMORY_PROPERTY_KEY.to_string(), memory.to_string());
    }
    if let Some(cpu) = args.cpu {
        options.insert(CPU_PROPERTY_KEY.to_string(), cpu.to_string());
    }
    if !args.constraints.is_empty() {
        options.insert(CONSTRAINTS_PROPERTY_KEY.to_string(), args.constraints.join(","));
    }

    Ok(AppDeploymentRequest::new(definition, args.image)
        .with_deployment_properties(options)
        .with_command_args(args.args))
}

pub async fn launch(config: &CaravelConfig, args: LaunchArgs) -> anyhow::Result<()> {
    let request = build_request(args)?;
    let name = launcher(config)?.launch(&request).await?;
    println!("launched {name}");
    Ok(())
}

pub async fn cancel(config: &CaravelConfig, id: &str) -> anyhow::Result<()> {
    launcher(config)?.cancel(id).await?;
    println!("cancelled {id}");
    Ok(())
}

pub async fn cleanup(config: &CaravelConfig, id: &str) -> anyhow::Result<()> {
    launcher(config)?.cleanup(id).await?;
    println!("cleaned up {id}");
    Ok(())
}

pub async fn status(config: &CaravelConfig, id: &str, format: &str) -> anyhow::Result<()> {
    let status = launcher(config)?.status(id).await?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => println!("{} {}", status.id, status.state),
    }
    Ok(())
}

/// Trigger an immediate run of an existing job definition.
pub async fn run(config: &CaravelConfig, name: &str) -> anyhow::Result<()> {
    client(config)?.run_job(name).await?;
    println!("triggered {name}");
    Ok(())
}
