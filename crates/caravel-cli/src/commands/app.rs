//! App subcommands against the grouped-app orchestrator.

use std::collections::HashMap;

use clap::Args;

use caravel_core::request::{
    CONSTRAINTS_PROPERTY_KEY, COUNT_PROPERTY_KEY, CPU_PROPERTY_KEY, GROUP_PROPERTY_KEY,
    INDEXED_PROPERTY_KEY, MEMORY_PROPERTY_KEY, URIS_PROPERTY_KEY,
};
use caravel_core::{AppDefinition, AppDeployer, AppDeploymentRequest, parse_env_entries};
use caravel_marathon::{MarathonAppDeployer, MarathonClient};

use crate::config::CaravelConfig;

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Logical app name
    pub name: String,
    /// Container image reference, e.g. myrepo/myapp:1.2
    pub image: String,
    /// Group to place the app under
    #[arg(long)]
    pub group: Option<String>,
    /// Number of instances
    #[arg(long)]
    pub count: Option<u32>,
    /// Fan out into independently addressable single-instance apps
    #[arg(long)]
    pub indexed: bool,
    /// Environment entry for the app, repeatable
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
    /// Extra artifact URI, repeatable
    #[arg(long = "uri", value_name = "URI")]
    pub uris: Vec<String>,
    /// Command-line arguments for the container, after --
    #[arg(last = true)]
    pub args: Vec<String>,
}

fn deployer(config: &CaravelConfig) -> anyhow::Result<MarathonAppDeployer<MarathonClient>> {
    let client = MarathonClient::new(
        &config.marathon.api_endpoint,
        config.marathon.auth_token.clone(),
    )?;
    Ok(MarathonAppDeployer::new(
        client,
        config.marathon.deployer_config(),
    ))
}

fn build_request(args: DeployArgs) -> anyhow::Result<AppDeploymentRequest> {
    let mut definition = AppDefinition::new(args.name);
    definition.properties = parse_env_entries(&args.env)?;

    let mut options = HashMap::new();
    if let Some(group) = args.group {
        options.insert(GROUP_PROPERTY_KEY.to_string(), group);
    }
    if let Some(count) = args.count {
        options.insert(COUNT_PROPERTY_KEY.to_string(), count.to_string());
    }
    if args.indexed {
        options.insert(INDEXED_PROPERTY_KEY.to_string(), "true".to_string());
    }
    if let Some(memory) = args.memory {
        options.insert(MEMORY_PROPERTY_KEY.to_string(), memory.to_string());
    }
    if let Some(cpu) = args.cpu {
        options.insert(CPU_PROPERTY_KEY.to_string(), cpu.to_string());
    }
    if !args.constraints.is_empty() {
        options.insert(CONSTRAINTS_PROPERTY_KEY.to_string(), args.constraints.join(","));
    }
    if !args.uris.is_empty() {
        options.insert(URIS_PROPERTY_KEY.to_string(), args.uris.join(","));
    }

    Ok(AppDeploymentRequest::new(definition, args.image)
        .with_deployment_properties(options)
        .with_command_args(args.args))
}

pub async fn deploy(config: &CaravelConfig, args: DeployArgs) -> anyhow::Result<()> {
    let request = build_request(args)?;
    let id = deployer(config)?.deploy(&request).await?;
    println!("deployed {id}");
    Ok(())
}

pub async fn undeploy(config: &CaravelConfig, id: &str) -> anyhow::Result<()> {
    deployer(config)?.undeploy(id).await?;
    println!("undeployed {id}");
    Ok(())
}

pub async fn status(config: &CaravelConfig, id: &str, format: &str) -> anyhow::Result<()> {
    let status = deployer(config)?.status(id).await?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => {
            println!("{} {}", status.id(), status.state());
            for instance in status.instances() {
                let host = instance
                    .attributes
                    .get("host")
                    .map(String::as_str)
                    .unwrap_or("-");
                println!("  {}  {}  {}", instance.id, instance.state, host);
            }
        }
    }
    Ok(())
}
