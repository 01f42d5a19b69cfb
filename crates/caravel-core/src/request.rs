//! Deployment requests.
//!
//! An [`AppDeploymentRequest`] is the declarative input to both the app
//! deployer and the task launcher: a named definition whose properties
//! become the workload's environment, a deployment-scoped option map,
//! a container image reference, and optional command-line arguments.
//! The request is immutable input owned by the caller.

use std::collections::HashMap;

use thiserror::Error;

/// Deployment option: id of the group the app should be placed under.
pub const GROUP_PROPERTY_KEY: &str = "caravel.deployer.group";

/// Deployment option: number of instances to run.
pub const COUNT_PROPERTY_KEY: &str = "caravel.deployer.count";

/// Deployment option: fan the workload out into independently
/// addressable single-instance apps instead of one multi-instance app.
pub const INDEXED_PROPERTY_KEY: &str = "caravel.deployer.indexed";

/// Deployment option: memory override in MiB.
pub const MEMORY_PROPERTY_KEY: &str = "caravel.deployer.memory";

/// Deployment option: cpu share override.
pub const CPU_PROPERTY_KEY: &str = "caravel.deployer.cpu";

/// Deployment option: comma-delimited placement constraints.
pub const CONSTRAINTS_PROPERTY_KEY: &str = "caravel.deployer.constraints";

/// Deployment option: comma-delimited extra artifact URIs.
pub const URIS_PROPERTY_KEY: &str = "caravel.deployer.uris";

/// Environment variable carrying the instance ordinal in indexed mode.
pub const INSTANCE_INDEX_VAR: &str = "INSTANCE_INDEX";

/// A deployment option value that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value [{value}] for deployment option {key}")]
pub struct InvalidDeploymentOption {
    pub key: &'static str,
    pub value: String,
}

/// The logical unit being deployed: a name plus the properties that
/// become its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDefinition {
    pub name: String,
    pub properties: HashMap<String, String>,
}

impl AppDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }
}

/// A request to deploy an app or launch a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDeploymentRequest {
    /// What to deploy.
    pub definition: AppDefinition,
    /// Deployment-scoped options (see the `*_PROPERTY_KEY` constants).
    pub deployment_properties: HashMap<String, String>,
    /// Container image reference, e.g. `myrepo/myapp:1.2`.
    pub image: String,
    /// Command-line arguments passed to the container.
    pub command_args: Vec<String>,
}

impl AppDeploymentRequest {
    pub fn new(definition: AppDefinition, image: impl Into<String>) -> Self {
        Self {
            definition,
            deployment_properties: HashMap::new(),
            image: image.into(),
            command_args: Vec::new(),
        }
    }

    pub fn with_deployment_properties(self, properties: HashMap<String, String>) -> Self {
        Self {
            deployment_properties: properties,
            ..self
        }
    }

    pub fn with_command_args(self, args: Vec<String>) -> Self {
        Self {
            command_args: args,
            ..self
        }
    }

    /// Group the app should be placed under, if any.
    pub fn group(&self) -> Option<&str> {
        self.deployment_properties
            .get(GROUP_PROPERTY_KEY)
            .map(String::as_str)
    }

    /// Requested instance count (defaults to 1).
    pub fn count(&self) -> Result<u32, InvalidDeploymentOption> {
        match self.deployment_properties.get(COUNT_PROPERTY_KEY) {
            Some(raw) => raw.parse().map_err(|_| InvalidDeploymentOption {
                key: COUNT_PROPERTY_KEY,
                value: raw.clone(),
            }),
            None => Ok(1),
        }
    }

    /// Whether indexed (per-instance addressable) placement was requested.
    pub fn indexed(&self) -> bool {
        self.deployment_properties
            .get(INDEXED_PROPERTY_KEY)
            .is_some_and(|v| v == "true")
    }

    /// Per-deployment memory override in MiB.
    pub fn memory_override(&self) -> Result<Option<f64>, InvalidDeploymentOption> {
        self.numeric_option(MEMORY_PROPERTY_KEY)
    }

    /// Per-deployment cpu share override.
    pub fn cpu_override(&self) -> Result<Option<f64>, InvalidDeploymentOption> {
        self.numeric_option(CPU_PROPERTY_KEY)
    }

    /// Comma-delimited constraint strings supplied with the request.
    pub fn constraints_override(&self) -> Option<&str> {
        self.deployment_properties
            .get(CONSTRAINTS_PROPERTY_KEY)
            .map(String::as_str)
    }

    /// Comma-delimited extra URIs supplied with the request.
    pub fn uris_override(&self) -> Option<&str> {
        self.deployment_properties
            .get(URIS_PROPERTY_KEY)
            .map(String::as_str)
    }

    fn numeric_option(
        &self,
        key: &'static str,
    ) -> Result<Option<f64>, InvalidDeploymentOption> {
        match self.deployment_properties.get(key) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| InvalidDeploymentOption {
                    key,
                    value: raw.clone(),
                }),
            None => Ok(None),
        }
    }
}
