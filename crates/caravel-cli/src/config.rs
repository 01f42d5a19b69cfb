//! caravel.toml parsing.
//!
//! The configuration file carries everything the deployer and
//! launcher constructors need: endpoints, auth, resource defaults and
//! the static env/constraint/uri sets. Every field has a default, so
//! an empty (or absent) file yields a working local setup.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use caravel_chronos::ChronosLauncherConfig;
use caravel_marathon::MarathonDeployerConfig;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "caravel.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaravelConfig {
    pub marathon: MarathonSection,
    pub chronos: ChronosSection,
}

/// `[marathon]` section: the grouped-app orchestrator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarathonSection {
    /// Location of the orchestrator's REST endpoint.
    pub api_endpoint: String,
    /// Bearer token sent with every request.
    pub auth_token: Option<String>,
    /// Memory to allocate per app in MiB, overridable per deployment.
    pub memory: f64,
    /// Cpu shares to allocate per app, overridable per deployment.
    pub cpu: f64,
    /// `KEY=VALUE` environment variables for every deployed app.
    pub environment_variables: Vec<String>,
    /// `field op param?` constraints for every deployed app.
    pub constraints: Vec<String>,
    /// Artifact URIs fetched into every app's sandbox.
    pub uris: Vec<String>,
    /// URI of a credentials archive for private registries.
    pub image_pull_secret: Option<String>,
}

impl Default for MarathonSection {
    fn default() -> Self {
        Self {
            api_endpoint: "http://localhost:8080".to_string(),
            auth_token: None,
            memory: 512.0,
            cpu: 0.5,
            environment_variables: Vec::new(),
            constraints: Vec::new(),
            uris: Vec::new(),
            image_pull_secret: None,
        }
    }
}

impl MarathonSection {
    pub fn deployer_config(&self) -> MarathonDeployerConfig {
        MarathonDeployerConfig {
            memory: self.memory,
            cpu: self.cpu,
            environment_variables: self.environment_variables.clone(),
            constraints: self.constraints.clone(),
            uris: self.uris.clone(),
            image_pull_secret: self.image_pull_secret.clone(),
        }
    }
}

/// `[chronos]` section: the job scheduler.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChronosSection {
    /// Location of the scheduler's REST endpoint.
    pub api_endpoint: String,
    /// Bearer token sent with every request.
    pub auth_token: Option<String>,
    /// Memory to allocate per job in MiB, overridable per launch.
    pub memory: f64,
    /// Cpu shares to allocate per job, overridable per launch.
    pub cpu: f64,
    /// `KEY=VALUE` environment variables for every launched job.
    pub environment_variables: Vec<String>,
    /// `field op param?` constraints for every launched job.
    pub constraints: Vec<String>,
    /// Artifact URIs fetched before each job starts.
    pub uris: Vec<String>,
    /// Email address recorded as the job owner.
    pub owner_email: Option<String>,
    /// Name recorded as the job owner.
    pub owner_name: Option<String>,
}

impl Default for ChronosSection {
    fn default() -> Self {
        Self {
            api_endpoint: "http://localhost:4400".to_string(),
            auth_token: None,
            memory: 512.0,
            cpu: 0.5,
            environment_variables: Vec::new(),
            constraints: Vec::new(),
            uris: Vec::new(),
            owner_email: None,
            owner_name: None,
        }
    }
}

impl ChronosSection {
    pub fn launcher_config(&self) -> ChronosLauncherConfig {
        ChronosLauncherConfig {
            memory: self.memory,
            cpu: self.cpu,
            environment_variables: self.environment_variables.clone(),
            constraints: self.constraints.clone(),
            uris: self.uris.clone(),
            owner_email: self.owner_email.clone(),
            owner_name: self.owner_name.clone(),
        }
    }
}

impl CaravelConfig {
    /// Load configuration from an explicit path, or from
    /// `./caravel.toml` if present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_point_at_local_services() {
        let config = CaravelConfig::default();
        assert_eq!(config.marathon.api_endpoint, "http://localhost:8080");
        assert_eq!(config.chronos.api_endpoint, "http://localhost:4400");
        assert_eq!(config.marathon.memory, 512.0);
        assert_eq!(config.chronos.cpu, 0.5);
    }

    #[test]
    fn parses_full_config_file() {
        let raw = r#"
            [marathon]
            api_endpoint = "http://marathon.example.com:8080"
            auth_token = "secret"
            memory = 1024.0
            cpu = 1.0
            environment_variables = ["FOO=bar"]
            constraints = ["hostname UNIQUE"]
            uris = ["http://repo/common.tar.gz"]
            image_pull_secret = "file:///etc/docker.tar.gz"

            [chronos]
            api_endpoint = "http://chronos.example.com:4400"
            owner_email = "ops@example.com"
            owner_name = "Ops"
        "#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let config = CaravelConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.marathon.api_endpoint, "http://marathon.example.com:8080");
        assert_eq!(config.marathon.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.marathon.memory, 1024.0);
        assert_eq!(config.marathon.environment_variables, vec!["FOO=bar"]);
        assert_eq!(config.chronos.owner_email.as_deref(), Some("ops@example.com"));
        // Unset fields keep their defaults.
        assert_eq!(config.chronos.memory, 512.0);
    }

    #[test]
    fn partial_sections_fill_with_defaults() {
        let raw = r#"
            [marathon]
            api_endpoint = "http://marathon.example.com:8080"
        "#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let config = CaravelConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.marathon.cpu, 0.5);
        assert_eq!(config.chronos.api_endpoint, "http://localhost:4400");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = CaravelConfig::load(Some(Path::new("/nonexistent/caravel.toml"))).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }

    #[test]
    fn sections_convert_to_component_configs() {
        let config = CaravelConfig::default();
        let deployer = config.marathon.deployer_config();
        assert_eq!(deployer.memory, 512.0);
        let launcher = config.chronos.launcher_config();
        assert_eq!(launcher.cpu, 0.5);
    }
}
