//! Deployer and client error types.

use caravel_core::{InvalidDeploymentOption, InvalidEnvironmentVariable, MalformedConstraint};
use thiserror::Error;

/// Errors from the remote orchestrator's REST API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The addressed app or group does not exist. Expected and
    /// recovered in most flows; only surfaced when nothing else can
    /// interpret it.
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("api error (http status: {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors from deploy/undeploy/status operations.
#[derive(Debug, Error)]
pub enum DeployerError {
    #[error("app '{0}' is already deployed")]
    AlreadyDeployed(String),

    #[error(transparent)]
    Constraint(#[from] MalformedConstraint),

    #[error(transparent)]
    EnvVar(#[from] InvalidEnvironmentVariable),

    #[error(transparent)]
    DeploymentOption(#[from] InvalidDeploymentOption),

    #[error("deployment of '{id}' failed")]
    DeploymentFailed {
        id: String,
        #[source]
        source: ClientError,
    },

    #[error("undeploy of '{id}' failed")]
    UndeployFailed {
        id: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type DeployerResult<T> = Result<T, DeployerError>;
