//! Launcher and client error types.

use caravel_core::{InvalidDeploymentOption, InvalidEnvironmentVariable, MalformedConstraint};
use thiserror::Error;

/// Errors from the remote scheduler's REST API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The addressed job does not exist; recovered during cleanup.
    #[error("job not found: {0}")]
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

/// Errors from launch/cancel/cleanup/status operations.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error(transparent)]
    Constraint(#[from] MalformedConstraint),

    #[error(transparent)]
    EnvVar(#[from] InvalidEnvironmentVariable),

    #[error(transparent)]
    DeploymentOption(#[from] InvalidDeploymentOption),

    #[error("launch of job '{name}' failed")]
    LaunchFailed {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("cancel of job '{name}' failed")]
    CancelFailed {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("cleanup of job '{name}' failed")]
    CleanupFailed {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type LauncherResult<T> = Result<T, LauncherError>;
