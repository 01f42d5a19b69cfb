//! caravel-core — shared model for the Caravel deployer.
//!
//! Holds everything the backend crates (`caravel-marathon`,
//! `caravel-chronos`) have in common:
//!
//! - The declarative [`AppDeploymentRequest`] input and its
//!   deployment-option keys
//! - Placement [`Constraint`]s and their parser
//! - `KEY=VALUE` environment variable validation
//! - Normalized status types ([`AppStatus`], [`TaskStatus`]) and the
//!   states derived from remote signals
//! - The [`AppDeployer`] and [`TaskLauncher`] contracts the backends
//!   implement
//!
//! Caravel keeps no state of its own: every operation is a stateless
//! translation against a remote orchestrator, and all types here are
//! built fresh per call.

pub mod constraint;
pub mod env;
pub mod request;
pub mod status;

pub use constraint::{Constraint, MalformedConstraint, parse_constraint_list};
pub use env::{InvalidEnvironmentVariable, parse_env_entries};
pub use request::{AppDefinition, AppDeploymentRequest, InvalidDeploymentOption};
pub use status::{AppInstanceStatus, AppStatus, DeploymentState, LaunchState, TaskStatus};

/// Contract for deploying long-running apps onto an orchestrator.
///
/// `deploy` returns the external id under which the workload is
/// addressable; `status` degrades to an empty `unknown` status for ids
/// with no remote counterpart instead of failing.
pub trait AppDeployer {
    type Error;

    fn deploy(
        &self,
        request: &AppDeploymentRequest,
    ) -> impl Future<Output = Result<String, Self::Error>>;

    fn undeploy(&self, id: &str) -> impl Future<Output = Result<(), Self::Error>>;

    fn status(&self, id: &str) -> impl Future<Output = Result<AppStatus, Self::Error>>;
}

/// Contract for launching one-off tasks on a job scheduler.
///
/// `cancel` stops a job's running tasks; `cleanup` removes the job
/// definition itself. `status` returns `unknown` for names the
/// scheduler does not know.
pub trait TaskLauncher {
    type Error;

    fn launch(
        &self,
        request: &AppDeploymentRequest,
    ) -> impl Future<Output = Result<String, Self::Error>>;

    fn cancel(&self, id: &str) -> impl Future<Output = Result<(), Self::Error>>;

    fn cleanup(&self, id: &str) -> impl Future<Output = Result<(), Self::Error>>;

    fn status(&self, id: &str) -> impl Future<Output = Result<TaskStatus, Self::Error>>;
}
