//! Normalized workload status.
//!
//! The remote orchestrators report state in heterogeneous shapes (task
//! lists, health-check results, a CSV graph). These types are the
//! normalized view handed back to callers: one workload id plus an
//! ordered collection of per-instance states for apps, and a single
//! launch state for jobs. Everything here is recomputed on every query
//! and never stored.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Deployment state of an app or one of its instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    /// No remote object, or no signal to interpret yet.
    Unknown,
    /// The orchestrator is still converging on the requested state.
    Deploying,
    /// Running and passing its health check.
    Deployed,
    /// The orchestrator recorded a failure.
    Failed,
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            DeploymentState::Unknown => "unknown",
            DeploymentState::Deploying => "deploying",
            DeploymentState::Deployed => "deployed",
            DeploymentState::Failed => "failed",
        };
        f.write_str(token)
    }
}

/// State of one instance of a deployed app.
///
/// An instance record can also stand in for a replica the orchestrator
/// never scheduled (or that crashed). The remote API gives no
/// distinguishing reason, so such records carry no attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInstanceStatus {
    pub id: String,
    pub state: DeploymentState,
    /// Reported scheduling details: host, ports, staged/started timestamps.
    pub attributes: HashMap<String, String>,
}

/// Normalized status for one workload id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppStatus {
    id: String,
    instances: Vec<AppInstanceStatus>,
}

impl AppStatus {
    /// A status with no instances (state `unknown`).
    pub fn of(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instances: Vec::new(),
        }
    }

    pub fn with_instance(mut self, instance: AppInstanceStatus) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn instances(&self) -> &[AppInstanceStatus] {
        &self.instances
    }

    /// Overall state, derived from the instances on every call:
    /// no instances → `unknown`; any `failed` → `failed`; all
    /// `deployed` → `deployed`; all `unknown` → `unknown`; anything
    /// else → `deploying`. Callers wanting a different aggregation
    /// fold over [`AppStatus::instances`] themselves.
    pub fn state(&self) -> DeploymentState {
        if self.instances.is_empty() {
            return DeploymentState::Unknown;
        }
        if self
            .instances
            .iter()
            .any(|i| i.state == DeploymentState::Failed)
        {
            return DeploymentState::Failed;
        }
        if self
            .instances
            .iter()
            .all(|i| i.state == DeploymentState::Deployed)
        {
            return DeploymentState::Deployed;
        }
        if self
            .instances
            .iter()
            .all(|i| i.state == DeploymentState::Unknown)
        {
            return DeploymentState::Unknown;
        }
        DeploymentState::Deploying
    }
}

/// Launch state of a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchState {
    /// The scheduler does not know the job.
    Unknown,
    /// Queued but not yet running.
    Launching,
    /// Currently executing.
    Running,
    /// Last run finished successfully.
    Complete,
    /// Neither running, queued, nor successful. The scheduler's graph
    /// does not distinguish genuine failure from idle or cancelled
    /// jobs, so those all land here.
    Failed,
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            LaunchState::Unknown => "unknown",
            LaunchState::Launching => "launching",
            LaunchState::Running => "running",
            LaunchState::Complete => "complete",
            LaunchState::Failed => "failed",
        };
        f.write_str(token)
    }
}

/// Normalized status for one launched job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStatus {
    pub id: String,
    pub state: LaunchState,
}

impl TaskStatus {
    pub fn new(id: impl Into<String>, state: LaunchState) -> Self {
        Self {
            id: id.into(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(id: &str, state: DeploymentState) -> AppInstanceStatus {
        AppInstanceStatus {
            id: id.to_string(),
            state,
            attributes: HashMap::new(),
        }
    }

    #[test]
    fn empty_status_is_unknown() {
        let status = AppStatus::of("/ticker");
        assert_eq!(status.state(), DeploymentState::Unknown);
        assert!(status.instances().is_empty());
    }

    #[test]
    fn all_deployed_is_deployed() {
        let status = AppStatus::of("/ticker")
            .with_instance(instance("t-0", DeploymentState::Deployed))
            .with_instance(instance("t-1", DeploymentState::Deployed));
        assert_eq!(status.state(), DeploymentState::Deployed);
    }

    #[test]
    fn any_failed_wins() {
        let status = AppStatus::of("/ticker")
            .with_instance(instance("t-0", DeploymentState::Deployed))
            .with_instance(instance("t-1", DeploymentState::Failed));
        assert_eq!(status.state(), DeploymentState::Failed);
    }

    #[test]
    fn all_unknown_is_unknown() {
        let status = AppStatus::of("/ticker")
            .with_instance(instance("t-0", DeploymentState::Unknown))
            .with_instance(instance("t-1", DeploymentState::Unknown));
        assert_eq!(status.state(), DeploymentState::Unknown);
    }

    #[test]
    fn mixed_progress_is_deploying() {
        let status = AppStatus::of("/ticker")
            .with_instance(instance("t-0", DeploymentState::Deployed))
            .with_instance(instance("t-1", DeploymentState::Unknown));
        assert_eq!(status.state(), DeploymentState::Deploying);

        let status = AppStatus::of("/ticker")
            .with_instance(instance("t-0", DeploymentState::Deploying));
        assert_eq!(status.state(), DeploymentState::Deploying);
    }

    #[test]
    fn states_render_as_tokens() {
        assert_eq!(DeploymentState::Deploying.to_string(), "deploying");
        assert_eq!(LaunchState::Launching.to_string(), "launching");
    }
}
