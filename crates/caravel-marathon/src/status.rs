//! Status derivation from remote app and group state.
//!
//! Converts an orchestrator lookup result into a normalized
//! [`AppStatus`]: live tasks become "up" instance records, and the gap
//! to the requested instance count is padded with "down" records.
//! The remote API gives no reason for a missing replica (never
//! scheduled vs. crashed), so a down record only distinguishes
//! `failed` when the app carries a recorded task failure.

use std::collections::HashMap;

use caravel_core::{AppInstanceStatus, AppStatus, DeploymentState};

use crate::models::{App, Group, Task};

/// Outcome of resolving an external id against the orchestrator.
#[derive(Debug, Clone)]
pub enum AppLookup {
    /// The id names a single app.
    App(App),
    /// The id names a group; indexed deployments land here.
    Group(Group),
    /// Neither an app nor a group exists at this id.
    Absent,
}

/// Build the normalized status for an id from its lookup result.
pub fn build_app_status(id: &str, lookup: AppLookup) -> AppStatus {
    match lookup {
        AppLookup::App(app) => app_status(id, &app),
        AppLookup::Group(group) => group_status(id, &group),
        AppLookup::Absent => AppStatus::of(id),
    }
}

fn app_status(id: &str, app: &App) -> AppStatus {
    let mut status = AppStatus::of(id);
    for task in &app.tasks {
        status = status.with_instance(instance_up(app, task));
    }
    // Pad up to the requested count with records for replicas the
    // orchestrator never reported.
    for ordinal in app.tasks.len() as u32..app.instances {
        status = status.with_instance(instance_down(app, ordinal));
    }
    status
}

fn group_status(id: &str, group: &Group) -> AppStatus {
    let mut status = AppStatus::of(id);
    for (ordinal, app) in group.apps.iter().enumerate() {
        match app.tasks.first() {
            Some(task) => status = status.with_instance(instance_up(app, task)),
            None => status = status.with_instance(instance_down(app, ordinal as u32)),
        }
    }
    status
}

/// Status of a replica with a bound task.
fn instance_up(app: &App, task: &Task) -> AppInstanceStatus {
    let state = if app.instances > app.tasks_running {
        DeploymentState::Deploying
    } else {
        let alive = task
            .health_check_results
            .first()
            .is_some_and(|result| result.alive);
        if alive {
            DeploymentState::Deployed
        } else if app.last_task_failure.is_some() {
            DeploymentState::Failed
        } else {
            DeploymentState::Deploying
        }
    };

    let mut attributes = HashMap::new();
    if let Some(staged_at) = &task.staged_at {
        attributes.insert("staged_at".to_string(), staged_at.clone());
    }
    if let Some(started_at) = &task.started_at {
        attributes.insert("started_at".to_string(), started_at.clone());
    }
    if let Some(host) = &task.host {
        attributes.insert("host".to_string(), host.clone());
    }
    attributes.insert(
        "ports".to_string(),
        task.ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(","),
    );

    AppInstanceStatus {
        id: task.id.clone(),
        state,
        attributes,
    }
}

/// Status of a replica with no bound task. The id is deterministic so
/// repeated queries (and tests) see the same synthetic identifiers.
fn instance_down(app: &App, ordinal: u32) -> AppInstanceStatus {
    let state = if app.last_task_failure.is_some() {
        DeploymentState::Failed
    } else {
        DeploymentState::Unknown
    };
    AppInstanceStatus {
        id: format!("{}-failed-{}", app.id, ordinal),
        state,
        attributes: HashMap::new(),
    }
}
