//! Marathon v2 wire model.
//!
//! Only the fields Caravel reads or writes are modeled; everything the
//! remote adds on top is ignored on deserialization. Field names follow
//! the remote API's camelCase convention.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An application, as sent to `POST /v2/apps` and read back from
/// `GET /v2/apps/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    pub cpus: f64,
    pub mem: f64,
    pub instances: u32,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub health_checks: Vec<HealthCheck>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<String>,
    /// Response-only: tasks currently bound to this app.
    #[serde(default, skip_serializing)]
    pub tasks: Vec<Task>,
    /// Response-only: how many tasks the orchestrator reports running.
    #[serde(default, skip_serializing)]
    pub tasks_running: u32,
    /// Response-only: most recent task failure, if any.
    #[serde(default, skip_serializing)]
    pub last_task_failure: Option<TaskFailure>,
}

/// Container section of an app definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(rename = "type")]
    pub kind: String,
    pub docker: Docker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Docker {
    pub image: String,
    pub network: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub container_port: u16,
    /// 0 lets the orchestrator pick the host port.
    pub host_port: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub path: String,
    pub protocol: String,
    pub grace_period_seconds: u32,
}

/// A task bound to an app, from the app status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub staged_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub health_check_results: Vec<HealthCheckResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A group of apps and nested groups, from `GET /v2/groups/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub apps: Vec<App>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// Envelope around `GET /v2/apps/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppResponse {
    pub app: App,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_request_skips_response_fields() {
        let app = App {
            id: "/ticker".to_string(),
            args: Vec::new(),
            cpus: 0.5,
            mem: 512.0,
            instances: 1,
            env: HashMap::new(),
            container: None,
            health_checks: Vec::new(),
            constraints: Vec::new(),
            uris: Vec::new(),
            tasks: Vec::new(),
            tasks_running: 0,
            last_task_failure: None,
        };
        let json = serde_json::to_value(&app).unwrap();
        assert!(json.get("tasks").is_none());
        assert!(json.get("tasksRunning").is_none());
        assert!(json.get("env").is_none());
    }

    #[test]
    fn app_response_parses_remote_fields() {
        let json = r#"{
            "app": {
                "id": "/stream/ticker",
                "cpus": 0.5,
                "mem": 512.0,
                "instances": 2,
                "tasksRunning": 1,
                "tasks": [
                    {
                        "id": "stream_ticker.abc",
                        "host": "10.0.0.7",
                        "ports": [31022],
                        "stagedAt": "2016-05-01T12:00:00.000Z",
                        "startedAt": "2016-05-01T12:00:30.000Z",
                        "healthCheckResults": [{"alive": true}]
                    }
                ],
                "lastTaskFailure": {"message": "OOM", "timestamp": "2016-05-01T11:00:00.000Z"}
            }
        }"#;
        let response: AppResponse = serde_json::from_str(json).unwrap();
        let app = response.app;
        assert_eq!(app.instances, 2);
        assert_eq!(app.tasks_running, 1);
        assert_eq!(app.tasks[0].ports, vec![31022]);
        assert!(app.tasks[0].health_check_results[0].alive);
        assert!(app.last_task_failure.is_some());
    }

    #[test]
    fn group_parses_nested_groups() {
        let json = r#"{
            "id": "/stream",
            "apps": [],
            "groups": [
                {"id": "/stream/ticker", "apps": [{"id": "/stream/ticker/ticker-0", "cpus": 0.5, "mem": 512.0, "instances": 1}]}
            ]
        }"#;
        let group: Group = serde_json::from_str(json).unwrap();
        assert!(group.apps.is_empty());
        assert_eq!(group.groups[0].apps[0].id, "/stream/ticker/ticker-0");
    }
}
