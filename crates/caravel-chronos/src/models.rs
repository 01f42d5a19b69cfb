//! Chronos wire model.
//!
//! One `Job` struct serves both directions: the fields Caravel writes
//! when creating a docker job and the subset it reads back from the
//! scheduler's job list. Field names follow the remote API's
//! camelCase convention.

use serde::{Deserialize, Serialize};

/// A scheduler job definition.
///
/// `command` and `shell` are always serialized; the scheduler
/// requires an explicit empty command with `shell: false` for
/// container jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub shell: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<JobContainer>,
}

impl Job {
    /// A bare job with only a name, as the job list often returns.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: String::new(),
            shell: false,
            schedule: None,
            retries: None,
            arguments: Vec::new(),
            environment_variables: Vec::new(),
            cpus: None,
            mem: None,
            constraints: Vec::new(),
            uris: Vec::new(),
            owner: None,
            owner_name: None,
            container: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContainer {
    #[serde(rename = "type")]
    pub kind: String,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_serializes_required_fields_even_when_empty() {
        let job = Job::named("ticker-abc");
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json.get("command").unwrap(), "");
        assert_eq!(json.get("shell").unwrap(), false);
        assert!(json.get("arguments").is_none());
        assert!(json.get("environmentVariables").is_none());
    }

    #[test]
    fn job_list_entry_parses_with_name_only() {
        let job: Job = serde_json::from_str(r#"{"name": "ticker-abc"}"#).unwrap();
        assert_eq!(job.name, "ticker-abc");
        assert!(job.schedule.is_none());
    }

    #[test]
    fn container_field_uses_type_key() {
        let mut job = Job::named("ticker-abc");
        job.container = Some(JobContainer {
            kind: "DOCKER".to_string(),
            image: "myrepo/ticker:1.0".to_string(),
        });
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["container"]["type"], "DOCKER");
        assert_eq!(json["container"]["image"], "myrepo/ticker:1.0");
    }
}
