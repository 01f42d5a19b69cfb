//! Task launching against the job scheduler.
//!
//! Translates an [`AppDeploymentRequest`] into a run-once docker job.
//! Job names get a hash suffix derived from the logical name and the
//! launch time, so repeated launches of the same definition do not
//! collide in the scheduler's flat namespace.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use caravel_core::{
    AppDeploymentRequest, Constraint, MalformedConstraint, TaskLauncher, TaskStatus,
    parse_constraint_list, parse_env_entries,
};

use crate::client::ChronosApi;
use crate::error::{LauncherError, LauncherResult};
use crate::graph::classify;
use crate::models::{EnvVar, Job, JobContainer};

/// Run once, immediately, with no repetition period.
const RUN_ONCE_SCHEDULE: &str = "R1//P";
const JOB_RETRIES: u32 = 1;

/// Static launcher configuration. Per-launch options on the request
/// override the numeric defaults.
#[derive(Debug, Clone)]
pub struct ChronosLauncherConfig {
    /// Memory to allocate per job in MiB.
    pub memory: f64,
    /// Cpu shares to allocate per job.
    pub cpu: f64,
    /// `KEY=VALUE` environment variables applied to every job.
    pub environment_variables: Vec<String>,
    /// Raw `field op param?` constraints applied to every job.
    pub constraints: Vec<String>,
    /// Artifact URIs fetched before the job starts.
    pub uris: Vec<String>,
    /// Email address recorded as the job owner.
    pub owner_email: Option<String>,
    /// Name recorded as the job owner.
    pub owner_name: Option<String>,
}

impl Default for ChronosLauncherConfig {
    fn default() -> Self {
        Self {
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

/// Launches one-off tasks on a Chronos-compatible scheduler.
pub struct ChronosTaskLauncher<C> {
    api: C,
    config: ChronosLauncherConfig,
}

impl<C: ChronosApi> ChronosTaskLauncher<C> {
    pub fn new(api: C, config: ChronosLauncherConfig) -> Self {
        Self { api, config }
    }

    fn deduce_constraints(
        &self,
        request: &AppDeploymentRequest,
    ) -> Result<Vec<Vec<String>>, MalformedConstraint> {
        let mut set = self
            .config
            .constraints
            .iter()
            .map(|raw| raw.parse())
            .collect::<Result<HashSet<Constraint>, _>>()?;
        if let Some(raw) = request.constraints_override() {
            set.extend(parse_constraint_list(raw)?);
        }
        let mut constraints: Vec<Vec<String>> =
            set.into_iter().map(|c| c.to_string_list()).collect();
        constraints.sort();
        Ok(constraints)
    }

    fn build_job(&self, name: String, request: &AppDeploymentRequest) -> LauncherResult<Job> {
        let mut env = parse_env_entries(&self.config.environment_variables)?;
        env.extend(request.definition.properties.clone());
        let mut environment_variables: Vec<EnvVar> = env
            .into_iter()
            .map(|(name, value)| EnvVar { name, value })
            .collect();
        environment_variables.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Job {
            name,
            command: String::new(),
            shell: false,
            schedule: Some(RUN_ONCE_SCHEDULE.to_string()),
            retries: Some(JOB_RETRIES),
            arguments: request.command_args.clone(),
            environment_variables,
            cpus: Some(request.cpu_override()?.unwrap_or(self.config.cpu)),
            mem: Some(request.memory_override()?.unwrap_or(self.config.memory)),
            constraints: self.deduce_constraints(request)?,
            uris: self.config.uris.clone(),
            owner: self.config.owner_email.clone(),
            owner_name: self.config.owner_name.clone(),
            container: Some(JobContainer {
                kind: "DOCKER".to_string(),
                image: request.image.clone(),
            }),
        })
    }
}

impl<C: ChronosApi> TaskLauncher for ChronosTaskLauncher<C> {
    type Error = LauncherError;

    async fn launch(&self, request: &AppDeploymentRequest) -> LauncherResult<String> {
        let name = job_name(&request.definition.name, now_millis());
        info!(job = %name, image = %request.image, "launching job");

        let job = self.build_job(name.clone(), request)?;
        debug!(job = %name, "creating job definition");
        self.api
            .create_job(&job)
            .await
            .map_err(|source| LauncherError::LaunchFailed {
                name: name.clone(),
                source,
            })?;
        Ok(name)
    }

    async fn cancel(&self, id: &str) -> LauncherResult<()> {
        info!(job = %id, "cancelling job tasks");
        match self.api.kill_tasks(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!(job = %id, "job not found, cancel is a no-op");
                Ok(())
            }
            Err(source) => Err(LauncherError::CancelFailed {
                name: id.to_string(),
                source,
            }),
        }
    }

    async fn cleanup(&self, id: &str) -> LauncherResult<()> {
        info!(job = %id, "removing job definition");
        match self.api.delete_job(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!(job = %id, "job not found, cleanup is a no-op");
                Ok(())
            }
            Err(source) => Err(LauncherError::CleanupFailed {
                name: id.to_string(),
                source,
            }),
        }
    }

    async fn status(&self, id: &str) -> LauncherResult<TaskStatus> {
        let csv = self.api.graph_csv().await?;
        let jobs = self.api.jobs().await?;
        let status = classify(id, &jobs, &csv);
        debug!(job = %id, state = %status.state, "job status");
        Ok(status)
    }
}

/// Derive a collision-resistant job name: the logical name plus a
/// short hash of the name and launch-time millis.
fn job_name(name: &str, now_millis: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(now_millis.to_be_bytes());
    let digest = hasher.finalize();
    format!("{name}-{}", hex::encode(&digest[..4]))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use caravel_core::{AppDefinition, LaunchState};
    use caravel_core::request::{CONSTRAINTS_PROPERTY_KEY, CPU_PROPERTY_KEY, MEMORY_PROPERTY_KEY};

    use super::*;
    use crate::error::ClientError;

    #[derive(Default)]
    struct FakeState {
        created: Vec<Job>,
        jobs: Vec<Job>,
        csv: String,
        killed: Vec<String>,
        deleted: Vec<String>,
        missing: bool,
        fail_create: bool,
    }

    #[derive(Default)]
    struct FakeChronos {
        state: Mutex<FakeState>,
    }

    impl FakeChronos {
        fn with_graph(self, jobs: &[&str], csv: &str) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state.jobs = jobs.iter().map(|name| Job::named(*name)).collect();
                state.csv = csv.to_string();
            }
            self
        }

        fn missing_jobs(self) -> Self {
            self.state.lock().unwrap().missing = true;
            self
        }

        fn failing_create(self) -> Self {
            self.state.lock().unwrap().fail_create = true;
            self
        }

        fn created(&self) -> Vec<Job> {
            self.state.lock().unwrap().created.clone()
        }
    }

    impl ChronosApi for FakeChronos {
        async fn create_job(&self, job: &Job) -> crate::error::ClientResult<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_create {
                return Err(ClientError::Api {
                    status: 500,
                    message: "scheduler unavailable".to_string(),
                });
            }
            state.created.push(job.clone());
            Ok(())
        }

        async fn jobs(&self) -> crate::error::ClientResult<Vec<Job>> {
            Ok(self.state.lock().unwrap().jobs.clone())
        }

        async fn graph_csv(&self) -> crate::error::ClientResult<String> {
            Ok(self.state.lock().unwrap().csv.clone())
        }

        async fn run_job(&self, _name: &str) -> crate::error::ClientResult<()> {
            Ok(())
        }

        async fn delete_job(&self, name: &str) -> crate::error::ClientResult<()> {
            let mut state = self.state.lock().unwrap();
            if state.missing {
                return Err(ClientError::NotFound(name.to_string()));
            }
            state.deleted.push(name.to_string());
            Ok(())
        }

        async fn kill_tasks(&self, name: &str) -> crate::error::ClientResult<()> {
            let mut state = self.state.lock().unwrap();
            if state.missing {
                return Err(ClientError::NotFound(name.to_string()));
            }
            state.killed.push(name.to_string());
            Ok(())
        }
    }

    fn launcher(api: FakeChronos) -> ChronosTaskLauncher<FakeChronos> {
        ChronosTaskLauncher::new(api, ChronosLauncherConfig::default())
    }

    fn request(name: &str) -> AppDeploymentRequest {
        AppDeploymentRequest::new(AppDefinition::new(name), "myrepo/ticker:1.0")
    }

    #[test]
    fn job_name_is_deterministic_for_fixed_inputs() {
        let a = job_name("ticker", 1_462_104_000_000);
        let b = job_name("ticker", 1_462_104_000_000);
        assert_eq!(a, b);
        assert!(a.starts_with("ticker-"));
        assert_eq!(a.len(), "ticker-".len() + 8);
    }

    #[test]
    fn job_name_varies_with_launch_time() {
        assert_ne!(job_name("ticker", 1), job_name("ticker", 2));
    }

    #[tokio::test]
    async fn launch_creates_a_run_once_docker_job() {
        let launcher = launcher(FakeChronos::default());
        let name = launcher.launch(&request("ticker")).await.unwrap();

        let created = launcher.api.created();
        let job = &created[0];
        assert_eq!(job.name, name);
        assert_eq!(job.schedule.as_deref(), Some("R1//P"));
        assert_eq!(job.retries, Some(1));
        assert!(!job.shell);
        assert_eq!(job.command, "");
        assert_eq!(job.cpus, Some(0.5));
        assert_eq!(job.mem, Some(512.0));
        let container = job.container.as_ref().unwrap();
        assert_eq!(container.kind, "DOCKER");
        assert_eq!(container.image, "myrepo/ticker:1.0");
    }

    #[tokio::test]
    async fn launch_passes_arguments_and_owner() {
        let config = ChronosLauncherConfig {
            owner_email: Some("ops@example.com".to_string()),
            owner_name: Some("Ops".to_string()),
            uris: vec!["http://repo/common.tar.gz".to_string()],
            ..ChronosLauncherConfig::default()
        };
        let launcher = ChronosTaskLauncher::new(FakeChronos::default(), config);
        let request = request("ticker").with_command_args(vec!["--fast".to_string()]);

        launcher.launch(&request).await.unwrap();
        let job = &launcher.api.created()[0];
        assert_eq!(job.arguments, vec!["--fast"]);
        assert_eq!(job.owner.as_deref(), Some("ops@example.com"));
        assert_eq!(job.owner_name.as_deref(), Some("Ops"));
        assert_eq!(job.uris, vec!["http://repo/common.tar.gz"]);
    }

    #[tokio::test]
    async fn definition_properties_override_static_environment() {
        let config = ChronosLauncherConfig {
            environment_variables: vec!["FOO=static".to_string(), "KEEP=yes".to_string()],
            ..ChronosLauncherConfig::default()
        };
        let launcher = ChronosTaskLauncher::new(FakeChronos::default(), config);
        let mut definition = AppDefinition::new("ticker");
        definition
            .properties
            .insert("FOO".to_string(), "definition".to_string());
        let request = AppDeploymentRequest::new(definition, "myrepo/ticker:1.0");

        launcher.launch(&request).await.unwrap();
        let job = &launcher.api.created()[0];
        let env: Vec<(&str, &str)> = job
            .environment_variables
            .iter()
            .map(|var| (var.name.as_str(), var.value.as_str()))
            .collect();
        assert_eq!(env, vec![("FOO", "definition"), ("KEEP", "yes")]);
    }

    #[tokio::test]
    async fn launch_resolves_overrides_and_constraints() {
        let config = ChronosLauncherConfig {
            constraints: vec!["hostname UNIQUE".to_string()],
            ..ChronosLauncherConfig::default()
        };
        let launcher = ChronosTaskLauncher::new(FakeChronos::default(), config);
        let mut request = request("ticker");
        request.deployment_properties.insert(
            MEMORY_PROPERTY_KEY.to_string(),
            "1024".to_string(),
        );
        request
            .deployment_properties
            .insert(CPU_PROPERTY_KEY.to_string(), "2".to_string());
        request.deployment_properties.insert(
            CONSTRAINTS_PROPERTY_KEY.to_string(),
            "hostname UNIQUE,rack_id CLUSTER rack-1".to_string(),
        );

        launcher.launch(&request).await.unwrap();
        let job = &launcher.api.created()[0];
        assert_eq!(job.mem, Some(1024.0));
        assert_eq!(job.cpus, Some(2.0));
        assert_eq!(
            job.constraints,
            vec![
                vec!["hostname".to_string(), "UNIQUE".to_string()],
                vec![
                    "rack_id".to_string(),
                    "CLUSTER".to_string(),
                    "rack-1".to_string()
                ],
            ]
        );
    }

    #[tokio::test]
    async fn malformed_static_env_fails_before_any_remote_call() {
        let config = ChronosLauncherConfig {
            environment_variables: vec!["BROKEN".to_string()],
            ..ChronosLauncherConfig::default()
        };
        let launcher = ChronosTaskLauncher::new(FakeChronos::default(), config);

        let err = launcher.launch(&request("ticker")).await.unwrap_err();
        assert!(matches!(err, LauncherError::EnvVar(_)));
        assert!(launcher.api.created().is_empty());
    }

    #[tokio::test]
    async fn remote_create_failure_surfaces_as_launch_failed() {
        let launcher = launcher(FakeChronos::default().failing_create());
        let err = launcher.launch(&request("ticker")).await.unwrap_err();
        assert!(matches!(err, LauncherError::LaunchFailed { .. }));
    }

    #[tokio::test]
    async fn cancel_kills_tasks() {
        let launcher = launcher(FakeChronos::default());
        launcher.cancel("ticker-abc12345").await.unwrap();
        assert_eq!(
            launcher.api.state.lock().unwrap().killed,
            vec!["ticker-abc12345"]
        );
    }

    #[tokio::test]
    async fn cancel_of_missing_job_is_a_noop() {
        let launcher = launcher(FakeChronos::default().missing_jobs());
        assert!(launcher.cancel("ticker-abc12345").await.is_ok());
    }

    #[tokio::test]
    async fn cleanup_deletes_the_job_definition() {
        let launcher = launcher(FakeChronos::default());
        launcher.cleanup("ticker-abc12345").await.unwrap();
        assert_eq!(
            launcher.api.state.lock().unwrap().deleted,
            vec!["ticker-abc12345"]
        );
    }

    #[tokio::test]
    async fn cleanup_of_missing_job_is_a_noop() {
        let launcher = launcher(FakeChronos::default().missing_jobs());
        assert!(launcher.cleanup("ticker-abc12345").await.is_ok());
    }

    #[tokio::test]
    async fn status_classifies_from_job_list_and_graph() {
        let launcher = launcher(
            FakeChronos::default().with_graph(&["ticker-abc12345"], "node,ticker-abc12345,success,idle"),
        );
        let status = launcher.status("ticker-abc12345").await.unwrap();
        assert_eq!(status.state, LaunchState::Complete);
    }

    #[tokio::test]
    async fn status_of_unlisted_job_is_unknown() {
        let launcher = launcher(FakeChronos::default());
        let status = launcher.status("ticker-abc12345").await.unwrap();
        assert_eq!(status.state, LaunchState::Unknown);
    }
}
