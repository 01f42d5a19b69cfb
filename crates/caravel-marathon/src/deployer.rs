//! App deployment against the grouped-app orchestrator.
//!
//! Translates a declarative [`AppDeploymentRequest`] into orchestrator
//! apps. A workload is addressed by a hierarchical external id
//! (`/group/name`); indexed placement fans one logical workload out
//! into N single-instance apps (`/group/name/name-i`), each carrying
//! its ordinal in an `INSTANCE_INDEX` environment variable.
//!
//! The remote orchestrator is the sole state of record: existence of
//! the app (or group) is the only deployment-state signal, and nothing
//! is cached between calls. The duplicate-deploy pre-check is
//! best-effort: it is not atomic with the subsequent create, so
//! concurrent deploys of the same name can still race.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use caravel_core::request::INSTANCE_INDEX_VAR;
use caravel_core::{
    AppDeployer, AppDeploymentRequest, AppStatus, Constraint, DeploymentState,
    MalformedConstraint, parse_constraint_list, parse_env_entries,
};

use crate::client::MarathonApi;
use crate::error::{DeployerError, DeployerResult};
use crate::models::{App, Container, Docker, HealthCheck, PortMapping};
use crate::status::{AppLookup, build_app_status};

const CONTAINER_PORT: u16 = 8080;
const HEALTH_CHECK_PATH: &str = "/health";
const HEALTH_CHECK_GRACE_PERIOD_SECS: u32 = 600;

/// Static deployer configuration. Per-deployment options on the
/// request override the numeric defaults; list-valued fields are
/// unioned with their request-side counterparts.
#[derive(Debug, Clone)]
pub struct MarathonDeployerConfig {
    /// Memory to allocate per app in MiB.
    pub memory: f64,
    /// Cpu shares to allocate per app.
    pub cpu: f64,
    /// `KEY=VALUE` environment variables applied to every app.
    pub environment_variables: Vec<String>,
    /// Raw `field op param?` constraints applied to every app.
    pub constraints: Vec<String>,
    /// Artifact URIs fetched into every app's sandbox.
    pub uris: Vec<String>,
    /// URI of a credentials archive for private registries, fetched
    /// alongside the other URIs.
    pub image_pull_secret: Option<String>,
}

impl Default for MarathonDeployerConfig {
    fn default() -> Self {
        Self {
            memory: 512.0,
            cpu: 0.5,
            environment_variables: Vec::new(),
            constraints: Vec::new(),
            uris: Vec::new(),
            image_pull_secret: None,
        }
    }
}

/// Deploys apps onto a Marathon-compatible orchestrator.
pub struct MarathonAppDeployer<M> {
    api: M,
    config: MarathonDeployerConfig,
}

impl<M: MarathonApi> MarathonAppDeployer<M> {
    pub fn new(api: M, config: MarathonDeployerConfig) -> Self {
        Self { api, config }
    }

    /// Union of configured constraints and the request's
    /// comma-delimited override, serialized to the wire's list-of-list
    /// form. Sorted so the produced app definition is deterministic.
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

    /// Union of configured URIs, the request's comma-delimited extras,
    /// and the image pull secret. First occurrence wins, order kept.
    fn deduce_uris(&self, request: &AppDeploymentRequest) -> Vec<String> {
        let mut uris = self.config.uris.clone();
        let extras = request
            .uris_override()
            .into_iter()
            .flat_map(|raw| raw.split(','))
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .map(str::to_string);
        for uri in extras.chain(self.config.image_pull_secret.clone()) {
            if !uris.contains(&uri) {
                uris.push(uri);
            }
        }
        uris
    }

    #[allow(clippy::too_many_arguments)]
    fn build_app(
        &self,
        id: String,
        request: &AppDeploymentRequest,
        container: Container,
        env: HashMap<String, String>,
        instances: u32,
        cpus: f64,
        mem: f64,
        constraints: Vec<Vec<String>>,
        uris: Vec<String>,
    ) -> App {
        App {
            id,
            args: request.command_args.clone(),
            cpus,
            mem,
            instances,
            env,
            container: Some(container),
            health_checks: vec![health_check()],
            constraints,
            uris,
            tasks: Vec::new(),
            tasks_running: 0,
            last_task_failure: None,
        }
    }

    async fn create_app(&self, app: &App) -> DeployerResult<()> {
        debug!(id = %app.id, "creating app");
        self.api
            .create_app(app)
            .await
            .map_err(|source| DeployerError::DeploymentFailed {
                id: app.id.clone(),
                source,
            })?;
        Ok(())
    }

    /// Delete one app, treating "not found" as already gone.
    async fn delete_app_quiet(&self, id: &str, app_id: &str) -> DeployerResult<()> {
        match self.api.delete_app(app_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(%app_id, "app already gone");
                Ok(())
            }
            Err(source) => Err(DeployerError::UndeployFailed {
                id: id.to_string(),
                source,
            }),
        }
    }

    /// Delete one group, treating "not found" as already gone.
    async fn delete_group_quiet(&self, id: &str, group_id: &str) -> DeployerResult<()> {
        match self.api.delete_group(group_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(source) => Err(DeployerError::UndeployFailed {
                id: id.to_string(),
                source,
            }),
        }
    }

    async fn get_group_for_undeploy(
        &self,
        id: &str,
        group_id: &str,
    ) -> DeployerResult<Option<crate::models::Group>> {
        self.api
            .get_group(group_id)
            .await
            .map_err(|source| DeployerError::UndeployFailed {
                id: id.to_string(),
                source,
            })
    }

    /// Tear a group down bottom-up: empty the leaf sub-groups (or the
    /// group itself), delete the group once it holds nothing, then
    /// prune the parent if that emptied it too.
    async fn teardown_group(&self, id: &str, root: crate::models::Group) -> DeployerResult<()> {
        // Leaf discovery is iterative; hierarchies can be arbitrarily
        // deep and recursion depth must not depend on remote data.
        let mut leaves = Vec::new();
        let mut stack = vec![root];
        while let Some(mut group) = stack.pop() {
            let children = std::mem::take(&mut group.groups);
            if children.is_empty() {
                leaves.push(group);
            } else {
                stack.extend(children);
            }
        }

        for leaf in &leaves {
            for app in &leaf.apps {
                info!(app_id = %app.id, "deleting app");
                self.delete_app_quiet(id, &app.id).await?;
            }
            if leaf.id != id
                && let Some(group) = self.get_group_for_undeploy(id, &leaf.id).await?
                && group.apps.is_empty()
                && group.groups.is_empty()
            {
                info!(group_id = %leaf.id, "deleting emptied sub-group");
                self.delete_group_quiet(id, &leaf.id).await?;
            }
        }

        if let Some(group) = self.get_group_for_undeploy(id, id).await?
            && group.apps.is_empty()
            && group.groups.is_empty()
        {
            info!(group_id = %id, "deleting emptied group");
            self.delete_group_quiet(id, id).await?;
        }

        self.prune_parent(id).await
    }

    /// Delete the parent group if removing this workload emptied it,
    /// so the last indexed instance does not leave an orphaned node.
    async fn prune_parent(&self, id: &str) -> DeployerResult<()> {
        let Some(parent) = parent_id(id) else {
            return Ok(());
        };
        if let Some(group) = self.get_group_for_undeploy(id, parent).await?
            && group.apps.is_empty()
            && group.groups.is_empty()
        {
            info!(group_id = %parent, "deleting emptied parent group");
            self.delete_group_quiet(id, parent).await?;
        }
        Ok(())
    }
}

impl<M: MarathonApi> AppDeployer for MarathonAppDeployer<M> {
    type Error = DeployerError;

    async fn deploy(&self, request: &AppDeploymentRequest) -> DeployerResult<String> {
        let name = &request.definition.name;
        let base_id = app_id(request.group(), name);
        info!(%name, id = %base_id, "deploying app");

        // Local validation happens before any remote call.
        let static_env = parse_env_entries(&self.config.environment_variables)?;
        let constraints = self.deduce_constraints(request)?;
        let cpus = request.cpu_override()?.unwrap_or(self.config.cpu);
        let memory = request.memory_override()?.unwrap_or(self.config.memory);
        let count = request.count()?;
        let uris = self.deduce_uris(request);

        let container = container_spec(&request.image);
        debug!(image = %request.image, "using container image");

        if request.indexed() {
            if self
                .api
                .get_group(&base_id)
                .await?
                .is_some()
            {
                return Err(DeployerError::AlreadyDeployed(name.clone()));
            }
            for index in 0..count {
                let member_id = format!("{base_id}/{name}-{index}");
                let mut env = static_env.clone();
                env.extend(request.definition.properties.clone());
                env.insert(INSTANCE_INDEX_VAR.to_string(), index.to_string());
                let app = self.build_app(
                    member_id,
                    request,
                    container.clone(),
                    env,
                    1,
                    cpus,
                    memory,
                    constraints.clone(),
                    uris.clone(),
                );
                self.create_app(&app).await?;
            }
        } else {
            let current = self.status(&base_id).await?;
            if current.state() != DeploymentState::Unknown {
                return Err(DeployerError::AlreadyDeployed(name.clone()));
            }
            let mut env = static_env;
            env.extend(request.definition.properties.clone());
            let app = self.build_app(
                base_id.clone(),
                request,
                container,
                env,
                count,
                cpus,
                memory,
                constraints,
                uris,
            );
            self.create_app(&app).await?;
        }

        Ok(base_id)
    }

    async fn undeploy(&self, id: &str) -> DeployerResult<()> {
        info!(%id, "undeploying");

        if let Some(group) = self.get_group_for_undeploy(id, id).await? {
            return self.teardown_group(id, group).await;
        }

        match self.api.delete_app(id).await {
            Ok(()) => self.prune_parent(id).await,
            Err(e) if e.is_not_found() => {
                // The group lookup already missed, so either a group
                // materialized between the two calls or there is
                // nothing deployed under this id at all.
                match self.get_group_for_undeploy(id, id).await? {
                    Some(group) => self.teardown_group(id, group).await,
                    None => {
                        warn!(%id, "nothing deployed under id, undeploy is a no-op");
                        Ok(())
                    }
                }
            }
            Err(source) => Err(DeployerError::UndeployFailed {
                id: id.to_string(),
                source,
            }),
        }
    }

    async fn status(&self, id: &str) -> DeployerResult<AppStatus> {
        let lookup = match self.api.get_app(id).await? {
            Some(app) => AppLookup::App(app),
            None => match self.api.get_group(id).await? {
                Some(group) => AppLookup::Group(group),
                None => AppLookup::Absent,
            },
        };
        let status = build_app_status(id, lookup);
        debug!(%id, state = %status.state(), "app status");
        Ok(status)
    }
}

/// Derive the hierarchical external id for a deployment.
fn app_id(group: Option<&str>, name: &str) -> String {
    match group {
        Some(group) => format!("/{}/{name}", group.trim_matches('/')),
        None => format!("/{name}"),
    }
}

/// One path segment up, stopping above top-level entries.
fn parent_id(id: &str) -> Option<&str> {
    match id.rfind('/') {
        Some(0) | None => None,
        Some(pos) => Some(&id[..pos]),
    }
}

/// Container launch specification: the orchestrator maps the fixed
/// container port to a host port of its choosing on a bridged network.
fn container_spec(image: &str) -> Container {
    Container {
        kind: "DOCKER".to_string(),
        docker: Docker {
            image: image.to_string(),
            network: "BRIDGE".to_string(),
            port_mappings: vec![PortMapping {
                container_port: CONTAINER_PORT,
                host_port: 0,
                protocol: "tcp".to_string(),
            }],
        },
    }
}

fn health_check() -> HealthCheck {
    HealthCheck {
        path: HEALTH_CHECK_PATH.to_string(),
        protocol: "HTTP".to_string(),
        grace_period_seconds: HEALTH_CHECK_GRACE_PERIOD_SECS,
    }
}
