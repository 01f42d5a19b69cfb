//! caravel-marathon — app deployment for Marathon-compatible
//! orchestrators.
//!
//! Implements the `caravel-core` [`AppDeployer`] contract against the
//! orchestrator's v2 REST API:
//!
//! - Single-instance and indexed multi-instance deployment
//! - Duplicate detection via a best-effort existence pre-check
//! - Bottom-up teardown of nested group hierarchies
//! - Normalized status derived from tasks and health-check results
//!
//! # Architecture
//!
//! ```text
//! MarathonAppDeployer<M: MarathonApi>
//!   ├── MarathonDeployerConfig (defaults, static env/constraints/uris)
//!   ├── deploy()   → App definitions via MarathonApi::create_app
//!   ├── undeploy() → iterative group teardown + parent pruning
//!   └── status()   → AppLookup {App, Group, Absent} → AppStatus
//! ```
//!
//! The deployer holds no state between calls; the remote orchestrator
//! is the system of record.
//!
//! [`AppDeployer`]: caravel_core::AppDeployer

pub mod client;
pub mod deployer;
pub mod error;
pub mod models;
pub mod status;

pub use client::{MarathonApi, MarathonClient};
pub use deployer::{MarathonAppDeployer, MarathonDeployerConfig};
pub use error::{ClientError, ClientResult, DeployerError, DeployerResult};
pub use status::{AppLookup, build_app_status};
