//! REST client for the job scheduler.
//!
//! [`ChronosApi`] is the seam the launcher works against; the
//! reqwest-backed [`ChronosClient`] is the production implementation.
//! The scheduler has no structured per-run status endpoint; run
//! history is only available through the CSV scheduling graph.

use std::time::Duration;

use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::models::Job;

/// The job surface of the remote scheduler.
pub trait ChronosApi {
    fn create_job(&self, job: &Job) -> impl Future<Output = ClientResult<()>>;

    fn jobs(&self) -> impl Future<Output = ClientResult<Vec<Job>>>;

    /// The scheduling graph: newline-separated rows, comma-separated
    /// fields, node rows marked by a leading `node` token.
    fn graph_csv(&self) -> impl Future<Output = ClientResult<String>>;

    /// Trigger an immediate run of an existing job.
    fn run_job(&self, name: &str) -> impl Future<Output = ClientResult<()>>;

    fn delete_job(&self, name: &str) -> impl Future<Output = ClientResult<()>>;

    /// Kill the running tasks of a job without removing the job.
    fn kill_tasks(&self, name: &str) -> impl Future<Output = ClientResult<()>>;
}

/// reqwest-backed Chronos client.
pub struct ChronosClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ChronosClient {
    /// Create a client for the given REST endpoint. The optional token
    /// is sent as a bearer `Authorization` header on every request.
    pub fn new(endpoint: &str, auth_token: Option<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: endpoint.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "chronos request");
        let mut request = self.http.request(method, url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn check(name: &str, response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl ChronosApi for ChronosClient {
    async fn create_job(&self, job: &Job) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::POST, "/v1/scheduler/iso8601")
            .json(job)
            .send()
            .await?;
        Self::check(&job.name, response).await?;
        Ok(())
    }

    async fn jobs(&self) -> ClientResult<Vec<Job>> {
        let response = self
            .request(reqwest::Method::GET, "/v1/scheduler/jobs")
            .send()
            .await?;
        let response = Self::check("jobs", response).await?;
        Ok(response.json().await?)
    }

    async fn graph_csv(&self) -> ClientResult<String> {
        let response = self
            .request(reqwest::Method::GET, "/v1/scheduler/graph/csv")
            .header(reqwest::header::ACCEPT, "text/plain")
            .send()
            .await?;
        let response = Self::check("graph", response).await?;
        Ok(response.text().await?)
    }

    async fn run_job(&self, name: &str) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/v1/scheduler/job/{name}"))
            .send()
            .await?;
        Self::check(name, response).await?;
        Ok(())
    }

    async fn delete_job(&self, name: &str) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/v1/scheduler/job/{name}"))
            .send()
            .await?;
        Self::check(name, response).await?;
        Ok(())
    }

    async fn kill_tasks(&self, name: &str) -> ClientResult<()> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/v1/scheduler/task/kill/{name}"),
            )
            .send()
            .await?;
        Self::check(name, response).await?;
        Ok(())
    }
}
