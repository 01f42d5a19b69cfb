//! REST client for the grouped-app orchestrator.
//!
//! [`MarathonApi`] is the seam the deployer works against; the
//! reqwest-backed [`MarathonClient`] is the production implementation.
//! Tests substitute an in-memory fake.

use std::time::Duration;

use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::models::{App, AppResponse, Group};

/// The app/group surface of the remote orchestrator.
///
/// "Not found" is explicit: gets return `None`, deletes fail with
/// [`ClientError::NotFound`] so callers can decide whether it matters.
pub trait MarathonApi {
    fn create_app(&self, app: &App) -> impl Future<Output = ClientResult<App>>;

    fn get_app(&self, id: &str) -> impl Future<Output = ClientResult<Option<App>>>;

    fn delete_app(&self, id: &str) -> impl Future<Output = ClientResult<()>>;

    fn get_group(&self, id: &str) -> impl Future<Output = ClientResult<Option<Group>>>;

    fn delete_group(&self, id: &str) -> impl Future<Output = ClientResult<()>>;
}

/// reqwest-backed Marathon v2 client.
pub struct MarathonClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl MarathonClient {
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
        debug!(%method, %url, "marathon request");
        let mut request = self.http.request(method, url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Map a response to `Ok`, `NotFound` or `Api`.
    async fn check(id: &str, response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(id.to_string()));
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

impl MarathonApi for MarathonClient {
    async fn create_app(&self, app: &App) -> ClientResult<App> {
        let response = self
            .request(reqwest::Method::POST, "/v2/apps")
            .json(app)
            .send()
            .await?;
        let response = Self::check(&app.id, response).await?;
        Ok(response.json().await?)
    }

    async fn get_app(&self, id: &str) -> ClientResult<Option<App>> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v2/apps{id}"))
            .send()
            .await?;
        match Self::check(id, response).await {
            Ok(response) => {
                let envelope: AppResponse = response.json().await?;
                Ok(Some(envelope.app))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_app(&self, id: &str) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/v2/apps{id}"))
            .send()
            .await?;
        Self::check(id, response).await?;
        Ok(())
    }

    async fn get_group(&self, id: &str) -> ClientResult<Option<Group>> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v2/groups{id}"))
            .send()
            .await?;
        match Self::check(id, response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_group(&self, id: &str) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/v2/groups{id}"))
            .send()
            .await?;
        Self::check(id, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = MarathonClient::new("http://marathon.local:8080/", None).unwrap();
        assert_eq!(client.base_url(), "http://marathon.local:8080");
    }

    #[test]
    fn client_keeps_clean_endpoint() {
        let client = MarathonClient::new("http://marathon.local:8080", None).unwrap();
        assert_eq!(client.base_url(), "http://marathon.local:8080");
    }
}
