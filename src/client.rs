use crate::api::{Deployment, DeploymentPage, Envelope, Environment};
use crate::config::{Auth, Settings};
use crate::error::{ApiError, Resource};
use anyhow::Result;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// The deployments endpoint serves at most this many records per page.
pub const MAX_PER_PAGE: u32 = 25;

/// Fixed delays used to stay under the API rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Between list pages.
    pub page_delay: Duration,
    /// After each delete while no delete has failed yet.
    pub delete_delay: Duration,
    /// After each delete once any delete has failed.
    pub failure_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(300),
            delete_delay: Duration::from_millis(500),
            failure_delay: Duration::from_millis(1000),
        }
    }
}

impl Pacing {
    pub const fn none() -> Self {
        Self {
            page_delay: Duration::ZERO,
            delete_delay: Duration::ZERO,
            failure_delay: Duration::ZERO,
        }
    }

    pub fn after_delete(&self, failed_so_far: usize) -> Duration {
        if failed_so_far > 0 {
            self.failure_delay
        } else {
            self.delete_delay
        }
    }
}

/// Clamp a requested page size to what the endpoint accepts.
pub fn per_page(limit: u32) -> u32 {
    limit.clamp(1, MAX_PER_PAGE)
}

pub struct PagesClient {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) account_id: String,
    pub(crate) project_name: String,
    pub(crate) auth: Auth,
    pub(crate) pacing: Pacing,
}

impl PagesClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("cf-pages-deleter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::debug!(
            scheme = settings.auth.scheme(),
            credential = ?settings.auth,
            "using {} authentication",
            settings.auth.scheme()
        );

        Ok(Self {
            client,
            base_url: settings.api_url.clone(),
            account_id: settings.account_id.clone(),
            project_name: settings.project_name.clone(),
            auth: settings.auth.clone(),
            pacing: Pacing::default(),
        })
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Token(token) => request.bearer_auth(token),
            Auth::Key { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        }
    }

    /// `{base}/accounts/{account}/pages/projects/{project}/deployments[/{extra}...]`
    fn deployments_url(&self, extra: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend([
                "accounts",
                self.account_id.as_str(),
                "pages",
                "projects",
                self.project_name.as_str(),
                "deployments",
            ])
            .extend(extra);
        Ok(url)
    }

    fn project_resource(&self) -> Resource {
        Resource::Project {
            account_id: self.account_id.clone(),
            project_name: self.project_name.clone(),
        }
    }

    fn parse_envelope<T: DeserializeOwned>(body: String) -> Result<Envelope<T>, ApiError> {
        match serde_json::from_str(&body) {
            Ok(envelope) => Ok(envelope),
            Err(source) => Err(ApiError::InvalidJson { body, source }),
        }
    }

    /// Fetch a single page of deployments.
    pub async fn list_deployments_page(
        &self,
        page: u32,
        per_page: u32,
        env: Option<Environment>,
    ) -> Result<DeploymentPage, ApiError> {
        let url = self.deployments_url(&[])?;

        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(env) = env {
            query.push(("env", env.as_str().to_string()));
        }

        tracing::debug!(
            url = %url,
            page,
            per_page,
            env = env.map(|e| e.as_str()),
            headers = ?self.auth.masked_headers(),
            "GET deployments"
        );

        let response = self
            .authorized(self.client.get(url))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = %status, "list response");

        if status != StatusCode::OK {
            return Err(ApiError::from_response(
                status,
                body,
                self.project_resource(),
                false,
            ));
        }

        let envelope: Envelope<Vec<Deployment>> = Self::parse_envelope(body)?;
        if !envelope.success {
            return Err(ApiError::Unsuccessful {
                errors: envelope.errors,
            });
        }

        Ok(DeploymentPage {
            deployments: envelope.result.unwrap_or_default(),
            result_info: envelope.result_info,
        })
    }

    /// Fetch every deployment across all pages, in API order.
    ///
    /// Sleeps for the page delay between consecutive requests. Any failed
    /// page aborts the whole listing.
    pub async fn list_deployments(
        &self,
        per_page: u32,
        env: Option<Environment>,
        pb: &indicatif::ProgressBar,
    ) -> Result<Vec<Deployment>, ApiError> {
        let mut all_deployments = Vec::new();
        let mut page = 1;

        loop {
            let current = self.list_deployments_page(page, per_page, env).await?;
            let total_pages = current.total_pages();
            all_deployments.extend(current.deployments);

            if total_pages > page {
                page += 1;
                let message = format!("Fetching page {} of {}...", page, total_pages);
                // A hidden bar swallows its own output; stdout may carry JSON.
                pb.suspend(|| eprintln!("{}", message));
                pb.set_message(message);
                tracing::info!(page, total_pages, "fetching next page");
                sleep(self.pacing.page_delay).await;
            } else {
                break;
            }
        }

        Ok(all_deployments)
    }

    /// Delete one deployment; `force` also removes aliased deployments.
    pub async fn delete_deployment(&self, deployment_id: &str, force: bool) -> Result<(), ApiError> {
        let mut url = self.deployments_url(&[deployment_id])?;
        if force {
            url.query_pairs_mut().append_pair("force", "true");
        }

        tracing::debug!(url = %url, "DELETE deployment");

        let response = self.authorized(self.client.delete(url)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = %status, "delete response");

        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            return Err(ApiError::from_response(
                status,
                body,
                Resource::Deployment {
                    project_name: self.project_name.clone(),
                    deployment_id: deployment_id.to_string(),
                },
                force,
            ));
        }

        if body.trim().is_empty() {
            return Ok(());
        }

        let envelope: Envelope<serde_json::Value> = Self::parse_envelope(body)?;
        if envelope.success {
            Ok(())
        } else {
            Err(ApiError::Unsuccessful {
                errors: envelope.errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_url: &str) -> Settings {
        Settings {
            account_id: "acc 1".to_string(),
            project_name: "my-site".to_string(),
            auth: Auth::Token("token".to_string()),
            api_url: Url::parse(api_url).unwrap(),
        }
    }

    #[test]
    fn test_per_page_is_clamped() {
        assert_eq!(per_page(0), 1);
        assert_eq!(per_page(10), 10);
        assert_eq!(per_page(25), 25);
        assert_eq!(per_page(50), 25);
    }

    #[test]
    fn test_pacing_after_delete() {
        let pacing = Pacing::default();
        assert_eq!(pacing.after_delete(0), Duration::from_millis(500));
        assert_eq!(pacing.after_delete(2), Duration::from_millis(1000));
        assert_eq!(pacing.page_delay, Duration::from_millis(300));
        assert_eq!(Pacing::none().after_delete(1), Duration::ZERO);
    }

    #[test]
    fn test_deployments_url_keeps_base_path() {
        let client =
            PagesClient::new(&settings("https://api.cloudflare.com/client/v4")).unwrap();
        let url = client.deployments_url(&[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.cloudflare.com/client/v4/accounts/acc%201/pages/projects/my-site/deployments"
        );
    }

    #[test]
    fn test_deployment_url_with_trailing_slash_base() {
        let client = PagesClient::new(&settings("http://localhost:8787/")).unwrap();
        let url = client.deployments_url(&["abc/123"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8787/accounts/acc%201/pages/projects/my-site/deployments/abc%2F123"
        );
    }
}
