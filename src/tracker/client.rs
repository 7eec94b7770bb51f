//! reqwest-backed tracker client.

use crate::config::TrackerConfig;
use crate::tracker::{IterationScope, StoryFilter, TrackerApi, TrackerError};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

/// Header carrying the caller's API token.
pub const TOKEN_HEADER: &str = "X-TrackerToken";

/// Tracker client speaking the v3 XML API.
#[derive(Debug, Clone)]
pub struct HttpTracker {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpTracker {
    /// Create a client for the configured tracker host.
    pub fn new(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("trackboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| TrackerError::InvalidBaseUrl(config.base_url.clone()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// `{base}/services/v3/projects/{project}/{rest..}`. The project id is
    /// always one percent-encoded path segment.
    fn project_url(&self, project: &str, rest: &[&str]) -> Result<Url, TrackerError> {
        if matches!(project, "" | "." | "..") {
            return Err(TrackerError::InvalidProject(project.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TrackerError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["services", "v3", "projects", project])
            .extend(rest);
        Ok(url)
    }

    async fn fetch(
        &self,
        request: reqwest::RequestBuilder,
        api_key: &str,
    ) -> Result<String, TrackerError> {
        let response = request.header(TOKEN_HEADER, api_key).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TrackerApi for HttpTracker {
    async fn stories(
        &self,
        project: &str,
        api_key: &str,
        filter: &StoryFilter,
    ) -> Result<String, TrackerError> {
        let url = self.project_url(project, &["stories"])?;
        debug!("GET {} filter={}", url, filter);

        let mut request = self.http_client.get(url);
        if !filter.is_empty() {
            request = request.query(&[("filter", filter.to_string())]);
        }
        self.fetch(request, api_key).await
    }

    async fn iterations(
        &self,
        project: &str,
        api_key: &str,
        scope: IterationScope,
        limit: Option<u32>,
        offset: Option<i32>,
    ) -> Result<String, TrackerError> {
        let url = self.project_url(project, &["iterations", scope.path_segment()])?;
        debug!("GET {} limit={:?} offset={:?}", url, limit, offset);

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }

        let request = self.http_client.get(url).query(&params);
        self.fetch(request, api_key).await
    }
}
