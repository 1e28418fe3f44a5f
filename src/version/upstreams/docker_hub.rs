//! Docker Hub tags API upstream

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{DOCKER_HUB_BASE_URL, DOCKER_HUB_PAGE_SIZE};
use crate::spec::enrich::Locator;
use crate::version::error::UpstreamError;
use crate::version::schema::SourceKind;
use crate::version::upstream::Upstream;
use crate::version::upstreams::{check_status, http_client};

/// One page of the tags listing
#[derive(Debug, Deserialize)]
struct TagsPage {
    next: Option<String>,
    #[serde(default)]
    results: Vec<Value>,
}

/// Upstream implementation for the Docker Hub API
pub struct DockerHubUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl DockerHubUpstream {
    /// Creates a new DockerHubUpstream with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for DockerHubUpstream {
    fn default() -> Self {
        Self::new(DOCKER_HUB_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Upstream for DockerHubUpstream {
    fn source_kind(&self) -> SourceKind {
        SourceKind::DockerHub
    }

    async fn fetch_records(&self, locator: &Locator) -> Result<Vec<Value>, UpstreamError> {
        let Locator::DockerHub { repository } = locator else {
            return Err(UpstreamError::Unsupported(format!("{:?}", locator)));
        };

        let mut url = format!(
            "{}/v2/repositories/{}/tags?page_size={}",
            self.base_url, repository, DOCKER_HUB_PAGE_SIZE
        );
        let mut records = Vec::new();

        loop {
            let response = self.client.get(&url).send().await?;
            let response = check_status(response, repository)?;

            let page: TagsPage = response.json().await.map_err(|e| {
                warn!("Failed to parse Docker Hub tags response: {}", e);
                UpstreamError::InvalidResponse(e.to_string())
            })?;
            records.extend(page.results);

            match page.next {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        debug!("Fetched {} tags for {}", records.len(), repository);
        Ok(records)
    }
}
