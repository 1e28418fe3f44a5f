//! Artifactory docker repository upstream
//!
//! Every pushed tag has a `manifest.json` item under `<image>/<tag>/` in the
//! docker repository; one AQL query lists them all with their creation time,
//! creator and checksum.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::spec::enrich::Locator;
use crate::version::error::UpstreamError;
use crate::version::schema::SourceKind;
use crate::version::upstream::Upstream;
use crate::version::upstreams::{check_status, http_client};

/// Response from the AQL search API
#[derive(Debug, Deserialize)]
struct AqlResponse {
    #[serde(default)]
    results: Vec<AqlItem>,
}

#[derive(Debug, Deserialize)]
struct AqlItem {
    path: String,
    created: Option<String>,
    created_by: Option<String>,
    sha256: Option<String>,
}

/// Upstream implementation for docker repositories hosted in Artifactory
pub struct ArtifactoryUpstream {
    client: reqwest::Client,
}

impl ArtifactoryUpstream {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }

    fn query(registry: &str, image: &str) -> String {
        let criteria = json!({
            "repo": registry,
            "path": {"$match": format!("{}/*", image)},
            "name": "manifest.json",
        });
        format!(
            r#"items.find({}).include("repo","path","name","created","created_by","sha256")"#,
            criteria
        )
    }

    /// Turns AQL items into tag records, skipping items nested deeper than
    /// `<image>/<tag>`
    fn into_records(image: &str, items: Vec<AqlItem>) -> Vec<Value> {
        let prefix = format!("{}/", image);
        items
            .into_iter()
            .filter_map(|item| {
                let tag = item.path.strip_prefix(&prefix)?.to_string();
                if tag.is_empty() || tag.contains('/') {
                    return None;
                }
                Some(json!({
                    "tag": tag,
                    "path": item.path,
                    "created": item.created,
                    "created_by": item.created_by,
                    "sha256": item.sha256,
                }))
            })
            .collect()
    }
}

impl Default for ArtifactoryUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Upstream for ArtifactoryUpstream {
    fn source_kind(&self) -> SourceKind {
        SourceKind::DockerArtifactory
    }

    async fn fetch_records(&self, locator: &Locator) -> Result<Vec<Value>, UpstreamError> {
        let Locator::DockerArtifactory {
            api,
            registry,
            image,
        } = locator
        else {
            return Err(UpstreamError::Unsupported(format!("{:?}", locator)));
        };

        let url = format!("{}/api/search/aql", api);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "text/plain")
            .body(Self::query(registry, image))
            .send()
            .await?;
        let response = check_status(response, &format!("{}/{}", registry, image))?;

        let body: AqlResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Artifactory AQL response: {}", e);
            UpstreamError::InvalidResponse(e.to_string())
        })?;

        let records = Self::into_records(image, body.results);
        debug!("Fetched {} tags for {}/{}", records.len(), registry, image);
        Ok(records)
    }
}
