//! npm registry API upstream

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::NPM_REGISTRY_BASE_URL;
use crate::spec::enrich::Locator;
use crate::version::error::UpstreamError;
use crate::version::schema::SourceKind;
use crate::version::upstream::Upstream;
use crate::version::upstreams::{check_status, http_client};

/// Response from npm registry API
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(default)]
    versions: Map<String, Value>,
    #[serde(default)]
    time: Map<String, Value>,
}

/// Upstream implementation for npm registry API
pub struct NpmUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl NpmUpstream {
    /// Creates a new NpmUpstream with a custom default registry URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }

    /// One record per published version, carrying its publish time
    fn into_records(package: NpmPackageResponse) -> Vec<Value> {
        let NpmPackageResponse { versions, time } = package;
        versions
            .into_iter()
            .map(|(version, manifest)| {
                let mut record = match manifest {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                record
                    .entry("version")
                    .or_insert_with(|| Value::String(version.clone()));
                if let Some(published) = time.get(&version) {
                    record.insert("time".to_string(), published.clone());
                }
                Value::Object(record)
            })
            .collect()
    }
}

impl Default for NpmUpstream {
    fn default() -> Self {
        Self::new(NPM_REGISTRY_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Upstream for NpmUpstream {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Npm
    }

    async fn fetch_records(&self, locator: &Locator) -> Result<Vec<Value>, UpstreamError> {
        let Locator::Npm { registry, name } = locator else {
            return Err(UpstreamError::Unsupported(format!("{:?}", locator)));
        };

        let base_url = registry
            .as_deref()
            .map(|r| r.trim_end_matches('/'))
            .unwrap_or(&self.base_url);
        let url = format!("{}/{}", base_url, Self::encode_package_name(name));

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, name)?;

        let package: NpmPackageResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse npm registry response: {}", e);
            UpstreamError::InvalidResponse(e.to_string())
        })?;

        let records = Self::into_records(package);
        debug!("Fetched {} versions for {}", records.len(), name);
        Ok(records)
    }
}
