//! Upstream implementations for fetching version records

pub mod artifactory;
pub mod command;
pub mod docker_hub;
pub mod ecr;
pub mod npm;
pub mod rpm;
pub mod voom;

pub use artifactory::ArtifactoryUpstream;
pub use docker_hub::DockerHubUpstream;
pub use ecr::EcrUpstream;
pub use npm::NpmUpstream;
pub use rpm::RpmUpstream;
pub use voom::VoomUpstream;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::config::{ResolveOptions, USER_AGENT};
use crate::version::error::UpstreamError;
use crate::version::schema::SourceKind;
use crate::version::upstream::Upstream;

/// Builds the HTTP client shared by registry upstreams
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to create HTTP client")
}

/// Maps non-success statuses onto upstream errors
pub(crate) fn check_status(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(UpstreamError::NotFound(what.to_string()));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(UpstreamError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        warn!("{} returned status {}: {}", what, status, response.url());
        return Err(UpstreamError::InvalidResponse(format!(
            "Unexpected status: {}",
            status
        )));
    }

    Ok(response)
}

/// Create the default set of upstreams for every queryable source kind
pub fn create_default_upstreams(options: &ResolveOptions) -> HashMap<SourceKind, Arc<dyn Upstream>> {
    let mut upstreams: HashMap<SourceKind, Arc<dyn Upstream>> = HashMap::new();
    upstreams.insert(SourceKind::Rpm, Arc::new(RpmUpstream::default()));
    upstreams.insert(
        SourceKind::DockerHub,
        Arc::new(DockerHubUpstream::new(&options.docker_hub_url)),
    );
    upstreams.insert(
        SourceKind::DockerArtifactory,
        Arc::new(ArtifactoryUpstream::default()),
    );
    upstreams.insert(SourceKind::DockerEcr, Arc::new(EcrUpstream::default()));
    upstreams.insert(
        SourceKind::Npm,
        Arc::new(NpmUpstream::new(&options.npm_registry_url)),
    );
    upstreams.insert(SourceKind::Voom, Arc::new(VoomUpstream::default()));
    upstreams
}
