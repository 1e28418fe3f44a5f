use serde::Deserialize;

// =============================================================================
// Upstream endpoints
// =============================================================================

/// Default base URL for the Docker Hub API
pub const DOCKER_HUB_BASE_URL: &str = "https://hub.docker.com";

/// Default base URL for the npm registry
pub const NPM_REGISTRY_BASE_URL: &str = "https://registry.npmjs.org";

/// Page size requested from paginated registry APIs
pub const DOCKER_HUB_PAGE_SIZE: usize = 100;

/// User agent sent with every HTTP request
pub const USER_AGENT: &str = concat!("bump/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Spec defaults
// =============================================================================

/// Docker Hub namespace used when an image spec does not name one
pub const DEFAULT_NAMESPACE: &str = "library";

/// Tag dropped from results while `exclude-latest` is on
pub const LATEST_TAG: &str = "latest";

/// Suffix appended to the newest voom version when the work tree is dirty
pub const DIRTY_SUFFIX: &str = "-dirty";

/// Recognizes `<account>.dkr.ecr.<region>.amazonaws.com[.cn]`
pub const ECR_REGISTRY_PATTERN: &str =
    r"^(?P<account>\d{12})\.dkr\.ecr\.(?P<region>[a-z0-9-]+)\.amazonaws\.com(?:\.cn)?$";

// =============================================================================
// Commands
// =============================================================================

/// Program used to query RPM repositories
pub const REPOQUERY_PROGRAM: &str = "dnf";

/// Program used to query ECR repositories
pub const AWS_PROGRAM: &str = "aws";

/// Program used to derive voom versions
pub const GIT_PROGRAM: &str = "git";

/// Options for one resolution run
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolveOptions {
    /// Fail the whole batch on upstream errors or unresolved components
    pub strict: bool,
    /// Base URL used for Docker Hub queries
    pub docker_hub_url: String,
    /// Default npm registry when a spec does not name one
    pub npm_registry_url: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strict: true,
            docker_hub_url: DOCKER_HUB_BASE_URL.to_string(),
            npm_registry_url: NPM_REGISTRY_BASE_URL.to_string(),
        }
    }
}
