//! Derivation of the upstream locator for a merged spec

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::config::{DEFAULT_NAMESPACE, ECR_REGISTRY_PATTERN};
use crate::spec::types::{ComponentSpec, Kind};
use crate::version::schema::SourceKind;

static ECR_REGISTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ECR_REGISTRY_PATTERN).expect("ECR registry pattern is valid"));

/// Where the versions of one component live
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Package `name` in the RPM repository at `repo`
    Rpm { repo: String, name: String },
    /// Docker Hub repository (`namespace/image`)
    DockerHub { repository: String },
    /// Docker repository `registry` served by the Artifactory at `api`
    DockerArtifactory {
        api: String,
        registry: String,
        image: String,
    },
    /// ECR repository `image` in the registry of `account_id` in `region`
    DockerEcr {
        registry: String,
        account_id: String,
        region: String,
        image: String,
    },
    /// npm package, optionally from a non-default registry
    Npm {
        registry: Option<String>,
        name: String,
    },
    /// Versions derived from the git history of `paths`
    Voom { git_dir: String, paths: Vec<String> },
    /// No upstream, the value comes from `version-default`
    Literal,
}

impl Locator {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Locator::Rpm { .. } => SourceKind::Rpm,
            Locator::DockerHub { .. } => SourceKind::DockerHub,
            Locator::DockerArtifactory { .. } => SourceKind::DockerArtifactory,
            Locator::DockerEcr { .. } => SourceKind::DockerEcr,
            Locator::Npm { .. } => SourceKind::Npm,
            Locator::Voom { .. } => SourceKind::Voom,
            Locator::Literal => SourceKind::Literal,
        }
    }

    /// Identifier rows must carry to belong to this component
    ///
    /// Also the prefix of every `full-version`.
    pub fn repo_id(&self) -> String {
        match self {
            Locator::Rpm { name, .. } => name.clone(),
            Locator::DockerHub { repository } => repository.clone(),
            Locator::DockerArtifactory {
                registry, image, ..
            } => format!("{}/{}", registry, image),
            Locator::DockerEcr {
                registry, image, ..
            } => format!("{}/{}", registry, image),
            Locator::Npm { name, .. } => name.clone(),
            Locator::Voom { .. } | Locator::Literal => String::new(),
        }
    }

    /// Key identifying the upstream query, shared by every component that
    /// can be answered by the same request
    ///
    /// `None` when there is nothing to query.
    pub fn query_key(&self) -> Option<String> {
        match self {
            Locator::Rpm { repo, .. } => Some(repo.clone()),
            Locator::DockerHub { repository } => Some(repository.clone()),
            Locator::DockerArtifactory {
                api,
                registry,
                image,
            } => Some(format!("{}/{}/{}", api, registry, image)),
            Locator::DockerEcr {
                registry, image, ..
            } => Some(format!("{}/{}", registry, image)),
            Locator::Npm { registry, name } => Some(match registry {
                Some(registry) => format!("{}/{}", registry, name),
                None => name.clone(),
            }),
            Locator::Voom { git_dir, paths } => Some(format!("{}:{}", git_dir, paths.join(","))),
            Locator::Literal => None,
        }
    }
}

/// Derives the locator of a merged spec
///
/// Pure and idempotent. Returns `None` when the spec has no kind or lacks the
/// fields its kind requires, which validation reports beforehand.
pub fn enrich(spec: &ComponentSpec) -> Option<Locator> {
    match spec.kind? {
        Kind::Rpm => Some(Locator::Rpm {
            repo: spec.repo.clone()?,
            name: spec.name.clone()?,
        }),
        Kind::Image => enrich_image(spec),
        Kind::Npm => Some(Locator::Npm {
            registry: spec.npm_registry.clone(),
            name: spec.name.clone()?,
        }),
        Kind::Git => (!spec.paths.is_empty()).then(|| Locator::Voom {
            git_dir: spec.git_dir.clone().unwrap_or_else(|| ".".to_string()),
            paths: spec.paths.clone(),
        }),
        Kind::Literal => Some(Locator::Literal),
    }
}

fn enrich_image(spec: &ComponentSpec) -> Option<Locator> {
    let image = spec.image.clone()?;

    if let Some(api) = &spec.artifactory_api {
        return Some(Locator::DockerArtifactory {
            api: api.trim_end_matches('/').to_string(),
            registry: spec.registry.clone()?,
            image,
        });
    }

    if let Some(registry) = &spec.registry
        && let Some(caps) = ECR_REGISTRY.captures(registry)
    {
        return Some(Locator::DockerEcr {
            registry: registry.clone(),
            account_id: caps["account"].to_string(),
            region: caps["region"].to_string(),
            image,
        });
    }

    if let Some(registry) = &spec.registry {
        warn!(
            "{}: registry '{}' is neither ECR nor paired with artifactory-api; querying Docker Hub",
            spec.component, registry
        );
    }

    let repository = match &spec.namespace {
        Some(namespace) => format!("{}/{}", namespace, image),
        None if image.contains('/') => image,
        None => format!("{}/{}", DEFAULT_NAMESPACE, image),
    };
    Some(Locator::DockerHub { repository })
}
