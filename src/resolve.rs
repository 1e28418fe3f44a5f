//! Batch resolution of component specs
//!
//! Sequences the whole pipeline for a batch of components:
//! - merge defaults and validate every spec, reporting all problems at once
//! - derive each spec's locator
//! - query every distinct repository concurrently and wait for all of them
//! - normalize the returned records and select each component's candidates
//! - report every unresolved component at once

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ResolveOptions;
use crate::spec::defaults::merge_defaults;
use crate::spec::document::{DefaultsDocument, SpecDocument};
use crate::spec::enrich::{Locator, enrich};
use crate::spec::types::ComponentSpec;
use crate::spec::validate::validate_all;
use crate::version::dispatch::{Dispatcher, QueryKey};
use crate::version::error::UpstreamError;
use crate::version::filter::{Criteria, select_candidates};
use crate::version::row::{Row, normalize};
use crate::version::schema::SourceKind;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid component specs:\n  {}", .0.join("\n  "))]
    Validation(Vec<String>),

    #[error("{component}: {reason}")]
    Config { component: String, reason: String },

    #[error("Failed to query {source_kind} {repository}: {source}")]
    Upstream {
        source_kind: SourceKind,
        repository: String,
        #[source]
        source: UpstreamError,
    },

    #[error("Unresolved components:\n  {}", .0.join("\n  "))]
    Unresolved(Vec<String>),
}

/// Outcome of resolving one component
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub component: String,
    pub source_kind: SourceKind,
    /// Matching rows, oldest first
    pub candidates: Vec<Row>,
    /// Whether the candidates come from `version-default`
    pub fallback: bool,
}

impl Resolution {
    /// The selected version row: the newest candidate
    pub fn current(&self) -> Option<&Row> {
        self.candidates.last()
    }

    pub fn is_resolved(&self) -> bool {
        !self.candidates.is_empty()
    }
}

/// Merges defaults under every component of `specs` and validates the result
///
/// Components only named in `by-name` defaults are not part of the batch.
pub fn prepare_specs(
    defaults: &[DefaultsDocument],
    specs: &SpecDocument,
) -> Result<Vec<ComponentSpec>, ResolveError> {
    let mut problems = Vec::new();
    let mut prepared = Vec::new();

    for (component, raw) in specs {
        let merged = merge_defaults(defaults, component, raw);
        match ComponentSpec::from_map(component, merged) {
            Ok(spec) => {
                for key in spec.unknown.keys() {
                    warn!("{}: ignoring unknown key '{}'", component, key);
                }
                prepared.push(spec);
            }
            Err(e) => problems.push(e.to_string()),
        }
    }

    problems.extend(validate_all(&prepared));
    if !problems.is_empty() {
        return Err(ResolveError::Validation(problems));
    }

    debug!("Prepared {} component specs", prepared.len());
    Ok(prepared)
}

/// Resolves batches of component specs against upstreams
pub struct Resolver {
    dispatcher: Dispatcher,
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(dispatcher: Dispatcher, options: ResolveOptions) -> Self {
        Self {
            dispatcher,
            options,
        }
    }

    /// Resolves every spec of the batch
    ///
    /// In strict mode an upstream failure or any unresolved component fails
    /// the batch; otherwise they are logged and unresolved components come
    /// back with no candidates.
    pub async fn resolve(
        &self,
        specs: &[ComponentSpec],
    ) -> Result<IndexMap<String, Resolution>, ResolveError> {
        let locators = specs
            .iter()
            .map(|spec| {
                enrich(spec).ok_or_else(|| ResolveError::Config {
                    component: spec.component.clone(),
                    reason: "cannot derive an upstream from this spec".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let wave = self.dispatcher.fetch_all(&locators).await;

        let mut rows_by_query: HashMap<QueryKey, Vec<Row>> = HashMap::new();
        let mut failures: Vec<(QueryKey, UpstreamError)> = Vec::new();
        for (key, outcome) in wave {
            match outcome {
                Ok(batch) => {
                    let rows = normalize(key.0.schema(), &batch.locator.repo_id(), &batch.records);
                    debug!("{} {}: {} rows", key.0, key.1, rows.len());
                    rows_by_query.insert(key, rows);
                }
                Err(e) => failures.push((key, e)),
            }
        }

        failures.sort_by(|(a, _), (b, _)| a.cmp(b));
        let mut failed = HashSet::new();
        for ((source_kind, repository), source) in failures {
            if self.options.strict {
                return Err(ResolveError::Upstream {
                    source_kind,
                    repository,
                    source,
                });
            }
            warn!("Ignoring failed query {} {}: {}", source_kind, repository, source);
            failed.insert((source_kind, repository));
        }

        let mut resolutions = IndexMap::new();
        for (spec, locator) in specs.iter().zip(&locators) {
            let resolution = self.resolve_one(spec, locator, &rows_by_query, &failed)?;
            resolutions.insert(spec.component.clone(), resolution);
        }

        let unresolved: Vec<String> = resolutions
            .values()
            .filter(|r| !r.is_resolved())
            .map(|r| r.component.clone())
            .collect();
        if !unresolved.is_empty() {
            if self.options.strict {
                return Err(ResolveError::Unresolved(unresolved));
            }
            warn!("Unresolved components: {}", unresolved.join(", "));
        }

        info!(
            "Resolved {} of {} components",
            resolutions.len() - unresolved.len(),
            resolutions.len()
        );
        Ok(resolutions)
    }

    fn resolve_one(
        &self,
        spec: &ComponentSpec,
        locator: &Locator,
        rows_by_query: &HashMap<QueryKey, Vec<Row>>,
        failed: &HashSet<QueryKey>,
    ) -> Result<Resolution, ResolveError> {
        let source_kind = locator.source_kind();
        let schema = source_kind.schema();
        let repo_id = locator.repo_id();
        let key = self.dispatcher.query_key(locator);

        let fallback = || {
            spec.version_default.as_deref().map(|default| {
                debug!("{}: using version-default '{}'", spec.component, default);
                Resolution {
                    component: spec.component.clone(),
                    source_kind,
                    candidates: vec![Row::synthetic(&repo_id, schema.delimiter(), default)],
                    fallback: true,
                }
            })
        };

        let rows = key
            .as_ref()
            .and_then(|key| rows_by_query.get(key))
            .filter(|rows| !rows.is_empty());

        let Some(rows) = rows else {
            if let Some(resolution) = fallback() {
                return Ok(resolution);
            }
            if key.as_ref().is_some_and(|key| failed.contains(key)) {
                return Ok(Resolution {
                    component: spec.component.clone(),
                    source_kind,
                    candidates: Vec::new(),
                    fallback: false,
                });
            }
            return Err(ResolveError::Config {
                component: spec.component.clone(),
                reason: match locator.query_key() {
                    Some(query) => format!("no versions available from {} {}", source_kind, query),
                    None => format!("{} has no upstream and no version-default", source_kind),
                },
            });
        };

        let criteria = Criteria::from_spec(spec).map_err(|e| ResolveError::Config {
            component: spec.component.clone(),
            reason: e.to_string(),
        })?;
        let candidates = select_candidates(&criteria, schema, &repo_id, rows);

        if candidates.is_empty()
            && let Some(resolution) = fallback()
        {
            return Ok(resolution);
        }

        if let Some(current) = candidates.last() {
            debug!("{}: selected {}", spec.component, current.full_version);
        }
        Ok(Resolution {
            component: spec.component.clone(),
            source_kind,
            candidates,
            fallback: false,
        })
    }
}
