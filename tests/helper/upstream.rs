//! Upstream test utilities

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use bump::config::ResolveOptions;
use bump::resolve::{ResolveError, Resolution, Resolver, prepare_specs};
use bump::spec::document::{parse_defaults_document, parse_spec_document};
use bump::spec::enrich::Locator;
use bump::version::dispatch::Dispatcher;
use bump::version::error::UpstreamError;
use bump::version::schema::SourceKind;
use bump::version::upstream::Upstream;
use indexmap::IndexMap;

/// Mock upstream serving canned records per repository id
pub struct MockUpstream {
    source_kind: SourceKind,
    records: HashMap<String, Vec<Value>>,
    calls: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn new(source_kind: SourceKind) -> Self {
        Self {
            source_kind,
            records: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_records(mut self, repo_id: &str, records: Vec<Value>) -> Self {
        self.records.insert(repo_id.to_string(), records);
        self
    }

    /// Counter of fetches issued against this upstream
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    async fn fetch_records(&self, locator: &Locator) -> Result<Vec<Value>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let repo_id = locator.repo_id();
        match self.records.get(&repo_id) {
            Some(records) => Ok(records.clone()),
            None => Err(UpstreamError::NotFound(repo_id)),
        }
    }
}

/// Create a dispatcher over the given mock upstreams
pub fn create_test_dispatcher(upstreams: Vec<MockUpstream>) -> Dispatcher {
    let upstreams: HashMap<SourceKind, Arc<dyn Upstream>> = upstreams
        .into_iter()
        .map(|u| (u.source_kind, Arc::new(u) as Arc<dyn Upstream>))
        .collect();
    Dispatcher::new(upstreams)
}

/// Resolve a YAML spec document with optional YAML defaults documents
pub async fn resolve_yaml(
    dispatcher: Dispatcher,
    options: ResolveOptions,
    defaults: &[&str],
    spec: &str,
) -> Result<IndexMap<String, Resolution>, ResolveError> {
    let defaults: Vec<_> = defaults
        .iter()
        .map(|text| parse_defaults_document(text, Path::new("defaults.yaml")).unwrap())
        .collect();
    let document = parse_spec_document(spec, Path::new("spec.yaml")).unwrap();
    let specs = prepare_specs(&defaults, &document)?;
    Resolver::new(dispatcher, options).resolve(&specs).await
}
