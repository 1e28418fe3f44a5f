//! Upstream query fan-out
//!
//! Components that share a query (same source kind, same query key) share one
//! request. All requests of a wave run concurrently and the wave only returns
//! once every one of them has settled.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::spec::enrich::Locator;
use crate::version::error::UpstreamError;
use crate::version::schema::SourceKind;
use crate::version::upstream::Upstream;

/// Identity of one upstream query
pub type QueryKey = (SourceKind, String);

/// Raw records returned by one query
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Locator the query was issued for
    pub locator: Locator,
    pub records: Vec<Value>,
}

/// Settled outcome of every query of a wave
pub type Wave = HashMap<QueryKey, Result<Batch, UpstreamError>>;

/// Routes queries to the upstream of their source kind
pub struct Dispatcher {
    upstreams: HashMap<SourceKind, Arc<dyn Upstream>>,
}

impl Dispatcher {
    pub fn new(upstreams: HashMap<SourceKind, Arc<dyn Upstream>>) -> Self {
        Self { upstreams }
    }

    /// Whether components of `kind` can be queried at all
    pub fn can_query(&self, kind: SourceKind) -> bool {
        self.upstreams.contains_key(&kind)
    }

    /// Query key of a locator, `None` when it cannot be queried
    pub fn query_key(&self, locator: &Locator) -> Option<QueryKey> {
        let kind = locator.source_kind();
        if !self.can_query(kind) {
            return None;
        }
        locator.query_key().map(|key| (kind, key))
    }

    /// Issues one query per distinct key among `locators` and waits for all
    pub async fn fetch_all<'a>(&self, locators: impl IntoIterator<Item = &'a Locator>) -> Wave {
        let mut queries: HashMap<QueryKey, &Locator> = HashMap::new();
        for locator in locators {
            if let Some(key) = self.query_key(locator) {
                queries.entry(key).or_insert(locator);
            }
        }
        info!("Querying {} upstream repositories", queries.len());

        let futures = queries.into_iter().map(|(key, locator)| {
            let upstream = Arc::clone(&self.upstreams[&key.0]);
            async move {
                debug!("Fetching {} {}", key.0, key.1);
                let outcome = upstream
                    .fetch_records(locator)
                    .await
                    .inspect_err(|e| error!("Failed to query {} {}: {}", key.0, key.1, e))
                    .map(|records| Batch {
                        locator: locator.clone(),
                        records,
                    });
                (key, outcome)
            }
        });

        join_all(futures).await.into_iter().collect()
    }
}
