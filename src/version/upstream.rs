//! Upstream trait for fetching version records from various sources

#[cfg(test)]
use mockall::automock;

use serde_json::Value;

use crate::spec::enrich::Locator;
use crate::version::error::UpstreamError;
use crate::version::schema::SourceKind;

/// Trait for fetching raw version records from an upstream
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Upstream: Send + Sync {
    /// Returns the source kind this implementation handles
    fn source_kind(&self) -> SourceKind;

    /// Fetches every known version record for the artifact at `locator`
    ///
    /// # Returns
    /// * `Ok(Vec<Value>)` - Records in no particular order, each exposing the
    ///   fields named by the source kind's row schema
    /// * `Err(UpstreamError)` - If the query fails
    async fn fetch_records(&self, locator: &Locator) -> Result<Vec<Value>, UpstreamError>;
}
