//! RPM repository upstream
//!
//! Lists every package of a repository with `dnf repoquery`, pointing dnf at
//! the repository URL directly so no system repo configuration is needed.

use std::collections::HashSet;

use serde_json::{Value, json};
use tracing::debug;

use crate::config::REPOQUERY_PROGRAM;
use crate::spec::enrich::Locator;
use crate::version::error::UpstreamError;
use crate::version::schema::SourceKind;
use crate::version::upstream::Upstream;
use crate::version::upstreams::command::run;

const REPO_ID: &str = "bump";
const QUERY_FORMAT: &str = "%{name}\t%{epoch}\t%{version}\t%{release}\t%{buildtime}\t%{sourcerpm}\n";

/// Upstream implementation for yum/dnf repositories
pub struct RpmUpstream {
    program: String,
}

impl RpmUpstream {
    /// Creates a new RpmUpstream running `program` in place of `dnf`
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn args(repo: &str) -> Vec<String> {
        vec![
            "repoquery".to_string(),
            "--quiet".to_string(),
            format!("--repofrompath={},{}", REPO_ID, repo),
            format!("--repo={}", REPO_ID),
            "--queryformat".to_string(),
            QUERY_FORMAT.to_string(),
        ]
    }

    /// Parses repoquery lines into package records
    ///
    /// Builds for several architectures share name, epoch, version and
    /// release; only the first of them is kept.
    fn parse(output: &str) -> Vec<Value> {
        let mut seen = HashSet::new();
        output
            .lines()
            .filter_map(|line| {
                let fields: Vec<&str> = line.split('\t').collect();
                let [name, epoch, version, release, buildtime, sourcerpm] = fields[..] else {
                    return None;
                };
                if !seen.insert((name, epoch, version, release)) {
                    return None;
                }
                Some(json!({
                    "name": name,
                    "epoch": epoch,
                    "version": version,
                    "release": release,
                    "full-version": format!("{}-{}", version, release),
                    "buildtime": buildtime,
                    "sourcerpm": sourcerpm,
                }))
            })
            .collect()
    }
}

impl Default for RpmUpstream {
    fn default() -> Self {
        Self::new(REPOQUERY_PROGRAM)
    }
}

#[async_trait::async_trait]
impl Upstream for RpmUpstream {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Rpm
    }

    async fn fetch_records(&self, locator: &Locator) -> Result<Vec<Value>, UpstreamError> {
        let Locator::Rpm { repo, .. } = locator else {
            return Err(UpstreamError::Unsupported(format!("{:?}", locator)));
        };

        let output = run(&self.program, &Self::args(repo), None).await?;
        let records = Self::parse(&output);
        debug!("Fetched {} packages from {}", records.len(), repo);
        Ok(records)
    }
}
