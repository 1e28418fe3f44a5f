//! Voom versions from git history
//!
//! A voom version names a commit by its UTC commit time and short hash,
//! e.g. `20230601_120000-gabc1234`. Uncommitted changes under the paths add
//! one more version: the newest one with the dirty suffix appended.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::{DIRTY_SUFFIX, GIT_PROGRAM};
use crate::spec::enrich::Locator;
use crate::version::error::UpstreamError;
use crate::version::schema::SourceKind;
use crate::version::upstream::Upstream;
use crate::version::upstreams::command::run;

const SHORT_HASH_LEN: usize = 7;

/// Upstream implementation for git-derived versions
pub struct VoomUpstream {
    program: String,
}

/// Formats the voom version of a commit
pub fn voom_version(committed_at: DateTime<Utc>, short_hash: &str) -> String {
    format!("{}-g{}", committed_at.format("%Y%m%d_%H%M%S"), short_hash)
}

impl VoomUpstream {
    /// Creates a new VoomUpstream running `program` in place of `git`
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn log_args(paths: &[String]) -> Vec<String> {
        let mut args = vec![
            "log".to_string(),
            "--format=%H%x09%ct%x09%ae".to_string(),
            "--".to_string(),
        ];
        args.extend(paths.iter().cloned());
        args
    }

    fn status_args(paths: &[String]) -> Vec<String> {
        let mut args = vec![
            "status".to_string(),
            "--porcelain".to_string(),
            "--".to_string(),
        ];
        args.extend(paths.iter().cloned());
        args
    }

    /// Parses `git log` output, newest commit first
    fn parse_log(output: &str) -> Vec<Value> {
        output
            .lines()
            .filter_map(|line| {
                let mut fields = line.split('\t');
                let hash = fields.next()?;
                let committed_at = DateTime::from_timestamp(fields.next()?.parse().ok()?, 0)?;
                let author = fields.next().filter(|a| !a.is_empty());
                let short_hash = hash.get(..SHORT_HASH_LEN)?;

                Some(json!({
                    "version": voom_version(committed_at, short_hash),
                    "date": committed_at.to_rfc3339(),
                    "hash": short_hash,
                    "creator": author,
                    "commit": hash,
                }))
            })
            .collect()
    }

    /// Builds the dirty record from the newest commit record
    fn dirty_record(newest: &Value, now: DateTime<Utc>) -> Option<Value> {
        let version = newest.get("version")?.as_str()?;
        let hash = newest.get("hash")?.as_str()?;
        Some(json!({
            "version": format!("{}{}", version, DIRTY_SUFFIX),
            "date": now.to_rfc3339(),
            "hash": format!("{}{}", hash, DIRTY_SUFFIX),
            "dirty": true,
        }))
    }
}

impl Default for VoomUpstream {
    fn default() -> Self {
        Self::new(GIT_PROGRAM)
    }
}

#[async_trait::async_trait]
impl Upstream for VoomUpstream {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Voom
    }

    async fn fetch_records(&self, locator: &Locator) -> Result<Vec<Value>, UpstreamError> {
        let Locator::Voom { git_dir, paths } = locator else {
            return Err(UpstreamError::Unsupported(format!("{:?}", locator)));
        };
        let cwd = Path::new(git_dir);

        let log = run(&self.program, &Self::log_args(paths), Some(cwd)).await?;
        let mut records = Self::parse_log(&log);

        let status = run(&self.program, &Self::status_args(paths), Some(cwd)).await?;
        if !status.trim().is_empty()
            && let Some(dirty) = records
                .first()
                .and_then(|newest| Self::dirty_record(newest, Utc::now()))
        {
            debug!("Uncommitted changes under {:?}", paths);
            records.push(dirty);
        }

        debug!("Derived {} voom versions for {:?}", records.len(), paths);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn voom_version_formats_utc_time_and_hash() {
        let at = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 5).unwrap();
        assert_eq!(voom_version(at, "abc1234"), "20230601_120005-gabc1234");
    }

    #[test]
    fn parse_log_builds_records_newest_first() {
        let records = VoomUpstream::parse_log(
            "abc1234def5678\t1685620805\tdev@example.com\n\
             0123456789abcd\t1685577600\t\n",
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["version"], "20230601_120005-gabc1234");
        assert_eq!(records[0]["hash"], "abc1234");
        assert_eq!(records[0]["creator"], "dev@example.com");
        assert_eq!(records[1]["version"], "20230601_000000-g0123456");
        assert!(records[1]["creator"].is_null());
    }

    #[test]
    fn parse_log_skips_malformed_lines() {
        assert!(VoomUpstream::parse_log("abc\tnot-a-time\n\n").is_empty());
    }

    #[test]
    fn dirty_record_appends_suffix_to_version_and_hash() {
        let newest = json!({"version": "20230601_120005-gabc1234", "hash": "abc1234"});
        let now = Utc.with_ymd_and_hms(2023, 6, 2, 0, 0, 0).unwrap();

        let dirty = VoomUpstream::dirty_record(&newest, now).unwrap();

        assert_eq!(dirty["version"], "20230601_120005-gabc1234-dirty");
        assert_eq!(dirty["hash"], "abc1234-dirty");
        assert_eq!(dirty["date"], "2023-06-02T00:00:00+00:00");
    }

    #[test]
    fn log_args_limit_history_to_paths() {
        let args = VoomUpstream::log_args(&["src".to_string(), "Cargo.toml".to_string()]);
        assert_eq!(&args[args.len() - 3..], &["--", "src", "Cargo.toml"]);
    }
}
