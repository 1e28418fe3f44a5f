//! Normalized version rows

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::version::schema::{RowSchema, get_path, get_path_string};
use crate::version::timestamp::parse_timestamp;

/// One known version of an upstream artifact
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Repository id of the artifact this version belongs to
    pub repo_id: String,
    /// Raw version token (tag, package version, voom version)
    pub version: String,
    /// `repo_id + delimiter + version`
    pub full_version: String,
    pub date: Option<DateTime<Utc>>,
    /// Content identity shared by tags of the same artifact
    pub hash: Option<String>,
    pub creator: Option<String>,
    /// Every version carrying the same hash, filled by alias grouping
    pub all_versions: BTreeSet<String>,
    /// The upstream record this row was projected from
    pub record: Value,
}

impl Row {
    /// Builds the synthetic row used for fallback values
    pub fn synthetic(repo_id: &str, delimiter: &str, version: &str) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            version: version.to_string(),
            full_version: format!("{}{}{}", repo_id, delimiter, version),
            date: None,
            hash: None,
            creator: None,
            all_versions: BTreeSet::from([version.to_string()]),
            record: Value::Null,
        }
    }
}

/// Projects raw records onto rows
///
/// Records without a usable version are dropped. The owning repository id
/// comes from the schema's name field when it has one, otherwise every
/// record belongs to `repo_id`, the id of the repository that was queried.
pub fn normalize(schema: &RowSchema, repo_id: &str, records: &[Value]) -> Vec<Row> {
    records
        .iter()
        .filter_map(|record| {
            let version = get_path_string(record, schema.version)?;
            let owner = match schema.name {
                Some(path) => get_path_string(record, path)?,
                None => repo_id.to_string(),
            };
            let full_version = format!("{}{}{}", owner, schema.delimiter(), version);

            Some(Row {
                repo_id: owner,
                full_version,
                date: schema
                    .date
                    .and_then(|path| get_path(record, path))
                    .and_then(parse_timestamp),
                hash: schema.hash.and_then(|path| get_path_string(record, path)),
                creator: schema.creator.and_then(|path| get_path_string(record, path)),
                all_versions: BTreeSet::from([version.clone()]),
                version,
                record: record.clone(),
            })
        })
        .collect()
}
