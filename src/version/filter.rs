//! Version filtering and selection
//!
//! Rows of one query are narrowed down to the candidates of one component:
//!
//! 1. keep rows of the component's repository
//! 2. group aliases: rows sharing a hash learn each other's versions
//! 3. sort by date, oldest first
//! 4. apply every configured predicate, always in the same order
//!
//! The last candidate is the current version.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::config::LATEST_TAG;
use crate::spec::types::ComponentSpec;
use crate::version::error::FilterError;
use crate::version::row::Row;
use crate::version::schema::RowSchema;
use crate::version::timestamp::parse_timestamp_str;

/// Compiled match criteria of one spec
///
/// Every predicate is optional; an absent predicate is skipped rather than
/// evaluated against an empty pattern.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub version: Option<String>,
    pub version_start: Option<String>,
    pub version_regex: Option<Regex>,
    pub alt_version: Option<String>,
    pub alt_version_start: Option<String>,
    pub alt_version_regex: Option<Regex>,
    pub exclude_latest: bool,
    /// Inclusive upper bounds (`date` and `date-before`)
    pub before: Vec<DateTime<Utc>>,
    /// Inclusive lower bound
    pub after: Option<DateTime<Utc>>,
    pub creators: Option<HashSet<String>>,
}

impl Criteria {
    pub fn from_spec(spec: &ComponentSpec) -> Result<Self, FilterError> {
        let regex = |field: &'static str, pattern: &Option<String>| {
            pattern
                .as_deref()
                .map(|p| Regex::new(p).map_err(|source| FilterError::InvalidRegex { field, source }))
                .transpose()
        };
        let date = |field: &'static str, value: &Option<String>| {
            value
                .as_deref()
                .map(|v| {
                    parse_timestamp_str(v).ok_or_else(|| FilterError::InvalidDate {
                        field,
                        value: v.to_string(),
                    })
                })
                .transpose()
        };

        let before = [
            date("date", &spec.date)?,
            date("date-before", &spec.date_before)?,
        ]
        .into_iter()
        .flatten()
        .collect();

        Ok(Self {
            version: spec.version.clone(),
            version_start: spec.version_start.clone(),
            version_regex: regex("version-regex", &spec.version_regex)?,
            alt_version: spec.alt_version.clone(),
            alt_version_start: spec.alt_version_start.clone(),
            alt_version_regex: regex("alt-version-regex", &spec.alt_version_regex)?,
            exclude_latest: spec.exclude_latest,
            before,
            after: date("date-after", &spec.date_after)?,
            creators: (!spec.creators.is_empty())
                .then(|| spec.creators.iter().cloned().collect()),
        })
    }
}

/// Fills `all_versions` of every row with the versions of its hash bucket
///
/// Rows without a hash only alias themselves.
pub fn group_aliases(rows: &mut [Row]) {
    let mut buckets: HashMap<String, BTreeSet<String>> = HashMap::new();
    for row in rows.iter() {
        if let Some(hash) = &row.hash {
            buckets
                .entry(hash.clone())
                .or_default()
                .insert(row.version.clone());
        }
    }

    for row in rows.iter_mut() {
        row.all_versions = match &row.hash {
            Some(hash) => buckets.get(hash).cloned().unwrap_or_default(),
            None => BTreeSet::from([row.version.clone()]),
        };
    }
}

/// Sorts rows oldest first; undated rows lead, ties go by version
pub fn sort_by_date(rows: &mut [Row]) {
    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.version.cmp(&b.version)));
}

fn retain_if<T>(rows: &mut Vec<Row>, config: Option<T>, keep: impl Fn(&Row, &T) -> bool) {
    if let Some(config) = config {
        rows.retain(|row| keep(row, &config));
    }
}

/// Applies the predicates of `criteria` in their fixed order
pub fn apply_predicates(criteria: &Criteria, schema: &RowSchema, rows: &mut Vec<Row>) {
    retain_if(rows, criteria.version.as_ref(), |row, v| &row.version == *v);
    retain_if(rows, criteria.version_start.as_ref(), |row, prefix| {
        row.version.starts_with(prefix.as_str())
    });
    retain_if(rows, criteria.version_regex.as_ref(), |row, re| {
        re.is_match(&row.version)
    });

    retain_if(rows, criteria.alt_version.as_ref(), |row, v| {
        row.all_versions.contains(v.as_str())
    });
    retain_if(rows, criteria.alt_version_start.as_ref(), |row, prefix| {
        row.all_versions.iter().any(|v| v.starts_with(prefix.as_str()))
    });
    retain_if(rows, criteria.alt_version_regex.as_ref(), |row, re| {
        row.all_versions.iter().any(|v| re.is_match(v))
    });

    if criteria.exclude_latest {
        rows.retain(|row| row.version != LATEST_TAG);
    }

    for bound in &criteria.before {
        rows.retain(|row| row.date.is_some_and(|date| date <= *bound));
    }
    retain_if(rows, criteria.after.as_ref(), |row, bound| {
        row.date.is_some_and(|date| date >= **bound)
    });

    if schema.creator.is_some() {
        retain_if(rows, criteria.creators.as_ref(), |row, creators| {
            row.creator.as_ref().is_some_and(|c| creators.contains(c))
        });
    }
}

/// Narrows the rows of one query down to the candidates of one component
///
/// The result is ordered oldest first; its last element is the current
/// version. An empty result means nothing matched.
pub fn select_candidates(
    criteria: &Criteria,
    schema: &RowSchema,
    repo_id: &str,
    rows: &[Row],
) -> Vec<Row> {
    let mut candidates: Vec<Row> = rows
        .iter()
        .filter(|row| row.repo_id == repo_id)
        .cloned()
        .collect();
    let matched = candidates.len();

    group_aliases(&mut candidates);
    sort_by_date(&mut candidates);
    apply_predicates(criteria, schema, &mut candidates);

    debug!(
        "{}: {} of {} rows matched by name, {} candidates left",
        repo_id,
        matched,
        rows.len(),
        candidates.len()
    );
    candidates
}
