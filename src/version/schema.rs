//! Row schema registry
//!
//! Each source kind returns records of its own shape. The schema says where
//! in those records the normalizer finds each piece of a version row.

use serde_json::Value;

/// Upstream system a component's versions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Rpm,
    DockerHub,
    DockerArtifactory,
    DockerEcr,
    Npm,
    Voom,
    Literal,
}

impl SourceKind {
    /// Returns the string representation of the source kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Rpm => "rpm",
            SourceKind::DockerHub => "docker-hub",
            SourceKind::DockerArtifactory => "docker-artifactory",
            SourceKind::DockerEcr => "docker-ecr",
            SourceKind::Npm => "npm",
            SourceKind::Voom => "voom",
            SourceKind::Literal => "literal",
        }
    }

    /// Field locations for records of this source kind
    pub fn schema(&self) -> &'static RowSchema {
        match self {
            SourceKind::Rpm => &RPM,
            SourceKind::DockerHub => &DOCKER_HUB,
            SourceKind::DockerArtifactory => &DOCKER_ARTIFACTORY,
            SourceKind::DockerEcr => &DOCKER_ECR,
            SourceKind::Npm => &NPM,
            SourceKind::Voom => &VOOM,
            SourceKind::Literal => &LITERAL,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered list of keys leading to a value in nested maps
pub type FieldPath = &'static [&'static str];

/// Where the normalizer finds each row field in a raw record
#[derive(Debug, PartialEq, Eq)]
pub struct RowSchema {
    pub version: FieldPath,
    pub date: Option<FieldPath>,
    pub hash: Option<FieldPath>,
    pub creator: Option<FieldPath>,
    /// Field naming the owning artifact, for queries that return many
    pub name: Option<FieldPath>,
    /// Separator between repository id and version in `full-version`
    pub delimiter: Option<&'static str>,
}

impl RowSchema {
    pub fn delimiter(&self) -> &'static str {
        self.delimiter.unwrap_or("")
    }
}

pub static RPM: RowSchema = RowSchema {
    version: &["full-version"],
    date: Some(&["buildtime"]),
    hash: Some(&["sourcerpm"]),
    creator: None,
    name: Some(&["name"]),
    delimiter: Some("-"),
};

pub static DOCKER_HUB: RowSchema = RowSchema {
    version: &["name"],
    date: Some(&["last_updated"]),
    hash: Some(&["digest"]),
    creator: Some(&["last_updater_username"]),
    name: None,
    delimiter: Some(":"),
};

pub static DOCKER_ARTIFACTORY: RowSchema = RowSchema {
    version: &["tag"],
    date: Some(&["created"]),
    hash: Some(&["sha256"]),
    creator: Some(&["created_by"]),
    name: None,
    delimiter: Some(":"),
};

pub static DOCKER_ECR: RowSchema = RowSchema {
    version: &["tag"],
    date: Some(&["imagePushedAt"]),
    hash: Some(&["imageDigest"]),
    creator: None,
    name: None,
    delimiter: Some(":"),
};

pub static NPM: RowSchema = RowSchema {
    version: &["version"],
    date: Some(&["time"]),
    hash: Some(&["dist", "shasum"]),
    creator: Some(&["_npmUser", "name"]),
    name: None,
    delimiter: Some("@"),
};

pub static VOOM: RowSchema = RowSchema {
    version: &["version"],
    date: Some(&["date"]),
    hash: Some(&["hash"]),
    creator: Some(&["creator"]),
    name: None,
    delimiter: None,
};

pub static LITERAL: RowSchema = RowSchema {
    version: &["version"],
    date: None,
    hash: None,
    creator: None,
    name: None,
    delimiter: None,
};

/// Follows `path` through nested maps
pub fn get_path<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(record, |value, key| value.as_object()?.get(*key))
        .filter(|value| !value.is_null())
}

/// Follows `path` and renders a scalar as a string
pub fn get_path_string(record: &Value, path: &[&str]) -> Option<String> {
    match get_path(record, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_path_follows_nested_keys() {
        let record = json!({"dist": {"shasum": "abc"}});
        assert_eq!(get_path(&record, &["dist", "shasum"]), Some(&json!("abc")));
    }

    #[test]
    fn get_path_returns_none_for_missing_or_null() {
        let record = json!({"dist": {"shasum": null}, "flat": "x"});

        assert_eq!(get_path(&record, &["dist", "shasum"]), None);
        assert_eq!(get_path(&record, &["dist", "integrity"]), None);
        assert_eq!(get_path(&record, &["flat", "deeper"]), None);
    }

    #[test]
    fn get_path_string_renders_numbers_and_skips_empty() {
        let record = json!({"n": 42, "empty": "", "obj": {}});

        assert_eq!(get_path_string(&record, &["n"]), Some("42".to_string()));
        assert_eq!(get_path_string(&record, &["empty"]), None);
        assert_eq!(get_path_string(&record, &["obj"]), None);
    }

    #[test]
    fn every_source_kind_has_a_schema() {
        for kind in [
            SourceKind::Rpm,
            SourceKind::DockerHub,
            SourceKind::DockerArtifactory,
            SourceKind::DockerEcr,
            SourceKind::Npm,
            SourceKind::Voom,
            SourceKind::Literal,
        ] {
            assert!(!kind.schema().version.is_empty(), "{}", kind);
        }
        assert_eq!(SourceKind::Literal.schema().delimiter(), "");
        assert_eq!(SourceKind::DockerHub.schema().delimiter(), ":");
    }
}
