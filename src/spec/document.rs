//! Loading of spec and defaults documents
//!
//! Both document types are YAML (JSON parses as well). A spec document maps
//! component names to spec maps; a defaults document carries the `all`,
//! `by-type` and `by-name` layers.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::spec::error::SpecError;
use crate::spec::types::SpecMap;

/// Component specs in document order
pub type SpecDocument = IndexMap<String, SpecMap>;

/// Three-level defaults document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DefaultsDocument {
    /// Applies to every component
    pub all: SpecMap,
    /// Keyed by component kind
    pub by_type: IndexMap<String, SpecMap>,
    /// Keyed by component name
    pub by_name: IndexMap<String, SpecMap>,
}

/// Parses a spec document
///
/// A component declared with no body (`FOO:`) becomes an empty spec so that
/// validation reports it instead of the parser.
pub fn parse_spec_document(text: &str, path: &Path) -> Result<SpecDocument, SpecError> {
    if text.trim().is_empty() {
        return Ok(SpecDocument::new());
    }

    let raw: IndexMap<String, Option<SpecMap>> =
        serde_yaml::from_str(text).map_err(|source| SpecError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(raw
        .into_iter()
        .map(|(name, spec)| (name, spec.unwrap_or_default()))
        .collect())
}

/// Parses a defaults document
pub fn parse_defaults_document(text: &str, path: &Path) -> Result<DefaultsDocument, SpecError> {
    if text.trim().is_empty() {
        return Ok(DefaultsDocument::default());
    }

    serde_yaml::from_str(text).map_err(|source| SpecError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses a spec document from disk
pub fn load_spec_document(path: &Path) -> Result<SpecDocument, SpecError> {
    let text = read(path)?;
    let document = parse_spec_document(&text, path)?;
    debug!("Loaded {} component specs from {:?}", document.len(), path);
    Ok(document)
}

/// Reads and parses a defaults document from disk
pub fn load_defaults_document(path: &Path) -> Result<DefaultsDocument, SpecError> {
    let text = read(path)?;
    let document = parse_defaults_document(&text, path)?;
    debug!(
        "Loaded defaults from {:?} ({} by-type, {} by-name)",
        path,
        document.by_type.len(),
        document.by_name.len()
    );
    Ok(document)
}

/// Merges spec documents in order
///
/// A component declared in several documents keeps its first position; its
/// keys are overlaid with later documents winning.
pub fn merge_spec_documents(documents: impl IntoIterator<Item = SpecDocument>) -> SpecDocument {
    let mut merged = SpecDocument::new();
    for document in documents {
        for (name, spec) in document {
            merged.entry(name).or_default().extend(spec);
        }
    }
    merged
}

fn read(path: &Path) -> Result<String, SpecError> {
    std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parse_spec_document_keeps_component_order() {
        let doc = parse_spec_document(
            r#"
ZLIB_VERSION:
  kind: rpm
  name: zlib
  repo: https://repo.example.com/el8
ALPINE_VERSION:
  kind: image
  image: alpine
"#,
            Path::new("specs.yaml"),
        )
        .unwrap();

        let names: Vec<_> = doc.keys().cloned().collect();
        assert_eq!(names, vec!["ZLIB_VERSION", "ALPINE_VERSION"]);
        assert_eq!(doc["ZLIB_VERSION"].get("name"), Some(&json!("zlib")));
    }

    #[test]
    fn parse_spec_document_accepts_json() {
        let doc = parse_spec_document(
            r#"{"LODASH": {"kind": "npm", "name": "lodash"}}"#,
            Path::new("specs.json"),
        )
        .unwrap();

        assert_eq!(doc["LODASH"].get("kind"), Some(&json!("npm")));
    }

    #[test]
    fn parse_spec_document_turns_empty_body_into_empty_spec() {
        let doc = parse_spec_document("FOO:\n", Path::new("specs.yaml")).unwrap();
        assert!(doc["FOO"].is_empty());
    }

    #[test]
    fn parse_spec_document_reports_path_on_error() {
        let err = parse_spec_document("- not\n- a map\n", Path::new("bad.yaml")).unwrap_err();
        assert!(matches!(err, SpecError::Parse { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn parse_defaults_document_reads_all_layers() {
        let doc = parse_defaults_document(
            r#"
all:
  kind: image
by-type:
  image:
    registry: docker.io
by-name:
  REDIS:
    image: redis
"#,
            Path::new("defaults.yaml"),
        )
        .unwrap();

        assert_eq!(doc.all.get("kind"), Some(&json!("image")));
        assert_eq!(doc.by_type["image"].get("registry"), Some(&json!("docker.io")));
        assert_eq!(doc.by_name["REDIS"].get("image"), Some(&json!("redis")));
    }

    #[test]
    fn load_spec_document_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("specs.yaml");
        fs::write(&path, "NODE:\n  kind: npm\n  name: node\n").unwrap();

        let doc = load_spec_document(&path).unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn load_spec_document_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_spec_document(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, SpecError::Io { .. }));
    }

    #[test]
    fn merge_spec_documents_overlays_later_documents() {
        let first = parse_spec_document(
            "A:\n  kind: npm\n  name: a\nB:\n  kind: npm\n  name: b\n",
            Path::new("1.yaml"),
        )
        .unwrap();
        let second =
            parse_spec_document("A:\n  version-start: '2.'\n", Path::new("2.yaml")).unwrap();

        let merged = merge_spec_documents([first, second]);

        let names: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(merged["A"].get("name"), Some(&json!("a")));
        assert_eq!(merged["A"].get("version-start"), Some(&json!("2.")));
    }
}
