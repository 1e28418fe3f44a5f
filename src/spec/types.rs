//! Component spec types

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::spec::error::SpecError;

/// Untyped spec map as it appears in spec and defaults documents
pub type SpecMap = serde_json::Map<String, Value>;

/// Kind of artifact a component spec describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Container image (Docker Hub, Artifactory or ECR)
    Image,
    /// RPM package in a yum/dnf repository
    Rpm,
    /// npm package
    Npm,
    /// Build identifier derived from git history
    Git,
    /// Fixed value taken from `version-default`
    Literal,
}

impl Kind {
    /// Returns the string representation used in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Image => "image",
            Kind::Rpm => "rpm",
            Kind::Npm => "npm",
            Kind::Git => "git",
            Kind::Literal => "literal",
        }
    }
}

impl std::str::FromStr for Kind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Kind::Image),
            "rpm" => Ok(Kind::Rpm),
            "npm" => Ok(Kind::Npm),
            "git" => Ok(Kind::Git),
            "literal" => Ok(Kind::Literal),
            _ => Err(()),
        }
    }
}

/// Fully merged spec for one named component
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ComponentSpec {
    /// Key of the component in the spec document (the output variable name)
    #[serde(skip)]
    pub component: String,
    pub kind: Option<Kind>,

    // Locators
    #[serde(deserialize_with = "string_like")]
    pub image: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub registry: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub namespace: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub artifactory_api: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub name: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub repo: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub npm_registry: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub paths: Vec<String>,
    #[serde(deserialize_with = "string_like")]
    pub git_dir: Option<String>,

    // Match criteria
    #[serde(deserialize_with = "string_like")]
    pub version: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub version_start: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub version_regex: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub alt_version: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub alt_version_start: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub alt_version_regex: Option<String>,
    pub exclude_latest: bool,
    #[serde(deserialize_with = "string_like")]
    pub date: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub date_before: Option<String>,
    #[serde(deserialize_with = "string_like")]
    pub date_after: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub creators: Vec<String>,

    /// Fallback value, and the value itself for literal specs
    #[serde(deserialize_with = "string_like")]
    pub version_default: Option<String>,

    /// Keys this crate does not know about
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Default for ComponentSpec {
    fn default() -> Self {
        Self {
            component: String::new(),
            kind: None,
            image: None,
            registry: None,
            namespace: None,
            artifactory_api: None,
            name: None,
            repo: None,
            npm_registry: None,
            paths: Vec::new(),
            git_dir: None,
            version: None,
            version_start: None,
            version_regex: None,
            alt_version: None,
            alt_version_start: None,
            alt_version_regex: None,
            exclude_latest: true,
            date: None,
            date_before: None,
            date_after: None,
            creators: Vec::new(),
            version_default: None,
            unknown: IndexMap::new(),
        }
    }
}

impl ComponentSpec {
    /// Builds a typed spec from a merged spec map
    ///
    /// Empty strings and empty list entries are treated as unset, so an empty
    /// criterion never turns into a predicate.
    pub fn from_map(component: &str, map: SpecMap) -> Result<Self, SpecError> {
        let mut spec: ComponentSpec =
            serde_json::from_value(Value::Object(map)).map_err(|e| SpecError::Malformed {
                component: component.to_string(),
                reason: e.to_string(),
            })?;
        spec.component = component.to_string();

        for field in [
            &mut spec.image,
            &mut spec.registry,
            &mut spec.namespace,
            &mut spec.artifactory_api,
            &mut spec.name,
            &mut spec.repo,
            &mut spec.npm_registry,
            &mut spec.git_dir,
            &mut spec.version,
            &mut spec.version_start,
            &mut spec.version_regex,
            &mut spec.alt_version,
            &mut spec.alt_version_start,
            &mut spec.alt_version_regex,
            &mut spec.date,
            &mut spec.date_before,
            &mut spec.date_after,
            &mut spec.version_default,
        ] {
            if field.as_deref().is_some_and(str::is_empty) {
                *field = None;
            }
        }
        spec.paths.retain(|p| !p.is_empty());
        spec.creators.retain(|c| !c.is_empty());

        Ok(spec)
    }
}

/// Renders a scalar document value as a string
///
/// Integers and booleans are accepted wherever a string is expected. Other
/// numbers are rejected: YAML reads `1.10` as `1.1` and `2.` as `2.0`, so
/// their text cannot be recovered.
fn scalar_to_string(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) if n.is_f64() => Err(format!("{} must be quoted", n)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("expected a string, found {}", other)),
    }
}

fn string_like<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(value).map_err(serde::de::Error::custom)
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| scalar_to_string(item).transpose())
            .collect::<Result<Vec<_>, _>>()
            .map_err(serde::de::Error::custom),
        single => scalar_to_string(single)
            .map(|s| s.into_iter().collect())
            .map_err(serde::de::Error::custom),
    }
}
