//! Layered defaulting of component specs
//!
//! Precedence, lowest to highest:
//!
//! ```text
//! built-in < all < by-type[kind] < by-name[component] < explicit spec
//! ```
//!
//! Within one tier, documents are merged in the order given and later
//! documents win. Tiers never trade places, whatever the document order.

use serde_json::Value;

use crate::spec::document::DefaultsDocument;
use crate::spec::types::SpecMap;

/// Built-in defaults applied beneath every other layer
pub fn builtin_defaults() -> SpecMap {
    let mut map = SpecMap::new();
    map.insert("exclude-latest".to_string(), Value::Bool(true));
    map
}

/// Overlays `top` on `base` key by key, `top` winning
pub fn overlay(base: &SpecMap, top: &SpecMap) -> SpecMap {
    let mut merged = base.clone();
    for (key, value) in top {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn fold_layers<'a>(layers: impl IntoIterator<Item = &'a SpecMap>) -> SpecMap {
    layers
        .into_iter()
        .fold(SpecMap::new(), |acc, layer| overlay(&acc, layer))
}

/// Kind used to pick the `by-type` layer
///
/// Taken from the explicit spec (or its `by-name` defaults), else from `all`.
fn effective_kind<'a>(named: &'a SpecMap, all: &'a SpecMap) -> Option<&'a str> {
    named
        .get("kind")
        .and_then(Value::as_str)
        .or_else(|| all.get("kind").and_then(Value::as_str))
}

/// Merges all defaults layers under the explicit spec of `component`
///
/// Keys set to `null` in a higher layer clear the key; they are removed from
/// the result so the typed spec falls back to its own defaults.
pub fn merge_defaults(documents: &[DefaultsDocument], component: &str, spec: &SpecMap) -> SpecMap {
    let all = fold_layers(documents.iter().map(|doc| &doc.all));
    let by_name = fold_layers(documents.iter().filter_map(|doc| doc.by_name.get(component)));

    let named = overlay(&by_name, spec);
    let by_type = match effective_kind(&named, &all) {
        Some(kind) => fold_layers(documents.iter().filter_map(|doc| doc.by_type.get(kind))),
        None => SpecMap::new(),
    };

    let builtin = builtin_defaults();
    let layers = [&builtin, &all, &by_type, &by_name, spec];
    let mut merged = fold_layers(layers);
    merged.retain(|_, value| !value.is_null());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn map(value: Value) -> SpecMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn doc(all: Value, by_type: Value, by_name: Value) -> DefaultsDocument {
        let layer = |value: Value| -> IndexMap<String, SpecMap> {
            map(value).into_iter().map(|(k, v)| (k, map(v))).collect()
        };
        DefaultsDocument {
            all: map(all),
            by_type: layer(by_type),
            by_name: layer(by_name),
        }
    }

    #[test]
    fn merge_defaults_applies_builtin_exclude_latest() {
        let merged = merge_defaults(&[], "X", &map(json!({"kind": "image"})));
        assert_eq!(merged.get("exclude-latest"), Some(&json!(true)));
    }

    #[test]
    fn merge_defaults_respects_tier_precedence() {
        let documents = [doc(
            json!({"registry": "all", "namespace": "all", "image": "all", "repo": "all"}),
            json!({"image": {"registry": "type", "namespace": "type", "image": "type"}}),
            json!({"X": {"registry": "name", "namespace": "name"}}),
        )];
        let spec = map(json!({"kind": "image", "registry": "spec"}));

        let merged = merge_defaults(&documents, "X", &spec);

        assert_eq!(merged.get("registry"), Some(&json!("spec")));
        assert_eq!(merged.get("namespace"), Some(&json!("name")));
        assert_eq!(merged.get("image"), Some(&json!("type")));
        assert_eq!(merged.get("repo"), Some(&json!("all")));
    }

    #[test]
    fn merge_defaults_precedence_is_independent_of_document_order() {
        let low = doc(json!({"version-start": "all"}), json!({}), json!({}));
        let high = doc(
            json!({}),
            json!({"npm": {"version-start": "type"}}),
            json!({"X": {"version-start": "name"}}),
        );
        let spec = map(json!({"kind": "npm"}));

        let forward = merge_defaults(&[low.clone(), high.clone()], "X", &spec);
        let backward = merge_defaults(&[high, low], "X", &spec);

        assert_eq!(forward.get("version-start"), Some(&json!("name")));
        assert_eq!(forward, backward);
    }

    #[test]
    fn merge_defaults_later_documents_win_within_a_tier() {
        let first = doc(json!({"namespace": "first"}), json!({}), json!({}));
        let second = doc(json!({"namespace": "second"}), json!({}), json!({}));

        let merged = merge_defaults(&[first, second], "X", &map(json!({"kind": "image"})));

        assert_eq!(merged.get("namespace"), Some(&json!("second")));
    }

    #[test]
    fn merge_defaults_takes_kind_from_all_when_spec_has_none() {
        let documents = [doc(
            json!({"kind": "rpm"}),
            json!({"rpm": {"repo": "https://repo.example.com"}}),
            json!({}),
        )];

        let merged = merge_defaults(&documents, "X", &map(json!({"name": "zlib"})));

        assert_eq!(merged.get("kind"), Some(&json!("rpm")));
        assert_eq!(merged.get("repo"), Some(&json!("https://repo.example.com")));
    }

    #[test]
    fn merge_defaults_takes_kind_from_by_name() {
        let documents = [doc(
            json!({"kind": "rpm"}),
            json!({"npm": {"npm-registry": "https://npm.example.com"}}),
            json!({"X": {"kind": "npm"}}),
        )];

        let merged = merge_defaults(&documents, "X", &map(json!({"name": "left-pad"})));

        assert_eq!(merged.get("kind"), Some(&json!("npm")));
        assert_eq!(
            merged.get("npm-registry"),
            Some(&json!("https://npm.example.com"))
        );
    }

    #[test]
    fn merge_defaults_null_clears_lower_layers() {
        let documents = [doc(json!({"version-regex": "^v"}), json!({}), json!({}))];
        let spec = map(json!({"kind": "image", "version-regex": null, "exclude-latest": null}));

        let merged = merge_defaults(&documents, "X", &spec);

        assert!(!merged.contains_key("version-regex"));
        assert!(!merged.contains_key("exclude-latest"));
    }

    #[test]
    fn merge_defaults_ignores_other_components_by_name() {
        let documents = [doc(json!({}), json!({}), json!({"OTHER": {"image": "other"}}))];
        let merged = merge_defaults(&documents, "X", &map(json!({"kind": "image"})));
        assert!(!merged.contains_key("image"));
    }
}
