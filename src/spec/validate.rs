//! Validation of merged component specs

use regex::Regex;

use crate::spec::types::{ComponentSpec, Kind};
use crate::version::timestamp::parse_timestamp_str;

/// Returns the problems found in one spec, empty when valid
pub fn problems(spec: &ComponentSpec) -> Vec<String> {
    let mut problems = Vec::new();

    let mut require = |present: bool, field: &str| {
        if !present {
            problems.push(format!("missing {}", field));
        }
    };

    match spec.kind {
        None => require(false, "kind"),
        Some(Kind::Rpm) => {
            require(spec.name.is_some(), "name");
            require(spec.repo.is_some(), "repo");
        }
        Some(Kind::Image) => {
            require(spec.image.is_some(), "image");
            if spec.artifactory_api.is_some() {
                require(spec.registry.is_some(), "registry");
            }
        }
        Some(Kind::Npm) => require(spec.name.is_some(), "name"),
        Some(Kind::Git) => require(!spec.paths.is_empty(), "paths"),
        Some(Kind::Literal) => require(spec.version_default.is_some(), "version-default"),
    }

    for (field, pattern) in [
        ("version-regex", &spec.version_regex),
        ("alt-version-regex", &spec.alt_version_regex),
    ] {
        if let Some(pattern) = pattern
            && let Err(e) = Regex::new(pattern)
        {
            problems.push(format!("invalid {} ({})", field, e));
        }
    }

    for (field, value) in [
        ("date", &spec.date),
        ("date-before", &spec.date_before),
        ("date-after", &spec.date_after),
    ] {
        if let Some(value) = value
            && parse_timestamp_str(value).is_none()
        {
            problems.push(format!("invalid {} '{}'", field, value));
        }
    }

    problems
}

/// Validates every spec, returning one `component: problem, problem` line per
/// invalid spec
pub fn validate_all<'a>(specs: impl IntoIterator<Item = &'a ComponentSpec>) -> Vec<String> {
    specs
        .into_iter()
        .filter_map(|spec| {
            let problems = problems(spec);
            (!problems.is_empty()).then(|| format!("{}: {}", spec.component, problems.join(", ")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn spec(kind: Option<Kind>) -> ComponentSpec {
        ComponentSpec {
            component: "X".to_string(),
            kind,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(None, vec!["missing kind"])]
    #[case(Some(Kind::Rpm), vec!["missing name", "missing repo"])]
    #[case(Some(Kind::Image), vec!["missing image"])]
    #[case(Some(Kind::Npm), vec!["missing name"])]
    #[case(Some(Kind::Git), vec!["missing paths"])]
    #[case(Some(Kind::Literal), vec!["missing version-default"])]
    fn problems_reports_missing_required_fields(
        #[case] kind: Option<Kind>,
        #[case] expected: Vec<&str>,
    ) {
        assert_eq!(problems(&spec(kind)), expected);
    }

    #[test]
    fn problems_accepts_complete_rpm_spec() {
        let spec = ComponentSpec {
            name: Some("binutils".to_string()),
            repo: Some("https://repo.example.com".to_string()),
            ..spec(Some(Kind::Rpm))
        };
        assert!(problems(&spec).is_empty());
    }

    #[test]
    fn problems_requires_registry_for_artifactory_images() {
        let spec = ComponentSpec {
            image: Some("app".to_string()),
            artifactory_api: Some("https://art.example.com/artifactory".to_string()),
            ..spec(Some(Kind::Image))
        };
        assert_eq!(problems(&spec), vec!["missing registry"]);
    }

    #[test]
    fn problems_reports_bad_regex_and_dates() {
        let spec = ComponentSpec {
            name: Some("left-pad".to_string()),
            version_regex: Some("(".to_string()),
            date_after: Some("last tuesday".to_string()),
            ..spec(Some(Kind::Npm))
        };

        let found = problems(&spec);

        assert_eq!(found.len(), 2);
        assert!(found[0].starts_with("invalid version-regex"));
        assert_eq!(found[1], "invalid date-after 'last tuesday'");
    }

    #[test]
    fn validate_all_joins_problems_per_component() {
        let valid = ComponentSpec {
            component: "GOOD".to_string(),
            name: Some("left-pad".to_string()),
            ..spec(Some(Kind::Npm))
        };
        let invalid = ComponentSpec {
            component: "BAD".to_string(),
            ..spec(Some(Kind::Rpm))
        };

        assert_eq!(
            validate_all([&valid, &invalid]),
            vec!["BAD: missing name, missing repo"]
        );
    }
}
