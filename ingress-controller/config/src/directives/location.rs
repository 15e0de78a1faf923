use nginx_ingress_controller_core::{ingress::Location, Annotations};
use nginx_ingress_controller_k8s_api::annotations;

/// A location match modifier selected by the `nginx.org/path-regex`
/// annotation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegexModifier {
    CaseSensitive,
    CaseInsensitive,
    Exact,
}

// === impl RegexModifier ===

impl RegexModifier {
    /// Parses an annotation value. Unknown values select no modifier.
    pub fn from_annotation(value: &str) -> Option<Self> {
        match value {
            "case_sensitive" => Some(Self::CaseSensitive),
            "case_insensitive" => Some(Self::CaseInsensitive),
            "exact" => Some(Self::Exact),
            _ => None,
        }
    }

    pub fn apply(&self, path: &str) -> String {
        match self {
            Self::CaseSensitive => format!("~ \"^{path}\""),
            Self::CaseInsensitive => format!("~* \"^{path}\""),
            Self::Exact => format!("= \"{path}\""),
        }
    }
}

/// Applies the modifier named by `kind` to `path`, leaving the path unchanged
/// if `kind` names no modifier.
pub fn apply_regex_modifier(path: &str, kind: &str) -> String {
    match RegexModifier::from_annotation(kind) {
        Some(modifier) => modifier.apply(path),
        None => path.to_string(),
    }
}

/// Builds the location path, honoring the path-regex annotation of the
/// resource the location came from.
///
/// A location merged from a minion only ever uses the minion's annotation;
/// the master's annotation applies to the master's own locations.
pub fn build_location_path(
    location: &Location,
    ingress_annotations: &Annotations,
    minion_annotations: Option<&Annotations>,
) -> String {
    let owner = match minion_annotations {
        Some(minion) if annotations::is_minion(minion) => minion,
        _ => ingress_annotations,
    };

    match owner.get(annotations::PATH_REGEX) {
        Some(kind) => apply_regex_modifier(&location.path, kind),
        None => location.path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use nginx_ingress_controller_core::ResourceId;
    use rstest::rstest;

    fn location(path: &str, minion: bool) -> Location {
        Location {
            path: path.to_string(),
            minion_ingress: minion.then(|| ResourceId::new("default", "tea-minion")),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("case_sensitive", "~ \"^/tea\"")]
    #[case("case_insensitive", "~* \"^/tea\"")]
    #[case("exact", "= \"/tea\"")]
    #[case("", "/tea")]
    #[case("Exact", "/tea")]
    #[case("regex", "/tea")]
    fn applies_regex_modifiers(#[case] kind: &str, #[case] expected: &str) {
        assert_eq!(apply_regex_modifier("/tea", kind), expected);
    }

    #[test]
    fn minion_uses_its_own_regex() {
        let master = btreemap! {
            "nginx.org/mergeable-ingress-type".to_string() => "master".to_string(),
            "nginx.org/path-regex".to_string() => "case_insensitive".to_string(),
        };
        let minion = btreemap! {
            "nginx.org/mergeable-ingress-type".to_string() => "minion".to_string(),
            "nginx.org/path-regex".to_string() => "case_sensitive".to_string(),
        };

        assert_eq!(
            build_location_path(&location("/tea/[A-Z0-9]{3}", true), &master, Some(&minion)),
            "~ \"^/tea/[A-Z0-9]{3}\""
        );
    }

    #[test]
    fn master_regex_does_not_apply_to_minions() {
        let master = btreemap! {
            "nginx.org/mergeable-ingress-type".to_string() => "master".to_string(),
            "nginx.org/path-regex".to_string() => "case_sensitive".to_string(),
        };
        let minion = btreemap! {
            "nginx.org/mergeable-ingress-type".to_string() => "minion".to_string(),
        };

        assert_eq!(
            build_location_path(&location("/coffee", true), &master, Some(&minion)),
            "/coffee"
        );
    }

    #[test]
    fn standalone_ingress_uses_its_regex() {
        let ingress = btreemap! {
            "nginx.org/path-regex".to_string() => "exact".to_string(),
        };

        assert_eq!(
            build_location_path(&location("/tea", false), &ingress, None),
            "= \"/tea\""
        );
        assert_eq!(
            build_location_path(&location("/tea", false), &Annotations::new(), None),
            "/tea"
        );
    }

    #[test]
    fn unmarked_minion_falls_back_to_owner() {
        let ingress = btreemap! {
            "nginx.org/path-regex".to_string() => "case_insensitive".to_string(),
        };
        let other = btreemap! {
            "nginx.org/path-regex".to_string() => "exact".to_string(),
        };

        assert_eq!(
            build_location_path(&location("/tea", true), &ingress, Some(&other)),
            "~* \"^/tea\""
        );
    }
}
