//! Annotations read from Ingress resources.

/// Applies a regex match modifier to the ingress's location paths.
pub const PATH_REGEX: &str = "nginx.org/path-regex";

/// Marks an ingress as the `master` or a `minion` of a mergeable group.
pub const MERGEABLE_INGRESS_TYPE: &str = "nginx.org/mergeable-ingress-type";

/// A comma-separated list of `Name[ value]` headers to set on proxied
/// requests.
pub const PROXY_SET_HEADERS: &str = "nginx.org/proxy-set-headers";

pub const MASTER: &str = "master";
pub const MINION: &str = "minion";

/// Values accepted by [`PATH_REGEX`].
pub const PATH_REGEX_VALUES: [&str; 3] = ["case_sensitive", "case_insensitive", "exact"];

/// Returns true if the annotations mark a mergeable minion.
pub fn is_minion(annotations: &std::collections::BTreeMap<String, String>) -> bool {
    annotations
        .get(MERGEABLE_INGRESS_TYPE)
        .map(|v| v == MINION)
        .unwrap_or(false)
}
