use nginx_ingress_controller_core::Annotations;
use nginx_ingress_controller_k8s_api::annotations;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Indentation of directives inside a location block.
const INDENT: &str = "\n        ";

/// An HTTP header field name (an RFC 9110 token).
static HEADER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[!#$%&'*+\-.^_`|~0-9A-Za-z]+$").expect("header name regex must compile")
});

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("invalid header syntax: {0:?}")]
    InvalidHeaderSyntax(String),

    #[error("multiple values found in header: {0:?}")]
    MultipleValues(String),
}

/// One entry of the `nginx.org/proxy-set-headers` annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxySetHeader {
    pub name: String,
    /// A fixed value. Without one the client's header is passed through.
    pub value: Option<String>,
}

/// Parses a comma-separated list of `Name[ value]` entries, failing if any
/// entry is malformed.
pub fn parse_proxy_set_headers(annotation: &str) -> Result<Vec<ProxySetHeader>, HeaderError> {
    annotation
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            let (name, value) = match entry.split_once(' ') {
                Some((name, value)) => (name.trim(), Some(value.trim())),
                None => (entry, None),
            };

            if !HEADER_NAME.is_match(name) {
                return Err(HeaderError::InvalidHeaderSyntax(entry.to_string()));
            }
            if value.is_some_and(|v| v.contains(' ')) {
                return Err(HeaderError::MultipleValues(entry.to_string()));
            }

            Ok(ProxySetHeader {
                name: name.to_string(),
                value: value.map(str::to_string),
            })
        })
        .collect()
}

/// Renders the annotation as `proxy_set_header` directives, each on its own
/// indented line, in input order.
pub fn build_proxy_set_headers(annotation: &str) -> Result<String, HeaderError> {
    Ok(render(parse_proxy_set_headers(annotation)?.iter()))
}

/// Renders the headers of a location merged from a minion.
///
/// The minion's headers come first. The master's headers follow, except those
/// the minion already sets. Locations that do not come from a minion use
/// only the owning ingress's headers.
pub fn build_merged_proxy_set_headers(
    ingress_annotations: &Annotations,
    minion_annotations: Option<&Annotations>,
) -> Result<String, HeaderError> {
    let parse = |annotations: &Annotations| match annotations.get(annotations::PROXY_SET_HEADERS) {
        Some(value) => parse_proxy_set_headers(value),
        None => Ok(Vec::new()),
    };

    let master = parse(ingress_annotations)?;
    let minion = match minion_annotations {
        Some(minion) if annotations::is_minion(minion) => parse(minion)?,
        _ => return Ok(render(master.iter())),
    };

    let inherited = master
        .iter()
        .filter(|h| !minion.iter().any(|m| m.name.eq_ignore_ascii_case(&h.name)));
    Ok(render(minion.iter().chain(inherited)))
}

fn render<'h>(headers: impl Iterator<Item = &'h ProxySetHeader>) -> String {
    headers.map(|h| format!("{INDENT}{h}")).collect()
}

// === impl ProxySetHeader ===

impl fmt::Display for ProxySetHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "proxy_set_header {} {:?};", self.name, value),
            None => write!(
                f,
                "proxy_set_header {} $http_{};",
                self.name,
                self.name.to_lowercase().replace('-', "_")
            ),
        }
    }
}
