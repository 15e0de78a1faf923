use once_cell::sync::Lazy;
use regex::Regex;

const DNS1035_LABEL_FMT: &str = "[a-z]([-a-z0-9]*[a-z0-9])?";
const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const DNS1035_LABEL_MAX_LEN: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LEN: usize = 253;

static DNS1035_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{DNS1035_LABEL_FMT}$")).expect("label regex must compile")
});

static DNS1123_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{DNS1123_LABEL_FMT}(\.{DNS1123_LABEL_FMT})*$"))
        .expect("subdomain regex must compile")
});

/// Checks that `value` is a DNS-1035 label, as required of listener,
/// upstream and service names. Returns a description of each violation.
pub(crate) fn dns1035_label(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > DNS1035_LABEL_MAX_LEN {
        errors.push(format!(
            "must be no more than {DNS1035_LABEL_MAX_LEN} characters"
        ));
    }
    if !DNS1035_LABEL.is_match(value) {
        errors.push(format!(
            "a DNS-1035 label must consist of lower case alphanumeric characters or '-', start \
             with an alphabetic character, and end with an alphanumeric character (e.g. \
             'my-name', or 'abc-123', regex used for validation is '{DNS1035_LABEL_FMT}')"
        ));
    }
    errors
}

/// Checks that `value` is a host name. A leading `*.` wildcard is allowed.
pub(crate) fn host(value: &str) -> Vec<String> {
    let name = value.strip_prefix("*.").unwrap_or(value);
    let mut errors = Vec::new();
    if name.len() > DNS1123_SUBDOMAIN_MAX_LEN {
        errors.push(format!(
            "must be no more than {DNS1123_SUBDOMAIN_MAX_LEN} characters"
        ));
    }
    if !DNS1123_SUBDOMAIN.is_match(name) {
        errors.push(
            "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, \
             '-' or '.', and must start and end with an alphanumeric character (e.g. \
             'example.com')"
                .to_string(),
        );
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("tcp-listener", true)]
    #[case("a", true)]
    #[case("a1", true)]
    #[case("1a", false)]
    #[case("Listener", false)]
    #[case("listener-", false)]
    #[case("", false)]
    #[case("a.b", false)]
    fn validates_dns1035_labels(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(dns1035_label(name).is_empty(), valid, "{name:?}");
    }

    #[test]
    fn limits_label_length() {
        assert!(dns1035_label(&"a".repeat(63)).is_empty());
        assert_eq!(dns1035_label(&"a".repeat(64)).len(), 1);
    }

    #[rstest]
    #[case("cafe.example.com", true)]
    #[case("*.example.com", true)]
    #[case("example", true)]
    #[case("Cafe.example.com", false)]
    #[case("cafe..example.com", false)]
    #[case("", false)]
    fn validates_hosts(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(host(name).is_empty(), valid, "{name:?}");
    }
}
