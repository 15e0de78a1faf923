//! Template filters for NGINX syntax.

/// Wraps a value in double quotes, escaping the characters NGINX treats
/// specially inside a quoted string. Variables such as `$host` are kept.
///
/// Usage: `add_header X-Tea {{ value|quote }};`
pub(crate) fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("$host", "\"$host\"")]
    #[case("", "\"\"")]
    #[case("say \"hi\"", "\"say \\\"hi\\\"\"")]
    #[case("C:\\tea", "\"C:\\\\tea\"")]
    fn quotes_values(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(quote(value), expected);
    }
}
