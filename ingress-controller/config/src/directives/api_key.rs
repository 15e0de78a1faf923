use nginx_ingress_controller_core::virtual_server::ApiKey;

/// Builds the quoted njs variable value that concatenates every header and
/// query parameter an API key may be supplied in.
pub fn build_header_query_value(api_key: &ApiKey) -> String {
    let headers = api_key
        .header
        .iter()
        .map(|h| format!("${{http_{}}}", h.to_lowercase().replace('-', "_")));
    let queries = api_key.query.iter().map(|q| format!("${{arg_{q}}}"));

    format!("\"{}\"", headers.chain(queries).collect::<String>())
}
