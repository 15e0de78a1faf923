//! Configuration for a VirtualServer and the VirtualServerRoutes it
//! delegates to.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct VirtualServerConfig {
    pub upstreams: Vec<Upstream>,
    pub split_clients: Vec<SplitClient>,
    pub maps: Vec<Map>,
    pub status_matches: Vec<StatusMatch>,
    pub limit_req_zones: Vec<LimitReqZone>,
    pub api_key_client_maps: Vec<ApiKeyClientMap>,
    pub http_snippets: Vec<String>,
    pub server: Server,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Upstream {
    pub name: String,
    pub servers: Vec<UpstreamServer>,
    /// Servers used only when all primary servers are unavailable.
    pub backup_servers: Vec<UpstreamServer>,
    pub lb_method: Option<String>,
    pub keepalive: u32,
    pub max_fails: u32,
    pub max_conns: u32,
    pub fail_timeout: String,
    pub slow_start: Option<String>,
    pub upstream_zone_size: String,
    pub resolve: bool,
    pub queue: Option<Queue>,
    pub session_cookie: Option<SessionCookie>,
    pub ntlm: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamServer {
    pub address: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Queue {
    pub size: u32,
    pub timeout: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionCookie {
    pub name: String,
    pub path: Option<String>,
    pub expires: Option<String>,
    pub domain: Option<String>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitClient {
    pub source: String,
    pub variable: String,
    pub distributions: Vec<Distribution>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Distribution {
    pub weight: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Map {
    pub source: String,
    pub variable: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameter {
    pub value: String,
    pub result: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusMatch {
    pub name: String,
    pub code: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitReqZone {
    pub key: String,
    pub zone_name: String,
    pub zone_size: String,
    pub rate: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitReq {
    pub zone: String,
    pub burst: Option<u32>,
    pub no_delay: bool,
    pub delay: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitReqOptions {
    pub dry_run: bool,
    pub log_level: Option<String>,
    pub reject_code: Option<u16>,
}

/// Hashed API keys accepted by an API-key policy, keyed by the map variable
/// the policy consults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiKeyClientMap {
    pub map_name: String,
    pub clients: Vec<ApiKeyClient>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiKeyClient {
    pub client_id: String,
    pub hashed_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Server {
    pub server_name: String,
    pub status_zone: String,
    /// When set, only the custom ports below are listened on.
    pub custom_listeners: bool,
    pub http_port: u16,
    pub https_port: u16,
    pub http_ipv4: Option<String>,
    pub http_ipv6: Option<String>,
    pub https_ipv4: Option<String>,
    pub https_ipv6: Option<String>,
    pub proxy_protocol: bool,
    pub disable_ipv6: bool,
    pub ssl: Option<Ssl>,
    pub tls_redirect: Option<TlsRedirect>,
    pub server_tokens: String,
    pub real_ip_header: Option<String>,
    pub set_real_ip_from: Vec<String>,
    pub real_ip_recursive: bool,
    pub snippets: Vec<String>,
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub limit_reqs: Vec<LimitReq>,
    pub limit_req_options: LimitReqOptions,
    pub jwt_auth: Option<JwtAuth>,
    pub api_key: Option<ApiKey>,
    pub ingress_mtls: Option<IngressMtls>,
    pub waf: Option<Waf>,
    pub dos: Option<Dos>,
    pub health_checks: Vec<HealthCheck>,
    pub internal_redirect_locations: Vec<InternalRedirectLocation>,
    pub locations: Vec<Location>,
    pub error_page_locations: Vec<ErrorPageLocation>,
    pub return_locations: Vec<ReturnLocation>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ssl {
    pub http2: bool,
    pub certificate: String,
    pub certificate_key: String,
    pub reject_handshake: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlsRedirect {
    pub code: u16,
    /// The variable the redirect decision is based on, e.g. `$scheme`.
    pub based_on: String,
}

/// JWT validation with either a static key file or a remote key set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct JwtAuth {
    /// Unique policy key, used to name the key-set cache and fetch location.
    pub name: String,
    pub realm: String,
    pub secret: Option<String>,
    pub token: Option<String>,
    pub jwks: Option<Jwks>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Jwks {
    pub uri: String,
    pub key_cache: String,
    pub sni_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiKey {
    pub header: Vec<String>,
    pub query: Vec<String>,
    pub map_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngressMtls {
    pub client_cert: String,
    pub verify_client: String,
    pub verify_depth: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EgressMtls {
    pub certificate: Option<String>,
    pub certificate_key: Option<String>,
    pub trusted_cert: Option<String>,
    pub verify_server: bool,
    pub verify_depth: u32,
    pub protocols: Option<String>,
    pub ciphers: Option<String>,
    pub session_reuse: bool,
    pub ssl_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Waf {
    pub enable: bool,
    pub ap_policy: Option<String>,
    pub ap_security_log_enable: bool,
    pub ap_log_conf: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Dos {
    pub enable: bool,
    pub name: String,
    pub ap_dos_policy: Option<String>,
    pub ap_dos_security_log_enable: bool,
    pub ap_dos_log_conf: Option<String>,
    pub ap_dos_monitor_uri: Option<String>,
    pub ap_dos_monitor_protocol: Option<String>,
    pub ap_dos_monitor_timeout: Option<u64>,
    pub ap_dos_access_log_dest: Option<String>,
    pub allow_list_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthCheck {
    /// Name of the internal location the check runs from.
    pub name: String,
    /// Name of the upstream being checked.
    pub upstream: String,
    pub scheme: String,
    pub uri: String,
    pub interval: String,
    pub jitter: String,
    pub keepalive_time: Option<String>,
    pub fails: u32,
    pub passes: u32,
    pub port: Option<u16>,
    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub headers: Vec<Header>,
    pub status_match: Option<String>,
    pub grpc_status: Option<u32>,
    pub grpc_service: Option<String>,
    pub mandatory: bool,
    pub persistent: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddHeader {
    pub name: String,
    pub value: String,
    pub always: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InternalRedirectLocation {
    pub path: String,
    pub destination: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorPage {
    pub name: String,
    pub codes: String,
    pub response_code: Option<u16>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorPageLocation {
    pub name: String,
    pub default_type: Option<String>,
    pub response: Return,
    pub headers: Vec<Header>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReturnLocation {
    pub name: String,
    pub default_type: String,
    pub response: Return,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Return {
    pub code: u16,
    pub text: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
    Grpc,
    Grpcs,
}

/// The upstream a location proxies to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyPass {
    pub scheme: Scheme,
    pub upstream: String,
    /// Optional URI appended after the upstream name.
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Location {
    /// The location path, including any match modifier.
    pub path: String,
    pub internal: bool,
    pub proxy_pass: Option<ProxyPass>,
    pub response: Option<Return>,
    pub snippets: Vec<String>,
    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub client_max_body_size: String,
    pub proxy_max_temp_file_size: String,
    pub proxy_buffering: bool,
    pub proxy_buffers: Option<String>,
    pub proxy_buffer_size: Option<String>,
    pub proxy_intercept_errors: bool,
    pub proxy_next_upstream: String,
    pub proxy_next_upstream_timeout: String,
    pub proxy_next_upstream_tries: u32,
    pub has_keepalive: bool,
    pub default_type: Option<String>,
    pub rewrites: Vec<String>,
    pub proxy_set_headers: Vec<Header>,
    pub add_headers: Vec<AddHeader>,
    pub proxy_hide_headers: Vec<String>,
    pub proxy_pass_headers: Vec<String>,
    pub proxy_ssl_name: Option<String>,
    pub error_pages: Vec<ErrorPage>,
    pub limit_reqs: Vec<LimitReq>,
    pub jwt_auth: Option<JwtAuth>,
    pub api_key: Option<ApiKey>,
    pub egress_mtls: Option<EgressMtls>,
    pub waf: Option<Waf>,
    pub dos: Option<Dos>,
}

// === impl VirtualServerConfig ===

impl VirtualServerConfig {
    pub fn upstream(&self, name: &str) -> Option<&Upstream> {
        self.upstreams.iter().find(|u| u.name == name)
    }
}

// === impl Server ===

impl Server {
    /// Every JWT policy with a remote key set, deduplicated by name, in order
    /// of first appearance.
    pub fn jwks_policies(&self) -> Vec<&JwtAuth> {
        let mut policies: Vec<&JwtAuth> = Vec::new();
        let all = self
            .jwt_auth
            .iter()
            .chain(self.locations.iter().filter_map(|l| l.jwt_auth.as_ref()));
        for jwt in all.filter(|j| j.jwks.is_some()) {
            if !policies.iter().any(|p| p.name == jwt.name) {
                policies.push(jwt);
            }
        }
        policies
    }

    pub fn api_key_enabled(&self) -> bool {
        self.api_key.is_some() || self.locations.iter().any(|l| l.api_key.is_some())
    }
}

// === defaults ===

impl Default for Upstream {
    fn default() -> Self {
        Self {
            name: String::new(),
            servers: Vec::new(),
            backup_servers: Vec::new(),
            lb_method: None,
            keepalive: 0,
            max_fails: 1,
            max_conns: 0,
            fail_timeout: "10s".to_string(),
            slow_start: None,
            upstream_zone_size: "512k".to_string(),
            resolve: false,
            queue: None,
            session_cookie: None,
            ntlm: false,
        }
    }
}

impl Default for Jwks {
    fn default() -> Self {
        Self {
            uri: String::new(),
            key_cache: "12h".to_string(),
            sni_name: None,
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self {
            server_name: String::new(),
            status_zone: String::new(),
            custom_listeners: false,
            http_port: 0,
            https_port: 0,
            http_ipv4: None,
            http_ipv6: None,
            https_ipv4: None,
            https_ipv6: None,
            proxy_protocol: false,
            disable_ipv6: false,
            ssl: None,
            tls_redirect: None,
            server_tokens: "on".to_string(),
            real_ip_header: None,
            set_real_ip_from: Vec::new(),
            real_ip_recursive: false,
            snippets: Vec::new(),
            allow: Vec::new(),
            deny: Vec::new(),
            limit_reqs: Vec::new(),
            limit_req_options: LimitReqOptions::default(),
            jwt_auth: None,
            api_key: None,
            ingress_mtls: None,
            waf: None,
            dos: None,
            health_checks: Vec::new(),
            internal_redirect_locations: Vec::new(),
            locations: Vec::new(),
            error_page_locations: Vec::new(),
            return_locations: Vec::new(),
        }
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            name: String::new(),
            upstream: String::new(),
            scheme: "http".to_string(),
            uri: "/".to_string(),
            interval: "5s".to_string(),
            jitter: "0s".to_string(),
            keepalive_time: None,
            fails: 1,
            passes: 1,
            port: None,
            proxy_connect_timeout: "60s".to_string(),
            proxy_read_timeout: "60s".to_string(),
            proxy_send_timeout: "60s".to_string(),
            headers: Vec::new(),
            status_match: None,
            grpc_status: None,
            grpc_service: None,
            mandatory: false,
            persistent: false,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            internal: false,
            proxy_pass: None,
            response: None,
            snippets: Vec::new(),
            proxy_connect_timeout: "60s".to_string(),
            proxy_read_timeout: "60s".to_string(),
            proxy_send_timeout: "60s".to_string(),
            client_max_body_size: "1m".to_string(),
            proxy_max_temp_file_size: "1024m".to_string(),
            proxy_buffering: true,
            proxy_buffers: None,
            proxy_buffer_size: None,
            proxy_intercept_errors: false,
            proxy_next_upstream: "error timeout".to_string(),
            proxy_next_upstream_timeout: "0s".to_string(),
            proxy_next_upstream_tries: 0,
            has_keepalive: false,
            default_type: None,
            rewrites: Vec::new(),
            proxy_set_headers: Vec::new(),
            add_headers: Vec::new(),
            proxy_hide_headers: Vec::new(),
            proxy_pass_headers: Vec::new(),
            proxy_ssl_name: None,
            error_pages: Vec::new(),
            limit_reqs: Vec::new(),
            jwt_auth: None,
            api_key: None,
            egress_mtls: None,
            waf: None,
            dos: None,
        }
    }
}
