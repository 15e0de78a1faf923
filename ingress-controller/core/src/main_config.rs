//! Process-wide configuration rendered into `nginx.conf`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MainConfig {
    pub worker_processes: String,
    pub worker_rlimit_nofile: Option<String>,
    pub worker_cpu_affinity: Option<String>,
    pub worker_shutdown_timeout: Option<String>,
    pub worker_connections: String,
    pub error_log_level: String,
    pub access_log_off: bool,
    /// Lines of the `main` access log format. Empty selects the default.
    pub log_format: Vec<String>,
    pub log_format_escaping: Option<String>,
    pub stream_log_format: Vec<String>,
    pub server_tokens: String,
    pub server_names_hash_bucket_size: String,
    pub server_names_hash_max_size: String,
    pub keepalive_timeout: String,
    pub keepalive_requests: u32,
    pub ssl_protocols: Option<String>,
    pub ssl_ciphers: Option<String>,
    pub ssl_prefer_server_ciphers: bool,
    pub resolver_addresses: Vec<String>,
    pub resolver_ipv6: bool,
    pub resolver_valid: Option<String>,
    pub resolver_timeout: Option<String>,
    pub tls_passthrough: bool,
    pub tls_passthrough_port: u16,
    pub default_http_listener_port: u16,
    pub default_https_listener_port: u16,
    pub disable_ipv6: bool,
    pub status_port: u16,
    pub status_allow_cidrs: Vec<String>,
    pub main_snippets: Vec<String>,
    pub http_snippets: Vec<String>,
    pub stream_snippets: Vec<String>,
    /// Usage reporting settings. Only rendered by engines that accept the
    /// `mgmt` block.
    pub mgmt: Option<MgmtConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MgmtConfig {
    pub usage_report_endpoint: Option<String>,
    pub license_token_path: Option<String>,
    pub enforce_initial_report: Option<bool>,
    pub resolver: Option<String>,
    pub ssl_verify: Option<bool>,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            worker_processes: "auto".to_string(),
            worker_rlimit_nofile: None,
            worker_cpu_affinity: None,
            worker_shutdown_timeout: None,
            worker_connections: "1024".to_string(),
            error_log_level: "notice".to_string(),
            access_log_off: false,
            log_format: Vec::new(),
            log_format_escaping: None,
            stream_log_format: Vec::new(),
            server_tokens: "on".to_string(),
            server_names_hash_bucket_size: "256".to_string(),
            server_names_hash_max_size: "1024".to_string(),
            keepalive_timeout: "65s".to_string(),
            keepalive_requests: 100,
            ssl_protocols: None,
            ssl_ciphers: None,
            ssl_prefer_server_ciphers: false,
            resolver_addresses: Vec::new(),
            resolver_ipv6: true,
            resolver_valid: None,
            resolver_timeout: None,
            tls_passthrough: false,
            tls_passthrough_port: 443,
            default_http_listener_port: 80,
            default_https_listener_port: 443,
            disable_ipv6: false,
            status_port: 8080,
            status_allow_cidrs: vec!["127.0.0.1".to_string()],
            main_snippets: Vec::new(),
            http_snippets: Vec::new(),
            stream_snippets: Vec::new(),
            mgmt: None,
        }
    }
}
