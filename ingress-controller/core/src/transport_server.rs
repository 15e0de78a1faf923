//! Configuration for a TransportServer: a TCP, UDP or TLS passthrough
//! stream server.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportServerConfig {
    pub upstreams: Vec<StreamUpstream>,
    #[serde(rename = "match")]
    pub stream_match: Option<Match>,
    pub server: StreamServer,
    pub stream_snippets: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamUpstream {
    pub name: String,
    pub servers: Vec<StreamUpstreamServer>,
    pub backup_servers: Vec<StreamUpstreamServer>,
    pub upstream_zone_size: String,
    pub lb_method: Option<String>,
    pub resolve: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamUpstreamServer {
    pub address: String,
    pub max_fails: u32,
    pub max_conns: u32,
    pub fail_timeout: String,
}

/// A health check expectation: data to send and the response to expect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Match {
    pub name: String,
    pub send: String,
    pub expect: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamServer {
    pub tls_passthrough: bool,
    /// Socket a passthrough server listens on; the main configuration
    /// routes matching SNI hosts to it.
    pub unix_socket: String,
    pub port: u16,
    pub udp: bool,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub disable_ipv6: bool,
    pub status_zone: String,
    pub proxy_requests: Option<u32>,
    pub proxy_responses: Option<u32>,
    /// Name of the upstream this server proxies to.
    pub proxy_pass: String,
    pub proxy_timeout: String,
    pub proxy_connect_timeout: String,
    pub proxy_next_upstream: bool,
    pub proxy_next_upstream_timeout: String,
    pub proxy_next_upstream_tries: u32,
    pub health_check: Option<StreamHealthCheck>,
    pub ssl: Option<StreamSsl>,
    pub server_snippets: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamHealthCheck {
    pub timeout: String,
    pub jitter: String,
    pub port: Option<u16>,
    pub interval: String,
    pub passes: u32,
    pub fails: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamSsl {
    pub certificate: String,
    pub certificate_key: String,
}

// === impl TransportServerConfig ===

impl TransportServerConfig {
    pub fn upstream(&self, name: &str) -> Option<&StreamUpstream> {
        self.upstreams.iter().find(|u| u.name == name)
    }
}

// === defaults ===

impl Default for StreamUpstream {
    fn default() -> Self {
        Self {
            name: String::new(),
            servers: Vec::new(),
            backup_servers: Vec::new(),
            upstream_zone_size: "512k".to_string(),
            lb_method: None,
            resolve: false,
        }
    }
}

impl Default for StreamUpstreamServer {
    fn default() -> Self {
        Self {
            address: String::new(),
            max_fails: 1,
            max_conns: 0,
            fail_timeout: "10s".to_string(),
        }
    }
}

impl Default for StreamServer {
    fn default() -> Self {
        Self {
            tls_passthrough: false,
            unix_socket: String::new(),
            port: 0,
            udp: false,
            ipv4: None,
            ipv6: None,
            disable_ipv6: false,
            status_zone: String::new(),
            proxy_requests: None,
            proxy_responses: None,
            proxy_pass: String::new(),
            proxy_timeout: "10m".to_string(),
            proxy_connect_timeout: "60s".to_string(),
            proxy_next_upstream: false,
            proxy_next_upstream_timeout: "0s".to_string(),
            proxy_next_upstream_tries: 0,
            health_check: None,
            ssl: None,
            server_snippets: Vec::new(),
        }
    }
}

impl Default for StreamHealthCheck {
    fn default() -> Self {
        Self {
            timeout: "5s".to_string(),
            jitter: "0s".to_string(),
            port: None,
            interval: "5s".to_string(),
            passes: 1,
            fails: 1,
        }
    }
}
