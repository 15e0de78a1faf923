//! Configuration for the legacy Ingress family, assembled from Ingress
//! resources and their annotations.
//!
//! A mergeable ingress (a "master") may collect the locations of several
//! "minions". Locations keep a [`ResourceId`] for the minion they came from,
//! and the minion's annotations are carried alongside in
//! [`IngressNginxConfig::minions`].

use crate::{Annotations, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngressNginxConfig {
    /// The ingress that owns this configuration.
    pub ingress: IngressMeta,
    /// Minions merged into `ingress`, if it is a master.
    pub minions: Vec<IngressMeta>,
    pub upstreams: Vec<Upstream>,
    pub servers: Vec<Server>,
    pub keepalive: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngressMeta {
    pub namespace: String,
    pub name: String,
    pub annotations: Annotations,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Upstream {
    pub name: String,
    pub upstream_servers: Vec<UpstreamServer>,
    pub lb_method: Option<String>,
    pub upstream_zone_size: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamServer {
    pub address: String,
    pub max_fails: u32,
    pub max_conns: u32,
    pub fail_timeout: String,
    pub slow_start: Option<String>,
    pub resolve: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Server {
    pub name: String,
    pub server_tokens: String,
    pub http2: bool,
    /// Plain-text ports. Empty means the default HTTP port.
    pub ports: Vec<u16>,
    /// TLS ports. Empty means the default HTTPS port.
    pub ssl_ports: Vec<u16>,
    pub ssl: Option<Ssl>,
    pub ssl_redirect: bool,
    pub redirect_to_https: bool,
    pub hsts: Option<Hsts>,
    pub proxy_protocol: bool,
    pub disable_ipv6: bool,
    pub real_ip_header: Option<String>,
    pub set_real_ip_from: Vec<String>,
    pub real_ip_recursive: bool,
    pub status_zone: Option<String>,
    pub jwt_auth: Option<JwtAuth>,
    /// Active health checks, keyed by upstream name.
    pub health_checks: BTreeMap<String, HealthCheck>,
    pub server_snippets: Vec<String>,
    pub locations: Vec<Location>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ssl {
    pub certificate: String,
    pub certificate_key: String,
    pub ciphers: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Hsts {
    pub max_age: u64,
    pub include_subdomains: bool,
    pub behind_proxy: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct JwtAuth {
    pub key: String,
    pub realm: String,
    pub token: Option<String>,
    pub redirect_location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthCheck {
    pub uri: String,
    pub scheme: String,
    pub interval: u32,
    pub fails: u32,
    pub passes: u32,
    pub timeout_seconds: u32,
    pub headers: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Location {
    pub path: String,
    /// Name of the upstream this location proxies to.
    pub upstream: String,
    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub client_max_body_size: String,
    pub websocket: bool,
    pub rewrite: Option<String>,
    /// Proxy to the upstream over TLS.
    pub ssl: bool,
    pub grpc: bool,
    pub proxy_buffering: bool,
    pub proxy_buffers: Option<String>,
    pub proxy_buffer_size: Option<String>,
    pub proxy_max_temp_file_size: Option<String>,
    pub jwt_auth: Option<JwtAuth>,
    /// The minion this location was merged from.
    pub minion_ingress: Option<ResourceId>,
    pub location_snippets: Vec<String>,
}

// === impl IngressNginxConfig ===

impl IngressNginxConfig {
    pub fn minion(&self, id: &ResourceId) -> Option<&IngressMeta> {
        self.minions
            .iter()
            .find(|m| m.namespace == id.namespace && m.name == id.name)
    }

    pub fn upstream(&self, name: &str) -> Option<&Upstream> {
        self.upstreams.iter().find(|u| u.name == name)
    }
}

// === impl IngressMeta ===

impl IngressMeta {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.namespace, &self.name)
    }
}

// === defaults ===

impl Default for Upstream {
    fn default() -> Self {
        Self {
            name: String::new(),
            upstream_servers: Vec::new(),
            lb_method: None,
            upstream_zone_size: "256k".to_string(),
        }
    }
}

impl Default for UpstreamServer {
    fn default() -> Self {
        Self {
            address: String::new(),
            max_fails: 1,
            max_conns: 0,
            fail_timeout: "10s".to_string(),
            slow_start: None,
            resolve: false,
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self {
            name: String::new(),
            server_tokens: "on".to_string(),
            http2: false,
            ports: Vec::new(),
            ssl_ports: Vec::new(),
            ssl: None,
            ssl_redirect: false,
            redirect_to_https: false,
            hsts: None,
            proxy_protocol: false,
            disable_ipv6: false,
            real_ip_header: None,
            set_real_ip_from: Vec::new(),
            real_ip_recursive: false,
            status_zone: None,
            jwt_auth: None,
            health_checks: BTreeMap::new(),
            server_snippets: Vec::new(),
            locations: Vec::new(),
        }
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            uri: "/".to_string(),
            scheme: "http".to_string(),
            interval: 5,
            fails: 1,
            passes: 1,
            timeout_seconds: 60,
            headers: BTreeMap::new(),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            upstream: String::new(),
            proxy_connect_timeout: "60s".to_string(),
            proxy_read_timeout: "60s".to_string(),
            proxy_send_timeout: "60s".to_string(),
            client_max_body_size: "1m".to_string(),
            websocket: false,
            rewrite: None,
            ssl: false,
            grpc: false,
            proxy_buffering: true,
            proxy_buffers: None,
            proxy_buffer_size: None,
            proxy_max_temp_file_size: None,
            jwt_auth: None,
            minion_ingress: None,
            location_snippets: Vec::new(),
        }
    }
}
