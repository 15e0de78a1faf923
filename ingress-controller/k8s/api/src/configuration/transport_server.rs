use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Describes a TCP, UDP or TLS passthrough load balancer.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "k8s.nginx.org",
    version = "v1",
    kind = "TransportServer",
    shortname = "ts",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TransportServerSpec {
    pub listener: TransportServerListener,
    /// The SNI host routed to this server; required for TLS passthrough.
    pub host: Option<String>,
    #[serde(default)]
    pub upstreams: Vec<Upstream>,
    pub action: Option<Action>,
    pub server_snippets: Option<String>,
    pub stream_snippets: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransportServerListener {
    pub name: String,
    pub protocol: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    pub name: String,
    pub service: String,
    pub port: i32,
    pub backup: Option<String>,
    pub backup_port: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub pass: String,
}
