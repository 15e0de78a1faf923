use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The name of the built-in listener that receives TLS passthrough traffic.
/// User-defined listeners may not claim it.
pub const TLS_PASSTHROUGH_LISTENER_NAME: &str = "tls-passthrough";

/// The protocol of the built-in TLS passthrough listener.
pub const TLS_PASSTHROUGH_LISTENER_PROTOCOL: &str = "TLS_PASSTHROUGH";

/// Declares the listeners shared by VirtualServers and TransportServers.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "k8s.nginx.org",
    version = "v1",
    kind = "GlobalConfiguration",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfigurationSpec {
    #[serde(default)]
    pub listeners: Vec<Listener>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub port: i32,
    /// One of `HTTP`, `TCP` or `UDP`.
    pub protocol: String,
    /// Terminates TLS on an `HTTP` listener.
    #[serde(default)]
    pub ssl: bool,
}

impl Listener {
    /// The IP the listener binds, or the empty string for all addresses.
    pub fn ip(&self) -> &str {
        self.ip.as_deref().unwrap_or_default()
    }
}
