use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Describes an HTTP load balancer for a single host.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "k8s.nginx.org",
    version = "v1",
    kind = "VirtualServer",
    shortname = "vs",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServerSpec {
    pub host: String,
    pub listener: Option<VirtualServerListener>,
    pub tls: Option<Tls>,
    #[serde(default)]
    pub upstreams: Vec<Upstream>,
    #[serde(default)]
    pub routes: Vec<Route>,
    pub server_snippets: Option<String>,
    pub http_snippets: Option<String>,
}

/// Names of GlobalConfiguration listeners that replace the default ports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServerListener {
    pub http: Option<String>,
    pub https: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tls {
    pub secret: Option<String>,
    pub redirect: Option<TlsRedirect>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsRedirect {
    #[serde(default)]
    pub enable: bool,
    pub code: Option<i32>,
    pub based_on: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    pub name: String,
    pub service: String,
    pub port: i32,
    pub lb_method: Option<String>,
    /// A service resolved by DNS and used as a backup server.
    pub backup: Option<String>,
    pub backup_port: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub path: String,
    pub action: Option<Action>,
}

/// Exactly one of the fields must be set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub pass: Option<String>,
    pub redirect: Option<ActionRedirect>,
    #[serde(rename = "return")]
    pub action_return: Option<ActionReturn>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionRedirect {
    pub url: String,
    pub code: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionReturn {
    pub code: Option<i32>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub body: String,
}
