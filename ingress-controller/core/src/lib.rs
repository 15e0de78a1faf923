#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Render-ready intermediate representation of NGINX configuration, plus the
//! engine version negotiator that gates edition-specific directives.

pub mod ingress;
pub mod main_config;
pub mod transport_server;
pub mod version;
pub mod virtual_server;

pub use self::version::{Capabilities, Edition, EditionRelease, ProxyEngineVersion};

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Annotations attached to a resource, keyed by annotation name.
pub type Annotations = BTreeMap<String, String>;

/// Identifies a namespaced Kubernetes resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

/// Hosts mapped to the unix socket of the server that terminates them, used
/// to route TLS passthrough traffic by SNI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TlsPassthroughHosts(pub BTreeMap<String, String>);

// === impl ResourceId ===

impl ResourceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
