use crate::{directives::HeaderError, filters, view};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use nginx_ingress_controller_core::{
    ingress::IngressNginxConfig, main_config::MainConfig,
    transport_server::TransportServerConfig, virtual_server::VirtualServerConfig, Capabilities,
    Edition, ProxyEngineVersion, ResourceId, TlsPassthroughHosts,
};
use serde::Serialize;
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::debug;

/// Every template, keyed by the name it is registered under. Top-level
/// templates are named `<edition prefix>.<family>.conf`; the rest are
/// partials included by them.
static TEMPLATES: &[(&str, &str)] = &[
    ("nginx.conf", include_str!("../templates/nginx.conf")),
    ("nginx-plus.conf", include_str!("../templates/nginx-plus.conf")),
    ("nginx.ingress.conf", include_str!("../templates/nginx.ingress.conf")),
    ("nginx-plus.ingress.conf", include_str!("../templates/nginx-plus.ingress.conf")),
    ("nginx.virtualserver.conf", include_str!("../templates/nginx.virtualserver.conf")),
    ("nginx-plus.virtualserver.conf", include_str!("../templates/nginx-plus.virtualserver.conf")),
    ("nginx.transportserver.conf", include_str!("../templates/nginx.transportserver.conf")),
    ("nginx-plus.transportserver.conf", include_str!("../templates/nginx-plus.transportserver.conf")),
    ("tls-passthrough-hosts.conf", include_str!("../templates/tls-passthrough-hosts.conf")),
    ("main/http.conf", include_str!("../templates/main/http.conf")),
    ("main/stream.conf", include_str!("../templates/main/stream.conf")),
    ("ingress/server.conf", include_str!("../templates/ingress/server.conf")),
    ("ingress/location.conf", include_str!("../templates/ingress/location.conf")),
    ("virtualserver/http.conf", include_str!("../templates/virtualserver/http.conf")),
    ("virtualserver/server.conf", include_str!("../templates/virtualserver/server.conf")),
    ("virtualserver/location.conf", include_str!("../templates/virtualserver/location.conf")),
    ("transportserver/server.conf", include_str!("../templates/transportserver/server.conf")),
];

/// A resource family with a template per edition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TemplateId {
    Main,
    Ingress,
    VirtualServer,
    TransportServer,
    TlsPassthroughHosts,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown template {0:?}: expected one of main, ingress, virtualserver, transportserver, tls-passthrough-hosts")]
pub struct UnknownTemplate(String);

/// A rendering failure. No output is produced when rendering fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load template {name}")]
    Load {
        name: &'static str,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to render template {template}")]
    Render {
        template: &'static str,
        #[source]
        source: minijinja::Error,
    },

    #[error("{referrer} references undefined upstream {upstream:?}")]
    UndefinedUpstream { referrer: String, upstream: String },

    #[error("location {path:?} references undefined minion ingress {minion}")]
    UndefinedMinion { path: String, minion: ResourceId },

    #[error("invalid proxy-set-headers annotation on {resource}")]
    ProxySetHeaders {
        resource: ResourceId,
        #[source]
        source: HeaderError,
    },
}

/// Renders configuration files for one engine edition.
///
/// Templates are compiled when the executor is built and are never modified
/// afterwards, so an executor may be shared by concurrent render passes.
#[derive(Debug)]
pub struct TemplateExecutor {
    env: Environment<'static>,
    edition: Edition,
    capabilities: Capabilities,
}

// === impl TemplateId ===

impl TemplateId {
    pub const ALL: [Self; 5] = [
        Self::Main,
        Self::Ingress,
        Self::VirtualServer,
        Self::TransportServer,
        Self::TlsPassthroughHosts,
    ];

    /// The name of the template rendered for this family on `edition`.
    pub fn name(&self, edition: Edition) -> &'static str {
        match (self, edition) {
            (Self::Main, Edition::Oss) => "nginx.conf",
            (Self::Main, Edition::Plus) => "nginx-plus.conf",
            (Self::Ingress, Edition::Oss) => "nginx.ingress.conf",
            (Self::Ingress, Edition::Plus) => "nginx-plus.ingress.conf",
            (Self::VirtualServer, Edition::Oss) => "nginx.virtualserver.conf",
            (Self::VirtualServer, Edition::Plus) => "nginx-plus.virtualserver.conf",
            (Self::TransportServer, Edition::Oss) => "nginx.transportserver.conf",
            (Self::TransportServer, Edition::Plus) => "nginx-plus.transportserver.conf",
            (Self::TlsPassthroughHosts, _) => "tls-passthrough-hosts.conf",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Ingress => "ingress",
            Self::VirtualServer => "virtualserver",
            Self::TransportServer => "transportserver",
            Self::TlsPassthroughHosts => "tls-passthrough-hosts",
        }
    }
}

impl FromStr for TemplateId {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownTemplate(s.to_string()))
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl TemplateExecutor ===

impl TemplateExecutor {
    pub fn new(edition: Edition, capabilities: Capabilities) -> Result<Self, Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_filter("quote", filters::quote);

        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|source| Error::Load { name, source })?;
        }

        Ok(Self {
            env,
            edition,
            capabilities,
        })
    }

    /// Builds an executor for the installed engine.
    pub fn from_version(version: &ProxyEngineVersion) -> Result<Self, Error> {
        Self::new(version.edition(), version.capabilities())
    }

    pub fn edition(&self) -> Edition {
        self.edition
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn execute_main(&self, config: &MainConfig) -> Result<Vec<u8>, Error> {
        let view = view::main_config::MainConfigView::new(config, self.capabilities);
        self.render(TemplateId::Main, &view)
    }

    pub fn execute_ingress(&self, config: &IngressNginxConfig) -> Result<Vec<u8>, Error> {
        let view = view::ingress::IngressView::new(config)?;
        self.render(TemplateId::Ingress, &view)
    }

    pub fn execute_virtual_server(&self, config: &VirtualServerConfig) -> Result<Vec<u8>, Error> {
        let view = view::virtual_server::VirtualServerView::new(config)?;
        self.render(TemplateId::VirtualServer, &view)
    }

    pub fn execute_transport_server(
        &self,
        config: &TransportServerConfig,
    ) -> Result<Vec<u8>, Error> {
        let view = view::transport_server::TransportServerView::new(config)?;
        self.render(TemplateId::TransportServer, &view)
    }

    pub fn execute_tls_passthrough_hosts(
        &self,
        hosts: &TlsPassthroughHosts,
    ) -> Result<Vec<u8>, Error> {
        self.render(
            TemplateId::TlsPassthroughHosts,
            &minijinja::context! { hosts => hosts },
        )
    }

    fn render<S: Serialize>(&self, id: TemplateId, ctx: &S) -> Result<Vec<u8>, Error> {
        let template = id.name(self.edition);
        let render = || self.env.get_template(template)?.render(ctx);
        let output = render().map_err(|source| Error::Render { template, source })?;
        debug!(%template, bytes = output.len(), "Rendered configuration");
        Ok(output.into_bytes())
    }
}
