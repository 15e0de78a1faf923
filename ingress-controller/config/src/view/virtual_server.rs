use crate::{
    directives::{build_header_query_value, build_listener_block, ListenerKind},
    Error,
};
use nginx_ingress_controller_core::virtual_server::{JwtAuth, Location, VirtualServerConfig};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct VirtualServerView<'c> {
    #[serde(flatten)]
    config: &'c VirtualServerConfig,
    http_listen: String,
    https_listen: String,
    /// Key-set policies needing a cache zone and a fetch location.
    jwks_policies: Vec<&'c JwtAuth>,
    /// Whether any API-key policy needs the njs validation location.
    api_key_enabled: bool,
    header_query_value: Option<String>,
    location_views: Vec<LocationView<'c>>,
}

#[derive(Debug, Serialize)]
struct LocationView<'c> {
    #[serde(flatten)]
    location: &'c Location,
    header_query_value: Option<String>,
}

// === impl VirtualServerView ===

impl<'c> VirtualServerView<'c> {
    pub(crate) fn new(config: &'c VirtualServerConfig) -> Result<Self, Error> {
        let server = &config.server;

        for hc in &server.health_checks {
            check_upstream(config, &hc.upstream, || {
                format!("health check {:?}", hc.name)
            })?;
        }
        for location in &server.locations {
            if let Some(pass) = &location.proxy_pass {
                check_upstream(config, &pass.upstream, || {
                    format!("location {:?}", location.path)
                })?;
            }
        }

        let location_views = server
            .locations
            .iter()
            .map(|location| LocationView {
                location,
                header_query_value: location.api_key.as_ref().map(build_header_query_value),
            })
            .collect();

        Ok(Self {
            config,
            http_listen: build_listener_block(ListenerKind::Http, server),
            https_listen: build_listener_block(ListenerKind::Https, server),
            jwks_policies: server.jwks_policies(),
            api_key_enabled: server.api_key_enabled(),
            header_query_value: server.api_key.as_ref().map(build_header_query_value),
            location_views,
        })
    }
}

fn check_upstream(
    config: &VirtualServerConfig,
    upstream: &str,
    referrer: impl FnOnce() -> String,
) -> Result<(), Error> {
    if config.upstream(upstream).is_some() {
        return Ok(());
    }
    Err(Error::UndefinedUpstream {
        referrer: referrer(),
        upstream: upstream.to_string(),
    })
}
