use crate::{directives::build_stream_listen, Error};
use nginx_ingress_controller_core::transport_server::{Match, TransportServerConfig};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct TransportServerView<'c> {
    #[serde(flatten)]
    config: &'c TransportServerConfig,
    listen: String,
    health_match: Option<&'c Match>,
}

// === impl TransportServerView ===

impl<'c> TransportServerView<'c> {
    pub(crate) fn new(config: &'c TransportServerConfig) -> Result<Self, Error> {
        let server = &config.server;
        if config.upstream(&server.proxy_pass).is_none() {
            return Err(Error::UndefinedUpstream {
                referrer: format!("stream server {:?}", server.status_zone),
                upstream: server.proxy_pass.clone(),
            });
        }

        Ok(Self {
            config,
            listen: build_stream_listen(server),
            health_match: config.stream_match.as_ref(),
        })
    }
}
