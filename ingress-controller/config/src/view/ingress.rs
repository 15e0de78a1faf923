use crate::{
    directives::{build_location_path, build_merged_proxy_set_headers},
    Error,
};
use nginx_ingress_controller_core::ingress::{IngressNginxConfig, Location, Server};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct IngressView<'c> {
    #[serde(flatten)]
    config: &'c IngressNginxConfig,
    server_views: Vec<ServerView<'c>>,
}

#[derive(Debug, Serialize)]
struct ServerView<'c> {
    #[serde(flatten)]
    server: &'c Server,
    location_views: Vec<LocationView<'c>>,
}

#[derive(Debug, Serialize)]
struct LocationView<'c> {
    #[serde(flatten)]
    location: &'c Location,
    /// The path with its regex modifier applied.
    location_path: String,
    /// Rendered `proxy_set_header` directives, each on its own line.
    proxy_set_headers: String,
}

// === impl IngressView ===

impl<'c> IngressView<'c> {
    pub(crate) fn new(config: &'c IngressNginxConfig) -> Result<Self, Error> {
        let server_views = config
            .servers
            .iter()
            .map(|server| ServerView::new(config, server))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            config,
            server_views,
        })
    }
}

impl<'c> ServerView<'c> {
    fn new(config: &'c IngressNginxConfig, server: &'c Server) -> Result<Self, Error> {
        for upstream in server.health_checks.keys() {
            if config.upstream(upstream).is_none() {
                return Err(Error::UndefinedUpstream {
                    referrer: format!("health check of server {:?}", server.name),
                    upstream: upstream.clone(),
                });
            }
        }

        let location_views = server
            .locations
            .iter()
            .map(|location| LocationView::new(config, server, location))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            server,
            location_views,
        })
    }
}

impl<'c> LocationView<'c> {
    fn new(
        config: &'c IngressNginxConfig,
        server: &Server,
        location: &'c Location,
    ) -> Result<Self, Error> {
        if config.upstream(&location.upstream).is_none() {
            return Err(Error::UndefinedUpstream {
                referrer: format!(
                    "location {:?} of server {:?}",
                    location.path, server.name
                ),
                upstream: location.upstream.clone(),
            });
        }

        let minion = match &location.minion_ingress {
            Some(id) => Some(config.minion(id).ok_or_else(|| Error::UndefinedMinion {
                path: location.path.clone(),
                minion: id.clone(),
            })?),
            None => None,
        };
        let ingress_annotations = &config.ingress.annotations;
        let minion_annotations = minion.map(|m| &m.annotations);

        let proxy_set_headers =
            build_merged_proxy_set_headers(ingress_annotations, minion_annotations).map_err(
                |source| Error::ProxySetHeaders {
                    resource: minion.unwrap_or(&config.ingress).id(),
                    source,
                },
            )?;

        Ok(Self {
            location,
            location_path: build_location_path(location, ingress_annotations, minion_annotations),
            proxy_set_headers,
        })
    }
}
