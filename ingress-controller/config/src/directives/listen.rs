use nginx_ingress_controller_core::{transport_server::StreamServer, virtual_server::Server};

/// Indentation of a directive inside a server block. The first directive of a
/// block is indented by the template itself.
const SPACING: &str = "    ";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListenerKind {
    Http,
    Https,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Family {
    Ipv4,
    Ipv6,
}

/// Builds the `listen` directives of a virtual server for one kind of traffic.
///
/// Servers without custom listeners listen on the default port for the kind.
/// Servers with custom listeners only listen when the custom port for the
/// kind is set.
pub fn build_listener_block(kind: ListenerKind, server: &Server) -> String {
    let port = match (kind, server.custom_listeners) {
        (ListenerKind::Http, false) => "80".to_string(),
        (ListenerKind::Https, false) => "443 ssl".to_string(),
        (ListenerKind::Http, true) if server.http_port > 0 => server.http_port.to_string(),
        (ListenerKind::Https, true) if server.https_port > 0 => {
            format!("{} ssl", server.https_port)
        }
        (_, true) => return String::new(),
    };

    let (ipv4, ipv6) = match kind {
        ListenerKind::Http => (&server.http_ipv4, &server.http_ipv6),
        ListenerKind::Https => (&server.https_ipv4, &server.https_ipv6),
    };

    let mut block = listen_directive(ipv4.as_deref(), &port, server.proxy_protocol, Family::Ipv4);
    if !server.disable_ipv6 {
        block.push_str(SPACING);
        block.push_str(&listen_directive(
            ipv6.as_deref(),
            &port,
            server.proxy_protocol,
            Family::Ipv6,
        ));
    }
    block
}

/// Builds the `listen` directives of a stream server.
///
/// TLS passthrough servers are reached through the main configuration's SNI
/// router, so they listen on their unix socket and expect the PROXY protocol.
pub fn build_stream_listen(server: &StreamServer) -> String {
    if server.tls_passthrough {
        return format!("listen unix:{} proxy_protocol;\n", server.unix_socket);
    }

    let mut params = server.port.to_string();
    if server.ssl.is_some() {
        params.push_str(" ssl");
    }
    if server.udp {
        params.push_str(" udp");
    }

    let mut block = listen_directive(server.ipv4.as_deref(), &params, false, Family::Ipv4);
    if !server.disable_ipv6 {
        block.push_str(SPACING);
        block.push_str(&listen_directive(server.ipv6.as_deref(), &params, false, Family::Ipv6));
    }
    block
}

fn listen_directive(ip: Option<&str>, port: &str, proxy_protocol: bool, family: Family) -> String {
    let ip = ip.filter(|ip| !ip.is_empty());

    let mut directive = match (family, ip) {
        (Family::Ipv4, Some(ip)) => format!("listen {ip}:{port}"),
        (Family::Ipv4, None) => format!("listen {port}"),
        // An override that is not an IPv6 address binds every IPv6 address.
        (Family::Ipv6, Some(ip)) if ip.contains(':') => format!("listen [{ip}]:{port}"),
        (Family::Ipv6, _) => format!("listen [::]:{port}"),
    };
    if proxy_protocol {
        directive.push_str(" proxy_protocol");
    }
    directive.push_str(";\n");
    directive
}

#[cfg(test)]
mod tests {
    use super::*;
    use nginx_ingress_controller_core::transport_server::StreamSsl;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn custom(http_port: u16, https_port: u16) -> Server {
        Server {
            custom_listeners: true,
            http_port,
            https_port,
            ..Default::default()
        }
    }

    #[test]
    fn default_listeners() {
        let server = Server::default();
        assert_eq!(
            build_listener_block(ListenerKind::Http, &server),
            "listen 80;\n    listen [::]:80;\n"
        );
        assert_eq!(
            build_listener_block(ListenerKind::Https, &server),
            "listen 443 ssl;\n    listen [::]:443 ssl;\n"
        );
    }

    #[test]
    fn default_listeners_without_ipv6() {
        let server = Server {
            disable_ipv6: true,
            proxy_protocol: true,
            ..Default::default()
        };
        assert_eq!(
            build_listener_block(ListenerKind::Https, &server),
            "listen 443 ssl proxy_protocol;\n"
        );
    }

    #[rstest]
    #[case::http_only(8082, 0, "listen 8082;\n    listen [::]:8082;\n", "")]
    #[case::https_only(0, 8443, "", "listen 8443 ssl;\n    listen [::]:8443 ssl;\n")]
    #[case::both(
        8082,
        8443,
        "listen 8082;\n    listen [::]:8082;\n",
        "listen 8443 ssl;\n    listen [::]:8443 ssl;\n"
    )]
    #[case::neither(0, 0, "", "")]
    fn custom_listeners(
        #[case] http_port: u16,
        #[case] https_port: u16,
        #[case] http: &str,
        #[case] https: &str,
    ) {
        let server = custom(http_port, https_port);
        assert_eq!(build_listener_block(ListenerKind::Http, &server), http);
        assert_eq!(build_listener_block(ListenerKind::Https, &server), https);
    }

    #[test]
    fn custom_listeners_with_ips() {
        let server = Server {
            http_ipv4: Some("127.0.0.1".to_string()),
            http_ipv6: Some("::1".to_string()),
            https_ipv4: Some("127.0.0.2".to_string()),
            https_ipv6: Some("".to_string()),
            proxy_protocol: true,
            ..custom(8082, 8443)
        };
        assert_eq!(
            build_listener_block(ListenerKind::Http, &server),
            "listen 127.0.0.1:8082 proxy_protocol;\n    listen [::1]:8082 proxy_protocol;\n"
        );
        assert_eq!(
            build_listener_block(ListenerKind::Https, &server),
            "listen 127.0.0.2:8443 ssl proxy_protocol;\n    listen [::]:8443 ssl proxy_protocol;\n"
        );
    }

    #[test]
    fn stream_listeners() {
        let server = StreamServer {
            port: 1234,
            udp: true,
            ipv4: Some("127.0.0.1".to_string()),
            ssl: Some(StreamSsl::default()),
            disable_ipv6: true,
            ..Default::default()
        };
        assert_eq!(build_stream_listen(&server), "listen 127.0.0.1:1234 ssl udp;\n");

        let server = StreamServer {
            port: 5353,
            ipv6: Some("fd00::1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            build_stream_listen(&server),
            "listen 5353;\n    listen [fd00::1]:5353;\n"
        );
    }

    #[test]
    fn passthrough_listens_on_socket() {
        let server = StreamServer {
            tls_passthrough: true,
            unix_socket: "/var/lib/nginx/passthrough-default_secure-app.sock".to_string(),
            port: 443,
            ..Default::default()
        };
        assert_eq!(
            build_stream_listen(&server),
            "listen unix:/var/lib/nginx/passthrough-default_secure-app.sock proxy_protocol;\n"
        );
    }
}
