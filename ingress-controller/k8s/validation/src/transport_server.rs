use crate::{
    field::{AggregateError, ErrorList, FieldError, Path},
    global_configuration::ListenerProtocol,
    k8s::configuration::{
        global_configuration::{
            Listener, TLS_PASSTHROUGH_LISTENER_NAME, TLS_PASSTHROUGH_LISTENER_PROTOCOL,
        },
        transport_server::{TransportServerListener, TransportServerSpec},
    },
    names,
    upstream::validate_upstreams,
    virtual_server::snippets_disabled,
};

const STREAM_PROTOCOLS: [&str; 2] = ["TCP", "UDP"];

#[derive(Clone, Debug, Default)]
pub struct TransportServerValidator {
    tls_passthrough: bool,
    snippets_enabled: bool,
    is_plus: bool,
}

// === impl TransportServerValidator ===

impl TransportServerValidator {
    pub fn new(tls_passthrough: bool, snippets_enabled: bool, is_plus: bool) -> Self {
        Self {
            tls_passthrough,
            snippets_enabled,
            is_plus,
        }
    }

    /// Validates a TransportServer spec. When `listeners` holds the accepted
    /// GlobalConfiguration listeners, the listener reference is checked
    /// against them.
    pub fn validate(
        &self,
        spec: &TransportServerSpec,
        listeners: Option<&[Listener]>,
    ) -> Result<(), AggregateError> {
        let path = Path::new("spec");
        let mut errors = ErrorList::default();

        let passthrough = self.validate_listener(&spec.listener, &path.child("listener"), &mut errors);
        if let Some(accepted) = listeners {
            if !passthrough {
                validate_listener_reference(&spec.listener, accepted, &path.child("listener"), &mut errors);
            }
        }

        match (&spec.host, passthrough) {
            (Some(host), true) => {
                for msg in names::host(host) {
                    errors.push(FieldError::invalid(path.child("host"), host.as_str(), msg));
                }
            }
            (None, true) => errors.push(FieldError::required(
                path.child("host"),
                "must be specified for TLS Passthrough",
            )),
            (Some(_), false) => errors.push(FieldError::forbidden(
                path.child("host"),
                "host field is allowed only for TLS Passthrough TransportServers",
            )),
            (None, false) => {}
        }

        let upstreams = validate_upstreams(
            &spec.upstreams,
            &path.child("upstreams"),
            self.is_plus,
            &mut errors,
        );

        match &spec.action {
            None => errors.push(FieldError::required(path.child("action"), "must specify an action")),
            Some(action) if action.pass.is_empty() => {
                errors.push(FieldError::required(path.child("action").child("pass"), ""));
            }
            Some(action) if !upstreams.contains(action.pass.as_str()) => {
                errors.push(FieldError::not_found(
                    path.child("action").child("pass"),
                    action.pass.as_str(),
                ));
            }
            Some(_) => {}
        }

        if !self.snippets_enabled {
            if spec.server_snippets.is_some() {
                errors.push(snippets_disabled(path.child("serverSnippets")));
            }
            if spec.stream_snippets.is_some() {
                errors.push(snippets_disabled(path.child("streamSnippets")));
            }
        }

        errors.into_result()
    }

    /// Returns true if the listener is the built-in TLS passthrough listener.
    fn validate_listener(
        &self,
        listener: &TransportServerListener,
        path: &Path,
        errors: &mut ErrorList,
    ) -> bool {
        if listener.name == TLS_PASSTHROUGH_LISTENER_NAME {
            if listener.protocol != TLS_PASSTHROUGH_LISTENER_PROTOCOL {
                errors.push(FieldError::not_supported(
                    path.child("protocol"),
                    listener.protocol.as_str(),
                    &[TLS_PASSTHROUGH_LISTENER_PROTOCOL],
                ));
            }
            if !self.tls_passthrough {
                errors.push(FieldError::forbidden(
                    path.child("name"),
                    "TLS Passthrough is not enabled",
                ));
            }
            return true;
        }

        if listener.name.is_empty() {
            errors.push(FieldError::required(path.child("name"), ""));
        } else {
            for msg in names::dns1035_label(&listener.name) {
                errors.push(FieldError::invalid(path.child("name"), listener.name.as_str(), msg));
            }
        }
        if !STREAM_PROTOCOLS.contains(&listener.protocol.as_str()) {
            errors.push(FieldError::not_supported(
                path.child("protocol"),
                listener.protocol.as_str(),
                &STREAM_PROTOCOLS,
            ));
        }
        false
    }
}

fn validate_listener_reference(
    listener: &TransportServerListener,
    accepted: &[Listener],
    path: &Path,
    errors: &mut ErrorList,
) {
    let Some(found) = accepted.iter().find(|l| l.name == listener.name) else {
        errors.push(FieldError::not_found(path.child("name"), listener.name.as_str()));
        return;
    };

    if found.protocol == ListenerProtocol::Http.as_str() || found.protocol != listener.protocol {
        errors.push(FieldError::invalid(
            path.child("protocol"),
            listener.protocol.as_str(),
            format!(
                "Listener {} has protocol {}, not {}",
                found.name, found.protocol, listener.protocol
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::configuration::transport_server::{Action, Upstream};
    use pretty_assertions::assert_eq;

    fn dns(protocol: &str) -> TransportServerSpec {
        TransportServerSpec {
            listener: TransportServerListener {
                name: "dns-tcp".to_string(),
                protocol: protocol.to_string(),
            },
            upstreams: vec![Upstream {
                name: "dns-app".to_string(),
                service: "coredns".to_string(),
                port: 5353,
                ..Default::default()
            }],
            action: Some(Action {
                pass: "dns-app".to_string(),
            }),
            ..Default::default()
        }
    }

    fn passthrough() -> TransportServerSpec {
        TransportServerSpec {
            listener: TransportServerListener {
                name: TLS_PASSTHROUGH_LISTENER_NAME.to_string(),
                protocol: TLS_PASSTHROUGH_LISTENER_PROTOCOL.to_string(),
            },
            host: Some("app.example.com".to_string()),
            ..dns("TCP")
        }
    }

    fn listener(name: &str, protocol: &str) -> Listener {
        Listener {
            name: name.to_string(),
            ip: None,
            port: 5353,
            protocol: protocol.to_string(),
            ssl: false,
        }
    }

    #[test]
    fn accepts_stream_servers() {
        let validator = TransportServerValidator::default();
        assert_eq!(validator.validate(&dns("TCP"), None), Ok(()));
        assert_eq!(validator.validate(&dns("UDP"), None), Ok(()));
        assert_eq!(
            validator.validate(&dns("TCP"), Some(&[listener("dns-tcp", "TCP")])),
            Ok(())
        );
    }

    #[test]
    fn checks_listener_reference() {
        let validator = TransportServerValidator::default();

        let err = validator
            .validate(&dns("TCP"), Some(&[listener("dns-tcp", "UDP")]))
            .expect_err("protocol mismatch must be rejected");
        assert_eq!(
            err.to_string(),
            "spec.listener.protocol: Invalid value: \"TCP\": Listener dns-tcp has protocol UDP, not TCP"
        );

        let err = validator
            .validate(&dns("TCP"), Some(&[]))
            .expect_err("unknown listener must be rejected");
        assert_eq!(err.to_string(), "spec.listener.name: Not found: \"dns-tcp\"");
    }

    #[test]
    fn passthrough_requires_opt_in_and_host() {
        assert_eq!(
            TransportServerValidator::new(true, false, false).validate(&passthrough(), None),
            Ok(())
        );

        let err = TransportServerValidator::default()
            .validate(&passthrough(), None)
            .expect_err("passthrough must be enabled");
        assert_eq!(
            err.to_string(),
            "spec.listener.name: Forbidden: TLS Passthrough is not enabled"
        );

        let mut spec = passthrough();
        spec.host = None;
        let err = TransportServerValidator::new(true, false, false)
            .validate(&spec, None)
            .expect_err("host must be required");
        assert_eq!(
            err.to_string(),
            "spec.host: Required value: must be specified for TLS Passthrough"
        );
    }

    #[test]
    fn aggregates_errors() {
        let mut spec = dns("HTTP");
        spec.host = Some("dns.example.com".to_string());
        spec.action = Some(Action {
            pass: "missing".to_string(),
        });
        spec.upstreams[0].port = 0;
        spec.stream_snippets = Some("resolver 10.0.0.1;".to_string());

        let err = TransportServerValidator::default()
            .validate(&spec, None)
            .expect_err("spec must be rejected");
        assert_eq!(
            err.errors()
                .iter()
                .map(|e| e.path.to_string())
                .collect::<Vec<_>>(),
            [
                "spec.listener.protocol",
                "spec.host",
                "spec.upstreams[0].port",
                "spec.action.pass",
                "spec.streamSnippets",
            ]
        );
    }
}
