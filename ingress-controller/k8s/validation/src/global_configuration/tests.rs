use super::*;
use crate::field::{ErrorClass, ErrorKind};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn listener(name: &str, port: i32, protocol: &str) -> Listener {
    Listener {
        name: name.to_string(),
        ip: None,
        port,
        protocol: protocol.to_string(),
        ssl: false,
    }
}

fn with_ip(ip: &str, listener: Listener) -> Listener {
    Listener {
        ip: Some(ip.to_string()),
        ..listener
    }
}

fn names(listeners: &[Listener]) -> Vec<&str> {
    listeners.iter().map(|l| l.name.as_str()).collect()
}

fn validate(listeners: &[Listener]) -> (Vec<Listener>, ErrorList) {
    GlobalConfigurationValidator::new([80, 443, 8080, 9113])
        .validate_listeners(listeners, &Path::new("spec").child("listeners"))
}

#[test]
fn accepts_tcp_and_udp_on_the_same_port() {
    let mut gc = GlobalConfiguration::new(
        "nginx-configuration",
        GlobalConfigurationSpec {
            listeners: vec![
                listener("tcp-listener", 53, "TCP"),
                listener("udp-listener", 53, "UDP"),
            ],
        },
    );

    let res = GlobalConfigurationValidator::default().validate(&mut gc);

    assert_eq!(res, Ok(()));
    assert_eq!(names(&gc.spec.listeners), ["tcp-listener", "udp-listener"]);
}

#[test]
fn filters_invalid_listeners_from_the_spec() {
    let mut spec = GlobalConfigurationSpec {
        listeners: vec![
            listener("dns-tcp", 5353, "TCP"),
            listener("status", 8080, "TCP"),
            listener("dns-udp", 5353, "UDP"),
        ],
    };

    let err = GlobalConfigurationValidator::new([8080])
        .validate_spec(&mut spec)
        .expect_err("forbidden port must be rejected");

    assert_eq!(names(&spec.listeners), ["dns-tcp", "dns-udp"]);
    assert_eq!(
        err.to_string(),
        "spec.listeners[1].port: Forbidden: Listener status: port 8080 is forbidden"
    );
}

#[test]
fn first_listener_wins_a_protocol_conflict() {
    let (accepted, errors) = validate(&[
        listener("a", 53, "TCP"),
        listener("b", 53, "TCP"),
    ]);
    assert_eq!(names(&accepted), ["a"]);
    assert_eq!(errors.len(), 1);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.kind, ErrorKind::Duplicate);
    assert_eq!(error.class, ErrorClass::Conflict);
    assert_eq!(
        error.to_string(),
        "spec.listeners[1]: Duplicate value: \"Listener b: Duplicated port/protocol combination 53/TCP\""
    );
}

#[test]
fn http_claims_a_port_exclusively() {
    let (accepted, errors) = validate(&[
        listener("a", 53, "HTTP"),
        listener("b", 53, "TCP"),
        listener("c", 53, "UDP"),
    ]);
    assert_eq!(names(&accepted), ["a"]);
    assert_eq!(
        errors.iter().map(|e| e.kind).collect::<Vec<_>>(),
        [ErrorKind::Invalid, ErrorKind::Invalid]
    );
    assert_eq!(
        errors.iter().next().unwrap().to_string(),
        "spec.listeners[1].port: Invalid value: 53: Listener b: Port 53 is used with a different \
         protocol (current: HTTP, new: TCP)"
    );
}

#[rstest]
#[case::tcp_then_http(&["TCP", "HTTP"], &["tcp"])]
#[case::udp_then_http(&["UDP", "HTTP"], &["udp"])]
#[case::tcp_udp_then_http(&["TCP", "UDP", "HTTP"], &["tcp", "udp"])]
fn http_cannot_join_a_stream_port(#[case] protocols: &[&str], #[case] expected: &[&str]) {
    let listeners = protocols
        .iter()
        .map(|p| listener(&p.to_lowercase(), 53, p))
        .collect::<Vec<_>>();
    let (accepted, errors) = validate(&listeners);
    assert_eq!(names(&accepted), expected);
    assert_eq!(errors.len(), 1);
}

#[test]
fn http_may_use_a_different_port() {
    let (accepted, errors) = validate(&[
        listener("http-listener", 63, "HTTP"),
        listener("tcp-listener", 53, "TCP"),
        listener("udp-listener", 53, "UDP"),
    ]);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(accepted.len(), 3);
}

#[test]
fn rejects_duplicate_names() {
    let (accepted, errors) = validate(&[
        listener("tcp-listener", 2201, "TCP"),
        listener("tcp-listener", 2202, "TCP"),
    ]);
    assert_eq!(accepted, vec![listener("tcp-listener", 2201, "TCP")]);
    assert_eq!(
        errors.iter().next().unwrap().to_string(),
        "spec.listeners[1].name: Duplicate value: \"tcp-listener\""
    );
}

#[test]
fn rejected_listeners_do_not_claim_ports_or_names() {
    let (accepted, errors) = validate(&[
        listener("tcp-listener-1", 2201, "TCP"),
        listener("tcp-listener-2", 2201, "TCP"),
        listener("udp-listener-3", 2201, "UDP"),
        listener("tcp-listener-2", 2202, "TCP"),
    ]);
    assert_eq!(
        names(&accepted),
        ["tcp-listener-1", "udp-listener-3", "tcp-listener-2"]
    );
    assert_eq!(errors.len(), 1);
}

#[test]
fn listeners_on_different_ips_do_not_conflict() {
    let (accepted, errors) = validate(&[
        with_ip("127.0.0.1", listener("a", 8082, "HTTP")),
        with_ip("10.0.0.1", listener("b", 8082, "HTTP")),
        listener("c", 8082, "HTTP"),
        with_ip("::1", listener("d", 8082, "HTTP")),
        with_ip("0:0:0:0:0:0:0:1", listener("e", 8082, "HTTP")),
    ]);
    assert_eq!(names(&accepted), ["a", "b", "c", "d"]);
    assert_eq!(errors.iter().next().unwrap().class, ErrorClass::Conflict);
}

#[rstest]
#[case::invalid_name(listener("@", 2201, "TCP"), "spec.listeners[0].name: Invalid value: \"@\"")]
#[case::negative_port(listener("tcp-listener", -1, "TCP"), "spec.listeners[0].port: Invalid value: -1: must be between 1 and 65535, inclusive")]
#[case::zero_port(listener("tcp-listener", 0, "TCP"), "spec.listeners[0].port: Invalid value: 0")]
#[case::large_port(listener("tcp-listener", 65536, "TCP"), "spec.listeners[0].port: Invalid value: 65536")]
#[case::forbidden_port(listener("metrics", 9113, "HTTP"), "spec.listeners[0].port: Forbidden: Listener metrics: port 9113 is forbidden")]
#[case::invalid_protocol(listener("name", 2201, "IP"), "spec.listeners[0].protocol: Invalid value: \"IP\": must specify a valid protocol. Accepted values: HTTP,TCP,UDP")]
#[case::lowercase_protocol(listener("name", 2201, "tcp"), "spec.listeners[0].protocol: Invalid value: \"tcp\"")]
#[case::built_in_name(listener("tls-passthrough", 2201, "TCP"), "spec.listeners[0].name: Forbidden: is the name of a built-in listener")]
#[case::invalid_ip(with_ip("10.0.0", listener("name", 2201, "TCP")), "spec.listeners[0].ip: Invalid value: \"10.0.0\": invalid IP address")]
fn rejects_malformed_listeners(#[case] listener: Listener, #[case] prefix: &str) {
    let (accepted, errors) = validate(&[listener]);
    assert!(accepted.is_empty());
    assert_eq!(errors.len(), 1, "{errors:?}");
    let error = errors.iter().next().unwrap();
    assert_eq!(error.class, ErrorClass::Structural);
    assert!(
        error.to_string().starts_with(prefix),
        "{error} does not start with {prefix}"
    );
}

#[test]
fn reports_every_structural_error_of_a_listener() {
    let (accepted, errors) = validate(&[listener("Bad", 0, "SCTP")]);
    assert!(accepted.is_empty());
    assert_eq!(
        errors.iter().map(|e| e.path.as_str()).collect::<Vec<_>>(),
        [
            "spec.listeners[0].name",
            "spec.listeners[0].port",
            "spec.listeners[0].protocol",
        ]
    );
}

#[test]
fn invalid_listeners_do_not_block_valid_ones() {
    let (accepted, errors) = validate(&[
        listener("dns-tcp", 5353, "TCP"),
        listener("tls-passthrough", 443, "TCP"),
        listener("http-8083", 8083, "HTTP"),
        listener("dns-tcp", 5354, "TCP"),
    ]);
    assert_eq!(names(&accepted), ["dns-tcp", "http-8083"]);
    // The built-in name and forbidden port are both reported.
    assert_eq!(errors.len(), 3);
}
