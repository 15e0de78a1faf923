use crate::{
    field::{AggregateError, ErrorList, FieldError, Path},
    global_configuration::ListenerProtocol,
    k8s::configuration::{
        global_configuration::Listener,
        virtual_server::{Action, Route, Tls, VirtualServerListener, VirtualServerSpec},
    },
    names,
    upstream::validate_upstreams,
};
use ahash::AHashSet as HashSet;

const REDIRECT_CODES: [i32; 4] = [301, 302, 307, 308];
const TLS_REDIRECT_BASED_ON: [&str; 2] = ["scheme", "x-forwarded-proto"];

#[derive(Clone, Debug, Default)]
pub struct VirtualServerValidator {
    is_plus: bool,
    snippets_enabled: bool,
}

// === impl VirtualServerValidator ===

impl VirtualServerValidator {
    pub fn new(is_plus: bool, snippets_enabled: bool) -> Self {
        Self {
            is_plus,
            snippets_enabled,
        }
    }

    /// Validates a VirtualServer spec. When `listeners` holds the accepted
    /// GlobalConfiguration listeners, custom listener references are checked
    /// against them.
    pub fn validate(
        &self,
        spec: &VirtualServerSpec,
        listeners: Option<&[Listener]>,
    ) -> Result<(), AggregateError> {
        let path = Path::new("spec");
        let mut errors = ErrorList::default();

        if spec.host.is_empty() {
            errors.push(FieldError::required(path.child("host"), ""));
        } else {
            for msg in names::host(&spec.host) {
                errors.push(FieldError::invalid(path.child("host"), spec.host.as_str(), msg));
            }
        }

        if let Some(listener) = &spec.listener {
            validate_listener(listener, listeners, &path.child("listener"), &mut errors);
        }

        if let Some(tls) = &spec.tls {
            validate_tls(tls, &path.child("tls"), &mut errors);
        }

        let upstreams = validate_upstreams(
            &spec.upstreams,
            &path.child("upstreams"),
            self.is_plus,
            &mut errors,
        );

        let mut paths = HashSet::<&str>::default();
        for (i, route) in spec.routes.iter().enumerate() {
            let path = path.child("routes").index(i);
            validate_route(route, &upstreams, &path, &mut errors);
            if !route.path.is_empty() && !paths.insert(route.path.as_str()) {
                errors.push(FieldError::duplicate(path.child("path"), route.path.as_str()).conflict());
            }
        }

        if !self.snippets_enabled {
            if spec.server_snippets.is_some() {
                errors.push(snippets_disabled(path.child("server-snippets")));
            }
            if spec.http_snippets.is_some() {
                errors.push(snippets_disabled(path.child("http-snippets")));
            }
        }

        errors.into_result()
    }
}

pub(crate) fn snippets_disabled(path: Path) -> FieldError {
    FieldError::forbidden(path, "snippet specified but snippets feature is not enabled")
}

fn validate_listener(
    listener: &VirtualServerListener,
    accepted: Option<&[Listener]>,
    path: &Path,
    errors: &mut ErrorList,
) {
    let refs = [("http", &listener.http, false), ("https", &listener.https, true)];
    for (field, name, ssl) in refs {
        let Some(name) = name else { continue };
        let path = path.child(field);

        for msg in names::dns1035_label(name) {
            errors.push(FieldError::invalid(path.clone(), name.as_str(), msg));
        }

        let Some(accepted) = accepted else { continue };
        match accepted.iter().find(|l| l.name == *name) {
            None => errors.push(FieldError::not_found(path, name.as_str())),
            Some(l) if l.protocol != ListenerProtocol::Http.as_str() => {
                errors.push(FieldError::invalid(
                    path,
                    name.as_str(),
                    format!("Listener {name} is not an HTTP listener"),
                ));
            }
            Some(l) if l.ssl != ssl => {
                let detail = if ssl {
                    format!("Listener {name} must have ssl enabled")
                } else {
                    format!("Listener {name} must not have ssl enabled")
                };
                errors.push(FieldError::invalid(path, name.as_str(), detail));
            }
            Some(_) => {}
        }
    }
}

fn validate_tls(tls: &Tls, path: &Path, errors: &mut ErrorList) {
    if let Some(secret) = &tls.secret {
        if secret.is_empty() {
            errors.push(FieldError::required(path.child("secret"), ""));
        }
    }

    let Some(redirect) = &tls.redirect else { return };
    let path = path.child("redirect");
    if let Some(code) = redirect.code {
        if !REDIRECT_CODES.contains(&code) {
            errors.push(FieldError::invalid(
                path.child("code"),
                code,
                "status code out of accepted range. accepted values are '301', '302', '307', '308'",
            ));
        }
    }
    if let Some(based_on) = &redirect.based_on {
        if !TLS_REDIRECT_BASED_ON.contains(&based_on.as_str()) {
            errors.push(FieldError::not_supported(
                path.child("basedOn"),
                based_on.as_str(),
                &TLS_REDIRECT_BASED_ON,
            ));
        }
    }
}

fn validate_route(route: &Route, upstreams: &HashSet<&str>, path: &Path, errors: &mut ErrorList) {
    if route.path.is_empty() {
        errors.push(FieldError::required(path.child("path"), ""));
    } else if !is_valid_route_path(&route.path) {
        errors.push(FieldError::invalid(
            path.child("path"),
            route.path.as_str(),
            "must start with '/', '~', '~*' or '='",
        ));
    }

    match &route.action {
        Some(action) => validate_action(action, upstreams, &path.child("action"), errors),
        None => errors.push(FieldError::required(path.child("action"), "must specify an action")),
    }
}

/// A prefix path, or a regex or exact match written as `<modifier> <path>`.
fn is_valid_route_path(path: &str) -> bool {
    if path.starts_with('/') {
        return !path.contains(char::is_whitespace);
    }
    match path.split_once(' ') {
        Some(("~" | "~*", regex)) => !regex.trim().is_empty(),
        Some(("=", exact)) => exact.starts_with('/'),
        _ => false,
    }
}

fn validate_action(action: &Action, upstreams: &HashSet<&str>, path: &Path, errors: &mut ErrorList) {
    let set = [
        action.pass.is_some(),
        action.redirect.is_some(),
        action.action_return.is_some(),
    ];
    if set.iter().filter(|s| **s).count() != 1 {
        errors.push(FieldError::invalid(
            path.clone(),
            "",
            "must specify exactly one of: `pass`, `redirect` or `return`",
        ));
        return;
    }

    if let Some(pass) = &action.pass {
        if !upstreams.contains(pass.as_str()) {
            errors.push(FieldError::not_found(path.child("pass"), pass.as_str()));
        }
    }

    if let Some(redirect) = &action.redirect {
        let url = redirect.url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with("${scheme}")
            || url.starts_with("$scheme"))
        {
            errors.push(FieldError::invalid(
                path.child("redirect").child("url"),
                url,
                "must be an absolute URL starting with 'http://', 'https://' or '${scheme}://'",
            ));
        }
        if let Some(code) = redirect.code {
            if !REDIRECT_CODES.contains(&code) {
                errors.push(FieldError::invalid(
                    path.child("redirect").child("code"),
                    code,
                    "status code out of accepted range. accepted values are '301', '302', '307', '308'",
                ));
            }
        }
    }

    if let Some(ret) = &action.action_return {
        if let Some(code) = ret.code {
            if !(200..=299).contains(&code) && !(400..=599).contains(&code) {
                errors.push(FieldError::invalid(
                    path.child("return").child("code"),
                    code,
                    "must be 2XX, 4XX or 5XX",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::configuration::virtual_server::{ActionRedirect, Upstream};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn upstream(name: &str) -> Upstream {
        Upstream {
            name: name.to_string(),
            service: format!("{name}-svc"),
            port: 80,
            ..Default::default()
        }
    }

    fn route(path: &str, pass: &str) -> Route {
        Route {
            path: path.to_string(),
            action: Some(Action {
                pass: Some(pass.to_string()),
                ..Default::default()
            }),
        }
    }

    fn cafe() -> VirtualServerSpec {
        VirtualServerSpec {
            host: "cafe.example.com".to_string(),
            upstreams: vec![upstream("tea"), upstream("coffee")],
            routes: vec![route("/tea", "tea"), route("~* ^/coffee", "coffee")],
            ..Default::default()
        }
    }

    fn listener(name: &str, protocol: &str, ssl: bool) -> Listener {
        Listener {
            name: name.to_string(),
            ip: None,
            port: 8082,
            protocol: protocol.to_string(),
            ssl,
        }
    }

    fn paths(err: AggregateError) -> Vec<String> {
        err.errors().iter().map(|e| e.path.to_string()).collect()
    }

    #[test]
    fn accepts_valid_spec() {
        assert_eq!(VirtualServerValidator::default().validate(&cafe(), None), Ok(()));
    }

    #[test]
    fn aggregates_errors() {
        let mut spec = cafe();
        spec.host = String::new();
        spec.upstreams.push(upstream("tea"));
        spec.routes.push(route("/milk", "milk"));
        spec.routes.push(route("/tea", "tea"));

        let err = VirtualServerValidator::default()
            .validate(&spec, None)
            .expect_err("spec must be rejected");
        assert_eq!(
            paths(err),
            [
                "spec.host",
                "spec.upstreams[2].name",
                "spec.routes[2].action.pass",
                "spec.routes[3].path",
            ]
        );
    }

    #[rstest]
    #[case("/", true)]
    #[case("/tea/green", true)]
    #[case("~ ^/tea/[A-Z]{3}", true)]
    #[case("~* ^/coffee", true)]
    #[case("= /exact", true)]
    #[case("tea", false)]
    #[case("= tea", false)]
    #[case("~", false)]
    #[case("/tea green", false)]
    fn validates_route_paths(#[case] path: &str, #[case] valid: bool) {
        assert_eq!(is_valid_route_path(path), valid, "{path:?}");
    }

    #[test]
    fn actions_are_exclusive() {
        let mut spec = cafe();
        spec.routes[0].action = Some(Action {
            pass: Some("tea".to_string()),
            redirect: Some(ActionRedirect {
                url: "https://nginx.org".to_string(),
                code: Some(301),
            }),
            ..Default::default()
        });
        spec.routes[1].action = None;

        let err = VirtualServerValidator::default()
            .validate(&spec, None)
            .expect_err("spec must be rejected");
        assert_eq!(paths(err), ["spec.routes[0].action", "spec.routes[1].action"]);
    }

    #[test]
    fn backups_require_plus() {
        let mut spec = cafe();
        spec.upstreams[0].backup = Some("tea-backup".to_string());
        spec.upstreams[0].backup_port = Some(8080);

        assert_eq!(VirtualServerValidator::new(true, false).validate(&spec, None), Ok(()));
        let err = VirtualServerValidator::new(false, false)
            .validate(&spec, None)
            .expect_err("backup must be rejected");
        assert_eq!(
            err.to_string(),
            "spec.upstreams[0].backup: Forbidden: backup servers are only supported on NGINX Plus"
        );
    }

    #[test]
    fn custom_listeners_must_be_accepted_http_listeners() {
        let accepted = [
            listener("http-8082", "HTTP", false),
            listener("https-8443", "HTTP", true),
            listener("dns-tcp", "TCP", false),
        ];
        let validator = VirtualServerValidator::default();

        let mut spec = cafe();
        spec.listener = Some(VirtualServerListener {
            http: Some("http-8082".to_string()),
            https: Some("https-8443".to_string()),
        });
        assert_eq!(validator.validate(&spec, Some(&accepted)), Ok(()));
        // Without a GlobalConfiguration only the names are checked.
        assert_eq!(validator.validate(&spec, None), Ok(()));

        spec.listener = Some(VirtualServerListener {
            http: Some("https-8443".to_string()),
            https: Some("dns-tcp".to_string()),
        });
        let err = validator
            .validate(&spec, Some(&accepted))
            .expect_err("listeners must be rejected");
        assert_eq!(
            err.to_string(),
            "[spec.listener.http: Invalid value: \"https-8443\": Listener https-8443 must not have \
             ssl enabled, spec.listener.https: Invalid value: \"dns-tcp\": Listener dns-tcp is not \
             an HTTP listener]"
        );

        spec.listener = Some(VirtualServerListener {
            http: Some("http-9000".to_string()),
            https: None,
        });
        let err = validator
            .validate(&spec, Some(&accepted))
            .expect_err("unknown listener must be rejected");
        assert_eq!(
            err.to_string(),
            "spec.listener.http: Not found: \"http-9000\""
        );
    }

    #[test]
    fn snippets_require_opt_in() {
        let mut spec = cafe();
        spec.server_snippets = Some("add_header X-Tea green;".to_string());

        assert_eq!(VirtualServerValidator::new(false, true).validate(&spec, None), Ok(()));
        let err = VirtualServerValidator::default()
            .validate(&spec, None)
            .expect_err("snippets must be rejected");
        assert_eq!(paths(err), ["spec.server-snippets"]);
    }
}
