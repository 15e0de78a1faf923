use crate::{
    field::{ErrorList, FieldError, Path},
    k8s::configuration::{transport_server, virtual_server},
    names,
};
use ahash::AHashSet as HashSet;

/// The fields shared by VirtualServer and TransportServer upstreams.
pub(crate) trait UpstreamSpec {
    fn name(&self) -> &str;
    fn service(&self) -> &str;
    fn port(&self) -> i32;
    fn backup(&self) -> Option<&str>;
    fn backup_port(&self) -> Option<i32>;
}

/// Validates a list of upstreams, returning the names that were declared.
pub(crate) fn validate_upstreams<'u, U: UpstreamSpec>(
    upstreams: &'u [U],
    path: &Path,
    is_plus: bool,
    errors: &mut ErrorList,
) -> HashSet<&'u str> {
    let mut declared = HashSet::default();

    for (i, upstream) in upstreams.iter().enumerate() {
        let path = path.index(i);

        let name_errors = names::dns1035_label(upstream.name());
        let valid_name = name_errors.is_empty();
        for msg in name_errors {
            errors.push(FieldError::invalid(path.child("name"), upstream.name(), msg));
        }
        if valid_name && !declared.insert(upstream.name()) {
            errors.push(FieldError::duplicate(path.child("name"), upstream.name()).conflict());
        }

        for msg in names::dns1035_label(upstream.service()) {
            errors.push(FieldError::invalid(path.child("service"), upstream.service(), msg));
        }
        errors.extend(validate_port(upstream.port(), path.child("port")));

        match (upstream.backup(), upstream.backup_port()) {
            (None, None) => {}
            (Some(_), _) | (_, Some(_)) if !is_plus => {
                errors.push(FieldError::forbidden(
                    path.child("backup"),
                    "backup servers are only supported on NGINX Plus",
                ));
            }
            (Some(backup), backup_port) => {
                for msg in names::dns1035_label(backup) {
                    errors.push(FieldError::invalid(path.child("backup"), backup, msg));
                }
                match backup_port {
                    Some(port) => errors.extend(validate_port(port, path.child("backupPort"))),
                    None => errors.push(FieldError::required(
                        path.child("backupPort"),
                        "backupPort must be specified with backup",
                    )),
                }
            }
            (None, Some(_)) => {
                errors.push(FieldError::required(
                    path.child("backup"),
                    "backup must be specified with backupPort",
                ));
            }
        }
    }

    declared
}

pub(crate) fn validate_port(port: i32, path: Path) -> Option<FieldError> {
    if (1..=65535).contains(&port) {
        return None;
    }
    Some(FieldError::invalid(
        path,
        port,
        "must be between 1 and 65535, inclusive",
    ))
}

impl UpstreamSpec for virtual_server::Upstream {
    fn name(&self) -> &str {
        &self.name
    }

    fn service(&self) -> &str {
        &self.service
    }

    fn port(&self) -> i32 {
        self.port
    }

    fn backup(&self) -> Option<&str> {
        self.backup.as_deref()
    }

    fn backup_port(&self) -> Option<i32> {
        self.backup_port
    }
}

impl UpstreamSpec for transport_server::Upstream {
    fn name(&self) -> &str {
        &self.name
    }

    fn service(&self) -> &str {
        &self.service
    }

    fn port(&self) -> i32 {
        self.port
    }

    fn backup(&self) -> Option<&str> {
        self.backup.as_deref()
    }

    fn backup_port(&self) -> Option<i32> {
        self.backup_port
    }
}
