use crate::{
    field::{AggregateError, ErrorList, FieldError, Path},
    k8s::configuration::global_configuration::{
        GlobalConfiguration, GlobalConfigurationSpec, Listener, TLS_PASSTHROUGH_LISTENER_NAME,
    },
    names,
};
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use std::{fmt, net::IpAddr, str::FromStr};
use tracing::debug;

/// Validates GlobalConfiguration listeners.
///
/// Listeners are checked in order and an invalid listener is dropped without
/// affecting the others. When two listeners conflict the first one wins.
#[derive(Clone, Debug, Default)]
pub struct GlobalConfigurationValidator {
    forbidden_ports: HashSet<u16>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListenerProtocol {
    Http,
    Tcp,
    Udp,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidProtocol;

/// Ports claimed so far, by bind address. `None` binds all addresses.
type PortProtocols = HashMap<Option<IpAddr>, HashMap<u16, ListenerProtocol>>;

// === impl GlobalConfigurationValidator ===

impl GlobalConfigurationValidator {
    pub fn new(forbidden_ports: impl IntoIterator<Item = u16>) -> Self {
        Self {
            forbidden_ports: forbidden_ports.into_iter().collect(),
        }
    }

    /// Validates the resource, leaving only the accepted listeners in its
    /// spec.
    pub fn validate(&self, gc: &mut GlobalConfiguration) -> Result<(), AggregateError> {
        self.validate_spec(&mut gc.spec)
    }

    pub fn validate_spec(&self, spec: &mut GlobalConfigurationSpec) -> Result<(), AggregateError> {
        let path = Path::new("spec").child("listeners");
        let (accepted, errors) = self.validate_listeners(&spec.listeners, &path);
        spec.listeners = accepted;
        errors.into_result()
    }

    /// Returns the listeners that passed validation, in input order, and an
    /// error for each listener that did not.
    pub fn validate_listeners(
        &self,
        listeners: &[Listener],
        path: &Path,
    ) -> (Vec<Listener>, ErrorList) {
        let mut accepted = Vec::with_capacity(listeners.len());
        let mut errors = ErrorList::default();
        let mut names = HashSet::<&str>::default();
        let mut claimed = PortProtocols::default();

        for (i, listener) in listeners.iter().enumerate() {
            let path = path.index(i);

            let (port, protocol) = match self.validate_listener(listener, &path) {
                Ok(checked) => checked,
                Err(errs) => {
                    debug!(name = %listener.name, errors = errs.len(), "Rejected invalid listener");
                    errors.extend(errs);
                    continue;
                }
            };

            let ip = match parse_ip(listener.ip()) {
                Ok(ip) => ip,
                Err(()) => {
                    debug!(name = %listener.name, ip = %listener.ip(), "Rejected listener IP");
                    errors.push(FieldError::invalid(
                        path.child("ip"),
                        listener.ip(),
                        "invalid IP address",
                    ));
                    continue;
                }
            };

            if names.contains(listener.name.as_str()) {
                debug!(name = %listener.name, "Rejected duplicate listener name");
                errors.push(FieldError::duplicate(path.child("name"), listener.name.as_str()).conflict());
                continue;
            }

            if let Some(error) = check_port_conflict(&claimed, listener, ip, port, protocol, &path) {
                debug!(name = %listener.name, %error, "Rejected conflicting listener");
                errors.push(error);
                continue;
            }

            names.insert(listener.name.as_str());
            claimed.entry(ip).or_default().insert(port, protocol);
            accepted.push(listener.clone());
        }

        (accepted, errors)
    }

    fn validate_listener(
        &self,
        listener: &Listener,
        path: &Path,
    ) -> Result<(u16, ListenerProtocol), ErrorList> {
        let mut errors = ErrorList::default();

        if listener.name == TLS_PASSTHROUGH_LISTENER_NAME {
            errors.push(FieldError::forbidden(
                path.child("name"),
                "is the name of a built-in listener",
            ));
        } else {
            for msg in names::dns1035_label(&listener.name) {
                errors.push(FieldError::invalid(path.child("name"), listener.name.as_str(), msg));
            }
        }

        let port = match u16::try_from(listener.port) {
            Ok(port) if self.forbidden_ports.contains(&port) => {
                errors.push(FieldError::forbidden(
                    path.child("port"),
                    format!("Listener {}: port {} is forbidden", listener.name, port),
                ));
                None
            }
            Ok(port) if port > 0 => Some(port),
            _ => {
                errors.push(FieldError::invalid(
                    path.child("port"),
                    listener.port,
                    "must be between 1 and 65535, inclusive",
                ));
                None
            }
        };

        let protocol = match listener.protocol.parse::<ListenerProtocol>() {
            Ok(protocol) => Some(protocol),
            Err(InvalidProtocol) => {
                errors.push(FieldError::invalid(
                    path.child("protocol"),
                    listener.protocol.as_str(),
                    format!(
                        "must specify a valid protocol. Accepted values: {}",
                        ListenerProtocol::accepted_values()
                    ),
                ));
                None
            }
        };

        match (port, protocol) {
            (Some(port), Some(protocol)) if errors.is_empty() => Ok((port, protocol)),
            _ => Err(errors),
        }
    }
}

/// Parses a listener IP. An empty string means all addresses.
fn parse_ip(ip: &str) -> Result<Option<IpAddr>, ()> {
    if ip.is_empty() {
        return Ok(None);
    }
    ip.parse().map(Some).map_err(|_| ())
}

fn check_port_conflict(
    claimed: &PortProtocols,
    listener: &Listener,
    ip: Option<IpAddr>,
    port: u16,
    protocol: ListenerProtocol,
    path: &Path,
) -> Option<FieldError> {
    let current = *claimed.get(&ip)?.get(&port)?;

    if current == protocol {
        return Some(
            FieldError::duplicate(
                path.clone(),
                format!(
                    "Listener {}: Duplicated port/protocol combination {}/{}",
                    listener.name, port, protocol
                ),
            )
            .conflict(),
        );
    }

    // TCP and UDP may share a port, but HTTP claims it exclusively.
    if current == ListenerProtocol::Http || protocol == ListenerProtocol::Http {
        return Some(
            FieldError::invalid(
                path.child("port"),
                i32::from(port),
                format!(
                    "Listener {}: Port {} is used with a different protocol (current: {}, new: {})",
                    listener.name, port, current, protocol
                ),
            )
            .conflict(),
        );
    }

    None
}

// === impl ListenerProtocol ===

impl ListenerProtocol {
    const ALL: [Self; 3] = [Self::Http, Self::Tcp, Self::Udp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }

    fn accepted_values() -> String {
        let mut values = Self::ALL.iter().map(Self::as_str).collect::<Vec<_>>();
        values.sort_unstable();
        values.join(",")
    }
}

impl FromStr for ListenerProtocol {
    type Err = InvalidProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(InvalidProtocol)
    }
}

impl fmt::Display for ListenerProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests;
