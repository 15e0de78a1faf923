use crate::{
    k8s::{
        DynamicObject, GlobalConfiguration, GlobalConfigurationSpec, Listener, Resource,
        ResourceExt, TransportServer, TransportServerSpec, VirtualServer, VirtualServerSpec,
    },
    validation::{GlobalConfigurationValidator, TransportServerValidator, VirtualServerValidator},
};
use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Deserialize};
use std::fmt;
use tracing::{debug, info};

/// Validates custom resources the way the admission webhook of a running
/// controller would.
///
/// Listeners accepted from a GlobalConfiguration are remembered, and the
/// VirtualServers and TransportServers admitted afterwards must reference
/// them.
#[derive(Clone, Debug)]
pub struct Admission {
    global_configuration: GlobalConfigurationValidator,
    virtual_server: VirtualServerValidator,
    transport_server: TransportServerValidator,
    listeners: Option<Vec<Listener>>,
}

/// The outcome of admitting one resource.
#[derive(Debug)]
pub struct Decision {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub result: Result<()>,
}

trait Validate<T> {
    fn validate(&mut self, ns: &str, name: &str, spec: T) -> Result<()>;
}

// === impl Admission ===

impl Admission {
    pub fn new(
        forbidden_ports: impl IntoIterator<Item = u16>,
        tls_passthrough: bool,
        snippets_enabled: bool,
        is_plus: bool,
    ) -> Self {
        Self {
            global_configuration: GlobalConfigurationValidator::new(forbidden_ports),
            virtual_server: VirtualServerValidator::new(is_plus, snippets_enabled),
            transport_server: TransportServerValidator::new(
                tls_passthrough,
                snippets_enabled,
                is_plus,
            ),
            listeners: None,
        }
    }

    /// The listeners accepted from the last admitted GlobalConfiguration.
    pub fn listeners(&self) -> Option<&[Listener]> {
        self.listeners.as_deref()
    }

    /// Admits every object, GlobalConfigurations first so that listener
    /// references can be resolved. Otherwise input order is kept.
    pub fn admit_all(&mut self, objects: Vec<DynamicObject>) -> Vec<Decision> {
        let (globals, others): (Vec<_>, Vec<_>) = objects
            .into_iter()
            .partition(|obj| is_kind::<GlobalConfiguration>(obj));
        globals
            .into_iter()
            .chain(others)
            .map(|obj| self.admit(&obj))
            .collect()
    }

    pub fn admit(&mut self, obj: &DynamicObject) -> Decision {
        let result = if is_kind::<GlobalConfiguration>(obj) {
            self.admit_spec::<GlobalConfigurationSpec>(obj)
        } else if is_kind::<VirtualServer>(obj) {
            self.admit_spec::<VirtualServerSpec>(obj)
        } else if is_kind::<TransportServer>(obj) {
            self.admit_spec::<TransportServerSpec>(obj)
        } else {
            Err(anyhow!("unsupported resource type: {}", type_name(obj)))
        };

        Decision {
            kind: obj
                .types
                .as_ref()
                .map(|t| t.kind.clone())
                .unwrap_or_default(),
            namespace: obj.namespace().unwrap_or_default(),
            name: obj.name_any(),
            result,
        }
    }

    fn admit_spec<T>(&mut self, obj: &DynamicObject) -> Result<()>
    where
        T: DeserializeOwned,
        Self: Validate<T>,
    {
        let kind = type_name(obj);
        let spec = match parse_spec::<T>(obj) {
            Ok(spec) => spec,
            Err(error) => {
                info!(%error, %kind, "Failed to parse spec");
                return Err(error);
            }
        };

        let ns = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        if let Err(error) = self.validate(&ns, &name, spec) {
            info!(%error, %ns, %name, %kind, "Denied");
            return Err(error);
        }

        debug!(%ns, %name, %kind, "Admitted");
        Ok(())
    }
}

impl Validate<GlobalConfigurationSpec> for Admission {
    fn validate(&mut self, ns: &str, name: &str, mut spec: GlobalConfigurationSpec) -> Result<()> {
        let res = self.global_configuration.validate_spec(&mut spec);
        debug!(%ns, %name, accepted = spec.listeners.len(), "Accepted listeners");
        self.listeners = Some(spec.listeners);
        res.map_err(Into::into)
    }
}

impl Validate<VirtualServerSpec> for Admission {
    fn validate(&mut self, _ns: &str, _name: &str, spec: VirtualServerSpec) -> Result<()> {
        self.virtual_server
            .validate(&spec, self.listeners.as_deref())
            .map_err(Into::into)
    }
}

impl Validate<TransportServerSpec> for Admission {
    fn validate(&mut self, _ns: &str, _name: &str, spec: TransportServerSpec) -> Result<()> {
        self.transport_server
            .validate(&spec, self.listeners.as_deref())
            .map_err(Into::into)
    }
}

// === impl Decision ===

impl Decision {
    pub fn is_admitted(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)?;
        match &self.result {
            Ok(()) => f.write_str(": valid"),
            Err(error) => write!(f, ": {error:#}"),
        }
    }
}

/// Reads every object of a multi-document YAML manifest. Empty documents are
/// skipped.
pub fn read_manifest(manifest: &str) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();
    for (i, doc) in serde_yaml::Deserializer::from_str(manifest).enumerate() {
        let value = serde_yaml::Value::deserialize(doc)
            .with_context(|| format!("failed to parse document {i}"))?;
        if value.is_null() {
            continue;
        }
        let obj = serde_yaml::from_value(value)
            .with_context(|| format!("document {i} is not a Kubernetes object"))?;
        objects.push(obj);
    }
    Ok(objects)
}

fn is_kind<T>(obj: &DynamicObject) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let Some(types) = &obj.types else {
        return false;
    };
    let group = types
        .api_version
        .rsplit_once('/')
        .map(|(group, _)| group)
        .unwrap_or_default();

    let dt = Default::default();
    group.eq_ignore_ascii_case(&T::group(&dt)) && types.kind.eq_ignore_ascii_case(&T::kind(&dt))
}

fn type_name(obj: &DynamicObject) -> String {
    match &obj.types {
        Some(types) => format!("{}.{}", types.kind, types.api_version),
        None => "<missing kind>".to_string(),
    }
}

fn parse_spec<T: DeserializeOwned>(obj: &DynamicObject) -> Result<T> {
    let data = obj
        .data
        .get("spec")
        .cloned()
        .ok_or_else(|| anyhow!("resource missing 'spec'"))?;
    serde_json::from_value(data).context("failed to parse spec")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"
apiVersion: k8s.nginx.org/v1
kind: TransportServer
metadata:
  name: dns-tcp
  namespace: default
spec:
  listener:
    name: dns-tcp
    protocol: TCP
  upstreams:
  - name: dns-app
    service: coredns
    port: 5353
  action:
    pass: dns-app
---
apiVersion: k8s.nginx.org/v1
kind: GlobalConfiguration
metadata:
  name: nginx-configuration
  namespace: nginx-ingress
spec:
  listeners:
  - name: dns-tcp
    port: 5353
    protocol: TCP
  - name: dns-udp
    port: 5353
    protocol: UDP
  - name: http-80
    port: 80
    protocol: HTTP
---
"#;

    fn admission() -> Admission {
        Admission::new([80, 443, 8080], false, false, false)
    }

    #[test]
    fn reads_multi_document_manifests() {
        let objects = read_manifest(MANIFEST).expect("manifest must parse");
        let names = objects.iter().map(|o| o.name_any()).collect::<Vec<_>>();
        assert_eq!(names, ["dns-tcp", "nginx-configuration"]);
    }

    #[test]
    fn admits_global_configuration_first() {
        let objects = read_manifest(MANIFEST).expect("manifest must parse");
        let mut admission = admission();
        let decisions = admission.admit_all(objects);

        let summary = decisions
            .iter()
            .map(|d| (d.kind.as_str(), d.name.as_str(), d.is_admitted()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            [
                ("GlobalConfiguration", "nginx-configuration", false),
                ("TransportServer", "dns-tcp", true),
            ]
        );

        let names = admission
            .listeners()
            .expect("listeners must be recorded")
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["dns-tcp", "dns-udp"]);

        let denial = decisions[0].to_string();
        assert!(
            denial.starts_with("GlobalConfiguration nginx-ingress/nginx-configuration: "),
            "{denial}"
        );
        assert!(denial.contains("spec.listeners[2].port"), "{denial}");
    }

    #[test]
    fn checks_listener_references() {
        let objects = read_manifest(
            r#"
apiVersion: k8s.nginx.org/v1
kind: GlobalConfiguration
metadata:
  name: nginx-configuration
  namespace: nginx-ingress
spec:
  listeners:
  - name: dns-udp
    port: 5353
    protocol: UDP
---
apiVersion: k8s.nginx.org/v1
kind: TransportServer
metadata:
  name: dns-tcp
  namespace: default
spec:
  listener:
    name: dns-tcp
    protocol: TCP
  upstreams:
  - name: dns-app
    service: coredns
    port: 5353
  action:
    pass: dns-app
"#,
        )
        .expect("manifest must parse");

        let decisions = admission().admit_all(objects);
        assert!(decisions[0].is_admitted());
        let error = decisions[1]
            .result
            .as_ref()
            .expect_err("unknown listener must be denied");
        assert_eq!(
            error.to_string(),
            "spec.listener.name: Not found: \"dns-tcp\""
        );
    }

    #[test]
    fn validates_virtual_servers() {
        let objects = read_manifest(
            r#"
apiVersion: k8s.nginx.org/v1
kind: VirtualServer
metadata:
  name: cafe
  namespace: default
spec:
  host: cafe.example.com
  upstreams:
  - name: tea
    service: tea-svc
    port: 80
  routes:
  - path: /tea
    action:
      pass: tea
"#,
        )
        .expect("manifest must parse");

        let decisions = admission().admit_all(objects);
        assert!(decisions[0].is_admitted(), "{}", decisions[0]);
        assert_eq!(decisions[0].to_string(), "VirtualServer default/cafe: valid");
    }

    #[test]
    fn rejects_unsupported_kinds() {
        let objects = read_manifest(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: nginx-config
  namespace: nginx-ingress
data:
  worker-processes: "1"
"#,
        )
        .expect("manifest must parse");

        let decisions = admission().admit_all(objects);
        let error = decisions[0]
            .result
            .as_ref()
            .expect_err("config maps are not admitted");
        assert_eq!(error.to_string(), "unsupported resource type: ConfigMap.v1");
    }

    #[test]
    fn rejects_missing_spec() {
        let objects = read_manifest(
            r#"
apiVersion: k8s.nginx.org/v1
kind: VirtualServer
metadata:
  name: cafe
  namespace: default
"#,
        )
        .expect("manifest must parse");

        let decisions = admission().admit_all(objects);
        assert!(!decisions[0].is_admitted());
    }
}
