#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod annotations;
pub mod configuration;

pub use self::configuration::{
    GlobalConfiguration, GlobalConfigurationSpec, Listener, TransportServer,
    TransportServerSpec, VirtualServer, VirtualServerSpec,
};
pub use k8s_openapi::api::{
    self,
    networking::v1::{Ingress, IngressSpec},
};
pub use kube::{core::ObjectMeta, ResourceExt};
pub use kube::{core::DynamicObject, Resource};
