#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Command-line front end to the configuration compiler: validates custom
//! resource manifests and renders configuration files from their
//! intermediate representation.

pub use nginx_ingress_controller_config as config;
pub use nginx_ingress_controller_core as core;
pub use nginx_ingress_controller_k8s_api as k8s;
pub use nginx_ingress_controller_k8s_validation as validation;

mod admission;
mod args;
mod log;
mod ports;

pub use self::{
    admission::{read_manifest, Admission, Decision},
    args::Args,
    log::LogFormat,
    ports::parse_portset,
};
