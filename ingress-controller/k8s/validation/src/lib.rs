#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Validation of the controller's custom resources.
//!
//! Validators never stop at the first problem: every field error found in a
//! resource is collected into an [`field::ErrorList`] and reported together.
//! The GlobalConfiguration validator additionally drops invalid listeners
//! from `spec.listeners` so that the remaining listeners can still be served.

pub mod field;
pub mod global_configuration;
mod names;
pub mod transport_server;
mod upstream;
pub mod virtual_server;

pub use self::{
    field::{AggregateError, ErrorKind, ErrorList, FieldError, Path},
    global_configuration::{GlobalConfigurationValidator, ListenerProtocol},
    transport_server::TransportServerValidator,
    virtual_server::VirtualServerValidator,
};
pub use nginx_ingress_controller_k8s_api as k8s;
