//! Template contexts.
//!
//! Each view borrows the IR it renders and adds the output of the directive
//! builders. References between IR objects are resolved while a view is
//! built, so a dangling reference fails the render before any template runs.

pub(crate) mod ingress;
pub(crate) mod main_config;
pub(crate) mod transport_server;
pub(crate) mod virtual_server;
