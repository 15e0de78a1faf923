#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Generates NGINX configuration from the intermediate representation.
//!
//! The [`directives`] module holds the pure functions that encode individual
//! pieces of generation logic. [`TemplateExecutor`] renders whole files,
//! invoking the builders while it prepares each template's context.

pub mod directives;
mod executor;
mod filters;
mod view;

pub use self::executor::{Error, TemplateExecutor, TemplateId, UnknownTemplate};
pub use nginx_ingress_controller_core as core;
