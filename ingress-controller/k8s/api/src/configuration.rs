pub mod global_configuration;
pub mod transport_server;
pub mod virtual_server;

pub use self::{
    global_configuration::{GlobalConfiguration, GlobalConfigurationSpec, Listener},
    transport_server::{TransportServer, TransportServerSpec},
    virtual_server::{VirtualServer, VirtualServerSpec},
};

/// The API group of every custom resource in this module.
pub const GROUP: &str = "k8s.nginx.org";
