use nginx_ingress_controller_core::{main_config::MainConfig, Capabilities};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub(crate) struct MainConfigView<'c> {
    #[serde(flatten)]
    config: &'c MainConfig,
    /// Set when usage reporting is configured and the engine accepts it.
    mgmt_block: bool,
}

// === impl MainConfigView ===

impl<'c> MainConfigView<'c> {
    pub(crate) fn new(config: &'c MainConfig, capabilities: Capabilities) -> Self {
        let mgmt_block = config.mgmt.is_some() && capabilities.mgmt_block;
        if config.mgmt.is_some() && !mgmt_block {
            debug!("Engine does not accept the mgmt block; omitting usage reporting settings");
        }
        Self { config, mgmt_block }
    }
}
