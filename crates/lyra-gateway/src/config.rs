//! Gateway configuration

use lyra_acl::WhitelistTable;
use lyra_core::canonical_user;

use crate::threshold::ThresholdConfig;

/// Gateway configuration
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Whether connections must authenticate. When disabled every
    /// connection acts as `default_user`.
    pub auth: bool,
    /// Identity used when authentication is disabled
    pub default_user: String,
    /// Compatibility mode for raw data channels: failed authentication
    /// leaves the connection open in pending-reauth instead of closing it
    pub no_disconnect: bool,
    /// Capacity of each connection's outgoing event queue; overflow
    /// disconnects that connection
    pub out_queue_capacity: usize,
    /// Address whitelist merged into every ACL
    pub whitelist: Option<WhitelistTable>,
    /// Event flood detection
    pub threshold: ThresholdConfig,
    /// Reported by the `getVersion` command
    pub name: String,
    pub version: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            auth: false,
            default_user: canonical_user("admin"),
            no_disconnect: false,
            out_queue_capacity: 256,
            whitelist: None,
            threshold: ThresholdConfig::default(),
            name: "lyra-gateway".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl GatewayConfig {
    /// Normalize after deserialization or manual construction
    pub fn normalized(mut self) -> Self {
        self.default_user = canonical_user(&self.default_user);
        self
    }
}
