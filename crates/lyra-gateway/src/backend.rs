//! Backend state/object store contract
//!
//! The store owns persistence and the two change feeds; the gateway only
//! subscribes, queries, and forwards. The `user` argument on the point
//! operations is the acting identity, so the store can apply its own
//! object-level rights on top of the gateway's command permissions.

use async_trait::async_trait;
use serde_json::Value;

use lyra_core::{Acl, GatewayResult};

/// External backend object/state store
#[async_trait]
pub trait DataBackend: Send + Sync {
    // change feeds
    async fn subscribe_states(&self, pattern: &str) -> GatewayResult<()>;
    async fn unsubscribe_states(&self, pattern: &str) -> GatewayResult<()>;
    async fn subscribe_objects(&self, pattern: &str) -> GatewayResult<()>;
    async fn unsubscribe_objects(&self, pattern: &str) -> GatewayResult<()>;
    async fn subscribe_files(&self, pattern: &str) -> GatewayResult<()>;
    async fn unsubscribe_files(&self, pattern: &str) -> GatewayResult<()>;
    async fn set_log_streaming(&self, enabled: bool) -> GatewayResult<()>;

    // point queries and writes
    async fn get_object(&self, id: &str, user: &str) -> GatewayResult<Option<Value>>;
    async fn set_object(&self, id: &str, value: Value, user: &str) -> GatewayResult<()>;
    async fn del_object(&self, id: &str, user: &str) -> GatewayResult<()>;
    async fn get_objects(&self, pattern: &str, user: &str) -> GatewayResult<Value>;
    async fn get_state(&self, id: &str, user: &str) -> GatewayResult<Option<Value>>;
    async fn set_state(&self, id: &str, value: Value, user: &str) -> GatewayResult<()>;
    async fn del_state(&self, id: &str, user: &str) -> GatewayResult<()>;
    async fn get_states(&self, pattern: &str, user: &str) -> GatewayResult<Value>;

    // point-to-point instance messaging
    async fn send_to(&self, instance: &str, command: &str, message: Value)
        -> GatewayResult<Value>;

    /// Role-based permission grant for a user. A failure here denies
    /// authentication entirely - there is no partial ACL.
    async fn calculate_permissions(&self, user: &str) -> GatewayResult<Acl>;
}
