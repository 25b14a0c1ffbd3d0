//! External session store and password verifier contracts

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use lyra_core::GatewayResult;

/// One session record, owned by the external store. The gateway reads it
/// to learn the user recorded at login time and writes back renewed
/// expiries; it never owns the record's lifecycle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// User recorded at login, absent for anonymous sessions
    pub user: Option<String>,
    /// Opaque application payload carried along on renewal
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SessionRecord {
    pub fn for_user(user: impl Into<String>) -> Self {
        SessionRecord {
            user: Some(user.into()),
            data: serde_json::Value::Null,
        }
    }
}

/// Backend session store
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session record, `None` when expired or never created
    async fn get(&self, sid: &str) -> GatewayResult<Option<SessionRecord>>;

    /// Write a record back with a fresh time-to-live
    async fn set(&self, sid: &str, ttl: Duration, record: SessionRecord) -> GatewayResult<()>;

    /// Destroy a session (logout)
    async fn destroy(&self, sid: &str) -> GatewayResult<()>;
}

/// Backend password verifier
#[async_trait]
pub trait PasswordVerifier: Send + Sync {
    async fn check_password(&self, user: &str, pass: &str) -> GatewayResult<bool>;
}
