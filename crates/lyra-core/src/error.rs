//! Error types for the LYRA gateway

use thiserror::Error;

use crate::{acl::Operation, acl::Resource, id::ConnectionId};

/// Core gateway errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    // Authentication errors
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Session expired")]
    SessionExpired,

    // Authorization errors
    #[error("No permission to call {command}: need {resource}.{operation}")]
    PermissionDenied {
        command: String,
        resource: Resource,
        operation: Operation,
        arg: Option<String>,
    },

    // Subscription errors
    #[error("Empty pattern on subscribe")]
    EmptyPattern,

    // Command errors
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown connection: {0:?}")]
    UnknownConnection(ConnectionId),

    // Backend errors
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    // Delivery errors
    #[error("Outgoing queue overflow")]
    QueueOverflow,
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
