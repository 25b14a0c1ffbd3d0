//! Per-connection state
//!
//! All per-client bookkeeping lives in a `Connection` owned by the
//! gateway, never as ad hoc fields on a transport object; the transport
//! is reduced to the outgoing message queue.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use lyra_core::{Acl, ConnectionId, GatewayError, GatewayResult, Operation, Resource};
use lyra_registry::EventKind;
use lyra_session::SessionState;

/// Connection lifecycle states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnState {
    Connecting,
    Authenticating,
    Authorized,
    Active,
    /// Session expired mid-connection; only `authenticate` or a
    /// disconnect leads out of here
    PendingReauth,
    Disconnected,
}

/// Message pushed to a connected client
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    /// A matched change event
    Event {
        kind: EventKind,
        id: String,
        payload: Value,
    },
    /// A matched file change (container and file name both matched)
    FileEvent {
        id: String,
        name: String,
        payload: Value,
    },
    /// The client must re-login before issuing further commands
    Reauthenticate,
    /// Permission denial for a request that carried no reply callback
    PermissionError {
        command: String,
        resource: Resource,
        operation: Operation,
        arg: Option<String>,
    },
    /// Event threshold entered (true) or cleared (false)
    EventsThreshold(bool),
}

/// One live client session, exclusively owned by the gateway
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub address: String,
    pub state: ConnState,
    /// Capability set, computed once at authentication time
    pub acl: Acl,
    /// Present only for cookie-authenticated connections
    pub session_id: Option<String>,
    pub session: SessionState,
    /// Client-supplied display name
    pub name: Option<String>,
    /// Authenticated (as opposed to default-user) connection
    pub secure: bool,
    sender: mpsc::Sender<ServerMessage>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        address: String,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Self {
        Connection {
            id,
            address,
            state: ConnState::Connecting,
            acl: Acl::default(),
            session_id: None,
            session: SessionState::new(),
            name: None,
            secure: false,
            sender,
        }
    }

    /// Queue a message without blocking. A full queue is an overflow
    /// error local to this connection; a closed queue means the client
    /// is already gone and the message is dropped.
    pub fn push(&self, message: ServerMessage) -> GatewayResult<()> {
        match self.sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(GatewayError::QueueOverflow),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(conn = %self.id, "dropping message for closed connection");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_reports_overflow() {
        let (tx, mut rx) = mpsc::channel(1);
        let conn = Connection::new(ConnectionId::new(1), "127.0.0.1".into(), tx);

        conn.push(ServerMessage::Reauthenticate).unwrap();
        assert_eq!(
            conn.push(ServerMessage::Reauthenticate),
            Err(GatewayError::QueueOverflow)
        );

        assert_eq!(rx.try_recv().unwrap(), ServerMessage::Reauthenticate);
    }

    #[test]
    fn test_push_to_closed_queue_is_silent() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let conn = Connection::new(ConnectionId::new(1), "127.0.0.1".into(), tx);
        assert_eq!(conn.push(ServerMessage::Reauthenticate), Ok(()));
    }
}
