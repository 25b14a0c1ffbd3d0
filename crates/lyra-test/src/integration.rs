//! End-to-end gateway validation
//!
//! Assembles a full gateway around the in-memory doubles and exercises
//! the complete flow: connect, authenticate, subscribe, publish, deny,
//! expire, and disconnect. The fixture is public so downstream hosts can
//! reuse it for their own transport-level tests.

use std::sync::Arc;
use std::time::Duration;

use lyra_gateway::{ConnectionHandle, Gateway, GatewayConfig, Handshake};
use lyra_session::{SessionConfig, SessionManager};

use crate::doubles::{MemorySessionStore, MockBackend, StaticPasswordVerifier};

/// Shared secret the fixture signs session cookies with
pub const TEST_SECRET: &str = "swordfish";

/// A gateway wired to in-memory doubles
pub struct GatewayFixture {
    pub gateway: Gateway,
    pub backend: Arc<MockBackend>,
    pub store: Arc<MemorySessionStore>,
}

impl GatewayFixture {
    /// Gateway with the given config and a verifier knowing `anna`/`secret`
    pub fn new(config: GatewayConfig) -> Self {
        GatewayFixture::with_sessions(config, SessionConfig {
            secret: TEST_SECRET.to_owned(),
            ..SessionConfig::default()
        })
    }

    pub fn with_sessions(config: GatewayConfig, sessions: SessionConfig) -> Self {
        let backend = Arc::new(MockBackend::new());
        let store = Arc::new(MemorySessionStore::new());
        let verifier = Arc::new(StaticPasswordVerifier::new().with_user("anna", "secret"));
        let manager = SessionManager::new(store.clone(), verifier, sessions);
        let gateway = Gateway::start(backend.clone(), manager, config);
        GatewayFixture {
            gateway,
            backend,
            store,
        }
    }

    pub async fn connect(&self, address: &str) -> ConnectionHandle {
        self.gateway
            .connect(Handshake::anonymous(address))
            .await
            .expect("connect")
    }

    /// Let the upstream driver task drain the pending subscription changes
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use lyra_core::{GatewayError, Operation, Resource};
    use lyra_gateway::{Request, ServerMessage};
    use lyra_registry::EventKind;
    use lyra_session::{cookie, SessionRecord};

    fn anonymous_config() -> GatewayConfig {
        GatewayConfig {
            auth: false,
            default_user: "tester".to_owned(),
            ..GatewayConfig::default()
        }
    }

    fn expect_event(message: ServerMessage) -> (EventKind, String, serde_json::Value) {
        match message {
            ServerMessage::Event { kind, id, payload } => (kind, id, payload),
            other => panic!("expected change event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_matched_event_reaches_only_subscribers() {
        let fx = GatewayFixture::new(anonymous_config());
        let mut a = fx.connect("10.0.0.1").await;
        let mut b = fx.connect("10.0.0.2").await;

        fx.gateway
            .handle_command(a.id, Request::new("subscribe", vec![json!("lamp.*")]))
            .await
            .unwrap();
        fx.settle().await;
        assert_eq!(fx.backend.call_count("subscribe_states lamp.*"), 1);

        fx.gateway
            .publish(EventKind::StateChange, "lamp.kitchen", json!({ "val": true }))
            .await;

        let (kind, id, payload) = expect_event(a.events.recv().await.unwrap());
        assert_eq!(kind, EventKind::StateChange);
        assert_eq!(id, "lamp.kitchen");
        assert_eq!(payload, json!({ "val": true }));
        assert!(b.events.try_recv().is_err());

        // unmatched id reaches nobody
        fx.gateway
            .publish(EventKind::StateChange, "door.front", json!({ "val": 1 }))
            .await;
        assert!(a.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_shared_pattern_upstream_refcount() {
        let fx = GatewayFixture::new(anonymous_config());
        let a = fx.connect("10.0.0.1").await;
        let b = fx.connect("10.0.0.2").await;

        for conn in [a.id, b.id] {
            fx.gateway
                .handle_command(conn, Request::new("subscribe", vec![json!("sensor.*")]))
                .await
                .unwrap();
        }
        fx.settle().await;
        assert_eq!(fx.backend.call_count("subscribe_states sensor.*"), 1);

        // first leaver keeps the upstream subscription alive
        fx.gateway.disconnect(a.id);
        fx.settle().await;
        assert_eq!(fx.backend.call_count("unsubscribe_states sensor.*"), 0);

        fx.gateway.disconnect(b.id);
        fx.settle().await;
        assert_eq!(fx.backend.call_count("unsubscribe_states sensor.*"), 1);
    }

    #[tokio::test]
    async fn test_whitelist_narrows_state_write() {
        let whitelist = serde_json::from_value(json!({
            "192.168.1.50": { "state": { "write": false } }
        }))
        .unwrap();
        let fx = GatewayFixture::new(GatewayConfig {
            whitelist: Some(whitelist),
            ..anonymous_config()
        });

        let limited = fx.connect("192.168.1.50").await;
        let free = fx.connect("192.168.1.60").await;

        let err = fx
            .gateway
            .handle_command(
                limited.id,
                Request::new("setState", vec![json!("lamp.1"), json!(true)]),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::PermissionDenied {
                command: "setState".to_owned(),
                resource: Resource::State,
                operation: Operation::Write,
                arg: Some("lamp.1".to_owned()),
            }
        );

        // reads were not withdrawn
        fx.gateway
            .handle_command(limited.id, Request::new("getState", vec![json!("lamp.1")]))
            .await
            .unwrap();

        // other addresses are unaffected
        fx.gateway
            .handle_command(
                free.id,
                Request::new("setState", vec![json!("lamp.1"), json!(true)]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_denial_without_callback_emits_permission_error() {
        let whitelist = serde_json::from_value(json!({
            "192.168.1.50": { "state": { "write": false } }
        }))
        .unwrap();
        let fx = GatewayFixture::new(GatewayConfig {
            whitelist: Some(whitelist),
            ..anonymous_config()
        });
        let mut conn = fx.connect("192.168.1.50").await;

        fx.gateway
            .handle_command(
                conn.id,
                Request::fire_and_forget("setState", vec![json!("lamp.1"), json!(true)]),
            )
            .await
            .unwrap_err();

        assert_eq!(
            conn.events.recv().await.unwrap(),
            ServerMessage::PermissionError {
                command: "setState".to_owned(),
                resource: Resource::State,
                operation: Operation::Write,
                arg: Some("lamp.1".to_owned()),
            }
        );
    }

    #[tokio::test]
    async fn test_auth_required_rejects_anonymous() {
        let fx = GatewayFixture::new(GatewayConfig {
            auth: true,
            ..GatewayConfig::default()
        });
        let err = fx
            .gateway
            .connect(Handshake::anonymous("10.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AuthenticationFailed(_)));
        assert_eq!(fx.gateway.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_no_disconnect_keeps_connection_for_late_login() {
        let fx = GatewayFixture::new(GatewayConfig {
            auth: true,
            no_disconnect: true,
            ..GatewayConfig::default()
        });

        let mut conn = fx
            .gateway
            .connect(Handshake::anonymous("10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(
            conn.events.recv().await.unwrap(),
            ServerMessage::Reauthenticate
        );

        // everything but a login is refused while pending
        let err = fx
            .gateway
            .handle_command(conn.id, Request::new("getState", vec![json!("lamp.1")]))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::SessionExpired);

        let reply = fx
            .gateway
            .handle_command(
                conn.id,
                Request::new("authenticate", vec![json!("anna"), json!("secret")]),
            )
            .await
            .unwrap();
        assert_eq!(reply, json!({ "authenticated": true, "secure": true }));

        fx.gateway
            .handle_command(conn.id, Request::new("getState", vec![json!("lamp.1")]))
            .await
            .unwrap();
        assert_eq!(
            fx.backend.call_count("get_state lamp.1 system.user.anna"),
            1
        );
    }

    #[tokio::test]
    async fn test_cookie_login_and_logout() {
        let fx = GatewayFixture::new(GatewayConfig {
            auth: true,
            ..GatewayConfig::default()
        });
        fx.store.insert("sess-1", SessionRecord::for_user("bob"));

        let value = cookie::sign("sess-1", TEST_SECRET);
        let mut conn = fx
            .gateway
            .connect(Handshake {
                address: "10.0.0.1".to_owned(),
                cookie: Some(format!("connect.sid={value}")),
                credentials: None,
            })
            .await
            .unwrap();

        fx.gateway
            .handle_command(conn.id, Request::new("getState", vec![json!("lamp.1")]))
            .await
            .unwrap();
        assert_eq!(fx.backend.call_count("get_state lamp.1 system.user.bob"), 1);

        fx.gateway
            .handle_command(conn.id, Request::new("logout", vec![]))
            .await
            .unwrap();
        assert!(!fx.store.contains("sess-1"));
        assert_eq!(
            conn.events.recv().await.unwrap(),
            ServerMessage::Reauthenticate
        );
        let err = fx
            .gateway
            .handle_command(conn.id, Request::new("getState", vec![json!("lamp.1")]))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::SessionExpired);
    }

    #[tokio::test]
    async fn test_vanished_session_drops_delivery() {
        let fx = GatewayFixture::new(GatewayConfig {
            auth: true,
            ..GatewayConfig::default()
        });
        fx.store.insert("sess-1", SessionRecord::for_user("bob"));

        let value = cookie::sign("sess-1", TEST_SECRET);
        let mut conn = fx
            .gateway
            .connect(Handshake {
                address: "10.0.0.1".to_owned(),
                cookie: Some(format!("connect.sid={value}")),
                credentials: None,
            })
            .await
            .unwrap();

        fx.gateway
            .handle_command(conn.id, Request::new("subscribe", vec![json!("lamp.*")]))
            .await
            .unwrap();

        // session killed externally: the event is dropped, not re-queued
        fx.store.remove("sess-1");
        fx.gateway
            .publish(EventKind::StateChange, "lamp.kitchen", json!({ "val": 1 }))
            .await;

        assert_eq!(
            conn.events.recv().await.unwrap(),
            ServerMessage::Reauthenticate
        );
        assert!(conn.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_queue_overflow_disconnects_only_the_slow_client() {
        let fx = GatewayFixture::new(GatewayConfig {
            out_queue_capacity: 4,
            ..anonymous_config()
        });
        let slow = fx.connect("10.0.0.1").await;
        let mut fast = fx.connect("10.0.0.2").await;

        for conn in [slow.id, fast.id] {
            fx.gateway
                .handle_command(conn, Request::new("subscribe", vec![json!("x.*")]))
                .await
                .unwrap();
        }
        fx.settle().await;

        // the fast client drains, the slow one never does
        for i in 0..6 {
            fx.gateway
                .publish(EventKind::StateChange, "x.y", json!({ "val": i }))
                .await;
            fast.events.recv().await.unwrap();
        }

        assert_eq!(fx.gateway.connection_count(), 1);
        fx.settle().await;
        // the dead client's refcount was released, the live one's kept
        assert_eq!(fx.backend.call_count("unsubscribe_states x.*"), 0);

        fx.gateway
            .publish(EventKind::StateChange, "x.z", json!({ "val": 7 }))
            .await;
        let (_, id, _) = expect_event(fast.events.recv().await.unwrap());
        assert_eq!(id, "x.z");
    }

    #[tokio::test]
    async fn test_forced_threshold_swaps_upstream_subscriptions() {
        let fx = GatewayFixture::new(anonymous_config());
        let mut conn = fx.connect("10.0.0.1").await;

        fx.gateway
            .handle_command(conn.id, Request::new("subscribe", vec![json!("sensor.*")]))
            .await
            .unwrap();
        fx.settle().await;

        fx.gateway.set_event_threshold(true);
        fx.settle().await;
        assert_eq!(
            conn.events.recv().await.unwrap(),
            ServerMessage::EventsThreshold(true)
        );
        assert_eq!(fx.backend.call_count("unsubscribe_states sensor.*"), 1);
        assert_eq!(
            fx.backend.call_count("subscribe_states system.adapter.*"),
            1
        );

        fx.gateway.set_event_threshold(false);
        fx.settle().await;
        assert_eq!(
            conn.events.recv().await.unwrap(),
            ServerMessage::EventsThreshold(false)
        );
        assert_eq!(
            fx.backend.call_count("unsubscribe_states system.adapter.*"),
            1
        );
        assert_eq!(fx.backend.call_count("subscribe_states sensor.*"), 2);
    }

    #[tokio::test]
    async fn test_file_events_match_both_patterns() {
        let fx = GatewayFixture::new(anonymous_config());
        let mut conn = fx.connect("10.0.0.1").await;

        fx.gateway
            .handle_command(
                conn.id,
                Request::new("subscribeFiles", vec![json!("vis.0"), json!("main/*")]),
            )
            .await
            .unwrap();
        fx.settle().await;
        assert_eq!(fx.backend.call_count("subscribe_files vis.0"), 1);

        fx.gateway
            .publish_file("vis.0", "main/view.json", json!({ "size": 10 }))
            .await;
        assert_eq!(
            conn.events.recv().await.unwrap(),
            ServerMessage::FileEvent {
                id: "vis.0".to_owned(),
                name: "main/view.json".to_owned(),
                payload: json!({ "size": 10 }),
            }
        );

        // file name outside the per-file pattern
        fx.gateway
            .publish_file("vis.0", "other/view.json", json!({}))
            .await;
        assert!(conn.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_introspection_commands() {
        let fx = GatewayFixture::new(GatewayConfig {
            name: "lyra.0".to_owned(),
            version: "0.2.0".to_owned(),
            ..anonymous_config()
        });
        let conn = fx.connect("10.0.0.1").await;

        let version = fx
            .gateway
            .handle_command(conn.id, Request::new("getVersion", vec![]))
            .await
            .unwrap();
        assert_eq!(version, json!({ "version": "0.2.0", "name": "lyra.0" }));

        let permissions = fx
            .gateway
            .handle_command(conn.id, Request::new("listPermissions", vec![]))
            .await
            .unwrap();
        assert_eq!(
            permissions["setState"],
            json!({ "type": "state", "operation": "write" })
        );
        assert_eq!(
            permissions["authenticate"],
            json!({ "type": "", "operation": "" })
        );

        let acl = fx
            .gateway
            .handle_command(conn.id, Request::new("getUserPermissions", vec![]))
            .await
            .unwrap();
        assert_eq!(acl["user"], json!("system.user.tester"));
    }

    #[tokio::test]
    async fn test_unknown_command_and_empty_pattern() {
        let fx = GatewayFixture::new(anonymous_config());
        let conn = fx.connect("10.0.0.1").await;

        let err = fx
            .gateway
            .handle_command(conn.id, Request::new("flyToMoon", vec![]))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::UnknownCommand("flyToMoon".to_owned()));

        let err = fx
            .gateway
            .handle_command(conn.id, Request::new("subscribe", vec![json!("")]))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::EmptyPattern);
        fx.settle().await;
        // the empty pattern never reached the backend
        assert!(fx
            .backend
            .calls()
            .iter()
            .all(|c| !c.starts_with("subscribe_states")));
    }
}
