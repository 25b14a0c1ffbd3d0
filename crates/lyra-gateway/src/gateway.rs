//! Connection gateway orchestration
//!
//! Owns the connection table and wires the collaborators together:
//! session manager for identity, ACL engine for capabilities, the
//! subscription registry for fan-out, and the threshold monitor for
//! flood protection. Each connection's commands are processed
//! sequentially by contract with the embedding host; different
//! connections proceed fully in parallel, and a slow connection's queue
//! never blocks delivery to the others.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use lyra_acl::merge_acl;
use lyra_core::{
    Acl, Command, ConnectionId, ConnectionIdAllocator, GatewayError, GatewayResult,
};
use lyra_registry::{EventKind, SubscriptionRegistry, UpstreamChange, UpstreamReceiver};
use lyra_session::{Credentials, SessionManager, SessionState};

use crate::backend::DataBackend;
use crate::config::GatewayConfig;
use crate::connection::{ConnState, Connection, ServerMessage};
use crate::threshold::{EventThresholdMonitor, ThresholdTransition};

/// Connect-time information supplied by the transport layer
#[derive(Clone, Debug, Default)]
pub struct Handshake {
    /// Remote client address
    pub address: String,
    /// Raw `Cookie:` header, if the transport saw one
    pub cookie: Option<String>,
    /// Explicit credentials from the handshake query
    pub credentials: Option<(String, String)>,
}

impl Handshake {
    pub fn anonymous(address: impl Into<String>) -> Self {
        Handshake {
            address: address.into(),
            ..Handshake::default()
        }
    }

    fn credentials(&self) -> Credentials {
        if let Some((user, pass)) = &self.credentials {
            Credentials::UserPass {
                user: user.clone(),
                pass: pass.clone(),
            }
        } else if let Some(cookie) = &self.cookie {
            Credentials::CookieHeader(cookie.clone())
        } else {
            Credentials::None
        }
    }
}

/// One inbound client request. The handler completes exactly once with
/// either an error or a result, never both.
#[derive(Clone, Debug)]
pub struct Request {
    /// Wire command name
    pub command: String,
    /// Positional arguments as they arrived on the wire
    pub args: Vec<Value>,
    /// Whether the client supplied a reply callback. Permission denials
    /// for callback-less requests surface as a dedicated event instead.
    pub expects_reply: bool,
}

impl Request {
    pub fn new(command: impl Into<String>, args: Vec<Value>) -> Self {
        Request {
            command: command.into(),
            args,
            expects_reply: true,
        }
    }

    pub fn fire_and_forget(command: impl Into<String>, args: Vec<Value>) -> Self {
        Request {
            expects_reply: false,
            ..Request::new(command, args)
        }
    }
}

/// Handle returned to the transport layer for one connection
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    /// Messages the gateway pushes to this client
    pub events: mpsc::Receiver<ServerMessage>,
}

struct Shared {
    backend: Arc<dyn DataBackend>,
    sessions: SessionManager,
    config: GatewayConfig,
    registry: SubscriptionRegistry,
    threshold: EventThresholdMonitor,
    conns: Mutex<HashMap<ConnectionId, Connection>>,
    ids: ConnectionIdAllocator,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// The connection gateway. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Gateway {
    shared: Arc<Shared>,
}

impl Gateway {
    /// Start the gateway: spawns the upstream subscription driver and the
    /// threshold sampling task.
    pub fn start(
        backend: Arc<dyn DataBackend>,
        sessions: SessionManager,
        config: GatewayConfig,
    ) -> Gateway {
        let (registry, upstream_rx) = SubscriptionRegistry::new();
        let threshold = EventThresholdMonitor::new(config.threshold.clone());
        let config = config.normalized();

        let gateway = Gateway {
            shared: Arc::new(Shared {
                backend,
                sessions,
                config,
                registry,
                threshold,
                conns: Mutex::new(HashMap::new()),
                ids: ConnectionIdAllocator::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        };

        let driver = tokio::spawn(run_upstream_driver(
            gateway.shared.clone(),
            upstream_rx,
        ));
        let sampler = tokio::spawn(run_threshold_sampler(gateway.clone()));
        gateway.shared.tasks.lock().extend([driver, sampler]);

        gateway
    }

    /// Accept a new connection: resolve its identity, compute its ACL,
    /// and register it. The returned handle carries the connection's
    /// outgoing message stream.
    pub async fn connect(&self, handshake: Handshake) -> GatewayResult<ConnectionHandle> {
        let shared = &self.shared;
        let id = shared.ids.allocate();
        let (tx, rx) = mpsc::channel(shared.config.out_queue_capacity);
        let mut conn = Connection::new(id, handshake.address.clone(), tx);
        conn.state = ConnState::Authenticating;

        let resolved = if shared.config.auth {
            match shared.sessions.resolve(&handshake.credentials()).await {
                Ok(resolved) => Some(resolved),
                Err(err) => {
                    warn!(address = %handshake.address, %err, "authentication failed");
                    let _ = conn.push(ServerMessage::Reauthenticate);
                    if !shared.config.no_disconnect {
                        return Err(err);
                    }
                    // compatibility mode for raw data channels: keep the
                    // connection open, it may only authenticate
                    conn.state = ConnState::PendingReauth;
                    shared.registry.register(id);
                    shared.conns.lock().insert(id, conn);
                    return Ok(ConnectionHandle { id, events: rx });
                }
            }
        } else {
            None
        };

        let (user, session_id, secure) = match resolved {
            Some(r) => (r.user, r.session_id, true),
            None => (shared.config.default_user.clone(), None, false),
        };

        let acl = match self.compute_acl(&user, &handshake.address).await {
            Ok(acl) => acl,
            Err(err) => {
                // no partial ACL: role lookup failure denies authentication
                warn!(user, %err, "permission calculation failed");
                let _ = conn.push(ServerMessage::Reauthenticate);
                return Err(err);
            }
        };

        conn.acl = acl;
        conn.session_id = session_id;
        conn.secure = secure;
        conn.state = ConnState::Active;
        info!(conn = %id, user = %conn.acl.user, address = %conn.address, "client connected");

        shared.registry.register(id);
        shared.conns.lock().insert(id, conn);
        Ok(ConnectionHandle { id, events: rx })
    }

    async fn compute_acl(&self, user: &str, address: &str) -> GatewayResult<Acl> {
        let role = self.shared.backend.calculate_permissions(user).await?;
        Ok(merge_acl(&role, address, self.shared.config.whitelist.as_ref()))
    }

    /// Process one inbound command. Error-first single completion: the
    /// result is exactly one of an error or a value.
    pub async fn handle_command(
        &self,
        conn: ConnectionId,
        request: Request,
    ) -> GatewayResult<Value> {
        let Some(command) = Command::parse(&request.command) else {
            warn!(command = %request.command, "no rule for command");
            return Err(GatewayError::UnknownCommand(request.command));
        };

        self.update_session(conn, command)?;
        self.check_permissions(conn, command, &request)?;
        self.dispatch(conn, command, request.args).await
    }

    /// Activity bookkeeping and TTL check before every command
    fn update_session(&self, conn: ConnectionId, command: Command) -> GatewayResult<()> {
        let expired = {
            let mut conns = self.shared.conns.lock();
            let c = conns
                .get_mut(&conn)
                .ok_or(GatewayError::UnknownConnection(conn))?;

            if c.state == ConnState::PendingReauth {
                // only re-login or logout leads out of pending-reauth
                if matches!(command, Command::Authenticate | Command::Logout) {
                    return Ok(());
                }
                return Err(GatewayError::SessionExpired);
            }

            if c.session_id.is_some() && c.session.expired(self.shared.sessions.ttl()) {
                c.state = ConnState::PendingReauth;
                let _ = c.push(ServerMessage::Reauthenticate);
                true
            } else {
                c.session.touch();
                false
            }
        };

        if expired {
            warn!(conn = %conn, "session ttl exceeded");
            if !self.shared.config.no_disconnect {
                self.disconnect(conn);
            }
            return Err(GatewayError::SessionExpired);
        }
        Ok(())
    }

    /// Enforce the static permission table. The administrative superuser
    /// passes unconditionally.
    fn check_permissions(
        &self,
        conn: ConnectionId,
        command: Command,
        request: &Request,
    ) -> GatewayResult<()> {
        let Some((resource, operation)) = command.permission() else {
            return Ok(());
        };

        let conns = self.shared.conns.lock();
        let c = conns
            .get(&conn)
            .ok_or(GatewayError::UnknownConnection(conn))?;
        if c.acl.allows(resource, operation) {
            return Ok(());
        }

        warn!(
            user = %c.acl.user,
            command = command.name(),
            %resource,
            %operation,
            "permission denied"
        );
        let arg = request
            .args
            .first()
            .and_then(Value::as_str)
            .map(str::to_owned);
        if !request.expects_reply {
            let _ = c.push(ServerMessage::PermissionError {
                command: command.name().to_owned(),
                resource,
                operation,
                arg: arg.clone(),
            });
        }
        Err(GatewayError::PermissionDenied {
            command: command.name().to_owned(),
            resource,
            operation,
            arg,
        })
    }

    async fn dispatch(
        &self,
        conn: ConnectionId,
        command: Command,
        args: Vec<Value>,
    ) -> GatewayResult<Value> {
        let shared = &self.shared;
        match command {
            Command::Authenticate => self.authenticate(conn, &args).await,

            Command::Name => {
                let name = arg_str(&args, 0, "name")?;
                let mut conns = shared.conns.lock();
                let c = conns
                    .get_mut(&conn)
                    .ok_or(GatewayError::UnknownConnection(conn))?;
                match &c.name {
                    None => debug!(conn = %conn, name, "connection named"),
                    Some(old) if *old != name => {
                        warn!(conn = %conn, old, new = name, "connection changed its name")
                    }
                    _ => {}
                }
                c.name = Some(name);
                Ok(Value::Null)
            }

            Command::GetObject => {
                let id = arg_str(&args, 0, "object id")?;
                let user = self.user_of(conn)?;
                let obj = shared.backend.get_object(&id, &user).await?;
                Ok(obj.unwrap_or(Value::Null))
            }

            Command::GetObjects => {
                let pattern = arg_opt_str(&args, 0).unwrap_or_else(|| "*".to_owned());
                let user = self.user_of(conn)?;
                shared.backend.get_objects(&pattern, &user).await
            }

            Command::SetObject => {
                let id = arg_str(&args, 0, "object id")?;
                let value = arg_value(&args, 1);
                let user = self.user_of(conn)?;
                shared.backend.set_object(&id, value, &user).await?;
                Ok(Value::Null)
            }

            Command::DelObject => {
                let id = arg_str(&args, 0, "object id")?;
                let user = self.user_of(conn)?;
                shared.backend.del_object(&id, &user).await?;
                Ok(Value::Null)
            }

            Command::SubscribeObjects => {
                self.subscribe_patterns(conn, EventKind::ObjectChange, &args, true)
            }
            Command::UnsubscribeObjects => {
                self.subscribe_patterns(conn, EventKind::ObjectChange, &args, false)
            }

            Command::GetState => {
                let id = arg_str(&args, 0, "state id")?;
                let user = self.user_of(conn)?;
                let state = shared.backend.get_state(&id, &user).await?;
                Ok(state.unwrap_or(Value::Null))
            }

            Command::GetStates => {
                let pattern = arg_opt_str(&args, 0).unwrap_or_else(|| "*".to_owned());
                let user = self.user_of(conn)?;
                shared.backend.get_states(&pattern, &user).await
            }

            Command::SetState => {
                let id = arg_str(&args, 0, "state id")?;
                let value = arg_value(&args, 1);
                // bare values arrive unwrapped from older clients
                let value = if value.is_object() {
                    value
                } else {
                    json!({ "val": value })
                };
                let user = self.user_of(conn)?;
                shared.backend.set_state(&id, value, &user).await?;
                Ok(Value::Null)
            }

            Command::DelState => {
                let id = arg_str(&args, 0, "state id")?;
                let user = self.user_of(conn)?;
                shared.backend.del_state(&id, &user).await?;
                Ok(Value::Null)
            }

            Command::Subscribe => {
                self.subscribe_patterns(conn, EventKind::StateChange, &args, true)
            }
            Command::Unsubscribe => {
                self.subscribe_patterns(conn, EventKind::StateChange, &args, false)
            }

            Command::SubscribeFiles => {
                let id = arg_str(&args, 0, "container id")?;
                let pattern = arg_opt_str(&args, 1).unwrap_or_else(|| "*".to_owned());
                shared
                    .registry
                    .subscribe_files(conn, &id, &pattern)
                    .map_err(|err| {
                        warn!(%err, id, pattern, "file subscribe dropped");
                        err
                    })?;
                Ok(Value::Null)
            }

            Command::UnsubscribeFiles => {
                let id = arg_str(&args, 0, "container id")?;
                let pattern = arg_opt_str(&args, 1).unwrap_or_else(|| "*".to_owned());
                shared.registry.unsubscribe_files(conn, &id, &pattern);
                Ok(Value::Null)
            }

            Command::RequireLog => {
                let enabled = arg_bool(&args, 0, "enabled")?;
                shared.registry.require_log(conn, enabled);
                Ok(Value::Null)
            }

            Command::SendTo => {
                let instance = arg_str(&args, 0, "instance")?;
                let cmd = arg_str(&args, 1, "command")?;
                let message = arg_value(&args, 2);
                shared.backend.send_to(&instance, &cmd, message).await
            }

            Command::GetVersion => Ok(json!({
                "version": shared.config.version,
                "name": shared.config.name,
            })),

            Command::ListPermissions => {
                let mut map = serde_json::Map::new();
                for cmd in Command::ALL {
                    let entry = match cmd.permission() {
                        Some((resource, operation)) => json!({
                            "type": resource.to_string(),
                            "operation": operation.to_string(),
                        }),
                        None => json!({ "type": "", "operation": "" }),
                    };
                    map.insert(cmd.name().to_owned(), entry);
                }
                Ok(Value::Object(map))
            }

            Command::GetUserPermissions => {
                let conns = shared.conns.lock();
                let c = conns
                    .get(&conn)
                    .ok_or(GatewayError::UnknownConnection(conn))?;
                serde_json::to_value(&c.acl)
                    .map_err(|err| GatewayError::InvalidArgument(err.to_string()))
            }

            Command::Logout => {
                let sid = {
                    let conns = shared.conns.lock();
                    conns
                        .get(&conn)
                        .ok_or(GatewayError::UnknownConnection(conn))?
                        .session_id
                        .clone()
                };
                if let Some(sid) = sid {
                    shared.sessions.destroy(&sid).await?;
                }
                let mut conns = shared.conns.lock();
                if let Some(c) = conns.get_mut(&conn) {
                    c.state = ConnState::PendingReauth;
                    let _ = c.push(ServerMessage::Reauthenticate);
                }
                Ok(Value::Null)
            }
        }
    }

    async fn authenticate(&self, conn: ConnectionId, args: &[Value]) -> GatewayResult<Value> {
        let shared = &self.shared;
        let (state, secure, address) = {
            let conns = shared.conns.lock();
            let c = conns
                .get(&conn)
                .ok_or(GatewayError::UnknownConnection(conn))?;
            (c.state, c.secure, c.address.clone())
        };

        if state == ConnState::Active {
            return Ok(json!({ "authenticated": true, "secure": secure }));
        }

        let (Some(user), Some(pass)) = (arg_opt_str(args, 0), arg_opt_str(args, 1)) else {
            return Err(GatewayError::AuthenticationFailed(
                "credentials required".to_owned(),
            ));
        };

        let resolved = shared
            .sessions
            .resolve(&Credentials::UserPass { user, pass })
            .await?;
        let acl = self.compute_acl(&resolved.user, &address).await?;

        let mut conns = shared.conns.lock();
        let c = conns
            .get_mut(&conn)
            .ok_or(GatewayError::UnknownConnection(conn))?;
        c.acl = acl;
        c.session_id = resolved.session_id;
        c.session = SessionState::new();
        c.secure = true;
        c.state = ConnState::Active;
        info!(conn = %conn, user = %c.acl.user, "re-authenticated");
        Ok(json!({ "authenticated": true, "secure": true }))
    }

    fn subscribe_patterns(
        &self,
        conn: ConnectionId,
        kind: EventKind,
        args: &[Value],
        subscribe: bool,
    ) -> GatewayResult<Value> {
        for pattern in arg_patterns(args, 0)? {
            if subscribe {
                self.shared
                    .registry
                    .subscribe(conn, kind, &pattern)
                    .map_err(|err| {
                        warn!(%err, pattern, "subscribe dropped");
                        err
                    })?;
            } else {
                self.shared.registry.unsubscribe(conn, kind, &pattern);
            }
        }
        Ok(Value::Null)
    }

    fn user_of(&self, conn: ConnectionId) -> GatewayResult<String> {
        let conns = self.shared.conns.lock();
        conns
            .get(&conn)
            .map(|c| c.acl.user.clone())
            .ok_or(GatewayError::UnknownConnection(conn))
    }

    /// Fan out a backend change event to every matching connection
    pub async fn publish(&self, kind: EventKind, id: &str, payload: Value) {
        debug_assert!(kind != EventKind::FileChange, "use publish_file");
        if kind == EventKind::StateChange {
            self.shared.threshold.record_event();
        }
        for conn in self.shared.registry.publish(kind, id) {
            self.deliver(
                conn,
                ServerMessage::Event {
                    kind,
                    id: id.to_owned(),
                    payload: payload.clone(),
                },
            )
            .await;
        }
    }

    /// Fan out a file change (container id and file name both matched)
    pub async fn publish_file(&self, id: &str, name: &str, payload: Value) {
        for conn in self.shared.registry.publish_file(id, name) {
            self.deliver(
                conn,
                ServerMessage::FileEvent {
                    id: id.to_owned(),
                    name: name.to_owned(),
                    payload: payload.clone(),
                },
            )
            .await;
        }
    }

    /// Fan out a log line to every log subscriber
    pub async fn publish_log(&self, payload: Value) {
        for conn in self.shared.registry.publish(EventKind::Log, "log") {
            self.deliver(
                conn,
                ServerMessage::Event {
                    kind: EventKind::Log,
                    id: "log".to_owned(),
                    payload: payload.clone(),
                },
            )
            .await;
        }
    }

    /// Deliver one message: touch the session, renew it if stale, and
    /// drop the delivery if the session proves expired.
    async fn deliver(&self, conn: ConnectionId, message: ServerMessage) {
        let shared = &self.shared;

        let renew = {
            let mut conns = shared.conns.lock();
            let Some(c) = conns.get_mut(&conn) else {
                return;
            };
            if c.state != ConnState::Active {
                // pending reauth: dropped, not re-queued
                return;
            }
            c.session.touch();
            c.session_id.clone().map(|sid| (sid, c.session.clone()))
        };

        if let Some((sid, mut session)) = renew {
            match shared.sessions.renew_if_stale(&mut session, &sid).await {
                Ok(_) => {
                    let mut conns = shared.conns.lock();
                    if let Some(c) = conns.get_mut(&conn) {
                        c.session = session;
                    }
                }
                Err(err) => {
                    warn!(conn = %conn, %err, "session expired, dropping delivery");
                    let mut conns = shared.conns.lock();
                    if let Some(c) = conns.get_mut(&conn) {
                        c.state = ConnState::PendingReauth;
                        let _ = c.push(ServerMessage::Reauthenticate);
                    }
                    return;
                }
            }
        }

        let overflowed = {
            let conns = shared.conns.lock();
            match conns.get(&conn) {
                Some(c) => c.push(message).is_err(),
                None => false,
            }
        };
        if overflowed {
            warn!(conn = %conn, "outgoing queue overflow, disconnecting");
            self.disconnect(conn);
        }
    }

    /// Tear down one connection: release every subscription it holds and
    /// drop it. Closing the connection's sender ends its handle stream.
    pub fn disconnect(&self, conn: ConnectionId) {
        let Some(c) = self.shared.conns.lock().remove(&conn) else {
            return;
        };
        self.shared.registry.unsubscribe_all(conn);
        info!(
            conn = %conn,
            user = %c.acl.user,
            address = %c.address,
            name = c.name.as_deref().unwrap_or(""),
            "client disconnected"
        );
    }

    /// Manually force the event threshold (admin surface)
    pub fn set_event_threshold(&self, active: bool) {
        if let Some(transition) = self.shared.threshold.force(active) {
            self.apply_threshold(transition);
        }
    }

    fn apply_threshold(&self, transition: ThresholdTransition) {
        match transition {
            ThresholdTransition::Activated => {
                self.broadcast(ServerMessage::EventsThreshold(true));
                self.shared
                    .registry
                    .enter_degraded(&self.shared.threshold.config().coarse_pattern);
            }
            ThresholdTransition::Deactivated => {
                self.broadcast(ServerMessage::EventsThreshold(false));
                self.shared.registry.leave_degraded();
            }
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        let conns = self.shared.conns.lock();
        for c in conns.values() {
            let _ = c.push(message.clone());
        }
    }

    pub fn connection_count(&self) -> usize {
        self.shared.conns.lock().len()
    }

    /// Display names of the connected clients (`info.connected` surface)
    pub fn connected_names(&self) -> Vec<String> {
        self.shared
            .conns
            .lock()
            .values()
            .map(|c| c.name.clone().unwrap_or_else(|| "noname".to_owned()))
            .collect()
    }

    /// Tear down the gateway: stops the sampler and driver tasks and
    /// drops every connection.
    pub async fn close(&self) {
        for task in self.shared.tasks.lock().drain(..) {
            task.abort();
        }
        let ids: Vec<ConnectionId> = self.shared.conns.lock().keys().copied().collect();
        for id in ids {
            self.disconnect(id);
        }
    }
}

async fn run_upstream_driver(shared: Arc<Shared>, mut rx: UpstreamReceiver) {
    while let Some(change) = rx.recv().await {
        let result = match &change {
            UpstreamChange::Subscribe { kind, pattern } => match kind {
                EventKind::StateChange => shared.backend.subscribe_states(pattern).await,
                EventKind::ObjectChange => shared.backend.subscribe_objects(pattern).await,
                EventKind::FileChange => shared.backend.subscribe_files(pattern).await,
                EventKind::Log => Ok(()),
            },
            UpstreamChange::Unsubscribe { kind, pattern } => match kind {
                EventKind::StateChange => shared.backend.unsubscribe_states(pattern).await,
                EventKind::ObjectChange => shared.backend.unsubscribe_objects(pattern).await,
                EventKind::FileChange => shared.backend.unsubscribe_files(pattern).await,
                EventKind::Log => Ok(()),
            },
            UpstreamChange::SetLogStreaming(enabled) => {
                shared.backend.set_log_streaming(*enabled).await
            }
        };
        if let Err(err) = result {
            warn!(?change, %err, "upstream subscription change failed");
        }
    }
}

async fn run_threshold_sampler(gateway: Gateway) {
    let mut interval = tokio::time::interval(gateway.shared.threshold.config().check_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if let Some(transition) = gateway.shared.threshold.tick() {
            gateway.apply_threshold(transition);
        }
    }
}

fn arg_str(args: &[Value], idx: usize, what: &str) -> GatewayResult<String> {
    args.get(idx)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| GatewayError::InvalidArgument(format!("{what} must be a string")))
}

fn arg_opt_str(args: &[Value], idx: usize) -> Option<String> {
    args.get(idx).and_then(Value::as_str).map(str::to_owned)
}

fn arg_bool(args: &[Value], idx: usize, what: &str) -> GatewayResult<bool> {
    args.get(idx)
        .and_then(Value::as_bool)
        .ok_or_else(|| GatewayError::InvalidArgument(format!("{what} must be a boolean")))
}

fn arg_value(args: &[Value], idx: usize) -> Value {
    args.get(idx).cloned().unwrap_or(Value::Null)
}

/// A subscribe argument is a single pattern or an array of patterns
fn arg_patterns(args: &[Value], idx: usize) -> GatewayResult<Vec<String>> {
    match args.get(idx) {
        Some(Value::String(pattern)) => Ok(vec![pattern.clone()]),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| GatewayError::InvalidArgument("pattern must be a string".into()))
            })
            .collect(),
        _ => Err(GatewayError::InvalidArgument(
            "pattern must be a string or an array of strings".into(),
        )),
    }
}
