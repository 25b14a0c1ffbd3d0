//! Refcounted subscription registry
//!
//! The registry is an explicitly owned object guarded by one lock, never
//! ambient global state. Concurrent subscribe/unsubscribe/publish from
//! different connections is the common case; every refcount mutation
//! happens under the lock, and upstream actions are emitted inside the
//! same critical section so 0<->1 crossings map to exactly one upstream
//! call each.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use lyra_core::{ConnectionId, GatewayResult, Pattern};

/// Event streams a connection can subscribe to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    StateChange,
    ObjectChange,
    FileChange,
    Log,
}

impl EventKind {
    /// Wire name of the change event
    pub fn name(self) -> &'static str {
        match self {
            EventKind::StateChange => "stateChange",
            EventKind::ObjectChange => "objectChange",
            EventKind::FileChange => "fileChange",
            EventKind::Log => "log",
        }
    }
}

/// Upstream action to apply to the backend store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamChange {
    Subscribe { kind: EventKind, pattern: String },
    Unsubscribe { kind: EventKind, pattern: String },
    SetLogStreaming(bool),
}

/// Channel the registry emits upstream actions on
pub type UpstreamSender = mpsc::UnboundedSender<UpstreamChange>;
pub type UpstreamReceiver = mpsc::UnboundedReceiver<UpstreamChange>;

/// Log subscriptions have no meaningful pattern; a fixed placeholder
/// keys their refcounting.
const LOG_PATTERN: &str = "*";

/// A file subscription: container identifier pattern plus per-file pattern
#[derive(Clone, Debug)]
struct FileSub {
    id: Pattern,
    file: Pattern,
}

#[derive(Debug, Default)]
struct ConnSubs {
    state: Vec<Pattern>,
    object: Vec<Pattern>,
    log: Vec<Pattern>,
    files: Vec<FileSub>,
}

impl ConnSubs {
    fn list(&self, kind: EventKind) -> &Vec<Pattern> {
        match kind {
            EventKind::StateChange => &self.state,
            EventKind::ObjectChange => &self.object,
            EventKind::Log => &self.log,
            EventKind::FileChange => unreachable!("file subscriptions are kept separately"),
        }
    }

    fn list_mut(&mut self, kind: EventKind) -> &mut Vec<Pattern> {
        match kind {
            EventKind::StateChange => &mut self.state,
            EventKind::ObjectChange => &mut self.object,
            EventKind::Log => &mut self.log,
            EventKind::FileChange => unreachable!("file subscriptions are kept separately"),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Global refcounts per (event kind, pattern)
    counts: HashMap<(EventKind, String), usize>,
    /// Per-connection subscription lists, in registration order
    conns: HashMap<ConnectionId, ConnSubs>,
    /// Coarse pattern standing in for state subscriptions while degraded
    degraded: Option<String>,
}

/// The subscription registry
pub struct SubscriptionRegistry {
    inner: Mutex<Inner>,
    upstream: UpstreamSender,
}

impl SubscriptionRegistry {
    /// Create a registry together with the receiving end of its upstream
    /// action stream.
    pub fn new() -> (Self, UpstreamReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            SubscriptionRegistry {
                inner: Mutex::new(Inner::default()),
                upstream: tx,
            },
            rx,
        )
    }

    /// Register a connection. Subscribing also registers implicitly; this
    /// exists so `publish` sees connections that never subscribed.
    pub fn register(&self, conn: ConnectionId) {
        self.inner.lock().conns.entry(conn).or_default();
    }

    /// Add a pattern subscription for a connection. Idempotent per
    /// (connection, kind, pattern).
    pub fn subscribe(&self, conn: ConnectionId, kind: EventKind, pattern: &str) -> GatewayResult<()> {
        debug_assert!(kind != EventKind::FileChange, "use subscribe_files");
        let compiled = Pattern::compile(pattern)?;

        let mut inner = self.inner.lock();
        let subs = inner.conns.entry(conn).or_default();
        let list = subs.list_mut(kind);
        if list.iter().any(|p| p.as_str() == pattern) {
            return Ok(());
        }
        list.push(compiled);
        self.bump(&mut inner, kind, pattern);
        Ok(())
    }

    /// Remove a pattern subscription. Unknown patterns are a no-op.
    pub fn unsubscribe(&self, conn: ConnectionId, kind: EventKind, pattern: &str) {
        debug_assert!(kind != EventKind::FileChange, "use unsubscribe_files");
        let mut inner = self.inner.lock();
        let Some(subs) = inner.conns.get_mut(&conn) else {
            return;
        };
        let list = subs.list_mut(kind);
        let Some(pos) = list.iter().position(|p| p.as_str() == pattern) else {
            return;
        };
        list.remove(pos);
        self.drop_count(&mut inner, kind, pattern);
    }

    /// Add a file subscription. The upstream unit is the container id
    /// pattern; the per-file pattern only filters delivery.
    pub fn subscribe_files(
        &self,
        conn: ConnectionId,
        id_pattern: &str,
        file_pattern: &str,
    ) -> GatewayResult<()> {
        let id = Pattern::compile(id_pattern)?;
        let file = Pattern::compile(file_pattern)?;

        let mut inner = self.inner.lock();
        let subs = inner.conns.entry(conn).or_default();
        if subs
            .files
            .iter()
            .any(|s| s.id.as_str() == id_pattern && s.file.as_str() == file_pattern)
        {
            return Ok(());
        }
        subs.files.push(FileSub { id, file });
        self.bump(&mut inner, EventKind::FileChange, id_pattern);
        Ok(())
    }

    pub fn unsubscribe_files(&self, conn: ConnectionId, id_pattern: &str, file_pattern: &str) {
        let mut inner = self.inner.lock();
        let Some(subs) = inner.conns.get_mut(&conn) else {
            return;
        };
        let Some(pos) = subs
            .files
            .iter()
            .position(|s| s.id.as_str() == id_pattern && s.file.as_str() == file_pattern)
        else {
            return;
        };
        subs.files.remove(pos);
        self.drop_count(&mut inner, EventKind::FileChange, id_pattern);
    }

    /// Enable or disable log streaming for a connection. The upstream call
    /// fires on the 0<->1 crossing of the total log subscriber count.
    pub fn require_log(&self, conn: ConnectionId, enabled: bool) {
        if enabled {
            // LOG_PATTERN is never empty, compile cannot fail
            let _ = self.subscribe(conn, EventKind::Log, LOG_PATTERN);
        } else {
            self.unsubscribe(conn, EventKind::Log, LOG_PATTERN);
        }
    }

    /// Release everything a connection holds. Called exactly once, at
    /// disconnect.
    pub fn unsubscribe_all(&self, conn: ConnectionId) {
        let mut inner = self.inner.lock();
        let Some(subs) = inner.conns.remove(&conn) else {
            return;
        };
        for kind in [EventKind::StateChange, EventKind::ObjectChange, EventKind::Log] {
            for pattern in subs.list(kind).clone() {
                self.drop_count(&mut inner, kind, pattern.as_str());
            }
        }
        for sub in &subs.files {
            self.drop_count(&mut inner, EventKind::FileChange, sub.id.as_str());
        }
    }

    /// Match an inbound change against every live connection. Matchers are
    /// tested in registration order per connection, stopping at the first
    /// hit - at most one dispatch per connection per event.
    pub fn publish(&self, kind: EventKind, id: &str) -> Vec<ConnectionId> {
        debug_assert!(kind != EventKind::FileChange, "use publish_file");
        let inner = self.inner.lock();
        let mut matched: Vec<ConnectionId> = inner
            .conns
            .iter()
            .filter(|(_, subs)| subs.list(kind).iter().any(|p| p.matches(id)))
            .map(|(conn, _)| *conn)
            .collect();
        matched.sort_unstable();
        matched
    }

    /// Match a file change: both the container pattern and the per-file
    /// pattern must match before delivery.
    pub fn publish_file(&self, id: &str, name: &str) -> Vec<ConnectionId> {
        let inner = self.inner.lock();
        let mut matched: Vec<ConnectionId> = inner
            .conns
            .iter()
            .filter(|(_, subs)| {
                subs.files
                    .iter()
                    .any(|s| s.id.matches(id) && s.file.matches(name))
            })
            .map(|(conn, _)| *conn)
            .collect();
        matched.sort_unstable();
        matched
    }

    /// Swap the upstream state subscription set for a single coarse
    /// pattern. Per-connection membership and refcounts stay untouched so
    /// `leave_degraded` restores the exact previous set. Idempotent.
    pub fn enter_degraded(&self, coarse: &str) {
        let mut inner = self.inner.lock();
        if inner.degraded.is_some() {
            return;
        }
        for pattern in live_state_patterns(&inner) {
            self.emit(UpstreamChange::Unsubscribe {
                kind: EventKind::StateChange,
                pattern,
            });
        }
        self.emit(UpstreamChange::Subscribe {
            kind: EventKind::StateChange,
            pattern: coarse.to_owned(),
        });
        inner.degraded = Some(coarse.to_owned());
        debug!(coarse, "state subscriptions coarsened");
    }

    /// Restore the upstream state subscriptions recorded before
    /// coarsening. Idempotent.
    pub fn leave_degraded(&self) {
        let mut inner = self.inner.lock();
        let Some(coarse) = inner.degraded.take() else {
            return;
        };
        for pattern in live_state_patterns(&inner) {
            self.emit(UpstreamChange::Subscribe {
                kind: EventKind::StateChange,
                pattern,
            });
        }
        self.emit(UpstreamChange::Unsubscribe {
            kind: EventKind::StateChange,
            pattern: coarse,
        });
        debug!("state subscriptions restored");
    }

    /// Current refcount of a pattern
    pub fn refcount(&self, kind: EventKind, pattern: &str) -> usize {
        self.inner
            .lock()
            .counts
            .get(&(kind, pattern.to_owned()))
            .copied()
            .unwrap_or(0)
    }

    /// Number of registered connections
    pub fn connection_count(&self) -> usize {
        self.inner.lock().conns.len()
    }

    fn bump(&self, inner: &mut Inner, kind: EventKind, pattern: &str) {
        let count = inner.counts.entry((kind, pattern.to_owned())).or_insert(0);
        *count += 1;
        if *count == 1 && !(kind == EventKind::StateChange && inner.degraded.is_some()) {
            self.emit(upstream_on(kind, pattern));
        }
    }

    fn drop_count(&self, inner: &mut Inner, kind: EventKind, pattern: &str) {
        let key = (kind, pattern.to_owned());
        let Some(count) = inner.counts.get_mut(&key) else {
            debug_assert!(false, "refcount underflow for {kind:?} {pattern}");
            warn!(?kind, pattern, "refcount underflow");
            return;
        };
        *count -= 1;
        if *count == 0 {
            inner.counts.remove(&key);
            if !(kind == EventKind::StateChange && inner.degraded.is_some()) {
                self.emit(upstream_off(kind, pattern));
            }
        }
    }

    fn emit(&self, change: UpstreamChange) {
        // receiver dropped means the gateway is shutting down
        let _ = self.upstream.send(change);
    }
}

fn live_state_patterns(inner: &Inner) -> Vec<String> {
    inner
        .counts
        .keys()
        .filter(|(kind, _)| *kind == EventKind::StateChange)
        .map(|(_, pattern)| pattern.clone())
        .collect()
}

fn upstream_on(kind: EventKind, pattern: &str) -> UpstreamChange {
    match kind {
        EventKind::Log => UpstreamChange::SetLogStreaming(true),
        _ => UpstreamChange::Subscribe {
            kind,
            pattern: pattern.to_owned(),
        },
    }
}

fn upstream_off(kind: EventKind, pattern: &str) -> UpstreamChange {
    match kind {
        EventKind::Log => UpstreamChange::SetLogStreaming(false),
        _ => UpstreamChange::Unsubscribe {
            kind,
            pattern: pattern.to_owned(),
        },
    }
}
