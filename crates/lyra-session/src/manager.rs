//! Session manager
//!
//! Resolves a connection's identity from explicit credentials or a signed
//! session cookie, and keeps the backing session record alive with a
//! rate-limited renewal. The throttle matters: every matched publish
//! touches the session, and an unthrottled renewal would turn each event
//! into a session-store write.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use lyra_core::{canonical_user, GatewayError, GatewayResult};

use crate::cookie;
use crate::store::{PasswordVerifier, SessionStore};

/// Session manager configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Shared secret the session cookies are signed with
    pub secret: String,
    /// Session time-to-live, written back on every renewal
    pub ttl: Duration,
    /// Minimum interval between two session-store writes per connection
    pub renew_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            secret: String::new(),
            ttl: Duration::from_secs(3600),
            renew_interval: Duration::from_secs(60),
        }
    }
}

/// Credentials presented at connect time
#[derive(Clone, Debug)]
pub enum Credentials {
    /// Explicit username/password from the handshake query
    UserPass { user: String, pass: String },
    /// Raw `Cookie:` header carrying a signed session cookie
    CookieHeader(String),
    /// Nothing presented
    None,
}

/// Successfully resolved identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Canonical `system.user.` identity
    pub user: String,
    /// Session id, present only for cookie-authenticated connections
    pub session_id: Option<String>,
}

/// Outcome of a renewal attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Renewal {
    /// The record's expiry was extended
    Extended,
    /// Within the minimum interval, no store I/O happened
    Throttled,
    /// The store failed transiently; tolerated until the next cycle
    Tolerated,
}

/// Per-connection session bookkeeping, owned by the gateway's connection
/// record rather than the transport object.
#[derive(Clone, Debug)]
pub struct SessionState {
    last_activity: Instant,
    last_renewal: Option<Instant>,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState {
            last_activity: Instant::now(),
            last_renewal: None,
        }
    }

    /// Record activity now. Deliberately explicit - callers touch on
    /// delivery and command handling, not on every internal event.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Whether the connection has been idle past its time-to-live
    pub fn expired(&self, ttl: Duration) -> bool {
        self.last_activity.elapsed() > ttl
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::new()
    }
}

/// The session manager
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    verifier: Arc<dyn PasswordVerifier>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        verifier: Arc<dyn PasswordVerifier>,
        config: SessionConfig,
    ) -> Self {
        SessionManager {
            store,
            verifier,
            config,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Resolve an identity. Explicit credentials take precedence over the
    /// session cookie; failure of both is an authentication error, not a
    /// partial identity.
    pub async fn resolve(&self, credentials: &Credentials) -> GatewayResult<ResolvedIdentity> {
        match credentials {
            Credentials::UserPass { user, pass } => {
                if self.verifier.check_password(user, pass).await? {
                    debug!(user, "logged in with credentials");
                    Ok(ResolvedIdentity {
                        user: canonical_user(user),
                        session_id: None,
                    })
                } else {
                    warn!(user, "invalid password or user name");
                    Err(GatewayError::AuthenticationFailed(format!(
                        "invalid password or user name: {user}"
                    )))
                }
            }
            Credentials::CookieHeader(header) => {
                let Some(sid) = cookie::session_id_from_header(header, &self.config.secret) else {
                    return Err(GatewayError::AuthenticationFailed(
                        "no user found in cookies".to_owned(),
                    ));
                };
                match self.store.get(&sid).await? {
                    Some(record) => match record.user {
                        Some(user) => Ok(ResolvedIdentity {
                            user: canonical_user(&user),
                            session_id: Some(sid),
                        }),
                        None => Err(GatewayError::AuthenticationFailed(
                            "session carries no user".to_owned(),
                        )),
                    },
                    None => Err(GatewayError::AuthenticationFailed(
                        "unknown session".to_owned(),
                    )),
                }
            }
            Credentials::None => Err(GatewayError::AuthenticationFailed(
                "cannot detect user".to_owned(),
            )),
        }
    }

    /// Destroy the backing session record (logout)
    pub async fn destroy(&self, sid: &str) -> GatewayResult<()> {
        self.store.destroy(sid).await
    }

    /// Renew the session record unless a renewal happened within the
    /// minimum interval. A vanished or userless record means the session
    /// expired; a transient store failure is tolerated for this cycle.
    pub async fn renew_if_stale(
        &self,
        state: &mut SessionState,
        sid: &str,
    ) -> GatewayResult<Renewal> {
        if let Some(last) = state.last_renewal {
            if last.elapsed() < self.config.renew_interval {
                return Ok(Renewal::Throttled);
            }
        }
        // advance the clock before the I/O so a failing store is retried
        // after a full interval, not on every event
        state.last_renewal = Some(Instant::now());

        let record = match self.store.get(sid).await {
            Ok(record) => record,
            Err(err) => {
                warn!(sid, %err, "session store read failed, keeping session for one cycle");
                return Ok(Renewal::Tolerated);
            }
        };

        match record {
            Some(record) if record.user.is_some() => {
                match self.store.set(sid, self.config.ttl, record).await {
                    Ok(()) => Ok(Renewal::Extended),
                    Err(err) => {
                        warn!(sid, %err, "session renewal write failed, tolerated");
                        Ok(Renewal::Tolerated)
                    }
                }
            }
            _ => Err(GatewayError::SessionExpired),
        }
    }
}
