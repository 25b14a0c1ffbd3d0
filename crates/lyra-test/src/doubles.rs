//! Test doubles for the gateway's external contracts
//!
//! In-memory implementations of the data backend, session store, and
//! password verifier. The backend records every upstream call so tests
//! can assert on the subscription traffic the gateway produces, not
//! just on what the clients observe.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use lyra_core::{Acl, GatewayError, GatewayResult, Pattern};
use lyra_gateway::DataBackend;
use lyra_session::{PasswordVerifier, SessionRecord, SessionStore};

/// In-memory backend with upstream call recording
#[derive(Default)]
pub struct MockBackend {
    objects: Mutex<HashMap<String, Value>>,
    states: Mutex<HashMap<String, Value>>,
    acls: Mutex<HashMap<String, Acl>>,
    calls: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend::default()
    }

    pub fn put_object(&self, id: &str, value: Value) {
        self.objects.lock().insert(id.to_owned(), value);
    }

    pub fn put_state(&self, id: &str, value: Value) {
        self.states.lock().insert(id.to_owned(), value);
    }

    /// Role grant returned for `user`; unknown users get a full grant
    pub fn set_acl(&self, user: &str, acl: Acl) {
        self.acls.lock().insert(user.to_owned(), acl);
    }

    /// Make every backend call fail until cleared
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock() = failing;
    }

    /// Every recorded call, oldest first, formatted `"name args"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// How many recorded calls equal `call` exactly
    pub fn call_count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: String) -> GatewayResult<()> {
        self.calls.lock().push(call);
        if *self.fail.lock() {
            return Err(GatewayError::BackendUnavailable("mock failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DataBackend for MockBackend {
    async fn subscribe_states(&self, pattern: &str) -> GatewayResult<()> {
        self.record(format!("subscribe_states {pattern}"))
    }

    async fn unsubscribe_states(&self, pattern: &str) -> GatewayResult<()> {
        self.record(format!("unsubscribe_states {pattern}"))
    }

    async fn subscribe_objects(&self, pattern: &str) -> GatewayResult<()> {
        self.record(format!("subscribe_objects {pattern}"))
    }

    async fn unsubscribe_objects(&self, pattern: &str) -> GatewayResult<()> {
        self.record(format!("unsubscribe_objects {pattern}"))
    }

    async fn subscribe_files(&self, pattern: &str) -> GatewayResult<()> {
        self.record(format!("subscribe_files {pattern}"))
    }

    async fn unsubscribe_files(&self, pattern: &str) -> GatewayResult<()> {
        self.record(format!("unsubscribe_files {pattern}"))
    }

    async fn set_log_streaming(&self, enabled: bool) -> GatewayResult<()> {
        self.record(format!("set_log_streaming {enabled}"))
    }

    async fn get_object(&self, id: &str, user: &str) -> GatewayResult<Option<Value>> {
        self.record(format!("get_object {id} {user}"))?;
        Ok(self.objects.lock().get(id).cloned())
    }

    async fn set_object(&self, id: &str, value: Value, user: &str) -> GatewayResult<()> {
        self.record(format!("set_object {id} {user}"))?;
        self.objects.lock().insert(id.to_owned(), value);
        Ok(())
    }

    async fn del_object(&self, id: &str, user: &str) -> GatewayResult<()> {
        self.record(format!("del_object {id} {user}"))?;
        self.objects.lock().remove(id);
        Ok(())
    }

    async fn get_objects(&self, pattern: &str, user: &str) -> GatewayResult<Value> {
        self.record(format!("get_objects {pattern} {user}"))?;
        let matcher = Pattern::compile(pattern)?;
        let objects = self.objects.lock();
        let map = objects
            .iter()
            .filter(|(id, _)| matcher.matches(id))
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect();
        Ok(Value::Object(map))
    }

    async fn get_state(&self, id: &str, user: &str) -> GatewayResult<Option<Value>> {
        self.record(format!("get_state {id} {user}"))?;
        Ok(self.states.lock().get(id).cloned())
    }

    async fn set_state(&self, id: &str, value: Value, user: &str) -> GatewayResult<()> {
        self.record(format!("set_state {id} {user}"))?;
        self.states.lock().insert(id.to_owned(), value);
        Ok(())
    }

    async fn del_state(&self, id: &str, user: &str) -> GatewayResult<()> {
        self.record(format!("del_state {id} {user}"))?;
        self.states.lock().remove(id);
        Ok(())
    }

    async fn get_states(&self, pattern: &str, user: &str) -> GatewayResult<Value> {
        self.record(format!("get_states {pattern} {user}"))?;
        let matcher = Pattern::compile(pattern)?;
        let states = self.states.lock();
        let map = states
            .iter()
            .filter(|(id, _)| matcher.matches(id))
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect();
        Ok(Value::Object(map))
    }

    async fn send_to(
        &self,
        instance: &str,
        command: &str,
        message: Value,
    ) -> GatewayResult<Value> {
        self.record(format!("send_to {instance} {command}"))?;
        Ok(json!({ "instance": instance, "command": command, "message": message }))
    }

    async fn calculate_permissions(&self, user: &str) -> GatewayResult<Acl> {
        self.record(format!("calculate_permissions {user}"))?;
        Ok(self
            .acls
            .lock()
            .get(user)
            .cloned()
            .unwrap_or_else(|| Acl::superuser(user)))
    }
}

/// In-memory session store with a write counter
#[derive(Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<String, SessionRecord>>,
    writes: Mutex<u32>,
    fail: Mutex<bool>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        MemorySessionStore::default()
    }

    pub fn insert(&self, sid: &str, record: SessionRecord) {
        self.records.lock().insert(sid.to_owned(), record);
    }

    pub fn remove(&self, sid: &str) {
        self.records.lock().remove(sid);
    }

    pub fn contains(&self, sid: &str) -> bool {
        self.records.lock().contains_key(sid)
    }

    pub fn write_count(&self) -> u32 {
        *self.writes.lock()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock() = failing;
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, sid: &str) -> GatewayResult<Option<SessionRecord>> {
        if *self.fail.lock() {
            return Err(GatewayError::BackendUnavailable("store down".into()));
        }
        Ok(self.records.lock().get(sid).cloned())
    }

    async fn set(&self, sid: &str, _ttl: Duration, record: SessionRecord) -> GatewayResult<()> {
        if *self.fail.lock() {
            return Err(GatewayError::BackendUnavailable("store down".into()));
        }
        *self.writes.lock() += 1;
        self.records.lock().insert(sid.to_owned(), record);
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> GatewayResult<()> {
        self.records.lock().remove(sid);
        Ok(())
    }
}

/// Fixed user/password table
#[derive(Default)]
pub struct StaticPasswordVerifier {
    users: HashMap<String, String>,
}

impl StaticPasswordVerifier {
    pub fn new() -> Self {
        StaticPasswordVerifier::default()
    }

    pub fn with_user(mut self, user: &str, pass: &str) -> Self {
        self.users.insert(user.to_owned(), pass.to_owned());
        self
    }
}

#[async_trait]
impl PasswordVerifier for StaticPasswordVerifier {
    async fn check_password(&self, user: &str, pass: &str) -> GatewayResult<bool> {
        Ok(self.users.get(user).map(String::as_str) == Some(pass))
    }
}
