#![allow(dead_code)]

//! Shared test support: a scripted in-memory entity manager and a small
//! counter entity type driven through the public API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use entitylink::{
    BusyRetryPolicy, ClientEntityManager, EntityClientService, EntityConnection, EntityDescriptor,
    EntityEndpoint, EntityError, EntityFailure, EntityIdentity, InvokeCompletion, ManagerFault,
    MessageCodec, Result,
};

/// Operation selector for scripting stub behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Fetch,
    Create,
    Reconfigure,
    Destroy,
}

/// One scripted response, consumed before the stub's normal semantics run.
#[derive(Debug, Clone)]
pub enum Script {
    /// Report this wire failure.
    Fail(EntityFailure),
    /// Report a transport-layer fault.
    Transport(String),
    /// Abandon the caller's wait without delivering a result.
    AbandonWait,
    /// Settle successfully with this payload, bypassing the entity map.
    Respond(Vec<u8>),
}

#[derive(Default)]
struct ClusterState {
    entities: HashMap<EntityIdentity, StoredEntity>,
    permanent: HashSet<EntityIdentity>,
    referenced: HashSet<EntityIdentity>,
    scripts: HashMap<Op, VecDeque<Script>>,
}

struct StoredEntity {
    version: u64,
    configuration: Vec<u8>,
}

/// In-memory entity manager with lifecycle semantics plus per-operation
/// scripted responses for driving failure paths.
#[derive(Default)]
pub struct ScriptedManager {
    state: Mutex<ClusterState>,
    fetch_calls: AtomicUsize,
    create_calls: AtomicUsize,
    reconfigure_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
}

impl ScriptedManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a scripted response for the next call of `op`.
    pub fn script(&self, op: Op, script: Script) {
        let mut state = self.state.lock().unwrap();
        state.scripts.entry(op).or_default().push_back(script);
    }

    pub fn fail_next(&self, op: Op, failure: EntityFailure) {
        self.script(op, Script::Fail(failure));
    }

    pub fn mark_permanent(&self, identity: &EntityIdentity) {
        let mut state = self.state.lock().unwrap();
        state.permanent.insert(identity.clone());
    }

    pub fn mark_referenced(&self, identity: &EntityIdentity) {
        let mut state = self.state.lock().unwrap();
        state.referenced.insert(identity.clone());
    }

    pub fn clear_referenced(&self, identity: &EntityIdentity) {
        let mut state = self.state.lock().unwrap();
        state.referenced.remove(identity);
    }

    pub fn entity_exists(&self, identity: &EntityIdentity) -> bool {
        self.state.lock().unwrap().entities.contains_key(identity)
    }

    pub fn configuration_of(&self, identity: &EntityIdentity) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .entities
            .get(identity)
            .map(|stored| stored.configuration.clone())
    }

    pub fn calls(&self, op: Op) -> usize {
        match op {
            Op::Fetch => self.fetch_calls.load(Ordering::SeqCst),
            Op::Create => self.create_calls.load(Ordering::SeqCst),
            Op::Reconfigure => self.reconfigure_calls.load(Ordering::SeqCst),
            Op::Destroy => self.destroy_calls.load(Ordering::SeqCst),
        }
    }

    fn next_script(&self, op: Op) -> Option<Script> {
        let mut state = self.state.lock().unwrap();
        state.scripts.get_mut(&op).and_then(VecDeque::pop_front)
    }

    fn scripted_completion(script: Script) -> InvokeCompletion {
        match script {
            Script::Fail(failure) => InvokeCompletion::settled(Err(failure)),
            Script::Transport(message) => {
                let (handle, completion) = InvokeCompletion::pending();
                handle.fail_transport(message);
                completion
            }
            Script::AbandonWait => {
                let (handle, completion) = InvokeCompletion::pending();
                drop(handle);
                completion
            }
            Script::Respond(payload) => InvokeCompletion::settled(Ok(payload)),
        }
    }
}

#[async_trait]
impl ClientEntityManager for ScriptedManager {
    async fn fetch_entity(
        &self,
        descriptor: EntityDescriptor,
        codec: Arc<dyn MessageCodec>,
    ) -> std::result::Result<EntityEndpoint, ManagerFault> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(script) = self.next_script(Op::Fetch) {
            return match script {
                Script::Fail(failure) => Err(ManagerFault::Entity(failure)),
                Script::Transport(message) => Err(ManagerFault::Transport(message)),
                Script::AbandonWait => Err(ManagerFault::Interrupted),
                Script::Respond(_) => Ok(EntityEndpoint::new(descriptor, codec)),
            };
        }

        let failure = {
            let state = self.state.lock().unwrap();
            match state.entities.get(descriptor.identity()) {
                None => Some(EntityFailure::NotFound),
                Some(stored) if stored.version != descriptor.version() => {
                    Some(EntityFailure::VersionMismatch)
                }
                Some(_) => None,
            }
        };

        match failure {
            Some(failure) => Err(ManagerFault::Entity(failure)),
            None => Ok(EntityEndpoint::new(descriptor, codec)),
        }
    }

    async fn create_entity(
        &self,
        identity: EntityIdentity,
        version: u64,
        payload: Vec<u8>,
    ) -> InvokeCompletion {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(script) = self.next_script(Op::Create) {
            return Self::scripted_completion(script);
        }

        let mut state = self.state.lock().unwrap();
        if state.entities.contains_key(&identity) {
            return InvokeCompletion::settled(Err(EntityFailure::AlreadyExists));
        }

        state.entities.insert(
            identity,
            StoredEntity {
                version,
                configuration: payload,
            },
        );
        InvokeCompletion::settled(Ok(Vec::new()))
    }

    async fn reconfigure_entity(
        &self,
        identity: EntityIdentity,
        _version: u64,
        payload: Vec<u8>,
    ) -> InvokeCompletion {
        self.reconfigure_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(script) = self.next_script(Op::Reconfigure) {
            return Self::scripted_completion(script);
        }

        let mut state = self.state.lock().unwrap();
        match state.entities.get_mut(&identity) {
            None => InvokeCompletion::settled(Err(EntityFailure::NotProvided)),
            Some(stored) => {
                stored.configuration = payload.clone();
                InvokeCompletion::settled(Ok(payload))
            }
        }
    }

    async fn destroy_entity(&self, identity: EntityIdentity, _version: u64) -> InvokeCompletion {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(script) = self.next_script(Op::Destroy) {
            return Self::scripted_completion(script);
        }

        let mut state = self.state.lock().unwrap();
        if !state.entities.contains_key(&identity) {
            return InvokeCompletion::settled(Err(EntityFailure::NotFound));
        }
        if state.permanent.contains(&identity) {
            return InvokeCompletion::settled(Err(EntityFailure::Permanent));
        }
        if state.referenced.contains(&identity) {
            return InvokeCompletion::settled(Err(EntityFailure::Referenced));
        }

        state.entities.remove(&identity);
        InvokeCompletion::settled(Ok(Vec::new()))
    }
}

/// Configuration of the test counter entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    pub capacity: u32,
    pub label: String,
}

impl CounterConfig {
    pub fn new(capacity: u32, label: &str) -> Self {
        Self {
            capacity,
            label: label.to_string(),
        }
    }
}

/// Caller-facing typed entity handed out by fetch.
pub struct CounterEntity {
    endpoint: EntityEndpoint,
}

impl CounterEntity {
    pub fn instance_id(&self) -> u64 {
        self.endpoint.instance_id().value()
    }
}

pub struct CounterCodec;

impl MessageCodec for CounterCodec {
    fn encode_message(&self, message: &[u8]) -> Vec<u8> {
        message.to_vec()
    }

    fn decode_response(&self, payload: &[u8]) -> Vec<u8> {
        payload.to_vec()
    }
}

/// Service for the counter entity type; configurations travel as JSON.
pub struct CounterService;

impl CounterService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl EntityClientService for CounterService {
    type Entity = CounterEntity;
    type Configuration = CounterConfig;

    fn entity_type(&self) -> &str {
        "counter"
    }

    fn serialize_configuration(&self, configuration: &CounterConfig) -> Result<Vec<u8>> {
        serde_json::to_vec(configuration).map_err(|e| EntityError::Configuration(e.to_string()))
    }

    fn deserialize_configuration(&self, payload: &[u8]) -> Result<CounterConfig> {
        serde_json::from_slice(payload).map_err(|e| EntityError::Configuration(e.to_string()))
    }

    fn message_codec(&self) -> Arc<dyn MessageCodec> {
        Arc::new(CounterCodec)
    }

    fn create(&self, endpoint: EntityEndpoint) -> CounterEntity {
        CounterEntity { endpoint }
    }
}

/// Connection over the given manager with a zero-interval retry policy so
/// busy-retry tests finish immediately.
pub fn connection(manager: Arc<ScriptedManager>) -> EntityConnection {
    EntityConnection::with_retry_policy(
        manager,
        BusyRetryPolicy::new().retry_interval(Duration::from_millis(0)),
    )
}

pub fn counter_identity(name: &str) -> EntityIdentity {
    EntityIdentity::new("counter", name)
}
