//! Boundary to the network-facing entity manager.
//!
//! The manager owns transport framing and the server round trip; this crate
//! only consumes its results. Failures cross the boundary as a closed,
//! wire-defined taxonomy ([`EntityFailure`]) wrapped in a [`ManagerFault`],
//! and the mutating operations resolve through a future-like
//! [`InvokeCompletion`] that the reference layer awaits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::core::types::{ClientInstanceId, EntityDescriptor, EntityIdentity};
use crate::service::MessageCodec;

/// Closed set of failure variants the server reports on the wire.
///
/// Produced by the server side and consumed here, never invented by this
/// crate. Each operation accepts only a subset of these; an out-of-set
/// variant reaching a classifier is a protocol invariant violation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityFailure {
    #[error("entity not found")]
    NotFound,

    #[error("entity type not provided")]
    NotProvided,

    #[error("entity already exists")]
    AlreadyExists,

    #[error("entity version mismatch")]
    VersionMismatch,

    #[error("configuration rejected: {0}")]
    Configuration(String),

    #[error("server busy")]
    Busy,

    #[error("entity is permanent")]
    Permanent,

    #[error("entity still referenced by a live instance")]
    Referenced,
}

/// Everything the manager collaborator can fail with.
///
/// Wire-level entity failures keep their closed taxonomy; transport faults
/// and abandoned waits stay outside it so the classifiers can escalate them
/// separately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerFault {
    #[error("{0}")]
    Entity(EntityFailure),

    #[error("transport fault: {0}")]
    Transport(String),

    #[error("wait interrupted before the operation completed")]
    Interrupted,
}

/// Future-like completion for a create/reconfigure/destroy round trip.
///
/// The manager hands one back immediately; the reference layer awaits it
/// via [`InvokeCompletion::settle`]. If the producing side goes away before
/// delivering a result, the wait resolves to [`ManagerFault::Interrupted`].
#[derive(Debug)]
pub struct InvokeCompletion {
    rx: oneshot::Receiver<std::result::Result<Vec<u8>, ManagerFault>>,
}

impl InvokeCompletion {
    /// Create a completion together with the handle that will settle it.
    pub fn pending() -> (CompletionHandle, InvokeCompletion) {
        let (tx, rx) = oneshot::channel();
        (CompletionHandle { tx }, InvokeCompletion { rx })
    }

    /// Create an already-settled completion from a wire-level result.
    pub fn settled(result: std::result::Result<Vec<u8>, EntityFailure>) -> Self {
        let (handle, completion) = Self::pending();
        handle.complete(result);
        completion
    }

    /// Block until the server round trip resolves.
    pub async fn settle(self) -> std::result::Result<Vec<u8>, ManagerFault> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(ManagerFault::Interrupted),
        }
    }
}

/// Producing side of an [`InvokeCompletion`].
///
/// Dropping the handle without completing abandons the waiting caller,
/// which observes [`ManagerFault::Interrupted`].
#[derive(Debug)]
pub struct CompletionHandle {
    tx: oneshot::Sender<std::result::Result<Vec<u8>, ManagerFault>>,
}

impl CompletionHandle {
    /// Settle with a wire-level result from the server.
    pub fn complete(self, result: std::result::Result<Vec<u8>, EntityFailure>) {
        let _ = self.tx.send(result.map_err(ManagerFault::Entity));
    }

    pub fn succeed(self, payload: Vec<u8>) {
        self.complete(Ok(payload));
    }

    pub fn fail(self, failure: EntityFailure) {
        self.complete(Err(failure));
    }

    /// Settle with a transport-layer fault outside the entity protocol.
    pub fn fail_transport(self, message: impl Into<String>) {
        let _ = self.tx.send(Err(ManagerFault::Transport(message.into())));
    }
}

/// Live communication endpoint for one fetched entity instance.
///
/// Transport details live behind the manager; this layer only routes the
/// endpoint to the per-type factory, which wraps it into the caller-facing
/// typed entity.
pub struct EntityEndpoint {
    descriptor: EntityDescriptor,
    codec: Arc<dyn MessageCodec>,
}

impl EntityEndpoint {
    pub fn new(descriptor: EntityDescriptor, codec: Arc<dyn MessageCodec>) -> Self {
        Self { descriptor, codec }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    pub fn instance_id(&self) -> ClientInstanceId {
        self.descriptor.instance_id()
    }

    pub fn codec(&self) -> &Arc<dyn MessageCodec> {
        &self.codec
    }
}

/// The network-facing entity manager collaborator.
///
/// One instance serves a whole connection; references submit their
/// operations here and never talk to the transport directly.
#[async_trait]
pub trait ClientEntityManager: Send + Sync {
    /// Resolve a live endpoint for the descriptor's instance. Fails only
    /// with `NotFound` or `VersionMismatch` under the server contract.
    async fn fetch_entity(
        &self,
        descriptor: EntityDescriptor,
        codec: Arc<dyn MessageCodec>,
    ) -> std::result::Result<EntityEndpoint, ManagerFault>;

    /// Ask the server to create the named entity from the serialized
    /// configuration payload.
    async fn create_entity(
        &self,
        identity: EntityIdentity,
        version: u64,
        payload: Vec<u8>,
    ) -> InvokeCompletion;

    /// Ask the server to replace the entity's configuration. The settled
    /// payload carries the server's resulting effective configuration.
    async fn reconfigure_entity(
        &self,
        identity: EntityIdentity,
        version: u64,
        payload: Vec<u8>,
    ) -> InvokeCompletion;

    /// Ask the server to destroy the named entity.
    async fn destroy_entity(&self, identity: EntityIdentity, version: u64) -> InvokeCompletion;
}
