pub mod allocator;
pub mod retry;

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Level, event};

use crate::core::types::{EntityDescriptor, EntityIdentity};
use crate::core::{EntityError, Result};
use crate::manager::{ClientEntityManager, EntityFailure, ManagerFault};
use crate::service::EntityClientService;
use allocator::InstanceIdAllocator;
use retry::BusyRetryPolicy;

/// Long-lived handle to one named, versioned entity on the server.
///
/// A reference is a capability object: it is bound to one
/// {identity, version} pair at construction and carries no mutable entity
/// state of its own. Fetch produces live typed instances, each addressed by
/// a fresh [`crate::ClientInstanceId`] from the connection-shared
/// allocator; create, reconfigure and destroy drive the entity's lifecycle
/// on the server.
///
/// Every operation blocks the calling task until the server round trip
/// resolves. Failure variants outside the closed set the server contract
/// allows for an operation indicate client/server skew and panic rather
/// than surfacing as mis-typed errors.
pub struct EntityRef<S: EntityClientService> {
    manager: Arc<dyn ClientEntityManager>,
    service: Arc<S>,
    identity: EntityIdentity,
    version: u64,
    allocator: Arc<InstanceIdAllocator>,
    retry: BusyRetryPolicy,
    // Serializes the allocate/describe/submit sequence of fetch so two
    // concurrent fetches on this reference cannot cross-associate a
    // descriptor with the wrong endpoint.
    fetch_gate: Mutex<()>,
}

impl<S: EntityClientService> EntityRef<S> {
    pub(crate) fn new(
        manager: Arc<dyn ClientEntityManager>,
        service: Arc<S>,
        identity: EntityIdentity,
        version: u64,
        allocator: Arc<InstanceIdAllocator>,
        retry: BusyRetryPolicy,
    ) -> Self {
        Self {
            manager,
            service,
            identity,
            version,
            allocator,
            retry,
            fetch_gate: Mutex::new(()),
        }
    }

    /// Name of the entity this reference addresses.
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn identity(&self) -> &EntityIdentity {
        &self.identity
    }

    /// Schema version this reference was constructed against.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Fetch a live, typed instance of the entity.
    ///
    /// Allocates a fresh instance id, submits the descriptor together with
    /// the type's message codec, and wraps the returned endpoint through
    /// the per-type factory. Fetches on other references proceed
    /// concurrently; they coordinate only through the shared allocator.
    ///
    /// # Errors
    ///
    /// [`EntityError::NotFound`] and [`EntityError::VersionMismatch`] are
    /// the only recoverable outcomes. Transport faults are logged and
    /// escalated; fetch never retries them.
    pub async fn fetch(&self) -> Result<S::Entity> {
        let _gate = self.fetch_gate.lock().await;

        let instance_id = self.allocator.next_id();
        let descriptor = EntityDescriptor::new(self.identity.clone(), instance_id, self.version);

        let endpoint = match self
            .manager
            .fetch_entity(descriptor, self.service.message_codec())
            .await
        {
            Ok(endpoint) => endpoint,
            Err(ManagerFault::Entity(EntityFailure::NotFound)) => {
                return Err(EntityError::NotFound(self.identity.clone()));
            }
            Err(ManagerFault::Entity(EntityFailure::VersionMismatch)) => {
                return Err(EntityError::VersionMismatch(
                    self.identity.clone(),
                    self.version,
                ));
            }
            Err(ManagerFault::Entity(unexpected)) => {
                panic!("unsupported failure variant returned to fetch: {unexpected:?}");
            }
            Err(ManagerFault::Transport(message)) => {
                event!(Level::ERROR, entity = %self.identity, %message, "transport fault during fetch");
                panic!("transport fault during fetch of '{}': {message}", self.identity);
            }
            Err(ManagerFault::Interrupted) => {
                panic!("interrupted while fetching '{}'", self.identity);
            }
        };

        Ok(self.service.create(endpoint))
    }

    /// Create the entity from the given configuration.
    ///
    /// Busy rejections are absorbed by the reference's retry policy; the
    /// call blocks until the server accepts or refuses the create outright.
    ///
    /// # Errors
    ///
    /// [`EntityError::NotProvided`], [`EntityError::AlreadyExists`],
    /// [`EntityError::VersionMismatch`] and [`EntityError::Configuration`].
    pub async fn create(&self, configuration: &S::Configuration) -> Result<()> {
        let payload = self.service.serialize_configuration(configuration)?;

        let outcome = self
            .retry
            .run("create", || {
                let payload = payload.clone();
                async move {
                    self.manager
                        .create_entity(self.identity.clone(), self.version, payload)
                        .await
                        .settle()
                        .await
                        .map(|_| ())
                }
            })
            .await;

        match outcome {
            Ok(()) => Ok(()),
            Err(ManagerFault::Entity(failure)) => match failure {
                // The retry wrapper normally absorbs busy; one surfacing
                // here resolves as a no-op rather than an error.
                EntityFailure::Busy => Ok(()),
                EntityFailure::NotProvided => Err(EntityError::NotProvided(self.identity.clone())),
                EntityFailure::AlreadyExists => {
                    Err(EntityError::AlreadyExists(self.identity.clone()))
                }
                EntityFailure::VersionMismatch => Err(EntityError::VersionMismatch(
                    self.identity.clone(),
                    self.version,
                )),
                EntityFailure::Configuration(message) => Err(EntityError::Configuration(message)),
                unexpected => {
                    panic!("unsupported failure variant returned to create: {unexpected:?}");
                }
            },
            Err(ManagerFault::Interrupted) => {
                panic!("interrupted while creating '{}'", self.identity);
            }
            Err(ManagerFault::Transport(message)) => {
                panic!("transport fault during create of '{}': {message}", self.identity);
            }
        }
    }

    /// Replace the entity's configuration and return the server's resulting
    /// effective configuration.
    ///
    /// The server may normalize or augment the submitted value; the
    /// returned configuration, not the input, is authoritative. Busy
    /// rejections are absorbed by the retry policy.
    ///
    /// # Errors
    ///
    /// [`EntityError::NotProvided`] and [`EntityError::Configuration`].
    /// A version mismatch is not an expected outcome here, because the
    /// reference's version was already validated when the entity was
    /// resolved, and escalates as fatal.
    pub async fn reconfigure(&self, configuration: &S::Configuration) -> Result<S::Configuration> {
        let payload = self.service.serialize_configuration(configuration)?;

        let outcome = self
            .retry
            .run("reconfigure", || {
                let payload = payload.clone();
                async move {
                    self.manager
                        .reconfigure_entity(self.identity.clone(), self.version, payload)
                        .await
                        .settle()
                        .await
                }
            })
            .await;

        match outcome {
            Ok(result_payload) => self.service.deserialize_configuration(&result_payload),
            Err(ManagerFault::Entity(failure)) => match failure {
                EntityFailure::NotProvided => Err(EntityError::NotProvided(self.identity.clone())),
                EntityFailure::Configuration(message) => Err(EntityError::Configuration(message)),
                unexpected => {
                    panic!("unsupported failure variant returned to reconfigure: {unexpected:?}");
                }
            },
            Err(ManagerFault::Interrupted) => {
                panic!("interrupted while reconfiguring '{}'", self.identity);
            }
            Err(ManagerFault::Transport(message)) => {
                panic!(
                    "transport fault during reconfigure of '{}': {message}",
                    self.identity
                );
            }
        }
    }

    /// Destroy the entity. Returns whether the destroy took effect.
    ///
    /// Deliberately not wrapped in the busy-retry executor: a destroy can
    /// be rejected because live instances remain, a precondition that may
    /// never clear, so callers that want to retry do so explicitly.
    ///
    /// `Ok(false)` covers the non-error negative outcomes: the server was
    /// busy, the entity is still referenced by another client's live
    /// instance, or the wait was interrupted.
    ///
    /// # Errors
    ///
    /// [`EntityError::NotProvided`], [`EntityError::NotFound`] and
    /// [`EntityError::Permanent`].
    pub async fn destroy(&self) -> Result<bool> {
        let completion = self
            .manager
            .destroy_entity(self.identity.clone(), self.version)
            .await;

        match completion.settle().await {
            Ok(_) => Ok(true),
            Err(ManagerFault::Entity(failure)) => match failure {
                EntityFailure::NotProvided => Err(EntityError::NotProvided(self.identity.clone())),
                EntityFailure::Busy => {
                    event!(Level::INFO, entity = %self.identity, "destroy rejected, busy wait");
                    Ok(false)
                }
                EntityFailure::NotFound => Err(EntityError::NotFound(self.identity.clone())),
                EntityFailure::Permanent => Err(EntityError::Permanent(self.identity.clone())),
                EntityFailure::Referenced => Ok(false),
                unexpected => {
                    panic!("unsupported failure variant returned to destroy: {unexpected:?}");
                }
            },
            Err(ManagerFault::Interrupted) => Ok(false),
            Err(ManagerFault::Transport(message)) => {
                panic!(
                    "transport fault during destroy of '{}': {message}",
                    self.identity
                );
            }
        }
    }
}
