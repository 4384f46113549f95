// ============================================================================
// entitylink: client-side entity reference and lifecycle layer
// ============================================================================

pub mod core;
pub mod manager;
pub mod reference;
pub mod service;

// Re-export main types for convenience
pub use crate::core::{ClientInstanceId, EntityDescriptor, EntityError, EntityIdentity, Result};
pub use manager::{
    ClientEntityManager, CompletionHandle, EntityEndpoint, EntityFailure, InvokeCompletion,
    ManagerFault,
};
pub use reference::{EntityRef, allocator::InstanceIdAllocator, retry::BusyRetryPolicy};
pub use service::{EntityClientService, MessageCodec};

use std::sync::Arc;

// ============================================================================
// Connection-scoped entry point
// ============================================================================

/// Connection-scoped factory for entity references.
///
/// One `EntityConnection` wraps one entity-manager collaborator and owns
/// the instance-id allocator shared by every reference it vends, so
/// instance ids stay unique across the whole connection no matter which
/// reference fetched them.
///
/// # Examples
///
/// ```ignore
/// use entitylink::EntityConnection;
///
/// let connection = EntityConnection::new(manager);
/// let counters = connection.entity_ref(counter_service, "page-hits", 1);
///
/// counters.create(&CounterConfig::default()).await?;
/// let live = counters.fetch().await?;
/// ```
pub struct EntityConnection {
    manager: Arc<dyn ClientEntityManager>,
    allocator: Arc<InstanceIdAllocator>,
    retry: BusyRetryPolicy,
}

impl EntityConnection {
    /// Wrap an entity manager with the default busy-retry policy
    /// (2 second interval, unbounded attempts).
    pub fn new(manager: Arc<dyn ClientEntityManager>) -> Self {
        Self::with_retry_policy(manager, BusyRetryPolicy::default())
    }

    /// Wrap an entity manager with a custom busy-retry policy. Tests
    /// substitute a zero-interval or bounded policy here.
    pub fn with_retry_policy(manager: Arc<dyn ClientEntityManager>, retry: BusyRetryPolicy) -> Self {
        Self {
            manager,
            allocator: Arc::new(InstanceIdAllocator::new()),
            retry,
        }
    }

    /// Obtain a reference to the named entity of the service's type, pinned
    /// to the given schema version.
    ///
    /// The reference shares this connection's manager, allocator and retry
    /// policy; it holds no server-side state of its own until used.
    pub fn entity_ref<S: EntityClientService>(
        &self,
        service: Arc<S>,
        name: &str,
        version: u64,
    ) -> EntityRef<S> {
        let identity = EntityIdentity::new(service.entity_type(), name);
        EntityRef::new(
            Arc::clone(&self.manager),
            service,
            identity,
            version,
            Arc::clone(&self.allocator),
            self.retry.clone(),
        )
    }

    /// The instance-id allocator shared by all references on this
    /// connection.
    pub fn allocator(&self) -> &Arc<InstanceIdAllocator> {
        &self.allocator
    }
}
