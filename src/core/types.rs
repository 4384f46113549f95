use serde::{Deserialize, Serialize};
use std::fmt;

/// Cluster-wide identity of one logical entity: its type name plus its
/// instance name. Compared by value; used as the addressing key for every
/// lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityIdentity {
    type_name: String,
    name: String,
}

impl EntityIdentity {
    pub fn new(type_name: &str, name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            name: name.to_string(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for EntityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.name)
    }
}

/// Connection-unique identifier for one fetched, live entity instance.
///
/// Issued by the shared allocator in strict allocation order; the server
/// uses it to route per-instance callbacks to the correct local handle, so
/// a value is never reused for the lifetime of the owning connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientInstanceId(u64);

impl ClientInstanceId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire envelope accompanying a fetch: the entity identity, the freshly
/// allocated instance id, and the schema version the client was built
/// against. Built once per fetch and never mutated. The version is compared
/// for equality only; a mismatch is a hard error, not something this layer
/// negotiates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    identity: EntityIdentity,
    instance_id: ClientInstanceId,
    version: u64,
}

impl EntityDescriptor {
    pub fn new(identity: EntityIdentity, instance_id: ClientInstanceId, version: u64) -> Self {
        Self {
            identity,
            instance_id,
            version,
        }
    }

    pub fn identity(&self) -> &EntityIdentity {
        &self.identity
    }

    pub fn instance_id(&self) -> ClientInstanceId {
        self.instance_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
