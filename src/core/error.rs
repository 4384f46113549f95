use thiserror::Error;

use crate::core::types::EntityIdentity;

/// Caller-visible errors for entity lifecycle operations.
///
/// Each operation surfaces only the subset of variants the server contract
/// allows for it; anything outside that closed set indicates client/server
/// skew and is escalated as a panic rather than mapped here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error("Entity '{0}' not found")]
    NotFound(EntityIdentity),

    #[error("Entity '{0}' already exists")]
    AlreadyExists(EntityIdentity),

    #[error("Version mismatch for entity '{0}': client requested version {1}")]
    VersionMismatch(EntityIdentity, u64),

    #[error("Entity type of '{0}' is not provided by the server")]
    NotProvided(EntityIdentity),

    #[error("Configuration rejected: {0}")]
    Configuration(String),

    #[error("Entity '{0}' is permanent and cannot be destroyed")]
    Permanent(EntityIdentity),
}

pub type Result<T> = std::result::Result<T, EntityError>;
