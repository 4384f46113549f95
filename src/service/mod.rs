//! Per-entity-type codec and factory collaborator.
//!
//! Every entity type registers one service that knows how to serialize its
//! configuration, frame its messages, and wrap a fetched endpoint into the
//! caller-facing typed entity. The reference layer treats all of it as
//! opaque plumbing.

use std::sync::Arc;

use crate::core::Result;
use crate::manager::EntityEndpoint;

/// Message codec for one entity type.
///
/// Handed to the manager at fetch time so the endpoint can frame entity
/// invocations for that instance; this crate never interprets the framed
/// bytes itself.
pub trait MessageCodec: Send + Sync {
    fn encode_message(&self, message: &[u8]) -> Vec<u8>;

    fn decode_response(&self, payload: &[u8]) -> Vec<u8>;
}

/// Codec/factory pair for one entity type.
pub trait EntityClientService: Send + Sync {
    /// The caller-facing typed entity produced from a fetched endpoint.
    type Entity;

    /// The configuration value used by create and reconfigure.
    type Configuration;

    /// Type name under which the server addresses entities of this service.
    fn entity_type(&self) -> &str;

    /// Serialize a configuration into the opaque wire payload. A value the
    /// codec cannot represent surfaces as [`crate::EntityError::Configuration`].
    fn serialize_configuration(&self, configuration: &Self::Configuration) -> Result<Vec<u8>>;

    /// Decode the server's effective configuration payload.
    fn deserialize_configuration(&self, payload: &[u8]) -> Result<Self::Configuration>;

    /// The message codec routed to the endpoint at fetch time.
    fn message_codec(&self) -> Arc<dyn MessageCodec>;

    /// Wrap a live endpoint into the typed entity handed to the caller.
    fn create(&self, endpoint: EntityEndpoint) -> Self::Entity;
}
