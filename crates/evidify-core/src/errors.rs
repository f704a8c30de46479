use crate::events::EventType;
use thiserror::Error;

/// Core error types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The type tag is not part of the event catalogue.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
    /// Payload JSON does not match the schema of its event type.
    #[error("payload does not match {event_type} schema: {source}")]
    Schema {
        /// Event type whose schema was applied.
        event_type: EventType,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
    /// Payload is well-formed but violates a value constraint.
    #[error("invalid {event_type} payload: {source}")]
    InvalidPayload {
        /// Event type of the rejected payload.
        event_type: EventType,
        /// Constraint that failed.
        #[source]
        source: evidify_canonical::ValidationError,
    },
    /// Payload could not be serialized to JSON.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Canonicalization error.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] evidify_canonical::CanonicalizationError),
    /// Stored identifier or timestamp failed validation.
    #[error("invalid event record: {0}")]
    InvalidRecord(#[from] evidify_canonical::ValidationError),
}
