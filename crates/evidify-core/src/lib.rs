//! Event data model and derived metrics for Evidify sessions.
//!
//! This crate provides:
//! - The closed catalogue of event types and their typed payloads
//! - Payload validation applied before an event may enter a ledger
//! - [`Event`], the record a ledger stores for each append
//! - [`compute_metrics`], a pure function from an event sequence to [`DerivedMetrics`]
//!
//! Core invariants:
//! - Every payload that reaches the ledger has passed [`EventPayload::validate`]
//! - Metrics depend only on the events given, in the order given
//!
#![deny(missing_docs)]

/// Error types for core operations.
pub mod errors;
/// Event catalogue and payload schemas.
pub mod events;
/// Derived metrics calculator.
pub mod metrics;

pub use errors::CoreError;
pub use events::{
    AiRevealed, AttentionCheckResponse, CaseCompleted, CaseLoaded, Condition, DeviationSkipped,
    DeviationSubmitted, DisclosureComprehensionResponse, DisclosurePresented, Event, EventPayload,
    EventType, FinalAssessment, FirstImpressionLocked, RandomizationAssigned, ReadEpisodeEnded,
    ReadEpisodeStarted, ReadPhase, SessionEnded, SessionStarted,
};
pub use metrics::{
    compute_metrics, DerivedMetrics, MetricField, MetricKind, MetricValue, METRIC_FIELDS,
    TOO_FAST_THRESHOLD_MS,
};
