use evidify_canonical::{CaseId, EventId, ReaderId, SessionId, Timestamp, ValidationError};
use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Closed set of event type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Session opened.
    SessionStarted,
    /// Reveal condition assigned to the session.
    RandomizationAssigned,
    /// Case presented to the reader.
    CaseLoaded,
    /// Timed read period began.
    ReadEpisodeStarted,
    /// Timed read period ended.
    ReadEpisodeEnded,
    /// Independent assessment committed before AI exposure.
    FirstImpressionLocked,
    /// AI output shown.
    AiRevealed,
    /// Error-rate disclosure shown.
    DisclosurePresented,
    /// Answer to the disclosure comprehension question.
    DisclosureComprehensionResponse,
    /// Final assessment after AI exposure.
    FinalAssessment,
    /// Reader documented why the final assessment deviates from AI.
    DeviationSubmitted,
    /// Reader declined to document a deviation.
    DeviationSkipped,
    /// Answer to an attention check.
    AttentionCheckResponse,
    /// Case concluded.
    CaseCompleted,
    /// Session closed.
    SessionEnded,
}

impl EventType {
    /// All event types in catalogue order.
    pub const ALL: [EventType; 15] = [
        EventType::SessionStarted,
        EventType::RandomizationAssigned,
        EventType::CaseLoaded,
        EventType::ReadEpisodeStarted,
        EventType::ReadEpisodeEnded,
        EventType::FirstImpressionLocked,
        EventType::AiRevealed,
        EventType::DisclosurePresented,
        EventType::DisclosureComprehensionResponse,
        EventType::FinalAssessment,
        EventType::DeviationSubmitted,
        EventType::DeviationSkipped,
        EventType::AttentionCheckResponse,
        EventType::CaseCompleted,
        EventType::SessionEnded,
    ];

    /// Wire tag, e.g. `"CASE_LOADED"`.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::SessionStarted => "SESSION_STARTED",
            EventType::RandomizationAssigned => "RANDOMIZATION_ASSIGNED",
            EventType::CaseLoaded => "CASE_LOADED",
            EventType::ReadEpisodeStarted => "READ_EPISODE_STARTED",
            EventType::ReadEpisodeEnded => "READ_EPISODE_ENDED",
            EventType::FirstImpressionLocked => "FIRST_IMPRESSION_LOCKED",
            EventType::AiRevealed => "AI_REVEALED",
            EventType::DisclosurePresented => "DISCLOSURE_PRESENTED",
            EventType::DisclosureComprehensionResponse => "DISCLOSURE_COMPREHENSION_RESPONSE",
            EventType::FinalAssessment => "FINAL_ASSESSMENT",
            EventType::DeviationSubmitted => "DEVIATION_SUBMITTED",
            EventType::DeviationSkipped => "DEVIATION_SKIPPED",
            EventType::AttentionCheckResponse => "ATTENTION_CHECK_RESPONSE",
            EventType::CaseCompleted => "CASE_COMPLETED",
            EventType::SessionEnded => "SESSION_ENDED",
        }
    }

    /// One-line description used in the export codebook.
    pub fn description(self) -> &'static str {
        match self {
            EventType::SessionStarted => "Session opened; carries the session and reader identifiers.",
            EventType::RandomizationAssigned => "Reveal condition (HUMAN_FIRST, AI_FIRST, CONCURRENT) assigned.",
            EventType::CaseLoaded => "Case presented to the reader.",
            EventType::ReadEpisodeStarted => "Timed read period began (PRE_AI or POST_AI).",
            EventType::ReadEpisodeEnded => "Timed read period ended, with its duration in ms.",
            EventType::FirstImpressionLocked => "Independent BI-RADS and confidence committed before AI exposure.",
            EventType::AiRevealed => "AI suggestion (BI-RADS, confidence) shown to the reader.",
            EventType::DisclosurePresented => "FDR/FOR error-rate disclosure shown.",
            EventType::DisclosureComprehensionResponse => "Whether the reader answered the disclosure check correctly.",
            EventType::FinalAssessment => "Final BI-RADS and confidence after AI exposure.",
            EventType::DeviationSubmitted => "Reason codes documenting disagreement with AI.",
            EventType::DeviationSkipped => "Deviation documentation declined.",
            EventType::AttentionCheckResponse => "Attention check outcome.",
            EventType::CaseCompleted => "Case concluded.",
            EventType::SessionEnded => "Session closed.",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownEventType(s.to_string()))
    }
}

/// Reveal condition of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    /// Reader commits an impression before AI is shown.
    HumanFirst,
    /// AI is shown before the reader reads.
    AiFirst,
    /// AI is visible throughout.
    Concurrent,
}

impl Condition {
    /// Wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::HumanFirst => "HUMAN_FIRST",
            Condition::AiFirst => "AI_FIRST",
            Condition::Concurrent => "CONCURRENT",
        }
    }
}

/// Read phase relative to AI exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadPhase {
    /// Before AI output is visible.
    PreAi,
    /// After AI output is visible.
    PostAi,
}

/// `SESSION_STARTED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionStarted {
    /// Session identifier.
    pub session_id: SessionId,
    /// Pseudonymous reader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_id: Option<ReaderId>,
    /// Study protocol label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_id: Option<String>,
}

/// `RANDOMIZATION_ASSIGNED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RandomizationAssigned {
    /// Assigned condition.
    pub condition: Condition,
    /// Seed used by the assignment procedure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    /// Assignment method label (e.g. Latin square).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// `CASE_LOADED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaseLoaded {
    /// Case identifier.
    pub case_id: CaseId,
    /// Calibration cases are excluded from case-level metrics when a study case exists.
    #[serde(default)]
    pub is_calibration: bool,
}

/// `READ_EPISODE_STARTED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReadEpisodeStarted {
    /// Case identifier.
    pub case_id: CaseId,
    /// Phase of the read.
    pub phase: ReadPhase,
}

/// `READ_EPISODE_ENDED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReadEpisodeEnded {
    /// Case identifier.
    pub case_id: CaseId,
    /// Phase of the read.
    pub phase: ReadPhase,
    /// Measured episode duration.
    pub duration_ms: u64,
}

/// `FIRST_IMPRESSION_LOCKED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FirstImpressionLocked {
    /// Case identifier.
    pub case_id: CaseId,
    /// BI-RADS category, 0 to 6.
    pub birads: u8,
    /// Reader confidence, 1 to 5.
    pub confidence: u8,
    /// Time from case load to lock as measured by the viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_lock_ms: Option<u64>,
}

/// `AI_REVEALED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AiRevealed {
    /// Case identifier.
    pub case_id: CaseId,
    /// BI-RADS category suggested by the AI.
    pub suggested_birads: u8,
    /// AI confidence in [0, 1].
    pub ai_confidence: f64,
}

/// `DISCLOSURE_PRESENTED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DisclosurePresented {
    /// Case identifier.
    pub case_id: CaseId,
    /// Presentation format label.
    pub format: String,
    /// False discovery rate shown, in [0, 1].
    pub fdr: f64,
    /// False omission rate shown, in [0, 1].
    #[serde(rename = "for")]
    pub for_rate: f64,
}

/// `DISCLOSURE_COMPREHENSION_RESPONSE` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DisclosureComprehensionResponse {
    /// Case identifier.
    pub case_id: CaseId,
    /// Whether the answer was correct.
    pub correct: bool,
}

/// `FINAL_ASSESSMENT` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FinalAssessment {
    /// Case identifier.
    pub case_id: CaseId,
    /// BI-RADS category, 0 to 6.
    pub birads: u8,
    /// Reader confidence, 1 to 5.
    pub confidence: u8,
}

/// `DEVIATION_SUBMITTED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeviationSubmitted {
    /// Case identifier.
    pub case_id: CaseId,
    /// Structured reason codes, at least one.
    pub reason_codes: Vec<String>,
    /// Free-text rationale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// `DEVIATION_SKIPPED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeviationSkipped {
    /// Case identifier.
    pub case_id: CaseId,
    /// Optional reason for skipping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `ATTENTION_CHECK_RESPONSE` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttentionCheckResponse {
    /// Attention check identifier.
    pub check_id: String,
    /// Whether the check was passed.
    pub passed: bool,
}

/// `CASE_COMPLETED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaseCompleted {
    /// Case identifier.
    pub case_id: CaseId,
    /// Total time on case as measured by the viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<u64>,
}

/// `SESSION_ENDED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionEnded {
    /// Why the session ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Typed payload, one variant per [`EventType`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// See [`SessionStarted`].
    SessionStarted(SessionStarted),
    /// See [`RandomizationAssigned`].
    RandomizationAssigned(RandomizationAssigned),
    /// See [`CaseLoaded`].
    CaseLoaded(CaseLoaded),
    /// See [`ReadEpisodeStarted`].
    ReadEpisodeStarted(ReadEpisodeStarted),
    /// See [`ReadEpisodeEnded`].
    ReadEpisodeEnded(ReadEpisodeEnded),
    /// See [`FirstImpressionLocked`].
    FirstImpressionLocked(FirstImpressionLocked),
    /// See [`AiRevealed`].
    AiRevealed(AiRevealed),
    /// See [`DisclosurePresented`].
    DisclosurePresented(DisclosurePresented),
    /// See [`DisclosureComprehensionResponse`].
    DisclosureComprehensionResponse(DisclosureComprehensionResponse),
    /// See [`FinalAssessment`].
    FinalAssessment(FinalAssessment),
    /// See [`DeviationSubmitted`].
    DeviationSubmitted(DeviationSubmitted),
    /// See [`DeviationSkipped`].
    DeviationSkipped(DeviationSkipped),
    /// See [`AttentionCheckResponse`].
    AttentionCheckResponse(AttentionCheckResponse),
    /// See [`CaseCompleted`].
    CaseCompleted(CaseCompleted),
    /// See [`SessionEnded`].
    SessionEnded(SessionEnded),
}

impl EventPayload {
    /// Type tag of this payload.
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::SessionStarted(_) => EventType::SessionStarted,
            EventPayload::RandomizationAssigned(_) => EventType::RandomizationAssigned,
            EventPayload::CaseLoaded(_) => EventType::CaseLoaded,
            EventPayload::ReadEpisodeStarted(_) => EventType::ReadEpisodeStarted,
            EventPayload::ReadEpisodeEnded(_) => EventType::ReadEpisodeEnded,
            EventPayload::FirstImpressionLocked(_) => EventType::FirstImpressionLocked,
            EventPayload::AiRevealed(_) => EventType::AiRevealed,
            EventPayload::DisclosurePresented(_) => EventType::DisclosurePresented,
            EventPayload::DisclosureComprehensionResponse(_) => {
                EventType::DisclosureComprehensionResponse
            }
            EventPayload::FinalAssessment(_) => EventType::FinalAssessment,
            EventPayload::DeviationSubmitted(_) => EventType::DeviationSubmitted,
            EventPayload::DeviationSkipped(_) => EventType::DeviationSkipped,
            EventPayload::AttentionCheckResponse(_) => EventType::AttentionCheckResponse,
            EventPayload::CaseCompleted(_) => EventType::CaseCompleted,
            EventPayload::SessionEnded(_) => EventType::SessionEnded,
        }
    }

    /// Case the payload refers to, if any.
    pub fn case_id(&self) -> Option<&CaseId> {
        match self {
            EventPayload::CaseLoaded(p) => Some(&p.case_id),
            EventPayload::ReadEpisodeStarted(p) => Some(&p.case_id),
            EventPayload::ReadEpisodeEnded(p) => Some(&p.case_id),
            EventPayload::FirstImpressionLocked(p) => Some(&p.case_id),
            EventPayload::AiRevealed(p) => Some(&p.case_id),
            EventPayload::DisclosurePresented(p) => Some(&p.case_id),
            EventPayload::DisclosureComprehensionResponse(p) => Some(&p.case_id),
            EventPayload::FinalAssessment(p) => Some(&p.case_id),
            EventPayload::DeviationSubmitted(p) => Some(&p.case_id),
            EventPayload::DeviationSkipped(p) => Some(&p.case_id),
            EventPayload::CaseCompleted(p) => Some(&p.case_id),
            EventPayload::SessionStarted(_)
            | EventPayload::RandomizationAssigned(_)
            | EventPayload::AttentionCheckResponse(_)
            | EventPayload::SessionEnded(_) => None,
        }
    }

    /// Parses untyped payload JSON against the schema of `event_type`.
    pub fn from_json(event_type: EventType, value: Value) -> Result<Self, CoreError> {
        fn parse<T: serde::de::DeserializeOwned>(
            event_type: EventType,
            value: Value,
        ) -> Result<T, CoreError> {
            serde_json::from_value(value).map_err(|source| CoreError::Schema { event_type, source })
        }

        Ok(match event_type {
            EventType::SessionStarted => EventPayload::SessionStarted(parse(event_type, value)?),
            EventType::RandomizationAssigned => {
                EventPayload::RandomizationAssigned(parse(event_type, value)?)
            }
            EventType::CaseLoaded => EventPayload::CaseLoaded(parse(event_type, value)?),
            EventType::ReadEpisodeStarted => {
                EventPayload::ReadEpisodeStarted(parse(event_type, value)?)
            }
            EventType::ReadEpisodeEnded => EventPayload::ReadEpisodeEnded(parse(event_type, value)?),
            EventType::FirstImpressionLocked => {
                EventPayload::FirstImpressionLocked(parse(event_type, value)?)
            }
            EventType::AiRevealed => EventPayload::AiRevealed(parse(event_type, value)?),
            EventType::DisclosurePresented => {
                EventPayload::DisclosurePresented(parse(event_type, value)?)
            }
            EventType::DisclosureComprehensionResponse => {
                EventPayload::DisclosureComprehensionResponse(parse(event_type, value)?)
            }
            EventType::FinalAssessment => EventPayload::FinalAssessment(parse(event_type, value)?),
            EventType::DeviationSubmitted => {
                EventPayload::DeviationSubmitted(parse(event_type, value)?)
            }
            EventType::DeviationSkipped => EventPayload::DeviationSkipped(parse(event_type, value)?),
            EventType::AttentionCheckResponse => {
                EventPayload::AttentionCheckResponse(parse(event_type, value)?)
            }
            EventType::CaseCompleted => EventPayload::CaseCompleted(parse(event_type, value)?),
            EventType::SessionEnded => EventPayload::SessionEnded(parse(event_type, value)?),
        })
    }

    /// Serializes the payload body (without its type tag).
    pub fn to_json(&self) -> Result<Value, CoreError> {
        let value = match self {
            EventPayload::SessionStarted(p) => serde_json::to_value(p),
            EventPayload::RandomizationAssigned(p) => serde_json::to_value(p),
            EventPayload::CaseLoaded(p) => serde_json::to_value(p),
            EventPayload::ReadEpisodeStarted(p) => serde_json::to_value(p),
            EventPayload::ReadEpisodeEnded(p) => serde_json::to_value(p),
            EventPayload::FirstImpressionLocked(p) => serde_json::to_value(p),
            EventPayload::AiRevealed(p) => serde_json::to_value(p),
            EventPayload::DisclosurePresented(p) => serde_json::to_value(p),
            EventPayload::DisclosureComprehensionResponse(p) => serde_json::to_value(p),
            EventPayload::FinalAssessment(p) => serde_json::to_value(p),
            EventPayload::DeviationSubmitted(p) => serde_json::to_value(p),
            EventPayload::DeviationSkipped(p) => serde_json::to_value(p),
            EventPayload::AttentionCheckResponse(p) => serde_json::to_value(p),
            EventPayload::CaseCompleted(p) => serde_json::to_value(p),
            EventPayload::SessionEnded(p) => serde_json::to_value(p),
        }?;
        Ok(value)
    }

    /// Checks value constraints that the JSON schema alone cannot express.
    ///
    /// Float fields are checked for finiteness here because `serde_json`
    /// silently turns NaN into `null` during serialization.
    pub fn validate(&self) -> Result<(), CoreError> {
        let event_type = self.event_type();
        let check = |result: Result<(), ValidationError>| {
            result.map_err(|source| CoreError::InvalidPayload { event_type, source })
        };
        // Identifiers deserialize transparently; re-check their pattern here.
        if let Some(case_id) = self.case_id() {
            check(CaseId::parse(case_id.as_str()).map(drop))?;
        }
        if let EventPayload::SessionStarted(p) = self {
            check(SessionId::parse(p.session_id.as_str()).map(drop))?;
            if let Some(reader_id) = &p.reader_id {
                check(ReaderId::parse(reader_id.as_str()).map(drop))?;
            }
        }
        match self {
            EventPayload::FirstImpressionLocked(p) => {
                check(birads("birads", p.birads))?;
                check(confidence(p.confidence))
            }
            EventPayload::FinalAssessment(p) => {
                check(birads("birads", p.birads))?;
                check(confidence(p.confidence))
            }
            EventPayload::AiRevealed(p) => {
                check(birads("suggestedBirads", p.suggested_birads))?;
                check(unit_interval("aiConfidence", p.ai_confidence))
            }
            EventPayload::DisclosurePresented(p) => {
                check(non_empty("format", &p.format))?;
                check(unit_interval("fdr", p.fdr))?;
                check(unit_interval("for", p.for_rate))
            }
            EventPayload::DeviationSubmitted(p) => {
                if p.reason_codes.is_empty() {
                    return check(Err(ValidationError::Empty {
                        field: "reasonCodes",
                    }));
                }
                p.reason_codes
                    .iter()
                    .try_for_each(|code| check(non_empty("reasonCodes", code)))
            }
            EventPayload::AttentionCheckResponse(p) => check(non_empty("checkId", &p.check_id)),
            EventPayload::SessionStarted(p) => match &p.protocol_id {
                Some(protocol) => check(non_empty("protocolId", protocol)),
                None => Ok(()),
            },
            EventPayload::RandomizationAssigned(_)
            | EventPayload::CaseLoaded(_)
            | EventPayload::ReadEpisodeStarted(_)
            | EventPayload::ReadEpisodeEnded(_)
            | EventPayload::DisclosureComprehensionResponse(_)
            | EventPayload::DeviationSkipped(_)
            | EventPayload::CaseCompleted(_)
            | EventPayload::SessionEnded(_) => Ok(()),
        }
    }
}

fn birads(field: &'static str, value: u8) -> Result<(), ValidationError> {
    if value > 6 {
        return Err(ValidationError::OutOfBounds {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn confidence(value: u8) -> Result<(), ValidationError> {
    if !(1..=5).contains(&value) {
        return Err(ValidationError::OutOfBounds {
            field: "confidence",
            value: value.to_string(),
        });
    }
    Ok(())
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::OutOfBounds {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// One recorded event.
///
/// On the wire an event is `{id, seq, type, timestamp, payload}`; the
/// payload is parsed back into its typed variant on deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct Event {
    /// Unique identifier issued by the log.
    pub id: EventId,
    /// Zero-based position in the log.
    pub seq: u64,
    /// UTC time the log recorded the event.
    pub timestamp: Timestamp,
    /// Typed payload.
    pub payload: EventPayload,
}

impl Event {
    /// Type tag of the payload.
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}

#[derive(Deserialize)]
struct EventRecord {
    id: EventId,
    seq: u64,
    #[serde(rename = "type")]
    event_type: EventType,
    timestamp: Timestamp,
    payload: Value,
}

impl TryFrom<EventRecord> for Event {
    type Error = CoreError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        Ok(Event {
            id: EventId::parse(record.id.as_str())?,
            seq: record.seq,
            timestamp: Timestamp::parse(record.timestamp.as_str())?,
            payload: EventPayload::from_json(record.event_type, record.payload)?,
        })
    }
}

#[derive(Serialize)]
struct EventRecordRef<'a> {
    id: &'a EventId,
    seq: u64,
    #[serde(rename = "type")]
    event_type: EventType,
    timestamp: &'a Timestamp,
    payload: Value,
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let payload = self.payload.to_json().map_err(S::Error::custom)?;
        EventRecordRef {
            id: &self.id,
            seq: self.seq,
            event_type: self.payload.event_type(),
            timestamp: &self.timestamp,
            payload,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tags_round_trip() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
            assert_eq!(
                serde_json::to_value(t).unwrap(),
                Value::String(t.as_str().to_string())
            );
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(matches!(
            "NOTE_CREATED".parse::<EventType>(),
            Err(CoreError::UnknownEventType(_))
        ));
    }

    #[test]
    fn payload_schema_rejects_unknown_fields() {
        let err = EventPayload::from_json(
            EventType::CaseLoaded,
            json!({"caseId": "C1", "annotation": "free text"}),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }));
    }

    #[test]
    fn payload_schema_requires_fields() {
        let err = EventPayload::from_json(EventType::CaseLoaded, json!({})).unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }));
    }

    #[test]
    fn malformed_case_id_fails_validation() {
        let payload =
            EventPayload::from_json(EventType::CaseLoaded, json!({"caseId": "case 1"})).unwrap();
        assert!(matches!(
            payload.validate(),
            Err(CoreError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn birads_bounds_are_enforced() {
        let payload = EventPayload::FirstImpressionLocked(FirstImpressionLocked {
            case_id: CaseId::new("C1".into()),
            birads: 7,
            confidence: 3,
            time_to_lock_ms: None,
        });
        assert!(matches!(
            payload.validate(),
            Err(CoreError::InvalidPayload {
                event_type: EventType::FirstImpressionLocked,
                ..
            })
        ));
    }

    #[test]
    fn non_finite_confidence_is_rejected() {
        let payload = EventPayload::AiRevealed(AiRevealed {
            case_id: CaseId::new("C1".into()),
            suggested_birads: 4,
            ai_confidence: f64::NAN,
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn disclosure_uses_for_on_the_wire() {
        let payload = EventPayload::DisclosurePresented(DisclosurePresented {
            case_id: CaseId::new("C1".into()),
            format: "FDR_FOR".into(),
            fdr: 0.04,
            for_rate: 0.12,
        });
        let value = payload.to_json().unwrap();
        assert_eq!(value["for"], json!(0.12));
        assert_eq!(
            EventPayload::from_json(EventType::DisclosurePresented, value).unwrap(),
            payload
        );
    }

    #[test]
    fn event_serializes_in_wire_shape() {
        let event = Event {
            id: EventId::new("e-1".into()),
            seq: 0,
            timestamp: Timestamp::new("2026-01-01T00:00:00.000Z".into()),
            payload: EventPayload::SessionStarted(SessionStarted {
                session_id: SessionId::new("S1".into()),
                reader_id: None,
                protocol_id: None,
            }),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "e-1",
                "seq": 0,
                "type": "SESSION_STARTED",
                "timestamp": "2026-01-01T00:00:00.000Z",
                "payload": {"sessionId": "S1"}
            })
        );
        let back: Event = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn serialized_payload_is_the_typed_json() {
        let payload = EventPayload::AiRevealed(AiRevealed {
            case_id: CaseId::new("C1".into()),
            suggested_birads: 4,
            ai_confidence: 0.87,
        });
        let event = Event {
            id: EventId::new("e-2".into()),
            seq: 1,
            timestamp: Timestamp::new("2026-01-01T00:00:01.000Z".into()),
            payload: payload.clone(),
        };
        let text = serde_json::to_string(&event).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "AI_REVEALED");
        assert_eq!(value["payload"], payload.to_json().unwrap());
    }
}
