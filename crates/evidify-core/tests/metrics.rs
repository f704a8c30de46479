use evidify_canonical::{CaseId, EventId, SessionId, Timestamp};
use evidify_core::{
    compute_metrics, AiRevealed, AttentionCheckResponse, CaseCompleted, CaseLoaded, Condition,
    DeviationSubmitted, DisclosureComprehensionResponse, Event, EventPayload, FinalAssessment,
    FirstImpressionLocked, RandomizationAssigned, ReadEpisodeEnded, ReadPhase, SessionEnded,
    SessionStarted, MetricValue, METRIC_FIELDS,
};

/// Builds events one second apart unless an explicit offset is given.
struct Session {
    events: Vec<Event>,
}

impl Session {
    fn new() -> Self {
        Self { events: Vec::new() }
    }

    fn at(&mut self, offset_ms: u64, payload: EventPayload) -> &mut Self {
        let secs = offset_ms / 1000;
        let millis = offset_ms % 1000;
        let seq = self.events.len() as u64;
        self.events.push(Event {
            id: EventId::new(format!("e-{seq}")),
            seq,
            timestamp: Timestamp::new(format!(
                "2026-01-01T00:{:02}:{:02}.{:03}Z",
                secs / 60,
                secs % 60,
                millis
            )),
            payload,
        });
        self
    }
}

fn case(id: &str) -> CaseId {
    CaseId::new(id.to_string())
}

fn loaded(id: &str, is_calibration: bool) -> EventPayload {
    EventPayload::CaseLoaded(CaseLoaded {
        case_id: case(id),
        is_calibration,
    })
}

fn locked(id: &str, birads: u8) -> EventPayload {
    EventPayload::FirstImpressionLocked(FirstImpressionLocked {
        case_id: case(id),
        birads,
        confidence: 3,
        time_to_lock_ms: None,
    })
}

fn revealed(id: &str, birads: u8) -> EventPayload {
    EventPayload::AiRevealed(AiRevealed {
        case_id: case(id),
        suggested_birads: birads,
        ai_confidence: 0.87,
    })
}

fn final_assessment(id: &str, birads: u8) -> EventPayload {
    EventPayload::FinalAssessment(FinalAssessment {
        case_id: case(id),
        birads,
        confidence: 4,
    })
}

#[test]
fn empty_session_yields_nulls() {
    let metrics = compute_metrics(&[]);
    assert_eq!(metrics.event_count, 0);
    assert_eq!(metrics.case_id, None);
    assert_eq!(metrics.adda, None);
    assert!(!metrics.session_complete);
    let values = metrics.values();
    assert_eq!(values.len(), METRIC_FIELDS.len());
    assert_eq!(values[0], MetricValue::Null);
}

#[test]
fn adda_case_after_initial_disagreement() {
    let mut s = Session::new();
    s.at(
        0,
        EventPayload::SessionStarted(SessionStarted {
            session_id: SessionId::new("S1".into()),
            reader_id: None,
            protocol_id: None,
        }),
    )
    .at(
        100,
        EventPayload::RandomizationAssigned(RandomizationAssigned {
            condition: Condition::HumanFirst,
            seed: None,
            method: None,
        }),
    )
    .at(1_000, loaded("C1", false))
    .at(9_000, locked("C1", 2))
    .at(10_000, revealed("C1", 4))
    .at(
        11_000,
        EventPayload::DisclosureComprehensionResponse(DisclosureComprehensionResponse {
            case_id: case("C1"),
            correct: true,
        }),
    )
    .at(12_000, final_assessment("C1", 4))
    .at(
        13_000,
        EventPayload::CaseCompleted(CaseCompleted {
            case_id: case("C1"),
            total_duration_ms: None,
        }),
    )
    .at(14_000, EventPayload::SessionEnded(SessionEnded { reason: None }));

    let m = compute_metrics(&s.events);
    assert_eq!(m.session_id.as_deref(), Some("S1"));
    assert_eq!(m.condition, Some(Condition::HumanFirst));
    assert_eq!(m.event_count, 9);
    assert_eq!(m.cases_loaded, 1);
    assert_eq!(m.cases_completed, 1);
    assert!(m.session_complete);
    assert_eq!(m.case_id.as_deref(), Some("C1"));
    assert_eq!(m.initial_birads, Some(2));
    assert_eq!(m.final_birads, Some(4));
    assert_eq!(m.ai_birads, Some(4));
    assert_eq!(m.change_occurred, Some(true));
    assert_eq!(m.ai_consistent_change, Some(true));
    assert_eq!(m.ai_inconsistent_change, Some(false));
    assert_eq!(m.adda_denominator, Some(true));
    assert_eq!(m.adda, Some(true));
    assert_eq!(m.deviation_required, Some(false));
    assert_eq!(m.decision_change_count, 1);
    assert_eq!(m.pre_ai_read_ms, Some(8_000));
    assert_eq!(m.post_ai_read_ms, Some(2_000));
    assert_eq!(m.time_ratio, Some(4.0));
    assert_eq!(m.session_median_pre_ai_ms, Some(8_000));
    assert_eq!(m.pre_ai_time_vs_median, Some(1.0));
    assert_eq!(m.lock_to_reveal_ms, Some(1_000));
    assert_eq!(m.reveal_to_final_ms, Some(2_000));
    assert_eq!(m.comprehension_correct, Some(true));
    assert_eq!(m.timing_flag_pre_ai_too_fast, Some(false));
    assert_eq!(m.timing_flag_ai_exposure_too_fast, Some(true));
}

#[test]
fn adda_is_null_when_initial_agrees_with_ai() {
    let mut s = Session::new();
    s.at(0, loaded("C1", false))
        .at(5_000, locked("C1", 3))
        .at(6_000, revealed("C1", 3))
        .at(7_000, final_assessment("C1", 4))
        .at(
            8_000,
            EventPayload::DeviationSubmitted(DeviationSubmitted {
                case_id: case("C1"),
                reason_codes: vec!["CLINICAL_JUDGMENT".into()],
                rationale: None,
            }),
        );
    let m = compute_metrics(&s.events);
    assert_eq!(m.adda_denominator, Some(false));
    assert_eq!(m.adda, None);
    assert_eq!(m.change_occurred, Some(true));
    assert_eq!(m.ai_inconsistent_change, Some(true));
    assert_eq!(m.deviation_required, Some(true));
    assert!(m.deviation_documented);
    assert!(!m.deviation_skipped);
}

#[test]
fn partial_case_leaves_later_fields_null() {
    let mut s = Session::new();
    s.at(0, loaded("C1", false)).at(2_000, locked("C1", 1));
    let m = compute_metrics(&s.events);
    assert_eq!(m.initial_birads, Some(1));
    assert_eq!(m.final_birads, None);
    assert_eq!(m.change_occurred, None);
    assert_eq!(m.adda_denominator, None);
    assert_eq!(m.post_ai_read_ms, None);
    assert_eq!(m.time_ratio, None);
    assert_eq!(m.timing_flag_pre_ai_too_fast, Some(true));
    assert_eq!(m.timing_flag_ai_exposure_too_fast, None);
}

#[test]
fn episode_durations_take_precedence_over_deltas() {
    let mut s = Session::new();
    s.at(0, loaded("C1", false))
        .at(
            1_000,
            EventPayload::ReadEpisodeEnded(ReadEpisodeEnded {
                case_id: case("C1"),
                phase: ReadPhase::PreAi,
                duration_ms: 4_321,
            }),
        )
        .at(10_000, locked("C1", 2));
    let m = compute_metrics(&s.events);
    assert_eq!(m.pre_ai_read_ms, Some(4_321));
}

#[test]
fn primary_case_skips_calibration() {
    let mut s = Session::new();
    s.at(0, loaded("C1", false))
        .at(4_000, locked("C1", 2))
        .at(5_000, loaded("CAL", true))
        .at(6_000, locked("CAL", 5));
    let m = compute_metrics(&s.events);
    assert_eq!(m.case_id.as_deref(), Some("C1"));
    assert_eq!(m.cases_loaded, 2);
    // Calibration read time is excluded from the session median.
    assert_eq!(m.session_median_pre_ai_ms, Some(4_000));
}

#[test]
fn attention_checks_are_counted() {
    let mut s = Session::new();
    for (i, passed) in [true, false, true].into_iter().enumerate() {
        s.at(
            i as u64 * 1_000,
            EventPayload::AttentionCheckResponse(AttentionCheckResponse {
                check_id: format!("ac-{i}"),
                passed,
            }),
        );
    }
    let m = compute_metrics(&s.events);
    assert_eq!(m.attention_checks_passed, 2);
    assert_eq!(m.attention_checks_total, 3);
}

#[test]
fn metrics_are_deterministic() {
    let mut s = Session::new();
    s.at(0, loaded("C1", false))
        .at(3_500, locked("C1", 4))
        .at(4_000, revealed("C1", 2))
        .at(9_000, final_assessment("C1", 2));
    assert_eq!(compute_metrics(&s.events), compute_metrics(&s.events));
}

#[test]
fn huge_episode_durations_do_not_overflow_the_median() {
    let long_read = |id: &str| {
        EventPayload::ReadEpisodeEnded(ReadEpisodeEnded {
            case_id: case(id),
            phase: ReadPhase::PreAi,
            duration_ms: u64::MAX - 1,
        })
    };
    let mut s = Session::new();
    s.at(0, loaded("C1", false))
        .at(1_000, long_read("C1"))
        .at(2_000, loaded("C2", false))
        .at(3_000, long_read("C2"));
    let m = compute_metrics(&s.events);
    assert_eq!(m.session_median_pre_ai_ms, Some(u64::MAX - 1));
    assert_eq!(m.pre_ai_read_ms, Some(u64::MAX - 1));
    assert_eq!(m.pre_ai_time_vs_median, Some(1.0));
}
