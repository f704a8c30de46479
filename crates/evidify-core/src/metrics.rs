use chrono::{DateTime, Utc};
use evidify_canonical::{format_number, CaseId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::events::{Condition, Event, EventPayload, ReadPhase};

/// Read times below this many milliseconds are flagged as too fast.
pub const TOO_FAST_THRESHOLD_MS: u64 = 3000;

/// Value type of a metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Free text or enumerated label.
    Text,
    /// Non-negative integer.
    Integer,
    /// Finite decimal.
    Float,
    /// `true` / `false`.
    Boolean,
}

impl MetricKind {
    /// Label used in the codebook.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Text => "string",
            MetricKind::Integer => "integer",
            MetricKind::Float => "number",
            MetricKind::Boolean => "boolean",
        }
    }
}

/// Column definition of the derived-metrics record.
#[derive(Debug, Clone, Copy)]
pub struct MetricField {
    /// camelCase column name.
    pub name: &'static str,
    /// Value type.
    pub kind: MetricKind,
    /// Codebook description.
    pub description: &'static str,
}

const fn field(name: &'static str, kind: MetricKind, description: &'static str) -> MetricField {
    MetricField {
        name,
        kind,
        description,
    }
}

/// Columns of [`DerivedMetrics`] in export order.
pub const METRIC_FIELDS: &[MetricField] = &[
    field("sessionId", MetricKind::Text, "Session identifier from SESSION_STARTED."),
    field("condition", MetricKind::Text, "Reveal condition from RANDOMIZATION_ASSIGNED."),
    field("eventCount", MetricKind::Integer, "Number of events in the log."),
    field("casesLoaded", MetricKind::Integer, "Distinct cases loaded."),
    field("casesCompleted", MetricKind::Integer, "Distinct cases completed."),
    field("sessionComplete", MetricKind::Boolean, "Whether SESSION_ENDED was recorded."),
    field(
        "decisionChangeCount",
        MetricKind::Integer,
        "Study cases whose final BI-RADS differs from the first impression.",
    ),
    field(
        "sessionMedianPreAiMs",
        MetricKind::Integer,
        "Median pre-AI read time over study cases.",
    ),
    field("attentionChecksPassed", MetricKind::Integer, "Attention checks passed."),
    field("attentionChecksTotal", MetricKind::Integer, "Attention checks answered."),
    field("caseId", MetricKind::Text, "Primary case: the last loaded study case."),
    field("initialBirads", MetricKind::Integer, "BI-RADS locked before AI exposure."),
    field("finalBirads", MetricKind::Integer, "BI-RADS after AI exposure."),
    field("aiBirads", MetricKind::Integer, "BI-RADS suggested by the AI."),
    field("aiConfidence", MetricKind::Float, "AI confidence in [0, 1]."),
    field("changeOccurred", MetricKind::Boolean, "Final differs from initial."),
    field(
        "aiConsistentChange",
        MetricKind::Boolean,
        "Changed, and the final assessment equals the AI suggestion.",
    ),
    field(
        "aiInconsistentChange",
        MetricKind::Boolean,
        "Changed, and the final assessment differs from the AI suggestion.",
    ),
    field(
        "addaDenominator",
        MetricKind::Boolean,
        "Initial assessment disagreed with the AI suggestion.",
    ),
    field(
        "adda",
        MetricKind::Boolean,
        "Agreement with AI after initial disagreement; null outside the denominator.",
    ),
    field("deviationRequired", MetricKind::Boolean, "Final differs from the AI suggestion."),
    field("deviationDocumented", MetricKind::Boolean, "DEVIATION_SUBMITTED recorded."),
    field("deviationSkipped", MetricKind::Boolean, "DEVIATION_SKIPPED recorded."),
    field(
        "preAiReadMs",
        MetricKind::Integer,
        "PRE_AI episode duration, else load to lock delta.",
    ),
    field(
        "postAiReadMs",
        MetricKind::Integer,
        "POST_AI episode duration, else reveal to final delta.",
    ),
    field("timeRatio", MetricKind::Float, "preAiReadMs / postAiReadMs."),
    field(
        "preAiTimeVsMedian",
        MetricKind::Float,
        "preAiReadMs / sessionMedianPreAiMs.",
    ),
    field("lockToRevealMs", MetricKind::Integer, "First impression lock to AI reveal."),
    field("revealToFinalMs", MetricKind::Integer, "AI reveal to final assessment."),
    field(
        "comprehensionCorrect",
        MetricKind::Boolean,
        "Disclosure comprehension answer was correct.",
    ),
    field(
        "timingFlagPreAiTooFast",
        MetricKind::Boolean,
        "preAiReadMs below 3000 ms.",
    ),
    field(
        "timingFlagAiExposureTooFast",
        MetricKind::Boolean,
        "revealToFinalMs below 3000 ms.",
    ),
];

/// A single cell of the metrics row.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Defining event absent.
    Null,
    /// Boolean cell.
    Bool(bool),
    /// Integer cell.
    Int(u64),
    /// Decimal cell.
    Float(f64),
    /// Text cell.
    Text(String),
}

impl MetricValue {
    /// Text rendering for CSV output; null renders as an empty cell.
    pub fn render(&self) -> String {
        match self {
            MetricValue::Null => String::new(),
            MetricValue::Bool(b) => b.to_string(),
            MetricValue::Int(n) => n.to_string(),
            MetricValue::Float(f) => format_number(*f).unwrap_or_default(),
            MetricValue::Text(s) => s.clone(),
        }
    }
}

impl From<Option<bool>> for MetricValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(MetricValue::Null, MetricValue::Bool)
    }
}

impl From<Option<u64>> for MetricValue {
    fn from(value: Option<u64>) -> Self {
        value.map_or(MetricValue::Null, MetricValue::Int)
    }
}

impl From<Option<u8>> for MetricValue {
    fn from(value: Option<u8>) -> Self {
        value.map_or(MetricValue::Null, |v| MetricValue::Int(u64::from(v)))
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(MetricValue::Null, MetricValue::Float)
    }
}

impl From<Option<String>> for MetricValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(MetricValue::Null, MetricValue::Text)
    }
}

/// Fixed-shape metrics record derived from an event sequence.
///
/// `None` means the defining event has not occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct DerivedMetrics {
    pub session_id: Option<String>,
    pub condition: Option<Condition>,
    pub event_count: u64,
    pub cases_loaded: u64,
    pub cases_completed: u64,
    pub session_complete: bool,
    pub decision_change_count: u64,
    pub session_median_pre_ai_ms: Option<u64>,
    pub attention_checks_passed: u64,
    pub attention_checks_total: u64,
    pub case_id: Option<String>,
    pub initial_birads: Option<u8>,
    pub final_birads: Option<u8>,
    pub ai_birads: Option<u8>,
    pub ai_confidence: Option<f64>,
    pub change_occurred: Option<bool>,
    pub ai_consistent_change: Option<bool>,
    pub ai_inconsistent_change: Option<bool>,
    pub adda_denominator: Option<bool>,
    pub adda: Option<bool>,
    pub deviation_required: Option<bool>,
    pub deviation_documented: bool,
    pub deviation_skipped: bool,
    pub pre_ai_read_ms: Option<u64>,
    pub post_ai_read_ms: Option<u64>,
    pub time_ratio: Option<f64>,
    pub pre_ai_time_vs_median: Option<f64>,
    pub lock_to_reveal_ms: Option<u64>,
    pub reveal_to_final_ms: Option<u64>,
    pub comprehension_correct: Option<bool>,
    pub timing_flag_pre_ai_too_fast: Option<bool>,
    pub timing_flag_ai_exposure_too_fast: Option<bool>,
}

impl DerivedMetrics {
    /// Cell values in [`METRIC_FIELDS`] order.
    pub fn values(&self) -> Vec<MetricValue> {
        vec![
            self.session_id.clone().into(),
            self.condition.map(|c| c.as_str().to_string()).into(),
            MetricValue::Int(self.event_count),
            MetricValue::Int(self.cases_loaded),
            MetricValue::Int(self.cases_completed),
            MetricValue::Bool(self.session_complete),
            MetricValue::Int(self.decision_change_count),
            self.session_median_pre_ai_ms.into(),
            MetricValue::Int(self.attention_checks_passed),
            MetricValue::Int(self.attention_checks_total),
            self.case_id.clone().into(),
            self.initial_birads.into(),
            self.final_birads.into(),
            self.ai_birads.into(),
            self.ai_confidence.into(),
            self.change_occurred.into(),
            self.ai_consistent_change.into(),
            self.ai_inconsistent_change.into(),
            self.adda_denominator.into(),
            self.adda.into(),
            self.deviation_required.into(),
            MetricValue::Bool(self.deviation_documented),
            MetricValue::Bool(self.deviation_skipped),
            self.pre_ai_read_ms.into(),
            self.post_ai_read_ms.into(),
            self.time_ratio.into(),
            self.pre_ai_time_vs_median.into(),
            self.lock_to_reveal_ms.into(),
            self.reveal_to_final_ms.into(),
            self.comprehension_correct.into(),
            self.timing_flag_pre_ai_too_fast.into(),
            self.timing_flag_ai_exposure_too_fast.into(),
        ]
    }
}

#[derive(Debug)]
struct CaseState {
    case_id: CaseId,
    loaded: bool,
    is_calibration: bool,
    completed: bool,
    loaded_at: Option<DateTime<Utc>>,
    locked_at: Option<DateTime<Utc>>,
    revealed_at: Option<DateTime<Utc>>,
    final_at: Option<DateTime<Utc>>,
    initial_birads: Option<u8>,
    final_birads: Option<u8>,
    ai_birads: Option<u8>,
    ai_confidence: Option<f64>,
    pre_ai_episode_ms: Option<u64>,
    post_ai_episode_ms: Option<u64>,
    deviation_documented: bool,
    deviation_skipped: bool,
    comprehension_correct: Option<bool>,
}

impl CaseState {
    fn new(case_id: CaseId) -> Self {
        Self {
            case_id,
            loaded: false,
            is_calibration: false,
            completed: false,
            loaded_at: None,
            locked_at: None,
            revealed_at: None,
            final_at: None,
            initial_birads: None,
            final_birads: None,
            ai_birads: None,
            ai_confidence: None,
            pre_ai_episode_ms: None,
            post_ai_episode_ms: None,
            deviation_documented: false,
            deviation_skipped: false,
            comprehension_correct: None,
        }
    }

    fn pre_ai_read_ms(&self) -> Option<u64> {
        self.pre_ai_episode_ms
            .or_else(|| delta_ms(self.loaded_at, self.locked_at))
    }

    fn post_ai_read_ms(&self) -> Option<u64> {
        self.post_ai_episode_ms
            .or_else(|| delta_ms(self.revealed_at, self.final_at))
    }

    fn changed(&self) -> Option<bool> {
        Some(self.initial_birads? != self.final_birads?)
    }
}

/// Cases in first-reference order, with a cursor to the primary case.
#[derive(Default)]
struct Cases {
    states: Vec<CaseState>,
    last_loaded: Option<usize>,
    last_loaded_study: Option<usize>,
}

impl Cases {
    fn index(&mut self, case_id: &CaseId) -> usize {
        match self.states.iter().position(|c| &c.case_id == case_id) {
            Some(idx) => idx,
            None => {
                self.states.push(CaseState::new(case_id.clone()));
                self.states.len() - 1
            }
        }
    }

    fn entry(&mut self, case_id: &CaseId) -> &mut CaseState {
        let idx = self.index(case_id);
        &mut self.states[idx]
    }

    fn load(&mut self, case_id: &CaseId, is_calibration: bool, at: Option<DateTime<Utc>>) {
        let idx = self.index(case_id);
        let state = &mut self.states[idx];
        // A reload keeps the first load time.
        if !state.loaded {
            state.loaded = true;
            state.loaded_at = at;
        }
        state.is_calibration = is_calibration;
        self.last_loaded = Some(idx);
        if !is_calibration {
            self.last_loaded_study = Some(idx);
        }
    }

    fn primary(&self) -> Option<&CaseState> {
        self.last_loaded_study
            .or(self.last_loaded)
            .and_then(|idx| self.states.get(idx))
    }

    fn study(&self) -> impl Iterator<Item = &CaseState> {
        self.states.iter().filter(|c| c.loaded && !c.is_calibration)
    }
}

fn parse_time(ts: &Timestamp) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts.as_str())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn delta_ms(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Option<u64> {
    let millis = (to? - from?).num_milliseconds();
    Some(u64::try_from(millis).unwrap_or(0))
}

fn median(mut values: Vec<u64>) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        let (lo, hi) = (values[mid - 1], values[mid]);
        // Floor of the mean without overflowing on large durations.
        Some(lo / 2 + hi / 2 + (lo % 2 + hi % 2) / 2)
    }
}

fn ratio(numerator: Option<u64>, denominator: Option<u64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0 => Some(n as f64 / d as f64),
        _ => None,
    }
}

/// Derives the metrics record from `events` in the order given.
///
/// Never fails: a partial session yields nulls for anything whose defining
/// event is missing.
pub fn compute_metrics(events: &[Event]) -> DerivedMetrics {
    let mut session_id = None;
    let mut condition = None;
    let mut session_complete = false;
    let mut attention_checks_passed = 0;
    let mut attention_checks_total = 0;
    let mut cases = Cases::default();

    for event in events {
        let at = parse_time(&event.timestamp);
        match &event.payload {
            EventPayload::SessionStarted(p) => session_id = Some(p.session_id.to_string()),
            EventPayload::RandomizationAssigned(p) => condition = Some(p.condition),
            EventPayload::CaseLoaded(p) => cases.load(&p.case_id, p.is_calibration, at),
            EventPayload::ReadEpisodeStarted(_) => {}
            EventPayload::ReadEpisodeEnded(p) => {
                let state = cases.entry(&p.case_id);
                match p.phase {
                    ReadPhase::PreAi => state.pre_ai_episode_ms = Some(p.duration_ms),
                    ReadPhase::PostAi => state.post_ai_episode_ms = Some(p.duration_ms),
                }
            }
            EventPayload::FirstImpressionLocked(p) => {
                let state = cases.entry(&p.case_id);
                state.initial_birads = Some(p.birads);
                state.locked_at = at;
            }
            EventPayload::AiRevealed(p) => {
                let state = cases.entry(&p.case_id);
                state.ai_birads = Some(p.suggested_birads);
                state.ai_confidence = Some(p.ai_confidence);
                state.revealed_at = at;
            }
            EventPayload::DisclosurePresented(_) => {}
            EventPayload::DisclosureComprehensionResponse(p) => {
                cases.entry(&p.case_id).comprehension_correct = Some(p.correct);
            }
            EventPayload::FinalAssessment(p) => {
                let state = cases.entry(&p.case_id);
                state.final_birads = Some(p.birads);
                state.final_at = at;
            }
            EventPayload::DeviationSubmitted(p) => {
                cases.entry(&p.case_id).deviation_documented = true;
            }
            EventPayload::DeviationSkipped(p) => {
                cases.entry(&p.case_id).deviation_skipped = true;
            }
            EventPayload::AttentionCheckResponse(p) => {
                attention_checks_total += 1;
                if p.passed {
                    attention_checks_passed += 1;
                }
            }
            EventPayload::CaseCompleted(p) => cases.entry(&p.case_id).completed = true,
            EventPayload::SessionEnded(_) => session_complete = true,
        }
    }

    let session_median_pre_ai_ms =
        median(cases.study().filter_map(CaseState::pre_ai_read_ms).collect());
    let decision_change_count = cases
        .study()
        .filter(|c| c.changed() == Some(true))
        .count() as u64;

    let mut metrics = DerivedMetrics {
        session_id,
        condition,
        event_count: events.len() as u64,
        cases_loaded: cases.states.iter().filter(|c| c.loaded).count() as u64,
        cases_completed: cases.states.iter().filter(|c| c.completed).count() as u64,
        session_complete,
        decision_change_count,
        session_median_pre_ai_ms,
        attention_checks_passed,
        attention_checks_total,
        case_id: None,
        initial_birads: None,
        final_birads: None,
        ai_birads: None,
        ai_confidence: None,
        change_occurred: None,
        ai_consistent_change: None,
        ai_inconsistent_change: None,
        adda_denominator: None,
        adda: None,
        deviation_required: None,
        deviation_documented: false,
        deviation_skipped: false,
        pre_ai_read_ms: None,
        post_ai_read_ms: None,
        time_ratio: None,
        pre_ai_time_vs_median: None,
        lock_to_reveal_ms: None,
        reveal_to_final_ms: None,
        comprehension_correct: None,
        timing_flag_pre_ai_too_fast: None,
        timing_flag_ai_exposure_too_fast: None,
    };

    if let Some(case) = cases.primary() {
        let changed = case.changed();
        let final_matches_ai = match (case.final_birads, case.ai_birads) {
            (Some(f), Some(ai)) => Some(f == ai),
            _ => None,
        };
        let adda_denominator = match (case.initial_birads, case.ai_birads) {
            (Some(i), Some(ai)) => Some(i != ai),
            _ => None,
        };
        let pre_ai_read_ms = case.pre_ai_read_ms();
        let post_ai_read_ms = case.post_ai_read_ms();
        let reveal_to_final_ms = delta_ms(case.revealed_at, case.final_at);

        metrics.case_id = Some(case.case_id.to_string());
        metrics.initial_birads = case.initial_birads;
        metrics.final_birads = case.final_birads;
        metrics.ai_birads = case.ai_birads;
        metrics.ai_confidence = case.ai_confidence;
        metrics.change_occurred = changed;
        metrics.ai_consistent_change = changed.zip(final_matches_ai).map(|(c, m)| c && m);
        metrics.ai_inconsistent_change = changed.zip(final_matches_ai).map(|(c, m)| c && !m);
        metrics.adda_denominator = adda_denominator;
        metrics.adda = match adda_denominator {
            Some(true) => final_matches_ai,
            _ => None,
        };
        metrics.deviation_required = final_matches_ai.map(|m| !m);
        metrics.deviation_documented = case.deviation_documented;
        metrics.deviation_skipped = case.deviation_skipped;
        metrics.pre_ai_read_ms = pre_ai_read_ms;
        metrics.post_ai_read_ms = post_ai_read_ms;
        metrics.time_ratio = ratio(pre_ai_read_ms, post_ai_read_ms);
        metrics.pre_ai_time_vs_median = ratio(pre_ai_read_ms, session_median_pre_ai_ms);
        metrics.lock_to_reveal_ms = delta_ms(case.locked_at, case.revealed_at);
        metrics.reveal_to_final_ms = reveal_to_final_ms;
        metrics.comprehension_correct = case.comprehension_correct;
        metrics.timing_flag_pre_ai_too_fast = pre_ai_read_ms.map(|ms| ms < TOO_FAST_THRESHOLD_MS);
        metrics.timing_flag_ai_exposure_too_fast =
            reveal_to_final_ms.map(|ms| ms < TOO_FAST_THRESHOLD_MS);
    }

    metrics
}
