use chrono::{DateTime, Duration, SecondsFormat, Utc};
use evidify_canonical::Timestamp;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the `timestamp` an [`EventLog`](crate::EventLog) stamps on each append.
///
/// Timestamps come from the recording machine and are not trusted by the
/// verifier beyond monotonicity.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Renders an instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_timestamp(instant: DateTime<Utc>) -> Timestamp {
    Timestamp::new(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Clock that advances by a fixed step on every reading.
///
/// The first reading returns `start`.
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    step_ms: i64,
    ticks: AtomicI64,
}

impl SteppingClock {
    /// Creates a clock starting at `start` and advancing by `step` per reading.
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            start,
            step_ms: step.num_milliseconds(),
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::milliseconds(tick.saturating_mul(self.step_ms))
    }
}
