use std::time::{Duration, Instant};

/// Accumulates how long a watched element has been on screen.
///
/// `shown` opens an interval, `hidden` folds it into the running total.
/// The total is non-negative and never decreases within a session; time
/// spent visible contributes nothing until the element is hidden (or the
/// clock is finalized at teardown).
#[derive(Debug, Default)]
pub struct DwellClock {
    visible_since: Option<Instant>,
    accumulated: Duration,
}

impl DwellClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&mut self, at: Instant) {
        if self.visible_since.is_none() {
            self.visible_since = Some(at);
        }
    }

    pub fn hidden(&mut self, at: Instant) {
        if let Some(since) = self.visible_since.take() {
            self.accumulated += at.saturating_duration_since(since);
        }
    }

    /// Close any open interval; used on visibility-hidden and teardown.
    pub fn finalize(&mut self, at: Instant) {
        self.hidden(at);
    }

    pub fn total(&self) -> Duration {
        self.accumulated
    }

    pub fn total_secs(&self) -> f64 {
        self.accumulated.as_secs_f64()
    }
}
