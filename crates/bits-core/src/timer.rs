use std::time::{
  Duration,
  Instant
};

use chrono::{
  DateTime,
  TimeZone
};
use tracing::trace;

/// Single-shot deadline that is polled rather than called back.
///
/// Every `arm` bumps the generation and returns it as a token. `poll`
/// reports the token of the activation that fired, so a superseded
/// activation can never be reported.
#[derive(Debug, Clone, Default)]
pub struct Timeout {
  deadline:   Option<Instant>,
  generation: u64
}

impl Timeout {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn arm(
    &mut self,
    now: Instant,
    after: Duration
  ) -> u64 {
    self.generation += 1;
    self.deadline = Some(now + after);
    trace!(
      generation = self.generation,
      after_ms = after.as_millis(),
      "timeout armed"
    );
    self.generation
  }

  pub fn cancel(&mut self) {
    self.deadline = None;
  }

  #[must_use]
  pub fn is_pending(&self) -> bool {
    self.deadline.is_some()
  }

  /// Yields the firing generation exactly once, on the first poll at
  /// or past the deadline.
  pub fn poll(
    &mut self,
    now: Instant
  ) -> Option<u64> {
    match self.deadline {
      | Some(deadline) if now >= deadline => {
        self.deadline = None;
        trace!(
          generation = self.generation,
          "timeout fired"
        );
        Some(self.generation)
      }
      | _ => None
    }
  }
}

/// Wall-clock display that re-samples at a fixed interval.
#[derive(Debug, Clone)]
pub struct ClockDisplay<Tz: TimeZone> {
  interval:  Duration,
  next_due:  Option<Instant>,
  current:   Option<DateTime<Tz>>,
  format:    String
}

impl<Tz: TimeZone> ClockDisplay<Tz>
where
  Tz::Offset: std::fmt::Display
{
  #[must_use]
  pub fn new(
    interval: Duration,
    format: impl Into<String>
  ) -> Self {
    Self {
      interval,
      next_due: None,
      current: None,
      format: format.into()
    }
  }

  /// Samples the clock when the interval has elapsed. Returns whether
  /// the displayed value was refreshed.
  pub fn poll(
    &mut self,
    now: Instant,
    sample: impl FnOnce() -> DateTime<Tz>
  ) -> bool {
    if self
      .next_due
      .is_some_and(|due| now < due)
    {
      return false;
    }
    self.current = Some(sample());
    self.next_due = Some(now + self.interval);
    true
  }

  #[must_use]
  pub fn text(&self) -> Option<String> {
    self.current.as_ref().map(|value| {
      value
        .format(self.format.as_str())
        .to_string()
    })
  }
}
