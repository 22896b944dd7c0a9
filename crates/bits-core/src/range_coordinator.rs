use chrono::NaiveDate;
use tracing::debug;

/// The two-sided selection held by a range composite.
///
/// Both sides only change through [`RangeCoordinator::apply`], which
/// keeps `start <= end` whenever both are present.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct RangeCoordinator {
  start: Option<NaiveDate>,
  end:   Option<NaiveDate>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEdit {
  Start(NaiveDate),
  End(NaiveDate),
  Clear
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeChange {
  Applied,
  /// The new start moved past the old end, which was dropped.
  EndCleared,
  /// An end before the current start; nothing changed.
  Rejected
}

impl RangeCoordinator {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn start(&self) -> Option<NaiveDate> {
    self.start
  }

  #[must_use]
  pub fn end(&self) -> Option<NaiveDate> {
    self.end
  }

  #[must_use]
  pub fn is_complete(&self) -> bool {
    self.start.is_some()
      && self.end.is_some()
  }

  pub fn apply(
    &mut self,
    edit: RangeEdit
  ) -> RangeChange {
    let change = match edit {
      | RangeEdit::Start(day) => {
        self.start = Some(day);
        match self.end {
          | Some(end) if end < day => {
            self.end = None;
            RangeChange::EndCleared
          }
          | _ => RangeChange::Applied
        }
      }
      | RangeEdit::End(day) => {
        match self.start {
          | Some(start) if day < start => {
            RangeChange::Rejected
          }
          | _ => {
            self.end = Some(day);
            RangeChange::Applied
          }
        }
      }
      | RangeEdit::Clear => {
        self.start = None;
        self.end = None;
        RangeChange::Applied
      }
    };

    debug!(
      ?edit,
      ?change,
      start = ?self.start,
      end = ?self.end,
      "range edit"
    );
    change
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::calendar_grid::add_days;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn start_after_end_clears_end() {
    let mut range = RangeCoordinator::new();
    assert_eq!(
      range.apply(RangeEdit::Start(date(
        2024, 3, 1
      ))),
      RangeChange::Applied
    );
    assert_eq!(
      range.apply(RangeEdit::End(date(
        2024, 3, 5
      ))),
      RangeChange::Applied
    );

    assert_eq!(
      range.apply(RangeEdit::Start(date(
        2024, 3, 9
      ))),
      RangeChange::EndCleared
    );
    assert_eq!(
      range.start(),
      Some(date(2024, 3, 9))
    );
    assert_eq!(range.end(), None);
  }

  #[test]
  fn start_equal_to_end_keeps_end() {
    let mut range = RangeCoordinator::new();
    range.apply(RangeEdit::End(date(
      2024, 3, 5
    )));
    assert_eq!(
      range.apply(RangeEdit::Start(date(
        2024, 3, 5
      ))),
      RangeChange::Applied
    );
    assert!(range.is_complete());
  }

  #[test]
  fn end_before_start_is_rejected() {
    let mut range = RangeCoordinator::new();
    range.apply(RangeEdit::Start(date(
      2024, 3, 10
    )));
    assert_eq!(
      range.apply(RangeEdit::End(date(
        2024, 3, 9
      ))),
      RangeChange::Rejected
    );
    assert_eq!(range.end(), None);
  }

  #[test]
  fn later_start_always_clears_earlier_end() {
    let base = date(2024, 1, 1);
    for a in 1..40_i64 {
      for b in 0..a {
        let later = add_days(base, a);
        let earlier = add_days(base, b);
        let mut range = RangeCoordinator::new();
        range.apply(RangeEdit::End(earlier));
        assert_eq!(
          range.apply(RangeEdit::Start(later)),
          RangeChange::EndCleared
        );
        assert_eq!(range.end(), None);
        assert_eq!(
          range.apply(RangeEdit::End(earlier)),
          RangeChange::Rejected
        );
        assert_eq!(range.end(), None);
      }
    }
  }

  #[test]
  fn clear_resets_both_sides() {
    let mut range = RangeCoordinator::new();
    range.apply(RangeEdit::Start(date(
      2024, 3, 10
    )));
    range.apply(RangeEdit::Clear);
    assert_eq!(range, RangeCoordinator::new());
  }
}
