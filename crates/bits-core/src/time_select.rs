use chrono::{
  NaiveDate,
  NaiveDateTime,
  Timelike
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  warn
};

use crate::Callback;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub enum HourFormat {
  #[default]
  #[serde(rename = "12")]
  TwelveHour,
  #[serde(rename = "24")]
  TwentyFourHour
}

impl HourFormat {
  #[must_use]
  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key.trim() {
      | "12" | "12h" => {
        Some(Self::TwelveHour)
      }
      | "24" | "24h" => {
        Some(Self::TwentyFourHour)
      }
      | _ => None
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Meridiem {
  Am,
  Pm
}

impl Meridiem {
  #[must_use]
  pub fn label(self) -> &'static str {
    match self {
      | Self::Am => "AM",
      | Self::Pm => "PM"
    }
  }

  #[must_use]
  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    if key.eq_ignore_ascii_case("am") {
      Some(Self::Am)
    } else if key
      .eq_ignore_ascii_case("pm")
    {
      Some(Self::Pm)
    } else {
      None
    }
  }
}

/// Time-of-day as shown in the picker columns.
///
/// In 12-hour mode `hour` is the displayed value (12, 1 … 11) and
/// `meridiem` is significant; in 24-hour mode `hour` is 0-23 and
/// `meridiem` only mirrors it.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct TimeSelection {
  pub hour:     u32,
  pub minute:   u32,
  pub second:   u32,
  pub meridiem: Meridiem
}

/// Row index each column is scrolled to.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub struct ColumnScroll {
  pub hour:   usize,
  pub minute: usize,
  pub second: usize
}

#[must_use]
pub fn to_internal_hour(
  hour: u32,
  meridiem: Meridiem,
  format: HourFormat
) -> u32 {
  match format {
    | HourFormat::TwentyFourHour => hour,
    | HourFormat::TwelveHour => {
      match (meridiem, hour % 12) {
        | (Meridiem::Am, h) => h,
        | (Meridiem::Pm, h) => h + 12
      }
    }
  }
}

/// Overwrites the time of day on `anchor`, keeping its date. An
/// out-of-range selection leaves the anchor's time in place.
#[must_use]
pub fn construct_time(
  selection: TimeSelection,
  anchor: NaiveDateTime,
  format: HourFormat
) -> NaiveDateTime {
  let hour = to_internal_hour(
    selection.hour,
    selection.meridiem,
    format
  );
  anchor
    .date()
    .and_hms_opt(
      hour,
      selection.minute,
      selection.second
    )
    .unwrap_or_else(|| {
      warn!(
        hour,
        minute = selection.minute,
        second = selection.second,
        "time selection out of range, keeping anchor"
      );
      anchor
        .with_nanosecond(0)
        .unwrap_or(anchor)
    })
}

#[must_use]
pub fn decompose_time(
  value: NaiveDateTime,
  format: HourFormat
) -> TimeSelection {
  let hour24 = value.hour();
  let meridiem = if hour24 < 12 {
    Meridiem::Am
  } else {
    Meridiem::Pm
  };
  let hour = match format {
    | HourFormat::TwentyFourHour => {
      hour24
    }
    | HourFormat::TwelveHour => {
      match hour24 % 12 {
        | 0 => 12,
        | h => h
      }
    }
  };

  TimeSelection {
    hour,
    minute: value.minute(),
    second: value.second(),
    meridiem
  }
}

#[must_use]
pub fn hour_values(
  format: HourFormat
) -> Vec<u32> {
  match format {
    | HourFormat::TwelveHour => {
      std::iter::once(12)
        .chain(1..12)
        .collect()
    }
    | HourFormat::TwentyFourHour => {
      (0..24).collect()
    }
  }
}

#[must_use]
pub fn minute_values() -> Vec<u32> {
  (0..60).collect()
}

#[must_use]
pub fn second_values() -> Vec<u32> {
  (0..60).collect()
}

fn hour_row(
  hour: u32,
  format: HourFormat
) -> usize {
  match format {
    | HourFormat::TwelveHour => {
      (hour % 12) as usize
    }
    | HourFormat::TwentyFourHour => {
      hour as usize
    }
  }
}

pub struct TimeRangeSelector {
  format:         HourFormat,
  initial:        NaiveDateTime,
  committed:      NaiveDateTime,
  draft:          TimeSelection,
  scroll:         ColumnScroll,
  on_time_change: Callback<NaiveDateTime>
}

impl std::fmt::Debug for TimeRangeSelector {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    f.debug_struct("TimeRangeSelector")
      .field("format", &self.format)
      .field("committed", &self.committed)
      .field("draft", &self.draft)
      .field("scroll", &self.scroll)
      .finish_non_exhaustive()
  }
}

impl TimeRangeSelector {
  pub fn new(
    format: HourFormat,
    initial: NaiveDateTime,
    on_time_change: impl FnMut(
      NaiveDateTime
    ) + 'static
  ) -> Self {
    let mut selector = Self {
      format,
      initial,
      committed: initial,
      draft: decompose_time(
        initial, format
      ),
      scroll: ColumnScroll::default(),
      on_time_change: Box::new(
        on_time_change
      )
    };
    selector.scroll_to_draft();
    selector
  }

  #[must_use]
  pub fn format(&self) -> HourFormat {
    self.format
  }

  #[must_use]
  pub fn draft(&self) -> TimeSelection {
    self.draft
  }

  #[must_use]
  pub fn committed(
    &self
  ) -> NaiveDateTime {
    self.committed
  }

  #[must_use]
  pub fn scroll(&self) -> ColumnScroll {
    self.scroll
  }

  /// Reseeds from a new initial value prop; a repeated value is a
  /// no-op so in-progress drafts survive unrelated re-renders.
  pub fn sync_initial(
    &mut self,
    initial: NaiveDateTime
  ) {
    if initial == self.initial {
      return;
    }
    debug!(%initial, "time selector reseeded");
    self.initial = initial;
    self.committed = initial;
    self.draft =
      decompose_time(initial, self.format);
    self.scroll_to_draft();
  }

  /// Moves the anchor date, keeping the committed time of day.
  pub fn set_anchor_date(
    &mut self,
    date: NaiveDate
  ) {
    self.committed =
      date.and_time(self.committed.time());
  }

  pub fn select_hour(
    &mut self,
    hour: u32
  ) -> bool {
    if !hour_values(self.format)
      .contains(&hour)
    {
      return false;
    }
    self.draft.hour = hour;
    if self.format
      == HourFormat::TwentyFourHour
    {
      self.draft.meridiem = if hour < 12 {
        Meridiem::Am
      } else {
        Meridiem::Pm
      };
    }
    self.scroll.hour =
      hour_row(hour, self.format);
    true
  }

  pub fn select_minute(
    &mut self,
    minute: u32
  ) -> bool {
    if minute >= 60 {
      return false;
    }
    self.draft.minute = minute;
    self.scroll.minute = minute as usize;
    true
  }

  pub fn select_second(
    &mut self,
    second: u32
  ) -> bool {
    if second >= 60 {
      return false;
    }
    self.draft.second = second;
    self.scroll.second = second as usize;
    true
  }

  pub fn select_meridiem(
    &mut self,
    meridiem: Meridiem
  ) {
    self.draft.meridiem = meridiem;
  }

  #[must_use]
  pub fn construct_time(
    &self
  ) -> NaiveDateTime {
    construct_time(
      self.draft,
      self.committed,
      self.format
    )
  }

  /// Commits the draft and notifies the owner.
  pub fn confirm(
    &mut self
  ) -> NaiveDateTime {
    let value = self.construct_time();
    self.committed = value;
    debug!(%value, "time confirmed");
    (self.on_time_change)(value);
    value
  }

  fn scroll_to_draft(&mut self) {
    self.scroll = ColumnScroll {
      hour:   hour_row(
        self.draft.hour,
        self.format
      ),
      minute: self.draft.minute as usize,
      second: self.draft.second as usize
    };
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::*;

  fn at(
    y: i32,
    m: u32,
    d: u32,
    h: u32,
    min: u32,
    s: u32
  ) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
      .and_then(|day| {
        day.and_hms_opt(h, min, s)
      })
      .expect("valid datetime")
  }

  #[test]
  fn out_of_range_selection_keeps_anchor() {
    let anchor = at(2024, 3, 10, 8, 15, 30);
    let selection = TimeSelection {
      hour:     25,
      minute:   0,
      second:   0,
      meridiem: Meridiem::Pm
    };
    assert_eq!(
      construct_time(
        selection,
        anchor,
        HourFormat::TwentyFourHour
      ),
      anchor
    );

    let late = TimeSelection {
      minute: 60,
      ..decompose_time(
        anchor,
        HourFormat::TwelveHour
      )
    };
    assert_eq!(
      construct_time(
        late,
        anchor,
        HourFormat::TwelveHour
      ),
      anchor
    );
  }

  #[test]
  fn twelve_hour_conversion_edges() {
    let f = HourFormat::TwelveHour;
    assert_eq!(
      to_internal_hour(12, Meridiem::Am, f),
      0
    );
    assert_eq!(
      to_internal_hour(12, Meridiem::Pm, f),
      12
    );
    assert_eq!(
      to_internal_hour(1, Meridiem::Pm, f),
      13
    );
    assert_eq!(
      to_internal_hour(11, Meridiem::Am, f),
      11
    );
    assert_eq!(
      to_internal_hour(
        17,
        Meridiem::Am,
        HourFormat::TwentyFourHour
      ),
      17
    );
  }

  #[test]
  fn construct_and_decompose_round_trip_all_hours(
  ) {
    let anchor = at(2024, 3, 10, 7, 8, 9);
    for format in [
      HourFormat::TwelveHour,
      HourFormat::TwentyFourHour
    ] {
      for hour in 0..24 {
        let source =
          at(2020, 1, 1, hour, 42, 17);
        let selection =
          decompose_time(source, format);
        let built = construct_time(
          selection, anchor, format
        );

        assert_eq!(built.date(), anchor.date());
        assert_eq!(built.hour(), hour);
        assert_eq!(
          decompose_time(built, format),
          selection,
          "{format:?} hour {hour}"
        );
      }
    }
  }

  #[test]
  fn construct_zeroes_subseconds() {
    let anchor = at(2024, 3, 10, 7, 8, 9)
      .with_nanosecond(123_000_000)
      .expect("valid nanos");
    let built = construct_time(
      TimeSelection {
        hour:     3,
        minute:   4,
        second:   5,
        meridiem: Meridiem::Pm
      },
      anchor,
      HourFormat::TwelveHour
    );
    assert_eq!(built, at(2024, 3, 10, 15, 4, 5));
  }

  #[test]
  fn hour_column_lists_twelve_first() {
    let hours =
      hour_values(HourFormat::TwelveHour);
    assert_eq!(hours.len(), 12);
    assert_eq!(hours[0], 12);
    assert_eq!(hours[11], 11);
    assert_eq!(
      hour_values(HourFormat::TwentyFourHour)
        .len(),
      24
    );
  }

  #[test]
  fn draft_edits_commit_only_on_confirm() {
    let seen = Rc::new(RefCell::new(
      Vec::new()
    ));
    let sink = Rc::clone(&seen);
    let initial = at(2024, 3, 10, 9, 30, 0);
    let mut selector = TimeRangeSelector::new(
      HourFormat::TwelveHour,
      initial,
      move |value| sink.borrow_mut().push(value)
    );

    assert!(selector.select_hour(12));
    assert!(selector.select_minute(5));
    assert!(selector.select_second(59));
    selector.select_meridiem(Meridiem::Am);
    assert!(!selector.select_hour(0));
    assert!(!selector.select_minute(60));

    assert!(seen.borrow().is_empty());
    assert_eq!(selector.committed(), initial);
    assert_eq!(
      selector.scroll(),
      ColumnScroll {
        hour:   0,
        minute: 5,
        second: 59
      }
    );

    let value = selector.confirm();
    assert_eq!(value, at(2024, 3, 10, 0, 5, 59));
    assert_eq!(*seen.borrow(), vec![value]);
    assert_eq!(selector.committed(), value);
  }

  #[test]
  fn reseeds_only_when_initial_changes() {
    let initial = at(2024, 3, 10, 14, 0, 0);
    let mut selector = TimeRangeSelector::new(
      HourFormat::TwentyFourHour,
      initial,
      |_| {}
    );
    assert!(selector.select_hour(3));

    selector.sync_initial(initial);
    assert_eq!(selector.draft().hour, 3);

    let next = at(2024, 4, 1, 22, 15, 0);
    selector.sync_initial(next);
    assert_eq!(selector.draft().hour, 22);
    assert_eq!(selector.draft().meridiem, Meridiem::Pm);
    assert_eq!(selector.committed(), next);
    assert_eq!(selector.scroll().hour, 22);
  }
}
