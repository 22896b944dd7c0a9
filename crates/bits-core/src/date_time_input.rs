use std::cell::Cell;
use std::rc::Rc;

use chrono::{
  NaiveDate,
  NaiveDateTime,
  Weekday
};
use tracing::info;

use crate::Callback;
use crate::date_range::{
  DateRangeSelector,
  SelectorProps,
  SelectorRole
};
use crate::range_coordinator::{
  RangeChange,
  RangeCoordinator,
  RangeEdit
};
use crate::time_select::{
  HourFormat,
  TimeRangeSelector
};

/// One side of a date-time field: a calendar plus a time column picker
/// sharing an anchor.
#[derive(Debug)]
pub struct DateTimeSide {
  pub date:    DateRangeSelector,
  pub time:    TimeRangeSelector,
  date_picked: Rc<Cell<Option<NaiveDate>>>
}

impl DateTimeSide {
  fn new(
    role: SelectorRole,
    week_start: Weekday,
    today: NaiveDate,
    format: HourFormat,
    initial: NaiveDateTime
  ) -> Self {
    let date_picked =
      Rc::new(Cell::new(None));
    let date_sink = Rc::clone(&date_picked);

    Self {
      date: DateRangeSelector::new(
        role,
        week_start,
        today,
        SelectorProps {
          selected: Some(initial.date()),
          ..SelectorProps::default()
        },
        move |day| date_sink.set(Some(day))
      ),
      time: TimeRangeSelector::new(
        format,
        initial,
        |_| {}
      ),
      date_picked
    }
  }

  #[must_use]
  pub fn value(&self) -> NaiveDateTime {
    self.time.committed()
  }
}

/// Start (and optionally end) date-time pair with cross-field
/// consistency between the two date sides.
pub struct DateTimeInput {
  range:          RangeCoordinator,
  from:           DateTimeSide,
  to:             Option<DateTimeSide>,
  on_from_change: Callback<NaiveDateTime>,
  on_to_change:   Callback<Option<NaiveDateTime>>
}

impl std::fmt::Debug for DateTimeInput {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    f.debug_struct("DateTimeInput")
      .field("range", &self.range)
      .field("from", &self.from)
      .field("to", &self.to)
      .finish_non_exhaustive()
  }
}

impl DateTimeInput {
  pub fn new(
    format: HourFormat,
    week_start: Weekday,
    today: NaiveDate,
    from: NaiveDateTime,
    to: Option<NaiveDateTime>,
    on_from_change: impl FnMut(
      NaiveDateTime
    ) + 'static,
    on_to_change: impl FnMut(
      Option<NaiveDateTime>
    ) + 'static
  ) -> Self {
    let mut range = RangeCoordinator::new();
    range.apply(RangeEdit::Start(from.date()));
    let to = to.map(|initial| {
      range.apply(RangeEdit::End(
        initial.date()
      ));
      DateTimeSide::new(
        SelectorRole::End,
        week_start,
        today,
        format,
        initial
      )
    });

    let mut input = Self {
      range,
      from: DateTimeSide::new(
        SelectorRole::Start,
        week_start,
        today,
        format,
        from
      ),
      to,
      on_from_change: Box::new(
        on_from_change
      ),
      on_to_change: Box::new(on_to_change)
    };
    input.sync_selectors();
    input
  }

  #[must_use]
  pub fn start_side(&self) -> &DateTimeSide {
    &self.from
  }

  pub fn start_side_mut(
    &mut self
  ) -> &mut DateTimeSide {
    &mut self.from
  }

  #[must_use]
  pub fn end_side(&self) -> Option<&DateTimeSide> {
    self.to.as_ref()
  }

  pub fn end_side_mut(
    &mut self
  ) -> Option<&mut DateTimeSide> {
    self.to.as_mut()
  }

  /// Picks a start day, keeping the start time of day.
  pub fn select_from_day(
    &mut self,
    day: NaiveDate
  ) -> bool {
    self.from.date.select_day(day);
    let Some(day) =
      self.from.date_picked.take()
    else {
      return false;
    };

    self.from.time.set_anchor_date(day);
    let change =
      self.range.apply(RangeEdit::Start(day));
    self.sync_selectors();
    (self.on_from_change)(self.from.value());

    if change == RangeChange::EndCleared {
      info!(%day, "start moved past end; clearing end");
      (self.on_to_change)(None);
    }
    true
  }

  pub fn select_to_day(
    &mut self,
    day: NaiveDate
  ) -> bool {
    let Some(side) = self.to.as_mut() else {
      return false;
    };
    side.date.select_day(day);
    let Some(day) = side.date_picked.take()
    else {
      return false;
    };
    if self.range.apply(RangeEdit::End(day))
      == RangeChange::Rejected
    {
      return false;
    }
    side.time.set_anchor_date(day);
    let value = side.value();
    self.sync_selectors();
    (self.on_to_change)(Some(value));
    true
  }

  /// Commits the start time draft.
  pub fn confirm_from_time(
    &mut self
  ) -> NaiveDateTime {
    let value = self.from.time.confirm();
    (self.on_from_change)(value);
    value
  }

  pub fn confirm_to_time(
    &mut self
  ) -> Option<NaiveDateTime> {
    if self.range.end().is_none() {
      return None;
    }
    let side = self.to.as_mut()?;
    let value = side.time.confirm();
    (self.on_to_change)(Some(value));
    Some(value)
  }

  fn sync_selectors(&mut self) {
    let start = self.range.start();
    let end = self.range.end();
    self.from.date.sync_props(SelectorProps {
      selected:    start,
      range_start: start,
      range_end:   end
    });
    if let Some(side) = self.to.as_mut() {
      side.date.sync_props(SelectorProps {
        selected:    end,
        range_start: start,
        range_end:   end
      });
    }
  }
}
