use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use tracing::{
  debug,
  trace
};

use crate::Callback;
use crate::calendar_grid::{
  CalendarDay,
  build_month_grid,
  first_day_of_month,
  shift_months
};

const YEAR_WINDOW_RADIUS: i32 = 4;
const YEAR_BLOCK_STEP: i32 = 12;

pub const MONTH_LABELS: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May",
  "Jun", "Jul", "Aug", "Sep", "Oct",
  "Nov", "Dec"
];

/// Which side of a range a selector plays. Fixed for the selector's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorRole {
  Start,
  End
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum OverlayView {
  Months,
  Years
}

/// Month/year jump overlay opened from the month title.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct MonthYearOverlay {
  pub view:         OverlayView,
  pub picked_month: u32,
  pub year_center:  i32
}

impl MonthYearOverlay {
  #[must_use]
  pub fn years(&self) -> Vec<i32> {
    (self.year_center - YEAR_WINDOW_RADIUS
      ..=self.year_center
        + YEAR_WINDOW_RADIUS)
      .collect()
  }
}

/// Parent-supplied values a selector renders against.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub struct SelectorProps {
  pub selected:    Option<NaiveDate>,
  pub range_start: Option<NaiveDate>,
  pub range_end:   Option<NaiveDate>
}

/// Visual flags for one grid cell.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub struct DayClasses {
  pub in_range:      bool,
  pub range_start:   bool,
  pub range_end:     bool,
  pub selected:      bool,
  pub today:         bool,
  pub outside_month: bool,
  pub hoverable:     bool,
  pub bold:          bool,
  pub disabled:      bool
}

impl DayClasses {
  #[must_use]
  pub fn class_names(
    &self
  ) -> Vec<&'static str> {
    [
      (self.in_range, "in-range"),
      (self.range_start, "range-start"),
      (self.range_end, "range-end"),
      (self.selected, "selected"),
      (self.today, "today"),
      (self.outside_month, "outside-month"),
      (self.hoverable, "hoverable"),
      (self.bold, "bold"),
      (self.disabled, "disabled")
    ]
    .into_iter()
    .filter_map(|(on, name)| {
      on.then_some(name)
    })
    .collect()
  }
}

pub struct DateRangeSelector {
  role:           SelectorRole,
  week_start:     Weekday,
  today:          NaiveDate,
  display_month:  NaiveDate,
  props:          SelectorProps,
  overlay:        Option<MonthYearOverlay>,
  on_date_change: Callback<NaiveDate>
}

impl std::fmt::Debug for DateRangeSelector {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    f.debug_struct("DateRangeSelector")
      .field("role", &self.role)
      .field("week_start", &self.week_start)
      .field("today", &self.today)
      .field(
        "display_month",
        &self.display_month
      )
      .field("props", &self.props)
      .field("overlay", &self.overlay)
      .finish_non_exhaustive()
  }
}

impl DateRangeSelector {
  pub fn new(
    role: SelectorRole,
    week_start: Weekday,
    today: NaiveDate,
    props: SelectorProps,
    on_date_change: impl FnMut(NaiveDate)
    + 'static
  ) -> Self {
    let focus = props
      .selected
      .or(match role {
        | SelectorRole::Start => {
          props.range_start
        }
        | SelectorRole::End => {
          props
            .range_end
            .or(props.range_start)
        }
      })
      .unwrap_or(today);

    Self {
      role,
      week_start,
      today,
      display_month: first_day_of_month(
        focus.year(),
        focus.month()
      ),
      props,
      overlay: None,
      on_date_change: Box::new(
        on_date_change
      )
    }
  }

  #[must_use]
  pub fn role(&self) -> SelectorRole {
    self.role
  }

  #[must_use]
  pub fn selected(
    &self
  ) -> Option<NaiveDate> {
    self.props.selected
  }

  #[must_use]
  pub fn display_month(
    &self
  ) -> NaiveDate {
    self.display_month
  }

  #[must_use]
  pub fn title(&self) -> String {
    self
      .display_month
      .format("%B %Y")
      .to_string()
  }

  #[must_use]
  pub fn overlay(
    &self
  ) -> Option<&MonthYearOverlay> {
    self.overlay.as_ref()
  }

  /// Applies a prop update from the owner. Never fires callbacks.
  pub fn sync_props(
    &mut self,
    props: SelectorProps
  ) {
    if self.props != props {
      trace!(?props, role = ?self.role, "selector props updated");
      self.props = props;
    }
  }

  #[must_use]
  pub fn grid(&self) -> Vec<CalendarDay> {
    build_month_grid(
      self.display_month,
      self.today,
      self.week_start
    )
  }

  #[must_use]
  pub fn is_date_selectable(
    &self,
    day: NaiveDate
  ) -> bool {
    match self.role {
      | SelectorRole::Start => true,
      | SelectorRole::End => {
        self
          .props
          .range_start
          .is_none_or(|start| {
            day >= start
          })
      }
    }
  }

  fn is_outside(
    &self,
    day: NaiveDate
  ) -> bool {
    day.year() != self.display_month.year()
      || day.month()
        != self.display_month.month()
  }

  /// Handles a click on `day`. Returns whether the selection changed.
  pub fn select_day(
    &mut self,
    day: NaiveDate
  ) -> bool {
    if !self.is_date_selectable(day)
      || self.is_outside(day)
    {
      debug!(
        %day,
        role = ?self.role,
        "ignored click on disabled day"
      );
      return false;
    }

    self.props.selected = Some(day);
    debug!(%day, role = ?self.role, "day selected");
    (self.on_date_change)(day);
    true
  }

  pub fn previous_month(&mut self) {
    self.display_month =
      shift_months(self.display_month, -1);
  }

  pub fn next_month(&mut self) {
    self.display_month =
      shift_months(self.display_month, 1);
  }

  pub fn toggle_overlay(&mut self) {
    self.overlay = match self.overlay {
      | Some(_) => None,
      | None => {
        Some(MonthYearOverlay {
          view:         OverlayView::Months,
          picked_month: self
            .display_month
            .month(),
          year_center:  self
            .display_month
            .year()
        })
      }
    };
  }

  /// Picks a month in the overlay and moves it to the year view.
  pub fn pick_month(
    &mut self,
    month: u32
  ) -> bool {
    let Some(overlay) =
      self.overlay.as_mut()
    else {
      return false;
    };
    if !(1..=12).contains(&month) {
      return false;
    }
    overlay.picked_month = month;
    overlay.view = OverlayView::Years;
    true
  }

  pub fn shift_year_block(
    &mut self,
    direction: i32
  ) {
    if let Some(overlay) =
      self.overlay.as_mut()
    {
      overlay.year_center = overlay
        .year_center
        .saturating_add(
          direction.signum()
            * YEAR_BLOCK_STEP
        );
    }
  }

  /// Picks a year, closes the overlay and shows the picked month.
  pub fn pick_year(
    &mut self,
    year: i32
  ) -> bool {
    let Some(overlay) = self.overlay
    else {
      return false;
    };
    self.display_month =
      first_day_of_month(
        year,
        overlay.picked_month
      );
    self.overlay = None;
    debug!(
      month = %self.display_month.format("%Y-%m"),
      "jumped via month/year overlay"
    );
    true
  }

  #[must_use]
  pub fn classify(
    &self,
    day: &CalendarDay
  ) -> DayClasses {
    let date = day.date;
    let SelectorProps {
      selected,
      range_start,
      range_end
    } = self.props;
    let selectable =
      self.is_date_selectable(date);
    let outside =
      day.is_outside_current_month;

    let mut classes = DayClasses::default();

    if let (Some(start), Some(end)) =
      (range_start, range_end)
    {
      classes.in_range =
        date >= start && date <= end;
    }

    classes.range_start =
      range_start == Some(date);
    classes.range_end =
      range_end == Some(date);
    let is_cap =
      classes.range_start || classes.range_end;

    let is_selected =
      selected == Some(date);
    classes.selected =
      is_selected && !is_cap;

    classes.today = day.is_today
      && !classes.in_range
      && !is_selected;

    classes.outside_month = outside;

    classes.hoverable =
      selectable && !outside;

    classes.bold =
      is_selected || day.is_today || is_cap;

    classes.disabled =
      !selectable || outside;

    classes
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn recording_selector(
    role: SelectorRole,
    props: SelectorProps
  ) -> (
    DateRangeSelector,
    Rc<RefCell<Vec<NaiveDate>>>
  ) {
    let seen = Rc::new(RefCell::new(
      Vec::new()
    ));
    let sink = Rc::clone(&seen);
    let selector = DateRangeSelector::new(
      role,
      Weekday::Sun,
      date(2024, 3, 20),
      props,
      move |day| sink.borrow_mut().push(day)
    );
    (selector, seen)
  }

  #[test]
  fn end_selector_rejects_days_before_start() {
    let start = date(2024, 3, 10);
    let (selector, _) = recording_selector(
      SelectorRole::End,
      SelectorProps {
        range_start: Some(start),
        ..SelectorProps::default()
      }
    );

    for offset in -40_i64..40 {
      let day =
        crate::calendar_grid::add_days(
          start, offset
        );
      assert_eq!(
        selector.is_date_selectable(day),
        offset >= 0,
        "offset {offset}"
      );
    }
  }

  #[test]
  fn end_selector_without_start_accepts_all() {
    let (selector, _) = recording_selector(
      SelectorRole::End,
      SelectorProps::default()
    );
    assert!(
      selector
        .is_date_selectable(date(1999, 1, 1))
    );
  }

  #[test]
  fn start_selector_accepts_everything() {
    let (selector, _) = recording_selector(
      SelectorRole::Start,
      SelectorProps {
        range_start: Some(date(2024, 3, 10)),
        range_end: Some(date(2024, 3, 15)),
        selected: None
      }
    );
    assert!(
      selector
        .is_date_selectable(date(2024, 3, 1))
    );
  }

  #[test]
  fn selecting_fires_callback_once_and_reenters() {
    let (mut selector, seen) =
      recording_selector(
        SelectorRole::Start,
        SelectorProps::default()
      );
    assert_eq!(selector.selected(), None);

    assert!(selector.select_day(date(2024, 3, 4)));
    assert!(selector.select_day(date(2024, 3, 6)));

    assert_eq!(
      selector.selected(),
      Some(date(2024, 3, 6))
    );
    assert_eq!(
      *seen.borrow(),
      vec![date(2024, 3, 4), date(2024, 3, 6)]
    );
  }

  #[test]
  fn disabled_and_outside_clicks_are_ignored() {
    let (mut selector, seen) =
      recording_selector(
        SelectorRole::End,
        SelectorProps {
          range_start: Some(date(2024, 3, 10)),
          ..SelectorProps::default()
        }
      );

    assert!(!selector.select_day(date(2024, 3, 9)));
    assert!(!selector.select_day(date(2024, 4, 2)));
    assert!(seen.borrow().is_empty());
  }

  #[test]
  fn month_navigation_ignores_selection() {
    let (mut selector, _) = recording_selector(
      SelectorRole::Start,
      SelectorProps {
        selected: Some(date(2024, 1, 31)),
        ..SelectorProps::default()
      }
    );
    selector.previous_month();
    assert_eq!(
      selector.display_month(),
      date(2023, 12, 1)
    );
    selector.next_month();
    selector.next_month();
    assert_eq!(
      selector.display_month(),
      date(2024, 2, 1)
    );
    assert_eq!(
      selector.selected(),
      Some(date(2024, 1, 31))
    );
  }

  #[test]
  fn overlay_jumps_month_then_year() {
    let (mut selector, _) = recording_selector(
      SelectorRole::Start,
      SelectorProps::default()
    );
    assert!(!selector.pick_month(5));

    selector.toggle_overlay();
    let overlay =
      selector.overlay().expect("overlay open");
    assert_eq!(overlay.view, OverlayView::Months);
    assert_eq!(
      overlay.years(),
      (2020..=2028).collect::<Vec<_>>()
    );

    assert!(selector.pick_month(7));
    assert_eq!(
      selector
        .overlay()
        .expect("overlay open")
        .view,
      OverlayView::Years
    );

    selector.shift_year_block(-1);
    assert_eq!(
      selector
        .overlay()
        .expect("overlay open")
        .years()[0],
      2008
    );

    assert!(selector.pick_year(2010));
    assert!(selector.overlay().is_none());
    assert_eq!(
      selector.display_month(),
      date(2010, 7, 1)
    );
  }

  #[test]
  fn range_shading_has_caps_on_both_ends() {
    let (selector, _) = recording_selector(
      SelectorRole::Start,
      SelectorProps {
        selected: Some(date(2024, 3, 10)),
        range_start: Some(date(2024, 3, 10)),
        range_end: Some(date(2024, 3, 15))
      }
    );

    for cell in selector.grid() {
      let classes = selector.classify(&cell);
      let in_window = cell.date
        >= date(2024, 3, 10)
        && cell.date <= date(2024, 3, 15);
      assert_eq!(classes.in_range, in_window, "{}", cell.date);
      assert_eq!(
        classes.range_start,
        cell.date == date(2024, 3, 10)
      );
      assert_eq!(
        classes.range_end,
        cell.date == date(2024, 3, 15)
      );
      assert!(!classes.selected);
    }
  }

  #[test]
  fn today_marker_yields_to_selection_and_range() {
    let (selector, _) = recording_selector(
      SelectorRole::Start,
      SelectorProps {
        selected: Some(date(2024, 3, 20)),
        ..SelectorProps::default()
      }
    );
    let today = CalendarDay {
      date: date(2024, 3, 20),
      is_outside_current_month: false,
      is_today: true
    };
    let classes = selector.classify(&today);
    assert!(classes.selected);
    assert!(!classes.today);
    assert!(classes.bold);
    assert_eq!(
      classes.class_names(),
      vec!["selected", "hoverable", "bold"]
    );
  }

  #[test]
  fn outside_days_are_faded_and_disabled() {
    let (selector, _) = recording_selector(
      SelectorRole::Start,
      SelectorProps::default()
    );
    let cell = selector
      .grid()
      .into_iter()
      .find(|cell| {
        cell.is_outside_current_month
      })
      .expect("march 2024 has padding");
    let classes = selector.classify(&cell);
    assert!(classes.outside_month);
    assert!(classes.disabled);
    assert!(!classes.hoverable);
  }
}
