use std::cell::Cell;
use std::rc::Rc;

use chrono::{
  NaiveDate,
  Weekday
};
use tracing::{
  debug,
  info
};

use crate::Callback;
use crate::date_range::{
  DateRangeSelector,
  SelectorProps,
  SelectorRole
};
use crate::panel::{
  AnchoredPanel,
  ElementId,
  HorizontalAlign,
  ListenerRegistry,
  PanelPosition,
  Rect,
  ScrollOffset
};
use crate::range_coordinator::{
  RangeChange,
  RangeCoordinator,
  RangeEdit
};

const LABEL_FORMAT: &str = "%b %-d, %Y";

/// Owner-supplied configuration of a date input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateInputProps {
  pub placeholder:      String,
  pub ranged:           bool,
  pub horizontal_align: HorizontalAlign,
  pub ghost:            bool
}

impl Default for DateInputProps {
  fn default() -> Self {
    Self {
      placeholder:      "Select date"
        .to_string(),
      ranged:           false,
      horizontal_align:
        HorizontalAlign::Left,
      ghost:            false
    }
  }
}

/// Upward reporting channel for the finalised `{from, to}` pair.
pub struct DateInputCallbacks {
  pub set_current_display_date:
    Callback<NaiveDate>,
  pub set_current_display_date_end:
    Callback<Option<NaiveDate>>
}

impl DateInputCallbacks {
  pub fn new(
    on_from: impl FnMut(NaiveDate) + 'static,
    on_to: impl FnMut(Option<NaiveDate>)
    + 'static
  ) -> Self {
    Self {
      set_current_display_date: Box::new(
        on_from
      ),
      set_current_display_date_end:
        Box::new(on_to)
    }
  }
}

type Picked = Rc<Cell<Option<NaiveDate>>>;

fn picking_selector(
  role: SelectorRole,
  week_start: Weekday,
  today: NaiveDate
) -> (DateRangeSelector, Picked) {
  let picked: Picked =
    Rc::new(Cell::new(None));
  let sink = Rc::clone(&picked);
  let selector = DateRangeSelector::new(
    role,
    week_start,
    today,
    SelectorProps::default(),
    move |day| sink.set(Some(day))
  );
  (selector, picked)
}

/// Date field with a dropdown calendar, optionally two-sided.
pub struct DateInput {
  props:       DateInputProps,
  panel:       AnchoredPanel,
  range:       RangeCoordinator,
  from:        DateRangeSelector,
  from_picked: Picked,
  to:          Option<(DateRangeSelector, Picked)>,
  callbacks:   DateInputCallbacks
}

impl std::fmt::Debug for DateInput {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    f.debug_struct("DateInput")
      .field("props", &self.props)
      .field("panel", &self.panel)
      .field("range", &self.range)
      .finish_non_exhaustive()
  }
}

impl DateInput {
  pub fn new(
    props: DateInputProps,
    ids: (ElementId, ElementId),
    registry: &ListenerRegistry,
    week_start: Weekday,
    today: NaiveDate,
    callbacks: DateInputCallbacks
  ) -> Self {
    let (trigger, panel_id) = ids;
    let (from, from_picked) =
      picking_selector(
        SelectorRole::Start,
        week_start,
        today
      );
    let to = props.ranged.then(|| {
      picking_selector(
        SelectorRole::End,
        week_start,
        today
      )
    });

    Self {
      panel: AnchoredPanel::new(
        trigger,
        panel_id,
        props.horizontal_align,
        registry
      ),
      props,
      range: RangeCoordinator::new(),
      from,
      from_picked,
      to,
      callbacks
    }
  }

  #[must_use]
  pub fn props(&self) -> &DateInputProps {
    &self.props
  }

  #[must_use]
  pub fn range(&self) -> RangeCoordinator {
    self.range
  }

  #[must_use]
  pub fn is_open(&self) -> bool {
    self.panel.is_open()
  }

  #[must_use]
  pub fn panel_position(
    &self
  ) -> Option<PanelPosition> {
    self.panel.position()
  }

  #[must_use]
  pub fn from_selector(
    &self
  ) -> &DateRangeSelector {
    &self.from
  }

  pub fn from_selector_mut(
    &mut self
  ) -> &mut DateRangeSelector {
    &mut self.from
  }

  #[must_use]
  pub fn to_selector(
    &self
  ) -> Option<&DateRangeSelector> {
    self.to.as_ref().map(|(sel, _)| sel)
  }

  pub fn to_selector_mut(
    &mut self
  ) -> Option<&mut DateRangeSelector> {
    self.to.as_mut().map(|(sel, _)| sel)
  }

  pub fn toggle(
    &mut self,
    trigger_rect: Rect,
    scroll: ScrollOffset,
    viewport_width: f64
  ) -> bool {
    self.panel.toggle(
      trigger_rect,
      scroll,
      viewport_width
    )
  }

  pub fn pointer_down(
    &mut self,
    path: &[ElementId]
  ) -> bool {
    self.panel.pointer_down(path)
  }

  /// Seeds both sides from owner state without firing callbacks.
  pub fn sync_value(
    &mut self,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>
  ) {
    self.range.apply(RangeEdit::Clear);
    if let Some(day) = from {
      self.range.apply(RangeEdit::Start(day));
    }
    if let Some(day) = to {
      self.range.apply(RangeEdit::End(day));
    }
    self.sync_selectors();
  }

  /// Routes a click on the start calendar.
  pub fn select_from(
    &mut self,
    day: NaiveDate
  ) -> bool {
    self.from.select_day(day);
    let Some(day) = self.from_picked.take()
    else {
      return false;
    };

    let change =
      self.range.apply(RangeEdit::Start(day));
    self.sync_selectors();
    (self.callbacks.set_current_display_date)(
      day
    );
    if change == RangeChange::EndCleared {
      info!(%day, "start moved past end; clearing end");
      (self
        .callbacks
        .set_current_display_date_end)(
        None
      );
    }
    if !self.props.ranged {
      self.panel.close();
    }
    true
  }

  /// Routes a click on the end calendar. A no-op on single inputs.
  pub fn select_to(
    &mut self,
    day: NaiveDate
  ) -> bool {
    let Some((selector, picked)) =
      self.to.as_mut()
    else {
      return false;
    };
    selector.select_day(day);
    let Some(day) = picked.take() else {
      return false;
    };

    if self.range.apply(RangeEdit::End(day))
      == RangeChange::Rejected
    {
      debug!(%day, "end before start rejected");
      return false;
    }
    self.sync_selectors();
    (self
      .callbacks
      .set_current_display_date_end)(
      Some(day)
    );
    self.panel.close();
    true
  }

  #[must_use]
  pub fn label(&self) -> String {
    let fmt = |day: NaiveDate| {
      day.format(LABEL_FORMAT).to_string()
    };
    match (
      self.range.start(),
      self.range.end(),
      self.props.ranged
    ) {
      | (None, _, _) => {
        self.props.placeholder.clone()
      }
      | (Some(start), _, false) => {
        fmt(start)
      }
      | (Some(start), Some(end), true) => {
        format!(
          "{} - {}",
          fmt(start),
          fmt(end)
        )
      }
      | (Some(start), None, true) => {
        format!("{} - …", fmt(start))
      }
    }
  }

  #[must_use]
  pub fn trigger_class_names(
    &self
  ) -> Vec<&'static str> {
    let mut names = vec!["date-input"];
    if self.props.ghost {
      names.push("ghost");
    }
    if self.range.start().is_none() {
      names.push("placeholder");
    }
    if self.panel.is_open() {
      names.push("open");
    }
    names
  }

  fn sync_selectors(&mut self) {
    let start = self.range.start();
    let end = self.range.end();
    self.from.sync_props(SelectorProps {
      selected:    start,
      range_start: start,
      range_end:   end
    });
    if let Some((selector, _)) =
      self.to.as_mut()
    {
      selector.sync_props(SelectorProps {
        selected:    end,
        range_start: start,
        range_end:   end
      });
    }
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  type Log = Rc<RefCell<Vec<String>>>;

  fn ranged_input(
    registry: &ListenerRegistry
  ) -> (DateInput, Log) {
    let log: Log =
      Rc::new(RefCell::new(Vec::new()));
    let from_log = Rc::clone(&log);
    let to_log = Rc::clone(&log);
    let input = DateInput::new(
      DateInputProps {
        placeholder: "Any time".to_string(),
        ranged: true,
        ..DateInputProps::default()
      },
      (ElementId(10), ElementId(11)),
      registry,
      Weekday::Sun,
      date(2024, 3, 1),
      DateInputCallbacks::new(
        move |day| {
          from_log
            .borrow_mut()
            .push(format!("from {day}"));
        },
        move |day| {
          to_log
            .borrow_mut()
            .push(format!("to {day:?}"));
        }
      )
    );
    (input, log)
  }

  #[test]
  fn reports_range_and_clears_stale_end() {
    let registry = ListenerRegistry::new();
    let (mut input, log) =
      ranged_input(&registry);
    assert_eq!(input.label(), "Any time");

    assert!(input.select_from(date(2024, 3, 10)));
    assert!(input.select_to(date(2024, 3, 15)));
    assert_eq!(
      input.label(),
      "Mar 10, 2024 - Mar 15, 2024"
    );

    assert!(input.select_from(date(2024, 3, 20)));
    assert_eq!(input.range().end(), None);
    assert_eq!(
      *log.borrow(),
      vec![
        "from 2024-03-10".to_string(),
        "to Some(2024-03-15)".to_string(),
        "from 2024-03-20".to_string(),
        "to None".to_string(),
      ]
    );
  }

  #[test]
  fn end_calendar_refuses_days_before_start() {
    let registry = ListenerRegistry::new();
    let (mut input, log) =
      ranged_input(&registry);
    input.select_from(date(2024, 3, 10));

    let end_selector = input
      .to_selector()
      .expect("ranged input has end");
    assert!(
      !end_selector
        .is_date_selectable(date(2024, 3, 9))
    );
    assert!(!input.select_to(date(2024, 3, 9)));
    assert_eq!(log.borrow().len(), 1);
  }

  #[test]
  fn selectors_shade_the_committed_range() {
    let registry = ListenerRegistry::new();
    let (mut input, _) =
      ranged_input(&registry);
    input.sync_value(
      Some(date(2024, 3, 10)),
      Some(date(2024, 3, 15))
    );

    let selector = input.from_selector();
    let shaded = selector
      .grid()
      .iter()
      .filter(|cell| {
        selector.classify(cell).in_range
      })
      .count();
    assert_eq!(shaded, 6);
  }

  #[test]
  fn single_input_closes_after_pick() {
    let registry = ListenerRegistry::new();
    let mut input = DateInput::new(
      DateInputProps {
        ghost: true,
        ..DateInputProps::default()
      },
      (ElementId(1), ElementId(2)),
      &registry,
      Weekday::Sun,
      date(2024, 3, 1),
      DateInputCallbacks::new(|_| {}, |_| {})
    );
    assert!(input.to_selector().is_none());
    assert!(input.toggle(
      Rect::default(),
      ScrollOffset::default(),
      800.0
    ));
    assert_eq!(
      input.trigger_class_names(),
      vec!["date-input", "ghost", "placeholder", "open"]
    );

    assert!(input.select_from(date(2024, 3, 5)));
    assert!(!input.is_open());
    assert_eq!(registry.active_count(), 0);
    assert_eq!(input.label(), "Mar 5, 2024");
    assert!(!input.select_to(date(2024, 3, 6)));
  }

  #[test]
  fn outside_click_reaches_the_input_through_the_registry() {
    let registry = ListenerRegistry::new();
    let (mut input, _) =
      ranged_input(&registry);
    input.toggle(
      Rect::default(),
      ScrollOffset::default(),
      800.0
    );

    assert!(!input.pointer_down(&[
      ElementId(50),
      ElementId(11)
    ]));
    assert!(input.is_open());

    assert_eq!(
      registry.dispatch_pointer_down(&[
        ElementId(50)
      ]),
      1
    );
    assert!(!input.is_open());
    assert_eq!(input.panel_position(), None);
    assert!(
      !input
        .trigger_class_names()
        .contains(&"open")
    );
  }
}
