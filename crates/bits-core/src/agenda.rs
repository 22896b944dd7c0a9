use std::time::{
  Duration,
  Instant
};

use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info
};

use crate::calendar_grid::{
  add_days,
  end_of_week,
  first_day_of_month,
  first_day_of_year,
  last_day_of_month,
  last_day_of_year,
  shift_months,
  shift_years,
  start_of_week
};
use crate::timer::Timeout;

pub const DEFAULT_HIGHLIGHT: Duration =
  Duration::from_secs(2);

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
#[serde(rename_all = "lowercase")]
pub enum AgendaMode {
  #[default]
  Week,
  Month,
  Year,
  Custom
}

impl AgendaMode {
  #[must_use]
  pub fn all() -> [Self; 4] {
    [
      Self::Week,
      Self::Month,
      Self::Year,
      Self::Custom
    ]
  }

  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Week => "week",
      | Self::Month => "month",
      | Self::Year => "year",
      | Self::Custom => "custom"
    }
  }

  #[must_use]
  pub fn label(self) -> &'static str {
    match self {
      | Self::Week => "Week",
      | Self::Month => "Month",
      | Self::Year => "Year",
      | Self::Custom => "Custom"
    }
  }

  #[must_use]
  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    Self::all().into_iter().find(|mode| {
      mode
        .as_key()
        .eq_ignore_ascii_case(key.trim())
    })
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
pub struct AgendaWindow {
  pub from: NaiveDate,
  pub to:   NaiveDate,
  pub mode: AgendaMode
}

impl AgendaWindow {
  #[must_use]
  pub fn contains(
    &self,
    day: NaiveDate
  ) -> bool {
    day >= self.from && day <= self.to
  }

  #[must_use]
  pub fn day_count(&self) -> i64 {
    (self.to - self.from).num_days() + 1
  }
}

/// Outcome of a "go to today" activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodayJump {
  /// Anchor moved to today.
  Anchored,
  /// Custom window lay in the past; `to` now reaches today.
  ExtendedTo,
  /// Today was already inside the custom window.
  AlreadyVisible,
  /// Custom window lay in the future; `from` now starts today.
  MovedFrom
}

/// Visible date window of the agenda view and its navigation.
#[derive(Debug, Clone)]
pub struct AgendaWindowCalculator {
  mode:          AgendaMode,
  anchor:        NaiveDate,
  custom:        Option<(NaiveDate, NaiveDate)>,
  week_start:    Weekday,
  highlight:     Timeout,
  highlight_day: Option<NaiveDate>,
  highlight_for: Duration
}

impl AgendaWindowCalculator {
  #[must_use]
  pub fn new(
    mode: AgendaMode,
    anchor: NaiveDate,
    week_start: Weekday
  ) -> Self {
    Self {
      mode,
      anchor,
      custom: (mode == AgendaMode::Custom)
        .then_some((anchor, anchor)),
      week_start,
      highlight: Timeout::new(),
      highlight_day: None,
      highlight_for: DEFAULT_HIGHLIGHT
    }
  }

  #[must_use]
  pub fn with_highlight_duration(
    mut self,
    duration: Duration
  ) -> Self {
    self.highlight_for = duration;
    self
  }

  #[must_use]
  pub fn mode(&self) -> AgendaMode {
    self.mode
  }

  #[must_use]
  pub fn anchor(&self) -> NaiveDate {
    self.anchor
  }

  #[must_use]
  pub fn is_highlighted(&self) -> bool {
    self.highlight.is_pending()
  }

  /// Day targeted by the last "go to today", while its highlight lasts.
  #[must_use]
  pub fn highlighted_day(
    &self
  ) -> Option<NaiveDate> {
    self
      .highlight_day
      .filter(|_| self.highlight.is_pending())
  }

  #[must_use]
  pub fn window(&self) -> AgendaWindow {
    let (from, to) = match self.mode {
      | AgendaMode::Custom => {
        self.custom.unwrap_or((
          self.anchor,
          self.anchor
        ))
      }
      | mode => {
        canonical_window(
          mode,
          self.anchor,
          self.week_start
        )
      }
    };
    AgendaWindow {
      from,
      to,
      mode: self.mode
    }
  }

  /// Switches mode. Fixed modes recentre on today; custom keeps the
  /// last explicit pair, seeded from the current window the first time.
  pub fn set_mode(
    &mut self,
    mode: AgendaMode,
    today: NaiveDate
  ) {
    if mode == AgendaMode::Custom {
      if self.custom.is_none() {
        let current = self.window();
        self.custom =
          Some((current.from, current.to));
      }
    } else {
      self.anchor = today;
    }
    self.mode = mode;
    debug!(mode = mode.as_key(), window = ?self.window(), "agenda mode changed");
  }

  /// Sets an explicit window and switches to custom mode. A reversed
  /// pair is reordered.
  pub fn set_custom_range(
    &mut self,
    from: NaiveDate,
    to: NaiveDate
  ) {
    let pair = if from <= to {
      (from, to)
    } else {
      (to, from)
    };
    self.custom = Some(pair);
    self.mode = AgendaMode::Custom;
    debug!(from = %pair.0, to = %pair.1, "custom agenda window set");
  }

  pub fn previous(&mut self) {
    self.step(-1);
  }

  pub fn next(&mut self) {
    self.step(1);
  }

  fn step(&mut self, direction: i32) {
    match self.mode {
      | AgendaMode::Week => {
        self.anchor = add_days(
          self.anchor,
          i64::from(direction) * 7
        );
      }
      | AgendaMode::Month => {
        self.anchor =
          shift_months(self.anchor, direction);
      }
      | AgendaMode::Year => {
        self.anchor =
          shift_years(self.anchor, direction);
      }
      | AgendaMode::Custom => {
        let (from, to) = self
          .custom
          .unwrap_or((self.anchor, self.anchor));
        self.custom = Some(if direction < 0 {
          (add_days(from, -1), to)
        } else {
          (from, add_days(to, 1))
        });
      }
    }
    debug!(window = ?self.window(), "agenda navigated");
  }

  pub fn go_to_today(
    &mut self,
    today: NaiveDate,
    now: Instant
  ) -> TodayJump {
    let jump = match (self.mode, self.custom) {
      | (AgendaMode::Custom, Some((from, to))) => {
        if to < today {
          self.custom = Some((from, today));
          TodayJump::ExtendedTo
        } else if from <= today {
          self.arm_highlight(today, now);
          TodayJump::AlreadyVisible
        } else {
          self.custom = Some((today, to));
          self.arm_highlight(today, now);
          TodayJump::MovedFrom
        }
      }
      | (AgendaMode::Custom, None) => {
        self.custom = Some((today, today));
        self.arm_highlight(today, now);
        TodayJump::MovedFrom
      }
      | _ => {
        self.anchor = today;
        self.arm_highlight(today, now);
        TodayJump::Anchored
      }
    };
    info!(?jump, window = ?self.window(), "go to today");
    jump
  }

  /// Advances the highlight timer. Returns `true` when it cleared.
  pub fn poll(
    &mut self,
    now: Instant
  ) -> bool {
    self.highlight.poll(now).is_some()
  }

  #[must_use]
  pub fn title(&self) -> String {
    let window = self.window();
    match self.mode {
      | AgendaMode::Week | AgendaMode::Custom => {
        format!(
          "{} - {}",
          window.from.format("%b %-d, %Y"),
          window.to.format("%b %-d, %Y")
        )
      }
      | AgendaMode::Month => {
        window.from.format("%B %Y").to_string()
      }
      | AgendaMode::Year => {
        window.from.year().to_string()
      }
    }
  }

  fn arm_highlight(
    &mut self,
    day: NaiveDate,
    now: Instant
  ) {
    self.highlight_day = Some(day);
    self.highlight.arm(now, self.highlight_for);
  }
}

fn canonical_window(
  mode: AgendaMode,
  anchor: NaiveDate,
  week_start: Weekday
) -> (NaiveDate, NaiveDate) {
  match mode {
    | AgendaMode::Year => {
      (
        first_day_of_year(anchor.year()),
        last_day_of_year(anchor.year())
      )
    }
    | AgendaMode::Month => {
      (
        first_day_of_month(
          anchor.year(),
          anchor.month()
        ),
        last_day_of_month(
          anchor.year(),
          anchor.month()
        )
      )
    }
    | AgendaMode::Week | AgendaMode::Custom => {
      (
        start_of_week(anchor, week_start),
        end_of_week(anchor, week_start)
      )
    }
  }
}
