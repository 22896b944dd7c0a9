use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};
use serde::{
  Deserialize,
  Serialize
};

/// One cell of a month grid.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct CalendarDay {
  pub date: NaiveDate,
  pub is_outside_current_month: bool,
  pub is_today: bool
}

/// Builds the display grid for the month containing `reference`.
///
/// The grid runs from the start of the week holding the 1st through the
/// end of the week holding the last day, so leading and trailing weeks
/// are always complete and the length is a multiple of seven.
#[must_use]
pub fn build_month_grid(
  reference: NaiveDate,
  today: NaiveDate,
  week_start: Weekday
) -> Vec<CalendarDay> {
  let first = first_day_of_month(
    reference.year(),
    reference.month()
  );
  let last = last_day_of_month(
    reference.year(),
    reference.month()
  );
  let start =
    start_of_week(first, week_start);
  let end = end_of_week(last, week_start);

  let mut days = Vec::with_capacity(42);
  let mut cursor = start;
  while cursor <= end {
    days.push(CalendarDay {
      date: cursor,
      is_outside_current_month: cursor
        .month()
        != reference.month()
        || cursor.year()
          != reference.year(),
      is_today: cursor == today
    });
    let next = add_days(cursor, 1);
    if next == cursor {
      break;
    }
    cursor = next;
  }

  tracing::trace!(
    month = %first.format("%Y-%m"),
    cells = days.len(),
    "built month grid"
  );
  days
}

#[must_use]
pub fn weekday_labels(
  week_start: Weekday
) -> [&'static str; 7] {
  match week_start {
    | Weekday::Mon => {
      ["M", "T", "W", "T", "F", "S", "S"]
    }
    | _ => {
      ["S", "M", "T", "W", "T", "F", "S"]
    }
  }
}

#[must_use]
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

#[must_use]
pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

#[must_use]
pub fn first_day_of_year(
  year: i32
) -> NaiveDate {
  first_day_of_month(year, 1)
}

#[must_use]
pub fn last_day_of_year(
  year: i32
) -> NaiveDate {
  last_day_of_month(year, 12)
}

#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

#[must_use]
pub fn shift_years(
  date: NaiveDate,
  years: i32
) -> NaiveDate {
  let year =
    date.year().saturating_add(years);
  let month = date.month();
  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

/// Moves `date` by whole months, clamping the day to the target month's
/// length.
#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let total = date.year() * 12
    + date.month0() as i32
    + months;
  let year = total.div_euclid(12);
  let month =
    total.rem_euclid(12) as u32 + 1;
  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

#[must_use]
pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = i64::from(
    day.weekday().num_days_from_monday()
  );
  let start_idx = i64::from(
    week_start.num_days_from_monday()
  );
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

#[must_use]
pub fn end_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  add_days(
    start_of_week(day, week_start),
    6
  )
}
