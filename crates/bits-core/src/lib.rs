pub mod agenda;
pub mod calendar_grid;
pub mod cli;
pub mod config;
pub mod date_input;
pub mod date_range;
pub mod date_time_input;
pub mod icons;
pub mod panel;
pub mod range_coordinator;
pub mod records;
pub mod render;
pub mod store;
pub mod time_select;
pub mod timer;

use std::ffi::OsString;
use std::time::Instant;

use anyhow::{
  Context,
  bail
};
use chrono::{
  Datelike,
  NaiveTime,
  Utc
};
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::agenda::{
  AgendaMode,
  AgendaWindowCalculator
};
use crate::calendar_grid::{
  first_day_of_month,
  weekday_labels
};
use crate::cli::{
  AgendaArgs,
  Command,
  MonthArgs,
  TimeArgs
};
use crate::config::Config;
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
use crate::render::Renderer;
use crate::store::JsonlBitStore;
use crate::time_select::{
  HourFormat,
  TimeRangeSelector
};
use crate::timer::ClockDisplay;

/// Owner-supplied notification hook.
pub type Callback<T> = Box<dyn FnMut(T)>;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli = cli::GlobalCli::parse_from(
    raw_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting bits CLI"
  );

  let cfg = Config::load(
    cli.config.as_deref()
  )?;
  debug!(
    week_start = ?cfg.week_start(),
    timezone = %cfg.timezone(),
    "configuration resolved"
  );

  let renderer =
    Renderer::new(cfg.icon_set());
  let output = match cli.command {
    | Command::Month(args) => {
      month_command(&cfg, &renderer, args)?
    }
    | Command::Agenda(args) => {
      agenda_command(
        &cfg, &renderer, args
      )?
    }
    | Command::Time(args) => {
      time_command(&cfg, &renderer, args)?
    }
  };
  renderer.print(&output)?;

  info!("done");
  Ok(())
}

fn month_command(
  cfg: &Config,
  renderer: &Renderer,
  args: MonthArgs
) -> anyhow::Result<String> {
  let mut range = RangeCoordinator::new();
  if let Some(start) = args.range_start {
    range.apply(RangeEdit::Start(start));
  }
  if let Some(end) = args.range_end {
    if range.apply(RangeEdit::End(end))
      == RangeChange::Rejected
    {
      bail!(
        "--range-end {end} is before \
         --range-start"
      );
    }
  }

  let role = if range.start().is_some() {
    SelectorRole::End
  } else {
    SelectorRole::Start
  };
  let props = SelectorProps {
    selected:    args
      .selected
      .or(range.end())
      .or(range.start()),
    range_start: range.start(),
    range_end:   range.end()
  };
  let week_start = cfg.week_start();
  let mut selector = DateRangeSelector::new(
    role,
    week_start,
    cfg.today(),
    props,
    |_| {}
  );

  if let Some(date) = args.date {
    let target =
      first_day_of_month(date.year(), date.month());
    while selector.display_month() < target {
      selector.next_month();
    }
    while selector.display_month() > target {
      selector.previous_month();
    }
  }
  if args.overlay {
    selector.toggle_overlay();
  }

  Ok(renderer.month_view(
    &selector,
    weekday_labels(week_start)
  ))
}

fn agenda_command(
  cfg: &Config,
  renderer: &Renderer,
  args: AgendaArgs
) -> anyhow::Result<String> {
  let today = cfg.today();
  let timezone = cfg.timezone();
  let mode = args.mode.unwrap_or_else(|| {
    if args.from.is_some() {
      AgendaMode::Custom
    } else {
      cfg.agenda_mode()
    }
  });

  let mut calc = AgendaWindowCalculator::new(
    mode,
    args.date.unwrap_or(today),
    cfg.week_start()
  )
  .with_highlight_duration(
    cfg.highlight_duration()
  );
  if let (Some(from), Some(to)) =
    (args.from, args.to)
  {
    calc.set_custom_range(from, to);
  }
  if args.today {
    calc.go_to_today(today, Instant::now());
  }

  let events = match args.records.as_deref()
  {
    | Some(path) => {
      let store = JsonlBitStore::open(path)?;
      let runtime =
        tokio::runtime::Builder::new_current_thread()
          .build()
          .context(
            "failed to start query runtime"
          )?;
      runtime.block_on(
        records::load_calendar_events(
          &store,
          calc.window(),
          timezone
        )
      )
    }
    | None => Vec::new()
  };
  info!(
    count = events.len(),
    window = ?calc.window(),
    "agenda events loaded"
  );

  let mut clock: ClockDisplay<chrono_tz::Tz> = ClockDisplay::new(
    cfg.clock_interval(),
    "%a %Y-%m-%d %H:%M:%S %Z"
  );
  clock.poll(Instant::now(), || {
    Utc::now().with_timezone(&timezone)
  });

  let mut output =
    renderer.agenda_view(&calc, &events);
  if let Some(now) = clock.text() {
    output.push_str(&format!("now {now}\n"));
  }
  Ok(output)
}

fn time_command(
  cfg: &Config,
  renderer: &Renderer,
  args: TimeArgs
) -> anyhow::Result<String> {
  let format = cfg.hour_format();
  let mut selector = TimeRangeSelector::new(
    format,
    args.date.and_time(NaiveTime::MIN),
    |value| debug!(%value, "time committed")
  );

  if !selector.select_hour(args.hour) {
    bail!(
      "hour {} is not on the {}-hour clock",
      args.hour,
      match format {
        | HourFormat::TwelveHour => 12,
        | HourFormat::TwentyFourHour => 24
      }
    );
  }
  if !selector.select_minute(args.minute) {
    bail!("minute {} is out of range", args.minute);
  }
  if !selector.select_second(args.second) {
    bail!("second {} is out of range", args.second);
  }
  if let Some(meridiem) = args.meridiem {
    if format == HourFormat::TwelveHour {
      selector.select_meridiem(meridiem);
    } else {
      warn!(
        meridiem = meridiem.label(),
        "meridiem ignored on a 24-hour clock"
      );
    }
  }

  let value = selector.confirm();
  Ok(renderer.time_view(value, format))
}
