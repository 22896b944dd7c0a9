use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::agenda::AgendaMode;
use crate::time_select::Meridiem;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bits",
    version,
    about = "Bits: date pickers, time pickers and agenda windows in the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show one month grid with optional selection and range shading.
    Month(MonthArgs),
    /// Show an agenda window and the bits that fall inside it.
    Agenda(AgendaArgs),
    /// Compose a date-time from a date and a time-of-day selection.
    Time(TimeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MonthArgs {
    /// Month to show; defaults to the selected date or today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub selected: Option<NaiveDate>,

    #[arg(long = "range-start")]
    pub range_start: Option<NaiveDate>,

    #[arg(long = "range-end", requires = "range_start")]
    pub range_end: Option<NaiveDate>,

    /// Show the month/year jump overlay instead of the day grid.
    #[arg(long)]
    pub overlay: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AgendaArgs {
    #[arg(long, value_parser = parse_agenda_mode)]
    pub mode: Option<AgendaMode>,

    /// Anchor date for week/month/year windows.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// JSON-lines file of bits to place in the window.
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Apply "go to today" after building the window.
    #[arg(long)]
    pub today: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TimeArgs {
    #[arg(long)]
    pub date: NaiveDate,

    #[arg(long)]
    pub hour: u32,

    #[arg(long, default_value_t = 0)]
    pub minute: u32,

    #[arg(long, default_value_t = 0)]
    pub second: u32,

    #[arg(long, value_parser = parse_meridiem)]
    pub meridiem: Option<Meridiem>,
}

fn parse_agenda_mode(raw: &str) -> anyhow::Result<AgendaMode> {
    AgendaMode::from_key(raw).ok_or_else(|| anyhow!("expected week, month, year or custom, got: {raw}"))
}

fn parse_meridiem(raw: &str) -> anyhow::Result<Meridiem> {
    Meridiem::from_key(raw).ok_or_else(|| anyhow!("expected am or pm, got: {raw}"))
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
