use std::collections::BTreeMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::Context;
use chrono::{
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  error,
  info,
  warn
};

use crate::agenda::AgendaMode;
use crate::icons::IconSet;
use crate::time_select::HourFormat;

const CONFIG_FILE: &str = "bits.toml";
const CONFIG_DIR: &str = "bits";
const CONFIG_ENV_VAR: &str = "BITS_CONFIG";

fn default_week_start() -> String {
  "sunday".to_string()
}

fn default_hour_format() -> String {
  "12".to_string()
}

fn default_agenda_mode() -> String {
  "week".to_string()
}

fn default_highlight_ms() -> u64 {
  2_000
}

fn default_refresh_ms() -> u64 {
  1_000
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct CalendarSection {
  #[serde(default = "default_week_start")]
  pub week_start: String
}

impl Default for CalendarSection {
  fn default() -> Self {
    Self {
      week_start: default_week_start()
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct TimeSection {
  #[serde(default = "default_hour_format")]
  pub hour_format: String,
  #[serde(default)]
  pub timezone:    Option<String>
}

impl Default for TimeSection {
  fn default() -> Self {
    Self {
      hour_format: default_hour_format(),
      timezone:    None
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct AgendaSection {
  #[serde(default = "default_agenda_mode")]
  pub default_mode: String,
  #[serde(default = "default_highlight_ms")]
  pub highlight_ms: u64
}

impl Default for AgendaSection {
  fn default() -> Self {
    Self {
      default_mode: default_agenda_mode(),
      highlight_ms: default_highlight_ms()
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct ClockSection {
  #[serde(default = "default_refresh_ms")]
  pub refresh_ms: u64
}

impl Default for ClockSection {
  fn default() -> Self {
    Self {
      refresh_ms: default_refresh_ms()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct Config {
  #[serde(default)]
  pub calendar:    CalendarSection,
  #[serde(default)]
  pub time:        TimeSection,
  #[serde(default)]
  pub agenda:      AgendaSection,
  #[serde(default)]
  pub clock:       ClockSection,
  #[serde(default)]
  pub icons:       BTreeMap<String, String>,
  #[serde(skip)]
  pub loaded_from: Option<PathBuf>
}

impl Config {
  /// Loads from the first of: explicit path, `BITS_CONFIG`, the user
  /// config dir. Falls back to defaults when none exists.
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(config_override)
    else {
      warn!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let raw = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut cfg = Self::from_toml_str(&raw)
      .with_context(|| {
        format!(
          "failed to parse {}",
          path.display()
        )
      })?;
    cfg.loaded_from = Some(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut cfg: Self = toml::from_str(raw)?;
    cfg.sanitize();
    Ok(cfg)
  }

  fn sanitize(&mut self) {
    if parse_week_start(
      &self.calendar.week_start
    )
    .is_none()
    {
      warn!(
        week_start = %self.calendar.week_start,
        "invalid week_start; using sunday"
      );
      self.calendar.week_start =
        default_week_start();
    }

    if HourFormat::from_key(
      &self.time.hour_format
    )
    .is_none()
    {
      warn!(
        hour_format = %self.time.hour_format,
        "invalid hour_format; using 12"
      );
      self.time.hour_format =
        default_hour_format();
    }

    if AgendaMode::from_key(
      &self.agenda.default_mode
    )
    .is_none()
    {
      warn!(
        mode = %self.agenda.default_mode,
        "invalid agenda mode; using week"
      );
      self.agenda.default_mode =
        default_agenda_mode();
    }

    if self.agenda.highlight_ms == 0 {
      self.agenda.highlight_ms =
        default_highlight_ms();
    }
    if self.clock.refresh_ms == 0 {
      self.clock.refresh_ms =
        default_refresh_ms();
    }
  }

  #[must_use]
  pub fn week_start(&self) -> Weekday {
    parse_week_start(
      &self.calendar.week_start
    )
    .unwrap_or(Weekday::Sun)
  }

  #[must_use]
  pub fn hour_format(&self) -> HourFormat {
    HourFormat::from_key(
      &self.time.hour_format
    )
    .unwrap_or_default()
  }

  #[must_use]
  pub fn agenda_mode(&self) -> AgendaMode {
    AgendaMode::from_key(
      &self.agenda.default_mode
    )
    .unwrap_or_default()
  }

  #[must_use]
  pub fn highlight_duration(
    &self
  ) -> Duration {
    Duration::from_millis(
      self.agenda.highlight_ms
    )
  }

  #[must_use]
  pub fn clock_interval(&self) -> Duration {
    Duration::from_millis(
      self.clock.refresh_ms
    )
  }

  #[must_use]
  pub fn icon_set(&self) -> IconSet {
    IconSet::from_config(&self.icons)
  }

  #[must_use]
  pub fn timezone(&self) -> Tz {
    self
      .time
      .timezone
      .as_deref()
      .and_then(|raw| {
        parse_timezone(raw, "bits.toml")
      })
      .unwrap_or(chrono_tz::UTC)
  }

  #[must_use]
  pub fn today(&self) -> NaiveDate {
    Utc::now()
      .with_timezone(&self.timezone())
      .date_naive()
  }
}

fn parse_week_start(
  raw: &str
) -> Option<Weekday> {
  match raw.trim().to_ascii_lowercase().as_str()
  {
    | "sunday" | "sun" => Some(Weekday::Sun),
    | "monday" | "mon" => Some(Weekday::Mon),
    | _ => None
  }
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(err) => {
      error!(
        source,
        timezone = %trimmed,
        error = %err,
        "invalid timezone id; using UTC"
      );
      None
    }
  }
}

fn resolve_config_path(
  config_override: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = config_override {
    return Some(path.to_path_buf());
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      debug!(env = CONFIG_ENV_VAR, path = %trimmed, "config path from env");
      return Some(PathBuf::from(trimmed));
    }
  }

  let candidate = dirs::config_dir()?
    .join(CONFIG_DIR)
    .join(CONFIG_FILE);
  if candidate.exists() {
    Some(candidate)
  } else {
    debug!(
      candidate = %candidate.display(),
      "user config file not found"
    );
    None
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use tempfile::NamedTempFile;

  use super::*;
  use crate::icons::{
    IconName,
    IconSlot
  };

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = Config::from_toml_str("")
      .expect("parse empty");
    assert_eq!(cfg.week_start(), Weekday::Sun);
    assert_eq!(
      cfg.hour_format(),
      HourFormat::TwelveHour
    );
    assert_eq!(cfg.agenda_mode(), AgendaMode::Week);
    assert_eq!(
      cfg.highlight_duration(),
      Duration::from_secs(2)
    );
    assert_eq!(cfg.timezone(), chrono_tz::UTC);
  }

  #[test]
  fn invalid_values_are_sanitised() {
    let cfg = Config::from_toml_str(
      r#"
[calendar]
week_start = "friday"

[time]
hour_format = "36"
timezone = "Mars/Olympus"

[agenda]
default_mode = "decade"
highlight_ms = 0
"#
    )
    .expect("parse");
    assert_eq!(cfg.calendar.week_start, "sunday");
    assert_eq!(cfg.time.hour_format, "12");
    assert_eq!(cfg.agenda.default_mode, "week");
    assert_eq!(cfg.agenda.highlight_ms, 2_000);
    assert_eq!(cfg.timezone(), chrono_tz::UTC);
  }

  #[test]
  fn loads_explicit_file() {
    let mut file =
      NamedTempFile::new().expect("temp file");
    write!(
      file,
      r#"
[calendar]
week_start = "monday"

[time]
hour_format = "24"
timezone = "America/Mexico_City"

[agenda]
default_mode = "month"

[icons]
confirm = "close"
"#
    )
    .expect("write config");

    let cfg = Config::load(Some(file.path()))
      .expect("load config");
    assert_eq!(cfg.week_start(), Weekday::Mon);
    assert_eq!(
      cfg.hour_format(),
      HourFormat::TwentyFourHour
    );
    assert_eq!(cfg.agenda_mode(), AgendaMode::Month);
    assert_eq!(
      cfg.timezone(),
      chrono_tz::America::Mexico_City
    );
    assert_eq!(
      cfg.icon_set().icon(IconSlot::Confirm),
      Some(IconName::Close)
    );
    assert_eq!(
      cfg.loaded_from.as_deref(),
      Some(file.path())
    );
  }

  #[test]
  fn malformed_file_is_an_error() {
    let mut file =
      NamedTempFile::new().expect("temp file");
    write!(file, "[calendar\nweek_start = 3")
      .expect("write config");
    let err = Config::load(Some(file.path()))
      .expect_err("should fail");
    assert!(format!("{err:#}").contains("failed to parse"));
  }
}
