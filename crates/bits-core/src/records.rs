use std::fmt;
use std::future::Future;

use chrono::{
  DateTime,
  Duration,
  NaiveDate,
  NaiveDateTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  warn
};
use uuid::Uuid;

use crate::agenda::AgendaWindow;
use crate::calendar_grid::add_days;

/// A stored record with free-form typed properties.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Bit {
  pub id:         Uuid,
  #[serde(default)]
  pub title:      String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub properties: Vec<RawProperty>
}

/// A property as stored, before its kind is checked.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct RawProperty {
  pub name:  String,
  pub kind:  String,
  #[serde(default)]
  pub value: serde_json::Value
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
  Text(String),
  Number(f64),
  Checkbox(bool),
  /// Raw date text; parsed lazily so a bad value never fails the bit.
  Date(String),
  DateTime(String)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
  pub name:  String,
  pub value: PropertyValue
}

/// A property whose kind is not one of the handled variants, or whose
/// payload does not fit its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedProperty {
  pub name: String,
  pub kind: String
}

impl fmt::Display for UnsupportedProperty {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "unsupported property `{}` of kind `{}`",
      self.name, self.kind
    )
  }
}

impl std::error::Error
  for UnsupportedProperty
{
}

impl TryFrom<&RawProperty> for Property {
  type Error = UnsupportedProperty;

  fn try_from(
    raw: &RawProperty
  ) -> Result<Self, Self::Error> {
    let unsupported = || {
      UnsupportedProperty {
        name: raw.name.clone(),
        kind: raw.kind.clone()
      }
    };
    let text = || {
      raw
        .value
        .as_str()
        .map(str::to_string)
        .ok_or_else(unsupported)
    };

    let value = match raw.kind.as_str() {
      | "text" => {
        PropertyValue::Text(text()?)
      }
      | "number" => {
        PropertyValue::Number(
          raw
            .value
            .as_f64()
            .ok_or_else(unsupported)?
        )
      }
      | "checkbox" => {
        PropertyValue::Checkbox(
          raw
            .value
            .as_bool()
            .ok_or_else(unsupported)?
        )
      }
      | "date" => {
        PropertyValue::Date(text()?)
      }
      | "datetime" | "date_time" => {
        PropertyValue::DateTime(text()?)
      }
      | _ => return Err(unsupported())
    };

    Ok(Self {
      name: raw.name.clone(),
      value
    })
  }
}

impl Bit {
  /// Typed properties. Unsupported ones are logged and skipped.
  #[must_use]
  pub fn properties(&self) -> Vec<Property> {
    self
      .properties
      .iter()
      .filter_map(|raw| {
        match Property::try_from(raw) {
          | Ok(prop) => Some(prop),
          | Err(err) => {
            warn!(bit = %self.id, error = %err, "skipping property");
            None
          }
        }
      })
      .collect()
  }

  /// Date-valued properties that parse, as `(name, date)`.
  #[must_use]
  pub fn date_properties(
    &self,
    timezone: Tz
  ) -> Vec<(String, NaiveDate)> {
    self
      .properties()
      .into_iter()
      .filter_map(|prop| {
        let day = match &prop.value {
          | PropertyValue::Date(raw) => {
            parse_date_value(raw)
          }
          | PropertyValue::DateTime(raw) => {
            parse_date_time_value(raw).map(
              |instant| {
                instant
                  .with_timezone(&timezone)
                  .date_naive()
              }
            )
          }
          | _ => return None
        };
        if day.is_none() {
          debug!(
            bit = %self.id,
            property = %prop.name,
            "unparseable date property ignored"
          );
        }
        day.map(|day| (prop.name, day))
      })
      .collect()
  }
}

#[must_use]
pub fn parse_date_value(
  raw: &str
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  NaiveDate::parse_from_str(
    trimmed, "%Y-%m-%d"
  )
  .ok()
  .or_else(|| {
    parse_date_time_value(trimmed)
      .map(|instant| instant.date_naive())
  })
}

#[must_use]
pub fn parse_date_time_value(
  raw: &str
) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();
  if let Ok(parsed) =
    DateTime::parse_from_rfc3339(trimmed)
  {
    return Some(parsed.with_timezone(&Utc));
  }
  ["%Y-%m-%dT%H:%M:%S", "%Y%m%dT%H%M%SZ"]
    .into_iter()
    .find_map(|format| {
      NaiveDateTime::parse_from_str(
        trimmed, format
      )
      .ok()
    })
    .map(|naive| naive.and_utc())
}

/// Read side of the record store.
pub trait BitQuery {
  fn created_between(
    &self,
    start: DateTime<Utc>,
    end: DateTime<Utc>
  ) -> impl Future<
    Output = anyhow::Result<Vec<Bit>>
  >;

  fn with_date_property_between(
    &self,
    start: DateTime<Utc>,
    end: DateTime<Utc>
  ) -> impl Future<
    Output = anyhow::Result<Vec<Bit>>
  >;
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum EventSource {
  Created,
  Property(String)
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct CalendarEvent {
  pub bit_id: Uuid,
  pub title:  String,
  pub date:   NaiveDate,
  pub source: EventSource
}

fn local_midnight_utc(
  day: NaiveDate,
  timezone: Tz
) -> DateTime<Utc> {
  let naive = day.and_time(
    chrono::NaiveTime::MIN
  );
  timezone
    .from_local_datetime(&naive)
    .earliest()
    .map_or_else(
      || naive.and_utc(),
      |local| local.with_timezone(&Utc)
    )
}

/// Derives the agenda's events from both queries. A failed query is
/// logged and contributes nothing.
#[tracing::instrument(skip(query), fields(from = %window.from, to = %window.to))]
pub async fn load_calendar_events<Q>(
  query: &Q,
  window: AgendaWindow,
  timezone: Tz
) -> Vec<CalendarEvent>
where
  Q: BitQuery
{
  let start = local_midnight_utc(
    window.from,
    timezone
  );
  let end = local_midnight_utc(
    add_days(window.to, 1),
    timezone
  ) - Duration::nanoseconds(1);

  let created = query
    .created_between(start, end)
    .await
    .unwrap_or_else(|err| {
      warn!(error = %format!("{err:#}"), "created-records query failed");
      Vec::new()
    });

  // Date-only values carry no zone, so widen by a day and filter below.
  let dated = query
    .with_date_property_between(
      start - Duration::days(1),
      end + Duration::days(1)
    )
    .await
    .unwrap_or_else(|err| {
      warn!(error = %format!("{err:#}"), "date-property query failed");
      Vec::new()
    });

  let mut events = created
    .iter()
    .map(|bit| {
      CalendarEvent {
        bit_id: bit.id,
        title:  bit.title.clone(),
        date:   bit
          .created_at
          .with_timezone(&timezone)
          .date_naive(),
        source: EventSource::Created
      }
    })
    .chain(dated.iter().flat_map(|bit| {
      bit
        .date_properties(timezone)
        .into_iter()
        .map(move |(name, date)| {
          CalendarEvent {
            bit_id: bit.id,
            title: bit.title.clone(),
            date,
            source: EventSource::Property(
              name
            )
          }
        })
    }))
    .filter(|event| {
      window.contains(event.date)
    })
    .collect::<Vec<_>>();

  events.sort_by(|a, b| {
    (a.date, &a.title, &a.source)
      .cmp(&(b.date, &b.title, &b.source))
  });
  events.dedup();

  debug!(
    created = created.len(),
    dated = dated.len(),
    events = events.len(),
    "calendar events derived"
  );
  events
}
