use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveTime, Utc};
use tracing::{debug, info};

use crate::records::{Bit, BitQuery, PropertyValue, parse_date_time_value, parse_date_value};

/// Read-only bit source backed by a JSON-lines file, one bit per line.
#[derive(Debug, Clone)]
pub struct JsonlBitStore {
    pub path: PathBuf,
}

impl JsonlBitStore {
    #[tracing::instrument(skip(path))]
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if !path.is_file() {
            return Err(anyhow!("bit file not found: {}", path.display()));
        }
        info!(file = %path.display(), "opened bit store");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_all(&self) -> anyhow::Result<Vec<Bit>> {
        load_jsonl(&self.path).with_context(|| format!("failed to load {}", self.path.display()))
    }
}

impl BitQuery for JsonlBitStore {
    async fn created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Bit>> {
        let mut bits: Vec<Bit> = self
            .load_all()?
            .into_iter()
            .filter(|bit| bit.created_at >= start && bit.created_at <= end)
            .collect();
        bits.sort_by_key(|bit| bit.created_at);
        Ok(bits)
    }

    async fn with_date_property_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Bit>> {
        let bits = self
            .load_all()?
            .into_iter()
            .filter(|bit| {
                bit.properties()
                    .iter()
                    .filter_map(|prop| property_instant(&prop.value))
                    .any(|instant| instant >= start && instant <= end)
            })
            .collect();
        Ok(bits)
    }
}

// Date-only values are pinned to UTC midnight.
fn property_instant(value: &PropertyValue) -> Option<DateTime<Utc>> {
    match value {
        PropertyValue::Date(raw) => parse_date_value(raw).map(|day| day.and_time(NaiveTime::MIN).and_utc()),
        PropertyValue::DateTime(raw) => parse_date_time_value(raw),
        _ => None,
    }
}

fn load_jsonl(path: &Path) -> anyhow::Result<Vec<Bit>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let bit: Bit = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(bit);
    }

    debug!(count = out.len(), "loaded bits from jsonl");
    Ok(out)
}
