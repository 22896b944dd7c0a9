use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::warn;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub enum IconName {
  Calendar,
  ChevronLeft,
  ChevronRight,
  ChevronsLeft,
  ChevronsRight,
  Clock,
  Check,
  Close,
  Search,
  Today
}

impl IconName {
  #[must_use]
  pub fn all() -> [Self; 10] {
    [
      Self::Calendar,
      Self::ChevronLeft,
      Self::ChevronRight,
      Self::ChevronsLeft,
      Self::ChevronsRight,
      Self::Clock,
      Self::Check,
      Self::Close,
      Self::Search,
      Self::Today
    ]
  }

  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Calendar => "calendar",
      | Self::ChevronLeft => "chevron-left",
      | Self::ChevronRight => {
        "chevron-right"
      }
      | Self::ChevronsLeft => {
        "chevrons-left"
      }
      | Self::ChevronsRight => {
        "chevrons-right"
      }
      | Self::Clock => "clock",
      | Self::Check => "check",
      | Self::Close => "close",
      | Self::Search => "search",
      | Self::Today => "today"
    }
  }

  #[must_use]
  pub fn glyph(self) -> &'static str {
    match self {
      | Self::Calendar => "📅",
      | Self::ChevronLeft => "‹",
      | Self::ChevronRight => "›",
      | Self::ChevronsLeft => "«",
      | Self::ChevronsRight => "»",
      | Self::Clock => "🕒",
      | Self::Check => "✓",
      | Self::Close => "✕",
      | Self::Search => "⌕",
      | Self::Today => "◉"
    }
  }
}

impl FromStr for IconName {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let key = s.trim();
    Self::all()
      .into_iter()
      .find(|icon| {
        icon.as_key().eq_ignore_ascii_case(key)
      })
      .ok_or_else(|| {
        anyhow!("unknown icon name: {key}")
      })
  }
}

/// Places in the picker chrome that show an icon.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
)]
pub enum IconSlot {
  Trigger,
  PreviousMonth,
  NextMonth,
  PreviousYears,
  NextYears,
  TimeTrigger,
  Confirm,
  Today
}

impl IconSlot {
  #[must_use]
  pub fn all() -> [Self; 8] {
    [
      Self::Trigger,
      Self::PreviousMonth,
      Self::NextMonth,
      Self::PreviousYears,
      Self::NextYears,
      Self::TimeTrigger,
      Self::Confirm,
      Self::Today
    ]
  }

  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Trigger => "trigger",
      | Self::PreviousMonth => {
        "previous_month"
      }
      | Self::NextMonth => "next_month",
      | Self::PreviousYears => {
        "previous_years"
      }
      | Self::NextYears => "next_years",
      | Self::TimeTrigger => {
        "time_trigger"
      }
      | Self::Confirm => "confirm",
      | Self::Today => "today"
    }
  }

  fn default_icon(self) -> IconName {
    match self {
      | Self::Trigger => IconName::Calendar,
      | Self::PreviousMonth => {
        IconName::ChevronLeft
      }
      | Self::NextMonth => {
        IconName::ChevronRight
      }
      | Self::PreviousYears => {
        IconName::ChevronsLeft
      }
      | Self::NextYears => {
        IconName::ChevronsRight
      }
      | Self::TimeTrigger => IconName::Clock,
      | Self::Confirm => IconName::Check,
      | Self::Today => IconName::Today
    }
  }
}

/// Slot → icon table resolved once when configuration loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSet {
  slots: BTreeMap<IconSlot, Option<IconName>>
}

impl Default for IconSet {
  fn default() -> Self {
    Self {
      slots: IconSlot::all()
        .into_iter()
        .map(|slot| {
          (slot, Some(slot.default_icon()))
        })
        .collect()
    }
  }
}

impl IconSet {
  /// Resolves configured names. Unknown slots or names are logged and
  /// the slot shows no icon.
  #[must_use]
  pub fn from_config(
    overrides: &BTreeMap<String, String>
  ) -> Self {
    let mut set = Self::default();
    for (slot_key, name) in overrides {
      let Some(slot) = IconSlot::all()
        .into_iter()
        .find(|slot| slot.as_key() == slot_key.as_str())
      else {
        warn!(slot = %slot_key, "unknown icon slot in config");
        continue;
      };

      let icon = match name.parse::<IconName>() {
        | Ok(icon) => Some(icon),
        | Err(err) => {
          warn!(slot = %slot_key, error = %err, "icon disabled");
          None
        }
      };
      set.slots.insert(slot, icon);
    }
    set
  }

  #[must_use]
  pub fn icon(
    &self,
    slot: IconSlot
  ) -> Option<IconName> {
    self.slots.get(&slot).copied().flatten()
  }

  #[must_use]
  pub fn glyph(
    &self,
    slot: IconSlot
  ) -> &'static str {
    self
      .icon(slot)
      .map_or("", IconName::glyph)
  }
}
