use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::agenda::{AgendaMode, AgendaWindowCalculator};
use crate::calendar_grid::add_days;
use crate::date_range::{DateRangeSelector, DayClasses, MONTH_LABELS, MonthYearOverlay, OverlayView};
use crate::icons::{IconSet, IconSlot};
use crate::records::{CalendarEvent, EventSource};
use crate::time_select::{HourFormat, decompose_time};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    icons: IconSet,
}

impl Renderer {
    pub fn new(icons: IconSet) -> Self {
        Self {
            color: io::stdout().is_terminal(),
            icons,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    #[tracing::instrument(skip_all)]
    pub fn print(&self, text: &str) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Draws the selector's visible month as a 7-column grid.
    pub fn month_view(&self, selector: &DateRangeSelector, labels: [&str; 7]) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {}\n",
            self.icons.glyph(IconSlot::PreviousMonth),
            selector.title(),
            self.icons.glyph(IconSlot::NextMonth)
        ));
        if let Some(overlay) = selector.overlay() {
            out.push_str(&overlay_text(overlay));
            return out;
        }
        let header: Vec<String> = labels.iter().map(|label| format!("{label:^4}")).collect();
        out.push_str(header.join("").trim_end());
        out.push('\n');

        for week in selector.grid().chunks(7) {
            let row: Vec<String> = week
                .iter()
                .map(|day| {
                    let classes = selector.classify(day);
                    self.paint_cell(&cell_text(day.date, &classes), &classes)
                })
                .collect();
            out.push_str(row.join("").trim_end());
            out.push('\n');
        }
        out
    }

    /// Lists the window's days with their events under the agenda title.
    pub fn agenda_view(&self, calc: &AgendaWindowCalculator, events: &[CalendarEvent]) -> String {
        let window = calc.window();
        let mut out = format!(
            "{} {} {}  [{}]\n",
            self.icons.glyph(IconSlot::PreviousMonth),
            calc.title(),
            self.icons.glyph(IconSlot::NextMonth),
            calc.mode().label()
        );

        let mut by_day: BTreeMap<NaiveDate, Vec<&CalendarEvent>> = BTreeMap::new();
        for event in events.iter().filter(|event| window.contains(event.date)) {
            by_day.entry(event.date).or_default().push(event);
        }

        // Week windows list every day; longer windows only list busy days.
        let days: Vec<NaiveDate> = if calc.mode() == AgendaMode::Week {
            (0..window.day_count()).map(|offset| add_days(window.from, offset)).collect()
        } else {
            by_day.keys().copied().collect()
        };

        if days.is_empty() {
            out.push_str("  (no bits in this window)\n");
            return out;
        }

        for day in days {
            let heading = day.format("%a %Y-%m-%d").to_string();
            let heading = if calc.highlighted_day() == Some(day) {
                self.paint(&heading, "1;33")
            } else {
                heading
            };
            out.push_str(&heading);
            out.push('\n');
            for event in by_day.get(&day).into_iter().flatten() {
                out.push_str(&format!("  • {} ({})\n", event.title, source_label(&event.source)));
            }
        }
        out
    }

    pub fn time_view(&self, value: NaiveDateTime, format: HourFormat) -> String {
        let selection = decompose_time(value, format);
        let clock = match format {
            HourFormat::TwelveHour => format!(
                "{:02}:{:02}:{:02} {}",
                selection.hour,
                selection.minute,
                selection.second,
                selection.meridiem.label()
            ),
            HourFormat::TwentyFourHour => {
                format!("{:02}:{:02}:{:02}", selection.hour, selection.minute, selection.second)
            }
        };
        format!(
            "{} {} {}\n{}\n",
            self.icons.glyph(IconSlot::TimeTrigger),
            value.date().format("%b %-d, %Y"),
            clock,
            value.format("%Y-%m-%dT%H:%M:%S")
        )
    }

    fn paint_cell(&self, text: &str, classes: &DayClasses) -> String {
        let code = if classes.selected || classes.range_start || classes.range_end {
            "7"
        } else if classes.in_range {
            "36"
        } else if classes.today {
            "1;4"
        } else if classes.outside_month || classes.disabled {
            "2"
        } else {
            return text.to_string();
        };
        self.paint(text, code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

/// Four-column cell. Brackets mark caps and selection so the grid reads
/// without colour.
fn cell_text(date: NaiveDate, classes: &DayClasses) -> String {
    let day = date.day();
    if classes.range_start && classes.range_end {
        format!("[{day:>2}]")
    } else if classes.range_start {
        format!("[{day:>2}-")
    } else if classes.range_end {
        format!("-{day:>2}]")
    } else if classes.selected {
        format!("[{day:>2}]")
    } else if classes.in_range {
        format!("-{day:>2}-")
    } else if classes.today {
        format!("*{day:>2}*")
    } else if classes.outside_month {
        format!("({day:>2})")
    } else {
        format!(" {day:>2} ")
    }
}

/// Months in rows of four, or the year window on one line. The picked
/// month and the centre year are bracketed.
fn overlay_text(overlay: &MonthYearOverlay) -> String {
    match overlay.view {
        OverlayView::Months => MONTH_LABELS
            .iter()
            .zip(1u32..)
            .map(|(label, month)| {
                if month == overlay.picked_month {
                    format!("[{label}]")
                } else {
                    format!(" {label} ")
                }
            })
            .collect::<Vec<_>>()
            .chunks(4)
            .map(|row| format!("{}\n", row.join(" ").trim_end()))
            .collect(),
        OverlayView::Years => {
            let years: Vec<String> = overlay
                .years()
                .into_iter()
                .map(|year| {
                    if year == overlay.year_center {
                        format!("[{year}]")
                    } else {
                        format!(" {year} ")
                    }
                })
                .collect();
            format!("{}\n", years.join(" ").trim_end())
        }
    }
}

fn source_label(source: &EventSource) -> String {
    match source {
        EventSource::Created => "created".to_string(),
        EventSource::Property(name) => name.clone(),
    }
}
