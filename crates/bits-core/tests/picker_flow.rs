use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use bits_core::agenda::{AgendaMode, AgendaWindowCalculator};
use bits_core::date_input::{DateInput, DateInputCallbacks, DateInputProps};
use bits_core::panel::{ElementId, ListenerRegistry, Rect, ScrollOffset};
use bits_core::records::{EventSource, load_calendar_events};
use bits_core::store::JsonlBitStore;
use chrono::{NaiveDate, Weekday};
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

type Reports = Rc<RefCell<Vec<(&'static str, Option<NaiveDate>)>>>;

fn ranged_input(registry: &ListenerRegistry, reports: &Reports) -> DateInput {
    let from_log = Rc::clone(reports);
    let to_log = Rc::clone(reports);
    DateInput::new(
        DateInputProps {
            ranged: true,
            ..DateInputProps::default()
        },
        (ElementId(1), ElementId(2)),
        registry,
        Weekday::Sun,
        date(2024, 3, 1),
        DateInputCallbacks::new(
            move |day| from_log.borrow_mut().push(("from", Some(day))),
            move |day| to_log.borrow_mut().push(("to", day)),
        ),
    )
}

fn open(input: &mut DateInput) {
    let trigger = Rect {
        left: 40.0,
        top: 10.0,
        width: 120.0,
        height: 32.0,
    };
    assert!(input.toggle(trigger, ScrollOffset::default(), 1024.0));
}

#[test]
fn ranged_pick_shades_the_days_between_the_caps() {
    let registry = ListenerRegistry::new();
    let reports: Reports = Rc::default();
    let mut input = ranged_input(&registry, &reports);

    open(&mut input);
    assert_eq!(registry.active_count(), 1);

    assert!(input.select_from(date(2024, 3, 10)));
    assert!(input.is_open());
    assert!(input.select_to(date(2024, 3, 15)));
    assert!(!input.is_open());
    assert_eq!(registry.active_count(), 0);

    assert_eq!(
        *reports.borrow(),
        vec![("from", Some(date(2024, 3, 10))), ("to", Some(date(2024, 3, 15)))]
    );
    assert_eq!(input.label(), "Mar 10, 2024 - Mar 15, 2024");

    let selector = input.to_selector().expect("ranged input has an end selector");
    let grid = selector.grid();
    let shaded: Vec<NaiveDate> = grid
        .iter()
        .filter(|day| selector.classify(day).in_range)
        .map(|day| day.date)
        .collect();
    assert_eq!(shaded, (10..=15).map(|d| date(2024, 3, d)).collect::<Vec<_>>());

    let starts: Vec<NaiveDate> = grid
        .iter()
        .filter(|day| selector.classify(day).range_start)
        .map(|day| day.date)
        .collect();
    let ends: Vec<NaiveDate> = grid
        .iter()
        .filter(|day| selector.classify(day).range_end)
        .map(|day| day.date)
        .collect();
    assert_eq!(starts, vec![date(2024, 3, 10)]);
    assert_eq!(ends, vec![date(2024, 3, 15)]);

    let before_start = grid
        .iter()
        .find(|day| day.date == date(2024, 3, 9))
        .expect("9th is visible");
    assert!(selector.classify(before_start).disabled);
}

#[test]
fn moving_the_start_past_the_end_clears_it() {
    let registry = ListenerRegistry::new();
    let reports: Reports = Rc::default();
    let mut input = ranged_input(&registry, &reports);

    open(&mut input);
    input.select_from(date(2024, 3, 10));
    input.select_to(date(2024, 3, 15));

    open(&mut input);
    assert!(input.select_from(date(2024, 3, 20)));
    assert_eq!(input.range().start(), Some(date(2024, 3, 20)));
    assert_eq!(input.range().end(), None);
    assert_eq!(reports.borrow().last(), Some(&("to", None)));

    assert!(!input.select_to(date(2024, 3, 18)));
    assert_eq!(input.range().end(), None);
    assert!(input.is_open());
}

#[tokio::test]
async fn agenda_week_collects_created_and_dated_bits() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"{{"id":"0b0f0e52-0000-4000-8000-000000000001","title":"plan","created_at":"2024-03-11T09:30:00Z"}}"#
    )
    .expect("write bit");
    writeln!(
        file,
        r#"{{"id":"0b0f0e52-0000-4000-8000-000000000002","title":"ship","created_at":"2024-01-02T00:00:00Z","properties":[{{"name":"due","kind":"date","value":"2024-03-14"}},{{"name":"note","kind":"text","value":"x"}}]}}"#
    )
    .expect("write bit");
    writeln!(
        file,
        r#"{{"id":"0b0f0e52-0000-4000-8000-000000000003","title":"later","created_at":"2024-04-20T00:00:00Z"}}"#
    )
    .expect("write bit");

    let store = JsonlBitStore::open(file.path()).expect("open store");
    let calc = AgendaWindowCalculator::new(AgendaMode::Week, date(2024, 3, 13), Weekday::Sun);
    let window = calc.window();
    assert_eq!((window.from, window.to), (date(2024, 3, 10), date(2024, 3, 16)));

    let events = load_calendar_events(&store, window, chrono_tz::UTC).await;
    let summary: Vec<(&str, NaiveDate, &EventSource)> = events
        .iter()
        .map(|event| (event.title.as_str(), event.date, &event.source))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("plan", date(2024, 3, 11), &EventSource::Created),
            ("ship", date(2024, 3, 14), &EventSource::Property("due".to_string())),
        ]
    );
}
