use chrono::NaiveTime;
use conference_core::{DiagnosticKind, TimeTable, TimeTableError};

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn occupied(table: &TimeTable<&'static str, &'static str>) -> Vec<(NaiveTime, &'static str, &'static str)> {
    let mut cells: Vec<_> = table
        .by_times()
        .into_iter()
        .flat_map(|line| line.cells)
        .filter_map(|position| {
            position
                .cell
                .map(|view| (position.time, *position.track, *view.payload()))
        })
        .collect();
    cells.sort();
    cells
}

fn day_with_overlap() -> TimeTable<&'static str, &'static str> {
    let mut table = TimeTable::new((at(9, 0), at(12, 0)), vec!["a", "b"]).unwrap();
    table.set_event(at(9, 0), "welcome", Some(60), &["a", "b"]).unwrap().unwrap();
    table.set_event(at(10, 0), "talk", Some(30), &["a"]).unwrap().unwrap();
    table.set_event(at(10, 0), "clash", Some(30), &["a"]).unwrap();
    table.set_event(at(11, 0), "lunch", None, &["a", "b"]).unwrap().unwrap();
    table
}

#[test]
fn slice_keeps_cells_inside_bounds_and_copies_error_log() {
    let table = day_with_overlap();
    assert_eq!(table.errors().len(), 1);

    let sliced = table.slice(Some(at(9, 30)), Some(at(10, 30))).unwrap();
    assert_eq!(sliced.start(), at(9, 30));
    assert_eq!(sliced.end(), at(10, 30));
    assert_eq!(sliced.tracks(), table.tracks());
    assert_eq!(sliced.slot_minutes(), 15);
    assert_eq!(sliced.errors(), table.errors());
    assert_eq!(sliced.errors()[0].kind, DiagnosticKind::OverlapEvent);

    let cells = occupied(&sliced);
    assert_eq!(cells.len(), 6);
    assert!(cells
        .iter()
        .all(|(time, _, _)| *time >= at(9, 30) && *time < at(10, 30)));
    assert_eq!(sliced.occupied_cells(), 6);

    // Extension cells keep resolving to an anchor that lies outside the slice.
    let view = sliced.get(at(9, 30), &"b").unwrap();
    assert_eq!(view.anchor().time, at(9, 0));
    assert_eq!(*view.payload(), "welcome");
}

#[test]
fn slice_with_inverted_bounds_matches_ordered_bounds() {
    let table = day_with_overlap();
    let forward = table.slice(Some(at(9, 45)), Some(at(11, 15))).unwrap();
    let backward = table.slice(Some(at(11, 15)), Some(at(9, 45))).unwrap();

    assert_eq!(forward.start(), backward.start());
    assert_eq!(forward.end(), backward.end());
    assert_eq!(occupied(&forward), occupied(&backward));
}

#[test]
fn slice_defaults_to_grid_bounds() {
    let table = day_with_overlap();
    let tail = table.slice(Some(at(11, 0)), None).unwrap();
    assert_eq!(tail.end(), at(12, 0));
    assert_eq!(occupied(&tail).len(), 8);

    let whole = table.slice(None, None).unwrap();
    assert_eq!(occupied(&whole), occupied(&table));
}

#[test]
fn slice_is_independent_from_source() {
    let table = day_with_overlap();
    let mut sliced = table.slice(Some(at(10, 30)), Some(at(11, 0))).unwrap();
    assert_eq!(sliced.occupied_cells(), 0);

    sliced
        .set_event(at(10, 30), "extra", Some(30), &["a", "b"])
        .unwrap()
        .unwrap();
    assert_eq!(sliced.occupied_cells(), 4);
    assert!(table.get(at(10, 30), &"a").is_none());

    sliced.set_event(at(10, 30), "again", Some(15), &["a"]).unwrap();
    assert_eq!(sliced.errors().len(), 2);
    assert_eq!(table.errors().len(), 1);
}

#[test]
fn slice_rejects_misaligned_or_empty_bounds() {
    let table = day_with_overlap();

    let err = table.slice(Some(at(9, 40)), Some(at(10, 0))).unwrap_err();
    assert_eq!(err, TimeTableError::Misaligned(at(9, 40)));

    let err = table.slice(Some(at(10, 0)), Some(at(10, 0))).unwrap_err();
    assert!(matches!(err, TimeTableError::InvalidRange { .. }));
}
