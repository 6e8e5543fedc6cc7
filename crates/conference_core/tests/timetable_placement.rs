use chrono::NaiveTime;
use conference_core::{CellView, DiagnosticKind, TimeTable, TimeTableError};

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn morning() -> TimeTable<&'static str, &'static str> {
    TimeTable::new((at(9, 0), at(10, 0)), vec!["a", "b"]).unwrap()
}

fn payload_at(
    table: &TimeTable<&'static str, &'static str>,
    time: NaiveTime,
    track: &'static str,
) -> Option<&'static str> {
    table.get(time, &track).map(|view| *view.payload())
}

#[test]
fn new_rejects_inverted_range_and_empty_tracks() {
    let err = TimeTable::<&str, u32>::new((at(10, 0), at(9, 0)), vec!["a"]).unwrap_err();
    assert_eq!(
        err,
        TimeTableError::InvalidRange {
            start: at(10, 0),
            end: at(9, 0),
        }
    );

    let err = TimeTable::<&str, u32>::new((at(9, 0), at(9, 0)), vec!["a"]).unwrap_err();
    assert!(matches!(err, TimeTableError::InvalidRange { .. }));

    let err = TimeTable::<&str, u32>::new((at(9, 0), at(10, 0)), vec![]).unwrap_err();
    assert_eq!(err, TimeTableError::NoTracks);

    let err =
        TimeTable::<&str, u32>::with_slot_length((at(9, 0), at(10, 0)), vec!["a"], 0).unwrap_err();
    assert_eq!(err, TimeTableError::ZeroSlotLength);
}

#[test]
fn set_event_preconditions_fail_fast_without_diagnostics() {
    let mut table = morning();

    let err = table.set_event(at(9, 0), "x", Some(15), &[]).unwrap_err();
    assert_eq!(err, TimeTableError::EmptyEventTracks);

    let err = table.set_event(at(9, 0), "x", Some(15), &["c"]).unwrap_err();
    assert!(matches!(err, TimeTableError::UnknownTrack(_)));

    let err = table.set_event(at(9, 0), "x", Some(15), &["a", "a"]).unwrap_err();
    assert!(matches!(err, TimeTableError::DuplicateTrack(_)));

    let err = table.set_event(at(10, 0), "x", Some(15), &["a"]).unwrap_err();
    assert_eq!(err, TimeTableError::OutOfRange(at(10, 0)));

    let err = table.set_event(at(8, 45), "x", Some(15), &["a"]).unwrap_err();
    assert_eq!(err, TimeTableError::OutOfRange(at(8, 45)));

    let err = table.set_event(at(9, 10), "x", Some(15), &["a"]).unwrap_err();
    assert_eq!(err, TimeTableError::Misaligned(at(9, 10)));

    assert!(table.errors().is_empty());
    assert_eq!(table.occupied_cells(), 0);
}

#[test]
fn fixed_event_writes_anchor_and_secondaries_on_every_track() {
    let mut table = morning();
    let id = table
        .set_event(at(9, 0), "keynote", Some(30), &["a", "b"])
        .unwrap()
        .unwrap();

    let anchor = table.anchor(id).unwrap();
    assert_eq!(anchor.columns, 2);
    assert_eq!(anchor.rows, 2);
    assert_eq!(anchor.track, "a");
    assert!(!anchor.flex);

    assert!(table.get(at(9, 0), &"a").unwrap().is_anchor());
    for (time, track) in [(at(9, 0), "b"), (at(9, 15), "a"), (at(9, 15), "b")] {
        let view = table.get(time, &track).unwrap();
        assert!(!view.is_anchor());
        assert_eq!(*view.payload(), "keynote");
    }
    assert!(table.get(at(9, 30), &"a").is_none());
    assert_eq!(table.occupied_cells(), 4);
}

#[test]
fn overlapping_fixed_events_record_one_overlap_event_and_drop_the_second() {
    let mut table = morning();
    table.set_event(at(9, 0), "first", Some(30), &["a"]).unwrap();

    let placed = table.set_event(at(9, 0), "second", Some(45), &["a", "b"]).unwrap();
    assert!(placed.is_none());

    let overlaps: Vec<_> = table
        .errors()
        .iter()
        .filter(|diagnostic| diagnostic.kind == DiagnosticKind::OverlapEvent)
        .collect();
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].item, "second");
    assert_eq!(overlaps[0].previous, "first");
    assert_eq!(overlaps[0].time, at(9, 0));
    assert_eq!(table.errors().len(), 1);

    assert_eq!(payload_at(&table, at(9, 0), "a"), Some("first"));
    assert_eq!(payload_at(&table, at(9, 0), "b"), None);
    assert_eq!(payload_at(&table, at(9, 30), "a"), None);
}

#[test]
fn trailing_cell_on_existing_anchor_rejects_whole_item() {
    let mut table = morning();
    table.set_event(at(9, 30), "talk", Some(15), &["a"]).unwrap();

    let placed = table.set_event(at(9, 0), "long", Some(60), &["a"]).unwrap();
    assert!(placed.is_none());
    assert_eq!(table.errors().len(), 1);
    assert_eq!(table.errors()[0].time, at(9, 30));
    assert_eq!(payload_at(&table, at(9, 0), "a"), None);
    assert_eq!(table.occupied_cells(), 1);
}

#[test]
fn flexible_event_stretches_to_grid_end_in_whole_slots() {
    let mut table: TimeTable<&str, &str> =
        TimeTable::new((at(9, 0), at(9, 50)), vec!["a"]).unwrap();
    let id = table.set_event(at(9, 0), "lunch", None, &["a"]).unwrap().unwrap();

    let anchor = table.anchor(id).unwrap();
    assert!(anchor.flex);
    assert_eq!(anchor.columns, 3);
    assert_eq!(table.iter_on_row(&"a", None, None).count(), 3);
}

#[test]
fn flexible_event_stops_at_next_event_on_first_track() {
    let mut table = morning();
    table.set_event(at(9, 30), "talk", Some(15), &["a"]).unwrap();

    let id = table.set_event(at(9, 0), "break", Some(0), &["a", "b"]).unwrap().unwrap();
    assert_eq!(table.anchor(id).unwrap().columns, 2);
    assert_eq!(payload_at(&table, at(9, 15), "b"), Some("break"));
    assert_eq!(payload_at(&table, at(9, 30), "b"), None);
    assert!(table.errors().is_empty());
}

#[test]
fn flexible_item_on_fixed_extension_trims_fixed_item_at_its_start() {
    let mut table = morning();
    let x = table.set_event(at(9, 0), "x", Some(30), &["a"]).unwrap().unwrap();
    let y = table.set_event(at(9, 15), "y", None, &["a"]).unwrap().unwrap();

    assert!(table
        .errors()
        .iter()
        .all(|diagnostic| diagnostic.kind != DiagnosticKind::OverlapReference));
    assert!(table.errors().is_empty());

    assert_eq!(table.anchor(x).unwrap().columns, 1);
    let y_anchor = table.anchor(y).unwrap();
    assert_eq!(y_anchor.time, at(9, 15));
    assert_eq!(y_anchor.columns, 3);

    assert!(matches!(
        table.get(at(9, 15), &"a"),
        Some(CellView::Anchor(anchor)) if anchor.payload == "y"
    ));
    assert_eq!(payload_at(&table, at(9, 30), "a"), Some("y"));
    assert_eq!(payload_at(&table, at(9, 45), "a"), Some("y"));
}

#[test]
fn fixed_item_carves_into_flexible_extension_on_every_track() {
    let mut table = morning();
    let lunch = table.set_event(at(9, 0), "lunch", None, &["a", "b"]).unwrap().unwrap();
    assert_eq!(table.anchor(lunch).unwrap().columns, 4);

    let talk = table.set_event(at(9, 30), "talk", Some(15), &["a"]).unwrap().unwrap();

    assert!(table.errors().is_empty());
    assert_eq!(table.anchor(lunch).unwrap().columns, 2);
    assert_eq!(table.anchor(talk).unwrap().columns, 1);

    assert_eq!(payload_at(&table, at(9, 15), "b"), Some("lunch"));
    assert_eq!(payload_at(&table, at(9, 30), "a"), Some("talk"));
    for (time, track) in [(at(9, 30), "b"), (at(9, 45), "a"), (at(9, 45), "b")] {
        assert_eq!(payload_at(&table, time, track), None, "{time} {track}");
    }
}

#[test]
fn fixed_over_fixed_extension_warns_and_trims() {
    let mut table = morning();
    let long = table.set_event(at(9, 0), "long", Some(60), &["a"]).unwrap().unwrap();
    table.set_event(at(9, 30), "short", Some(15), &["a"]).unwrap().unwrap();

    assert_eq!(table.errors().len(), 1);
    let diagnostic = &table.errors()[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::OverlapReference);
    assert_eq!(diagnostic.item, "short");
    assert_eq!(diagnostic.previous, "long");
    assert_eq!(diagnostic.time, at(9, 30));

    assert_eq!(table.anchor(long).unwrap().columns, 2);
    assert_eq!(payload_at(&table, at(9, 15), "a"), Some("long"));
    assert_eq!(payload_at(&table, at(9, 30), "a"), Some("short"));
    assert_eq!(payload_at(&table, at(9, 45), "a"), None);
}

#[test]
fn flexible_trailing_cell_yields_to_fixed_extension() {
    let mut table: TimeTable<&str, &str> =
        TimeTable::new((at(9, 0), at(10, 0)), vec!["a", "b", "c"]).unwrap();
    let panel = table.set_event(at(9, 30), "panel", Some(30), &["c", "b"]).unwrap().unwrap();

    let social = table.set_event(at(9, 0), "social", None, &["a", "b"]).unwrap().unwrap();

    assert!(table.errors().is_empty());
    assert_eq!(table.anchor(social).unwrap().columns, 2);
    assert_eq!(table.anchor(panel).unwrap().columns, 2);
    assert_eq!(payload_at(&table, at(9, 15), "a"), Some("social"));
    assert_eq!(payload_at(&table, at(9, 30), "a"), None);
    assert_eq!(payload_at(&table, at(9, 30), "b"), Some("panel"));
    assert_eq!(payload_at(&table, at(9, 45), "b"), Some("panel"));
}

#[test]
fn yielding_flexible_item_leaves_other_flexible_items_untouched() {
    let mut table: TimeTable<&str, &str> =
        TimeTable::new((at(9, 0), at(10, 0)), vec!["a", "b", "c", "d", "e"]).unwrap();
    let panel = table.set_event(at(9, 30), "panel", Some(30), &["e", "c"]).unwrap().unwrap();
    let lounge = table.set_event(at(9, 30), "lounge", None, &["d", "b"]).unwrap().unwrap();
    assert_eq!(table.anchor(lounge).unwrap().columns, 2);

    let social = table
        .set_event(at(9, 0), "social", None, &["a", "b", "c"])
        .unwrap()
        .unwrap();

    assert!(table.errors().is_empty());
    assert_eq!(table.anchor(social).unwrap().columns, 2);
    assert_eq!(table.anchor(lounge).unwrap().columns, 2);
    assert_eq!(table.anchor(panel).unwrap().columns, 2);
    for time in [at(9, 30), at(9, 45)] {
        assert_eq!(payload_at(&table, time, "b"), Some("lounge"), "{time}");
        assert_eq!(payload_at(&table, time, "d"), Some("lounge"), "{time}");
        assert_eq!(payload_at(&table, time, "c"), Some("panel"), "{time}");
        assert_eq!(payload_at(&table, time, "a"), None, "{time}");
    }
    assert_eq!(payload_at(&table, at(9, 15), "b"), Some("social"));
}

#[test]
fn fixed_event_past_grid_end_is_clipped() {
    let mut table = morning();
    let id = table.set_event(at(9, 30), "late", Some(90), &["a"]).unwrap().unwrap();

    assert_eq!(table.anchor(id).unwrap().columns, 2);
    assert_eq!(table.occupied_cells(), 2);
}

#[test]
fn non_overlapping_placements_are_reported_by_events_at_time() {
    let mut table: TimeTable<&str, usize> =
        TimeTable::new((at(9, 0), at(12, 0)), vec!["a", "b", "c"]).unwrap();
    let plan = [
        (at(9, 0), 45, vec!["a"]),
        (at(9, 0), 30, vec!["b", "c"]),
        (at(9, 45), 60, vec!["a", "b"]),
        (at(10, 0), 15, vec!["c"]),
        (at(11, 0), 60, vec!["c", "a"]),
    ];
    for (index, (time, minutes, tracks)) in plan.iter().enumerate() {
        table.set_event(*time, index, Some(*minutes), tracks).unwrap().unwrap();
    }
    assert!(table.errors().is_empty());

    for time in table.columns().collect::<Vec<_>>() {
        let mut expected: Vec<usize> = plan
            .iter()
            .enumerate()
            .filter(|(_, (start, minutes, _))| {
                let end = *start + chrono::Duration::minutes(i64::from(*minutes));
                *start <= time && time < end
            })
            .map(|(index, _)| index)
            .collect();
        expected.sort_unstable();

        let mut active: Vec<usize> = table
            .events_at_time(time, true)
            .iter()
            .map(|view| *view.payload())
            .collect();
        active.sort_unstable();
        active.dedup();
        assert_eq!(active, expected, "at {time}");
    }
}
