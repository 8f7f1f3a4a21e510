//! Integration test: audit two adjoining street edges end to end -- parse
//! the GeoJSON payloads, walk the first street, hand over to the second
//! with the continuity policy, and finish it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use kerbside_route::{Continuation, RouteConfig, RouteTask, TaskPhase, TaskSequence};

/// Roughly this many meters of longitude on the equator, in degrees.
fn degrees(meters: f64) -> f64 {
    meters / 111_195.0
}

fn street_payload(street_edge_id: i64, coordinates: &[(f64, f64)]) -> String {
    let coords = coordinates
        .iter()
        .map(|(lng, lat)| format!("[{lng}, {lat}]"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{{
            "type": "Feature",
            "geometry": {{"type": "LineString", "coordinates": [{coords}]}},
            "properties": {{"street_edge_id": {street_edge_id}, "task_start": "2015-11-17 01:15:00"}}
        }}"#
    )
}

#[test]
fn two_street_audit() {
    let config = RouteConfig::default();
    let mut sequence = TaskSequence::new(config);

    // First street: ~120 m east along the equator with a midpoint vertex.
    let first_payload = street_payload(
        101,
        &[(0.0, 0.0), (degrees(60.0), 0.0), (degrees(120.0), 0.0)],
    );
    let first = RouteTask::from_geojson(&first_payload, config).unwrap();
    assert_eq!(first.phase(), TaskPhase::Loaded);
    assert_eq!(sequence.advance(first), Continuation::JumpToStart);

    // Walk the street in five stops; completion must never decrease and
    // the overlays must always meet at the snapped position.
    let stops_m = [10.0, 35.0, 30.0, 80.0, 115.0];
    let mut previous_completion = 0.0;
    for meters in stops_m {
        let task = sequence.current_mut().unwrap();
        let progress = task.update_progress(0.0, degrees(meters));
        assert!(
            progress.completion >= previous_completion,
            "completion regressed at {meters} m",
        );
        previous_completion = progress.completion;

        let boundary = *progress.completed_path.last().unwrap();
        assert_eq!(boundary, progress.remaining_path[0]);
    }

    // The last stop was within 10 m of the final vertex.
    let task = sequence.current().unwrap();
    assert_eq!(task.phase(), TaskPhase::Completed);
    assert!(task.completion() > 0.9);
    assert!(task.is_at_end(0.0, degrees(115.0)));

    // Second street: served end-first. Its "start" is 60 m past the first
    // street's end, its "end" 3 m away, so the handover reverses it.
    let second_payload = street_payload(
        102,
        &[
            (degrees(120.0 + 60.0), 0.0),
            (degrees(120.0 + 3.0), 0.0),
        ],
    );
    let second = RouteTask::from_geojson(&second_payload, config).unwrap();
    assert_eq!(sequence.advance(second), Continuation::Continuous);
    assert_eq!(sequence.finished().len(), 1);
    assert_eq!(sequence.finished()[0].street_edge_id(), 101);

    let second = sequence.current_mut().unwrap();
    assert_eq!(second.street_edge_id(), 102);
    // Traversal begins at the vertex adjoining the finished street.
    let start_lng = second.start().unwrap().x();
    assert!((start_lng - degrees(123.0)).abs() < 1e-12);

    // Finish the second street.
    let progress = second.update_progress(0.0, degrees(178.0));
    assert!((progress.completion - 1.0).abs() < 0.05);
    assert_eq!(second.phase(), TaskPhase::Completed);
}

#[test]
fn disconnected_next_street_asks_for_a_jump() {
    let config = RouteConfig::default();
    let mut sequence = TaskSequence::new(config);

    let here = street_payload(7, &[(0.0, 0.0), (degrees(40.0), 0.0)]);
    sequence.advance(RouteTask::from_geojson(&here, config).unwrap());
    sequence
        .current_mut()
        .unwrap()
        .update_progress(0.0, degrees(39.0));

    // The next assigned street is on the other side of the neighborhood.
    let elsewhere = street_payload(8, &[(degrees(900.0), 0.0), (degrees(960.0), 0.0)]);
    let continuation = sequence.advance(RouteTask::from_geojson(&elsewhere, config).unwrap());
    assert_eq!(continuation, Continuation::JumpToStart);

    // Unreversed: the walker is dropped at the served start vertex.
    let current = sequence.current().unwrap();
    assert!((current.start().unwrap().x() - degrees(900.0)).abs() < 1e-12);
}
