//! End-to-end planning scenarios over a small hand-built network.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, NaiveDateTime};
use geo::Point;
use tramway_core::prelude::*;
use tramway_core::model::ALL_WEEKDAYS;
use tramway_core::model::StopTime;
use tramway_core::StopIdx;

/// Stops A, B, C, D. Line 1 runs A -> B -> C twice:
///   t1  A 08:00 -> B 08:10/08:12 -> C 08:25
///   t2  A 09:00 -> B 09:10/09:12 -> C 09:25
/// An in-station connection B -> D (300 s) feeds the express line X, whose
/// single trip runs D 08:16 -> C 08:20. Service every day of June 2024.
struct Fixture {
    model: TransitModel,
    a: StopIdx,
    b: StopIdx,
    c: StopIdx,
    d: StopIdx,
}

fn fixture() -> Fixture {
    fixture_with_express_arrival(30000)
}

/// Same network with the express reaching C at `express_arrival` instead of
/// 08:20, for scenarios where the transfer alternative must lose.
fn fixture_with_express_arrival(express_arrival: i32) -> Fixture {
    let mut b = TransitModelBuilder::new();
    let network = b.add_network("n1", "City");
    let rail = b.add_mode_type("rail", "Rail");
    let tram = b.add_mode("tram", "Tram", rail);
    let company = b.add_company("c1", "Operator");
    let line1 = b.add_line("l1", "Line 1", "1", rail, network);
    let line_x = b.add_line("lx", "Express", "X", rail, network);
    let r1 = b.add_route("r1", "Line 1 forward", line1, true);
    let rx = b.add_route("rx", "Express forward", line_x, true);

    let area_a = b.add_stop_area("sa_a", "Alpha", Point::new(0.0, 0.0));
    let area_b = b.add_stop_area("sa_b", "Bravo", Point::new(0.01, 0.0));
    let area_c = b.add_stop_area("sa_c", "Charlie", Point::new(0.02, 0.0));
    let stop_a = b.add_stop("a", "Alpha", Point::new(0.0, 0.0), area_a);
    let stop_b = b.add_stop("b", "Bravo", Point::new(0.01, 0.0), area_b);
    let stop_c = b.add_stop("c", "Charlie", Point::new(0.02, 0.0), area_c);
    let stop_d = b.add_stop("d", "Bravo express", Point::new(0.01, 0.001), area_b);

    b.add_route_stops(r1, &[stop_a, stop_b, stop_c]);
    b.add_route_stops(rx, &[stop_d, stop_c]);
    b.add_connection(stop_b, stop_d, 300, 900);

    let mut cal = ServiceCalendar::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    cal.add_range(
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        ALL_WEEKDAYS,
    )
    .unwrap();
    let calendar = b.add_calendar(cal);

    b.add_trip(
        "t1",
        r1,
        calendar,
        tram,
        company,
        vec![
            StopTime::new(28800, 28800, 0),
            StopTime::new(29400, 29520, 1),
            StopTime::new(30300, 30300, 2),
        ],
    );
    b.add_trip(
        "t2",
        r1,
        calendar,
        tram,
        company,
        vec![
            StopTime::new(32400, 32400, 0),
            StopTime::new(33000, 33120, 1),
            StopTime::new(33900, 33900, 2),
        ],
    );
    b.add_trip(
        "tx",
        rx,
        calendar,
        tram,
        company,
        vec![
            StopTime::new(29760, 29760, 0),
            StopTime::new(express_arrival, express_arrival, 1),
        ],
    );

    Fixture {
        model: b.build().unwrap(),
        a: stop_a,
        b: stop_b,
        c: stop_c,
        d: stop_d,
    }
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 10)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn request(datetimes: Vec<NaiveDateTime>) -> JourneyRequest {
    JourneyRequest::new(
        EntryPoint::parse("stop_point:a").unwrap(),
        EntryPoint::parse("stop_point:c").unwrap(),
        datetimes,
    )
}

#[test]
fn transfer_beats_direct_on_arrival() {
    let fx = fixture();
    let journeys =
        plan_journeys(&fx.model, &NoStreetNetwork, &request(vec![at(7, 55)]), None).unwrap();

    // Both options are Pareto-optimal: the express arrives 08:20 with one
    // transfer, the direct ride arrives 08:25 without any.
    assert_eq!(journeys.len(), 2);

    let express = &journeys[0];
    assert_eq!(express.arrival, at(8, 20));
    assert_eq!(express.transfers, 1);
    assert_eq!(express.legs.len(), 3);
    assert!(matches!(
        express.legs[1],
        Leg::Transfer { from_stop, to_stop, .. } if from_stop == fx.b && to_stop == fx.d
    ));

    let direct = &journeys[1];
    assert_eq!(direct.departure, at(8, 0));
    assert_eq!(direct.arrival, at(8, 25));
    assert_eq!(direct.transfers, 0);
    assert!(matches!(
        direct.legs[..],
        [Leg::Ride { from_stop, to_stop, .. }] if from_stop == fx.a && to_stop == fx.c
    ));
}

#[test]
fn slower_transfer_alternative_is_dominated() {
    // The express now reaches C at 08:30, after the direct 08:25 ride. The
    // transfer path is reachable in a later round but improves nothing, so
    // only the direct journey survives.
    let fx = fixture_with_express_arrival(30600);
    let journeys =
        plan_journeys(&fx.model, &NoStreetNetwork, &request(vec![at(7, 55)]), None).unwrap();

    assert_eq!(journeys.len(), 1);
    assert_eq!(journeys[0].arrival, at(8, 25));
    assert_eq!(journeys[0].transfers, 0);
}

#[test]
fn extra_transfer_rounds_do_not_change_converged_results() {
    // Every optimal journey here needs at most one transfer; once the
    // search has converged, allowing more rounds must not alter the output.
    let fx = fixture();
    let mut narrow = request(vec![at(7, 55)]);
    narrow.max_transfers = 1;
    let wide = request(vec![at(7, 55)]);

    let with_one = plan_journeys(&fx.model, &NoStreetNetwork, &narrow, None).unwrap();
    let with_ten = plan_journeys(&fx.model, &NoStreetNetwork, &wide, None).unwrap();

    assert_eq!(with_one.len(), 2);
    assert_eq!(
        serde_json::to_string(&with_one).unwrap(),
        serde_json::to_string(&with_ten).unwrap()
    );
}

#[test]
fn departure_after_last_trip_yields_nothing() {
    let fx = fixture();
    let journeys =
        plan_journeys(&fx.model, &NoStreetNetwork, &request(vec![at(10, 0)]), None).unwrap();
    assert!(journeys.is_empty());
}

#[test]
fn forbidding_the_express_line_keeps_only_the_direct_ride() {
    let fx = fixture();
    let mut req = request(vec![at(7, 55)]);
    req.forbidden_uris = vec!["line:lx".to_string()];
    let journeys = plan_journeys(&fx.model, &NoStreetNetwork, &req, None).unwrap();

    assert_eq!(journeys.len(), 1);
    assert_eq!(journeys[0].arrival, at(8, 25));
    assert_eq!(journeys[0].transfers, 0);
}

#[test]
fn arrive_before_picks_the_latest_departure() {
    let fx = fixture();
    let mut req = request(vec![at(9, 30)]);
    req.direction = Direction::ArriveBefore;
    let journeys = plan_journeys(&fx.model, &NoStreetNetwork, &req, None).unwrap();

    assert!(!journeys.is_empty());
    let best = &journeys[0];
    assert_eq!(best.departure, at(9, 0));
    assert_eq!(best.arrival, at(9, 25));
    assert_eq!(best.transfers, 0);
    assert!(matches!(
        best.legs[..],
        [Leg::Ride { from_stop, to_stop, .. }] if from_stop == fx.a && to_stop == fx.c
    ));
}

#[test]
fn datetime_batch_answers_each_independently() {
    let fx = fixture();
    let journeys = plan_journeys(
        &fx.model,
        &NoStreetNetwork,
        &request(vec![at(7, 55), at(8, 30)]),
        None,
    )
    .unwrap();

    let first: Vec<_> = journeys.iter().filter(|j| j.datetime_index == 0).collect();
    let second: Vec<_> = journeys.iter().filter(|j| j.datetime_index == 1).collect();

    assert_eq!(first.len(), 2);
    assert_eq!(first[0].arrival, at(8, 20));
    // At 08:30 only the second trip is catchable and the express has gone.
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].arrival, at(9, 25));
    assert_eq!(second[0].transfers, 0);
}

#[test]
fn batch_requests_match_single_runs() {
    let fx = fixture();
    let requests = vec![request(vec![at(7, 55)]), request(vec![at(8, 30)])];
    let batched = plan_journeys_batch(&fx.model, &NoStreetNetwork, &requests, None);

    assert_eq!(batched.len(), 2);
    for (req, outcome) in requests.iter().zip(&batched) {
        let single = plan_journeys(&fx.model, &NoStreetNetwork, req, None).unwrap();
        let batch = outcome.as_ref().unwrap();
        assert_eq!(batch.len(), single.len());
        for (a, b) in batch.iter().zip(&single) {
            assert_eq!(a.departure, b.departure);
            assert_eq!(a.arrival, b.arrival);
            assert_eq!(a.transfers, b.transfers);
        }
    }
}

#[test]
fn identical_runs_produce_identical_journeys() {
    let fx = fixture();
    let req = request(vec![at(7, 55), at(8, 30)]);
    let first = plan_journeys(&fx.model, &NoStreetNetwork, &req, None).unwrap();
    let second = plan_journeys(&fx.model, &NoStreetNetwork, &req, None).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

/// A street network where the origin neighbourhood reaches stop A in two
/// minutes and the destination neighbourhood reaches stop C in one.
struct WalkGrid {
    a: StopIdx,
    c: StopIdx,
}

impl StreetNetwork for WalkGrid {
    fn reachable_stops(
        &self,
        _from: Point<f64>,
        _budget: i32,
        direction: AccessDirection,
    ) -> Result<Vec<(StopIdx, i32)>, AccessError> {
        Ok(match direction {
            AccessDirection::Departure => vec![(self.a, 120)],
            AccessDirection::Arrival => vec![(self.c, 60)],
        })
    }
}

struct TimedOut;

impl StreetNetwork for TimedOut {
    fn reachable_stops(
        &self,
        _from: Point<f64>,
        _budget: i32,
        _direction: AccessDirection,
    ) -> Result<Vec<(StopIdx, i32)>, AccessError> {
        Err(AccessError::Timeout)
    }
}

#[test]
fn coordinate_origin_adds_an_access_walk_leg() {
    let fx = fixture();
    let streets = WalkGrid { a: fx.a, c: fx.c };
    let mut req = request(vec![at(7, 55)]);
    req.origin = EntryPoint::parse("coord:0.0005;0.0").unwrap();
    let journeys = plan_journeys(&fx.model, &streets, &req, None).unwrap();

    assert!(!journeys.is_empty());
    let direct = journeys.last().unwrap();
    assert!(matches!(
        direct.legs[0],
        Leg::Walk { from_stop: None, to_stop: Some(stop), duration: 120, .. } if stop == fx.a
    ));
    // Walking 120 s from 07:55 still catches the 08:00 departure.
    assert_eq!(direct.arrival, at(8, 25));
}

#[test]
fn street_timeout_degrades_to_exact_stops() {
    let fx = fixture();
    let journeys = plan_journeys(&fx.model, &TimedOut, &request(vec![at(7, 55)]), None).unwrap();
    assert_eq!(journeys.len(), 2);
    assert_eq!(journeys[1].arrival, at(8, 25));
}

#[test]
fn street_timeout_on_coordinates_is_an_error() {
    let fx = fixture();
    let mut req = request(vec![at(7, 55)]);
    req.origin = EntryPoint::parse("coord:0.0005;0.0").unwrap();
    let err = plan_journeys(&fx.model, &TimedOut, &req, None).unwrap_err();
    assert!(matches!(err, QueryError::InvalidEntryPoint(_)));
}

#[test]
fn unknown_entry_point_is_reported() {
    let fx = fixture();
    let mut req = request(vec![at(7, 55)]);
    req.origin = EntryPoint::parse("stop_point:ghost").unwrap();
    let err = plan_journeys(&fx.model, &NoStreetNetwork, &req, None).unwrap_err();
    assert!(matches!(err, QueryError::UnknownEntryPoint(uri) if uri == "stop_point:ghost"));
}

#[test]
fn stop_area_entry_point_uses_member_stops() {
    let fx = fixture();
    let mut req = request(vec![at(7, 55)]);
    req.origin = EntryPoint::parse("stop_area:sa_a").unwrap();
    let journeys = plan_journeys(&fx.model, &NoStreetNetwork, &req, None).unwrap();
    assert_eq!(journeys.len(), 2);
}

#[test]
fn date_without_service_yields_nothing() {
    let fx = fixture();
    let july = NaiveDate::from_ymd_opt(2024, 7, 1)
        .unwrap()
        .and_hms_opt(7, 55, 0)
        .unwrap();
    let journeys =
        plan_journeys(&fx.model, &NoStreetNetwork, &request(vec![july]), None).unwrap();
    assert!(journeys.is_empty());
}

#[test]
fn date_outside_calendar_window_is_rejected() {
    let fx = fixture();
    let far = NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(7, 55, 0)
        .unwrap();
    let err = plan_journeys(&fx.model, &NoStreetNetwork, &request(vec![far]), None).unwrap_err();
    assert_eq!(
        err,
        QueryError::DateOutOfCalendarRange(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    );
}

#[test]
fn empty_datetime_batch_is_a_no_op() {
    let fx = fixture();
    let journeys =
        plan_journeys(&fx.model, &NoStreetNetwork, &request(Vec::new()), None).unwrap();
    assert!(journeys.is_empty());
}

#[test]
fn cancellation_stops_the_search() {
    let fx = fixture();
    let cancel = AtomicBool::new(true);
    cancel.store(true, Ordering::Relaxed);
    let journeys = plan_journeys(
        &fx.model,
        &NoStreetNetwork,
        &request(vec![at(7, 55)]),
        Some(&cancel),
    )
    .unwrap();
    // Only seed labels exist, so nothing reaches the destination.
    assert!(journeys.is_empty());
}
