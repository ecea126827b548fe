//! The round loop: route scanning, trip selection and transfer relaxation.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use fixedbitset::FixedBitSet;
use log::{debug, trace};

use super::Direction;
use super::state::{Predecessor, RaptorState};
use crate::model::TransitModel;
use crate::routing::filters::ResolvedFilters;
use crate::{RouteIdx, StopIdx, Time, TripIdx};

/// One access candidate for one datetime index: the stop, the instant the
/// traveller is there, and the street walk that got them there (if any).
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchSeed {
    pub stop: StopIdx,
    pub time: Time,
    pub walk: Option<Time>,
}

/// One egress candidate, shared by all datetime indices.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchTarget {
    pub stop: StopIdx,
    pub walk: Time,
}

pub(crate) struct SearchContext<'a> {
    pub model: &'a TransitModel,
    pub direction: Direction,
    /// Query date per datetime index, for calendar filtering.
    pub dates: &'a [NaiveDate],
    /// Seeds per datetime index.
    pub seeds: &'a [Vec<SearchSeed>],
    pub targets: &'a [SearchTarget],
    pub forbidden: &'a ResolvedFilters,
    pub max_transfers: usize,
}

/// The trip currently ridden while sweeping a route, per datetime index.
#[derive(Debug, Clone, Copy)]
struct Onboard {
    trip: TripIdx,
    board_pos: usize,
    board_stop: StopIdx,
    board_time: Time,
}

/// Runs the full search and hands back the labels for extraction.
///
/// Cancellation is cooperative: the flag is read at the start of every round
/// and a cancelled search simply stops accumulating, leaving whatever labels
/// exist so far.
pub(crate) fn run(ctx: &SearchContext<'_>, cancel: Option<&AtomicBool>) -> RaptorState {
    // Round k holds journeys of k boardings, so exploring `max_transfers`
    // transfers needs max_transfers + 1 boarding rounds on top of round 0.
    let rounds = ctx.max_transfers + 2;
    let mut state = RaptorState::new(
        ctx.direction,
        ctx.model.num_stops(),
        ctx.dates.len(),
        rounds,
    );

    for (dt, seeds) in ctx.seeds.iter().enumerate() {
        for seed in seeds {
            if state.update(0, seed.stop, dt, seed.time, Predecessor::Seed { walk: seed.walk }) {
                state.marked[0].insert(seed.stop);
            }
        }
    }
    relax_connections(ctx, &mut state, 0);

    for round in 1..rounds {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            debug!("search cancelled before round {round}");
            break;
        }

        let queue = routes_to_scan(ctx, &state, round - 1);
        if queue.is_empty() {
            break;
        }
        trace!("round {round}: scanning {} routes", queue.len());

        for &(route, boundary) in &queue {
            scan_route(ctx, &mut state, round, route, boundary);
        }
        relax_connections(ctx, &mut state, round);

        if state.marked[round].is_clear() {
            break;
        }
    }

    state
}

/// Collects the routes touching any stop marked in `round`, with the
/// boundary position the sweep starts from: the first marked position in
/// travel order, the last one in the reversed search. Route index order
/// keeps the scan deterministic.
fn routes_to_scan(
    ctx: &SearchContext<'_>,
    state: &RaptorState,
    round: usize,
) -> Vec<(RouteIdx, usize)> {
    let model = ctx.model;
    let mut boundary: Vec<Option<usize>> = vec![None; model.num_routes()];

    for stop in state.marked[round].ones() {
        for &rp_idx in model.route_points_of_stop(stop) {
            let rp = model.route_point(rp_idx);
            if ctx.forbidden.route_forbidden(rp.route) {
                continue;
            }
            let pos = rp.order as usize;
            let entry = &mut boundary[rp.route];
            *entry = Some(match (*entry, ctx.direction) {
                (None, _) => pos,
                (Some(p), Direction::DepartAfter) => p.min(pos),
                (Some(p), Direction::ArriveBefore) => p.max(pos),
            });
        }
    }

    boundary
        .into_iter()
        .enumerate()
        .filter_map(|(route, pos)| pos.map(|p| (route, p)))
        .collect()
}

/// Sweeps one route once for the round, carrying per-datetime onboard state.
fn scan_route(
    ctx: &SearchContext<'_>,
    state: &mut RaptorState,
    round: usize,
    route: RouteIdx,
    boundary: usize,
) {
    let model = ctx.model;
    let direction = ctx.direction;
    let rps = model.route_points_of_route(route);
    let n_dt = ctx.dates.len();

    let mut onboard: Vec<Option<Onboard>> = vec![None; n_dt];
    let bounds: Vec<Time> = (0..n_dt).map(|dt| target_bound(ctx, state, dt)).collect();

    let positions: Vec<usize> = match direction {
        Direction::DepartAfter => (boundary..rps.len()).collect(),
        Direction::ArriveBefore => (0..=boundary).rev().collect(),
    };

    for pos in positions {
        let stop = model.route_point(rps[pos]).stop;

        for dt in 0..n_dt {
            // Alight side: propagate the onboard trip's time at this stop.
            if let Some(ob) = onboard[dt] {
                if pos != ob.board_pos {
                    let st = model.stop_times(ob.trip)[pos];
                    let here = match direction {
                        Direction::DepartAfter => st.arrival,
                        Direction::ArriveBefore => st.departure,
                    };
                    // Times only move one way along a journey, so anything
                    // that cannot beat the destination bound is dead.
                    if direction.is_better(here, bounds[dt])
                        && state.update(
                            round,
                            stop,
                            dt,
                            here,
                            Predecessor::Ride {
                                trip: ob.trip,
                                board_stop: ob.board_stop,
                                board_time: ob.board_time,
                            },
                        )
                    {
                        state.marked[round].insert(stop);
                    }
                }
            }

            // Board side: try to catch a better trip using the previous
            // round's label at this stop.
            let prev = state.label(round - 1, stop, dt);
            if prev == direction.unreached() {
                continue;
            }
            let worth_trying = match onboard[dt] {
                None => true,
                Some(ob) => {
                    let st = model.stop_times(ob.trip)[pos];
                    let board_side = match direction {
                        Direction::DepartAfter => st.departure,
                        Direction::ArriveBefore => st.arrival,
                    };
                    direction.is_better(prev, board_side)
                }
            };
            if !worth_trying {
                continue;
            }
            if let Some(trip) = select_trip(ctx, route, pos, prev, dt) {
                let st = model.stop_times(trip)[pos];
                let board_time = match direction {
                    Direction::DepartAfter => st.departure,
                    Direction::ArriveBefore => st.arrival,
                };
                let replace = match onboard[dt] {
                    None => true,
                    Some(ob) => {
                        let cur = model.stop_times(ob.trip)[pos];
                        let cur_board = match direction {
                            Direction::DepartAfter => cur.departure,
                            Direction::ArriveBefore => cur.arrival,
                        };
                        direction.is_better(board_time, cur_board)
                    }
                };
                if replace {
                    onboard[dt] = Some(Onboard {
                        trip,
                        board_pos: pos,
                        board_stop: stop,
                        board_time,
                    });
                }
            }
        }
    }
}

/// Picks the boardable trip closest to `bound` at this route position:
/// earliest departing at or after it (`DepartAfter`), latest arriving at or
/// before it (`ArriveBefore`). Trips are pre-sorted by the builder, so the
/// first admissible candidate in scan order wins; calendar-inactive and
/// forbidden trips are passed over.
fn select_trip(
    ctx: &SearchContext<'_>,
    route: RouteIdx,
    pos: usize,
    bound: Time,
    dt: usize,
) -> Option<TripIdx> {
    let model = ctx.model;
    let date = ctx.dates[dt];
    let trips = model.trips_of_route(route);

    let admissible = |trip: TripIdx| {
        if ctx.forbidden.trip_forbidden(trip) {
            return false;
        }
        let st = model.stop_times(trip)[pos];
        let catchable = match ctx.direction {
            Direction::DepartAfter => st.departure >= bound,
            Direction::ArriveBefore => st.arrival <= bound,
        };
        catchable && model.trip_runs_on(trip, date)
    };

    match ctx.direction {
        Direction::DepartAfter => trips.iter().copied().find(|&t| admissible(t)),
        Direction::ArriveBefore => trips.iter().rev().copied().find(|&t| admissible(t)),
    }
}

/// Relaxes in-station connections out of every stop improved this round.
/// Transfers do not consume a round: the reached stop keeps the round index
/// and may board again in the next one.
fn relax_connections(ctx: &SearchContext<'_>, state: &mut RaptorState, round: usize) {
    let model = ctx.model;
    let direction = ctx.direction;
    let n_dt = ctx.dates.len();

    let current: Vec<StopIdx> = state.marked[round].ones().collect();
    let mut new_marks = FixedBitSet::with_capacity(model.num_stops());
    let bounds: Vec<Time> = (0..n_dt).map(|dt| target_bound(ctx, state, dt)).collect();

    for stop in current {
        let connections = match direction {
            Direction::DepartAfter => model.outgoing_connections(stop),
            Direction::ArriveBefore => model.incoming_connections(stop),
        };
        for &connection_idx in connections {
            let connection = model.connection(connection_idx);
            let other = match direction {
                Direction::DepartAfter => connection.to,
                Direction::ArriveBefore => connection.from,
            };
            for dt in 0..n_dt {
                let at = state.label(round, stop, dt);
                if at == direction.unreached() {
                    continue;
                }
                let reached = direction.shift(at, connection.duration);
                if !direction.is_better(reached, bounds[dt]) {
                    continue;
                }
                if state.update(
                    round,
                    other,
                    dt,
                    reached,
                    Predecessor::Transfer {
                        connection: connection_idx,
                        prev_stop: stop,
                        prev_time: at,
                    },
                ) {
                    new_marks.insert(other);
                }
            }
        }
    }

    state.marked[round].union_with(&new_marks);
}

/// Best final time at any target so far, egress walk included. Used as the
/// classic RAPTOR destination bound.
fn target_bound(ctx: &SearchContext<'_>, state: &RaptorState, dt: usize) -> Time {
    let mut bound = ctx.direction.unreached();
    for target in ctx.targets {
        let at = state.best(target.stop, dt);
        if at == ctx.direction.unreached() {
            continue;
        }
        let reached = ctx.direction.shift(at, target.walk);
        if ctx.direction.is_better(reached, bound) {
            bound = reached;
        }
    }
    bound
}
