//! Turning engine labels into concrete itineraries.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;

use super::raptor::{Direction, Predecessor, RaptorState, SearchTarget};
use crate::model::TransitModel;
use crate::{ConnectionIdx, LineIdx, RouteIdx, StopIdx, Time, TripIdx};

/// One step of an itinerary. Walk legs at the edges have `None` for the raw
/// requested endpoint; everything in between is stop-to-stop.
#[derive(Debug, Clone, Serialize)]
pub enum Leg {
    Walk {
        from_stop: Option<StopIdx>,
        to_stop: Option<StopIdx>,
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
        duration: Time,
    },
    Ride {
        route: RouteIdx,
        line: LineIdx,
        trip: TripIdx,
        from_stop: StopIdx,
        to_stop: StopIdx,
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
    },
    Transfer {
        connection: ConnectionIdx,
        from_stop: StopIdx,
        to_stop: StopIdx,
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
    },
}

/// A complete itinerary answering one requested datetime.
#[derive(Debug, Clone, Serialize)]
pub struct Journey {
    pub legs: Vec<Leg>,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    pub transfers: usize,
    /// Which entry of the request's datetime batch this journey answers.
    pub datetime_index: usize,
}

impl Journey {
    fn from_legs(legs: Vec<Leg>, datetime_index: usize) -> Option<Self> {
        let departure = match legs.first()? {
            Leg::Walk { departure, .. }
            | Leg::Ride { departure, .. }
            | Leg::Transfer { departure, .. } => *departure,
        };
        let arrival = match legs.last()? {
            Leg::Walk { arrival, .. } | Leg::Ride { arrival, .. } | Leg::Transfer { arrival, .. } => {
                *arrival
            }
        };
        let rides = legs.iter().filter(|l| matches!(l, Leg::Ride { .. })).count();
        Some(Self {
            legs,
            departure,
            arrival,
            transfers: rides.saturating_sub(1),
            datetime_index,
        })
    }
}

/// Walks predecessor chains backward from the best target label of every
/// round and keeps the Pareto frontier over (final time, transfers).
///
/// Rounds are visited in ascending order, so a journey is kept only when it
/// strictly improves the final time; transfer counts grow with the round
/// index, which makes the kept set exactly the non-dominated one. An
/// unreachable destination yields an empty list, never an error.
pub(crate) fn extract_journeys(
    model: &TransitModel,
    state: &RaptorState,
    direction: Direction,
    dates: &[NaiveDate],
    targets: &[SearchTarget],
) -> Vec<Journey> {
    let mut journeys = Vec::new();

    for dt in 0..state.n_datetimes() {
        let mut best_final = direction.unreached();
        for round in 0..state.rounds() {
            let mut chosen: Option<(SearchTarget, Time, Time)> = None;
            for target in targets {
                let label = state.label(round, target.stop, dt);
                if label == direction.unreached() {
                    continue;
                }
                let finish = direction.shift(label, target.walk);
                if chosen.is_none_or(|(_, _, f)| direction.is_better(finish, f)) {
                    chosen = Some((*target, label, finish));
                }
            }
            let Some((target, label, finish)) = chosen else {
                continue;
            };
            if !direction.is_better(finish, best_final) {
                continue;
            }
            if let Some(journey) =
                reconstruct(model, state, direction, dates[dt], dt, round, target, label)
            {
                best_final = finish;
                journeys.push(journey);
            }
        }
    }

    journeys
}

/// Rebuilds one itinerary from its destination label. The chain runs toward
/// the seeds: backward in travel order for `DepartAfter`, forward for
/// `ArriveBefore`.
#[allow(clippy::too_many_arguments)]
fn reconstruct(
    model: &TransitModel,
    state: &RaptorState,
    direction: Direction,
    date: NaiveDate,
    dt: usize,
    round: usize,
    target: SearchTarget,
    label: Time,
) -> Option<Journey> {
    let mut legs = Vec::new();
    let mut stop = target.stop;
    let mut time = label;
    let mut r = round;

    loop {
        match state.pred(r, stop, dt) {
            Predecessor::Unreached => return None,
            Predecessor::Seed { walk } => {
                if let Some(w) = walk {
                    let leg = match direction {
                        Direction::DepartAfter => Leg::Walk {
                            from_stop: None,
                            to_stop: Some(stop),
                            departure: to_datetime(date, time - w),
                            arrival: to_datetime(date, time),
                            duration: w,
                        },
                        Direction::ArriveBefore => Leg::Walk {
                            from_stop: Some(stop),
                            to_stop: None,
                            departure: to_datetime(date, time),
                            arrival: to_datetime(date, time + w),
                            duration: w,
                        },
                    };
                    legs.push(leg);
                }
                break;
            }
            Predecessor::Ride {
                trip,
                board_stop,
                board_time,
            } => {
                let route = model.trip(trip).route;
                let line = model.route(route).line;
                let leg = match direction {
                    Direction::DepartAfter => Leg::Ride {
                        route,
                        line,
                        trip,
                        from_stop: board_stop,
                        to_stop: stop,
                        departure: to_datetime(date, board_time),
                        arrival: to_datetime(date, time),
                    },
                    // The chain moves toward the destination here, so the
                    // ride leaves the current stop.
                    Direction::ArriveBefore => Leg::Ride {
                        route,
                        line,
                        trip,
                        from_stop: stop,
                        to_stop: board_stop,
                        departure: to_datetime(date, time),
                        arrival: to_datetime(date, board_time),
                    },
                };
                legs.push(leg);
                r = r.checked_sub(1)?;
                stop = board_stop;
                time = state.label(r, stop, dt);
            }
            Predecessor::Transfer {
                connection,
                prev_stop,
                prev_time,
            } => {
                let leg = match direction {
                    Direction::DepartAfter => Leg::Transfer {
                        connection,
                        from_stop: prev_stop,
                        to_stop: stop,
                        departure: to_datetime(date, prev_time),
                        arrival: to_datetime(date, time),
                    },
                    Direction::ArriveBefore => Leg::Transfer {
                        connection,
                        from_stop: stop,
                        to_stop: prev_stop,
                        departure: to_datetime(date, time),
                        arrival: to_datetime(date, prev_time),
                    },
                };
                legs.push(leg);
                stop = prev_stop;
                time = prev_time;
            }
        }
    }

    match direction {
        Direction::DepartAfter => {
            legs.reverse();
            if target.walk > 0 {
                legs.push(Leg::Walk {
                    from_stop: Some(target.stop),
                    to_stop: None,
                    departure: to_datetime(date, label),
                    arrival: to_datetime(date, label + target.walk),
                    duration: target.walk,
                });
            }
        }
        Direction::ArriveBefore => {
            if target.walk > 0 {
                legs.insert(
                    0,
                    Leg::Walk {
                        from_stop: None,
                        to_stop: Some(target.stop),
                        departure: to_datetime(date, label - target.walk),
                        arrival: to_datetime(date, label),
                        duration: target.walk,
                    },
                );
            }
        }
    }

    Journey::from_legs(legs, dt)
}

fn to_datetime(date: NaiveDate, time: Time) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + TimeDelta::seconds(i64::from(time))
}
