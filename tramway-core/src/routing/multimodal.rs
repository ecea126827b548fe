//! Query orchestration: entry-point resolution, date validation, the engine
//! run and journey extraction, behind one front door.

use std::sync::atomic::AtomicBool;

use chrono::{NaiveDateTime, Timelike};
use log::{debug, info};
use rayon::prelude::*;

use super::access::{AccessDirection, Candidate, StreetNetwork, resolve_entry_point};
use super::filters::ResolvedFilters;
use super::journey::{Journey, extract_journeys};
use super::raptor::{self, Direction, SearchContext, SearchSeed, SearchTarget};
use crate::error::QueryError;
use crate::model::{EntryPoint, TransitModel};
use crate::{DEFAULT_MAX_TRANSFERS, Time};

/// Default street walking budget at each end of a journey, in seconds.
pub const DEFAULT_WALKING_BUDGET: Time = 900;

/// One journey-planning request. A single request may carry several
/// datetimes; each is answered independently in one engine run.
#[derive(Debug, Clone)]
pub struct JourneyRequest {
    pub origin: EntryPoint,
    pub destination: EntryPoint,
    pub datetimes: Vec<NaiveDateTime>,
    pub direction: Direction,
    pub forbidden_uris: Vec<String>,
    pub max_transfers: usize,
    pub walking_budget: Time,
}

impl JourneyRequest {
    pub fn new(origin: EntryPoint, destination: EntryPoint, datetimes: Vec<NaiveDateTime>) -> Self {
        Self {
            origin,
            destination,
            datetimes,
            direction: Direction::DepartAfter,
            forbidden_uris: Vec::new(),
            max_transfers: DEFAULT_MAX_TRANSFERS,
            walking_budget: DEFAULT_WALKING_BUDGET,
        }
    }
}

/// Plans journeys for one request.
///
/// Every datetime of the batch shares the resolved entry points, filters and
/// engine run; the answer is the concatenation of per-datetime Pareto
/// frontiers, ordered by datetime index then by optimality in the requested
/// direction. An unreachable destination yields an empty list; only
/// malformed requests are errors.
pub fn plan_journeys<S: StreetNetwork>(
    model: &TransitModel,
    streets: &S,
    request: &JourneyRequest,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<Journey>, QueryError> {
    if request.datetimes.is_empty() {
        return Ok(Vec::new());
    }

    let origins = resolve_entry_point(
        model,
        streets,
        &request.origin,
        request.walking_budget,
        AccessDirection::Departure,
    )?;
    let destinations = resolve_entry_point(
        model,
        streets,
        &request.destination,
        request.walking_budget,
        AccessDirection::Arrival,
    )?;

    let window = model.calendar_window();
    let mut dates = Vec::with_capacity(request.datetimes.len());
    for datetime in &request.datetimes {
        let date = datetime.date();
        let inside = window.is_some_and(|(start, end)| start <= date && date <= end);
        if !inside {
            return Err(QueryError::DateOutOfCalendarRange(date));
        }
        dates.push(date);
    }

    let (seed_side, target_side) = match request.direction {
        Direction::DepartAfter => (&origins, &destinations),
        Direction::ArriveBefore => (&destinations, &origins),
    };

    let seeds: Vec<Vec<SearchSeed>> = request
        .datetimes
        .iter()
        .map(|datetime| {
            let seconds = datetime.time().num_seconds_from_midnight() as Time;
            seed_side
                .iter()
                .map(|candidate| make_seed(request.direction, *candidate, seconds))
                .collect()
        })
        .collect();
    let targets: Vec<SearchTarget> = target_side
        .iter()
        .map(|candidate| SearchTarget {
            stop: candidate.stop,
            walk: candidate.walk,
        })
        .collect();

    let forbidden = if request.forbidden_uris.is_empty() {
        ResolvedFilters::none(model)
    } else {
        ResolvedFilters::resolve(model, &request.forbidden_uris)
    };

    debug!(
        "planning {:?} with {} seeds x {} datetimes, {} targets",
        request.direction,
        seed_side.len(),
        request.datetimes.len(),
        targets.len(),
    );

    let ctx = SearchContext {
        model,
        direction: request.direction,
        dates: &dates,
        seeds: &seeds,
        targets: &targets,
        forbidden: &forbidden,
        max_transfers: request.max_transfers,
    };
    let state = raptor::run(&ctx, cancel);

    let mut journeys = extract_journeys(model, &state, request.direction, &dates, &targets);
    match request.direction {
        Direction::DepartAfter => {
            journeys.sort_by_key(|j| (j.datetime_index, j.arrival, j.transfers));
        }
        Direction::ArriveBefore => {
            journeys.sort_by(|a, b| {
                (a.datetime_index, b.departure, a.transfers)
                    .cmp(&(b.datetime_index, a.departure, b.transfers))
            });
        }
    }

    info!(
        "{} journeys for {} datetimes",
        journeys.len(),
        request.datetimes.len()
    );
    Ok(journeys)
}

/// Plans a batch of independent requests in parallel. Order of results
/// matches order of requests; each slot carries its own outcome.
pub fn plan_journeys_batch<S: StreetNetwork + Sync>(
    model: &TransitModel,
    streets: &S,
    requests: &[JourneyRequest],
    cancel: Option<&AtomicBool>,
) -> Vec<Result<Vec<Journey>, QueryError>> {
    requests
        .par_iter()
        .map(|request| plan_journeys(model, streets, request, cancel))
        .collect()
}

/// A seed label: the traveller stands at the stop once the access walk is
/// spent (or regained, in the reversed search).
fn make_seed(direction: Direction, candidate: Candidate, seconds: Time) -> SearchSeed {
    let time = match direction {
        Direction::DepartAfter => seconds.saturating_add(candidate.walk),
        Direction::ArriveBefore => seconds.saturating_sub(candidate.walk),
    };
    SearchSeed {
        stop: candidate.stop,
        time,
        walk: (candidate.walk > 0).then_some(candidate.walk),
    }
}
