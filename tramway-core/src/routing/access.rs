//! Access/egress resolution through the external street-network
//! collaborator.

use geo::Point;
use log::warn;

use crate::error::{AccessError, QueryError};
use crate::model::{EntryPoint, ObjectKind, TransitModel};
use crate::{MAX_CANDIDATE_STOPS, StopIdx, Time};

/// Which edge of the journey the reachability query serves. Walking is
/// directed: toward stops at the origin, away from them at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDirection {
    Departure,
    Arrival,
}

/// The street-network collaborator: given a point and a walking budget in
/// seconds, the stops reachable within it.
///
/// Called once per origin and once per destination per query. The
/// implementation owns its own timeout policy; answering
/// [`AccessError::Timeout`] makes the orchestrator fall back to the exact
/// stop candidates instead of failing the query.
pub trait StreetNetwork {
    fn reachable_stops(
        &self,
        from: Point<f64>,
        budget: Time,
        direction: AccessDirection,
    ) -> Result<Vec<(StopIdx, Time)>, AccessError>;
}

/// Collaborator for purely scheduled deployments: nothing is walkable, so
/// only exact stop entry points resolve.
#[derive(Debug, Default)]
pub struct NoStreetNetwork;

impl StreetNetwork for NoStreetNetwork {
    fn reachable_stops(
        &self,
        _from: Point<f64>,
        _budget: Time,
        _direction: AccessDirection,
    ) -> Result<Vec<(StopIdx, Time)>, AccessError> {
        Ok(Vec::new())
    }
}

/// A boarding (or alighting) candidate with its street walk duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub stop: StopIdx,
    pub walk: Time,
}

/// Resolves an entry point into stop candidates.
///
/// Stop and stop-area uris resolve exactly, then get widened with walkable
/// alternatives; coordinates depend entirely on the collaborator. A
/// collaborator failure degrades to whatever exact candidates exist; only
/// an empty final set is an error.
pub(crate) fn resolve_entry_point<S: StreetNetwork>(
    model: &TransitModel,
    streets: &S,
    entry: &EntryPoint,
    budget: Time,
    side: AccessDirection,
) -> Result<Vec<Candidate>, QueryError> {
    let mut candidates = match entry {
        EntryPoint::Object {
            kind: ObjectKind::StopPoint,
            code,
        } => {
            let stop = model
                .stop_by_code(code)
                .ok_or_else(|| QueryError::UnknownEntryPoint(entry.uri()))?;
            vec![Candidate { stop, walk: 0 }]
        }
        EntryPoint::Object {
            kind: ObjectKind::StopArea,
            code,
        } => {
            let area = model
                .stop_area_by_code(code)
                .ok_or_else(|| QueryError::UnknownEntryPoint(entry.uri()))?;
            model
                .stop_area(area)
                .stops
                .iter()
                .map(|&stop| Candidate { stop, walk: 0 })
                .collect()
        }
        EntryPoint::Object { .. } => return Err(QueryError::UnknownEntryPoint(entry.uri())),
        EntryPoint::Coord(point) => match streets.reachable_stops(*point, budget, side) {
            Ok(reached) => {
                let mut walked = valid_candidates(model, reached);
                walked.sort_by_key(|c| (c.walk, c.stop));
                walked.truncate(MAX_CANDIDATE_STOPS);
                walked
            }
            Err(err) => {
                warn!("street network failed for `{}`: {err}", entry.uri());
                Vec::new()
            }
        },
    };

    if !candidates.is_empty() && matches!(entry, EntryPoint::Object { .. }) {
        widen_with_walks(model, streets, budget, side, &mut candidates);
    }

    if candidates.is_empty() {
        return Err(QueryError::InvalidEntryPoint(entry.uri()));
    }
    Ok(candidates)
}

/// Adds walkable alternatives around an exact entry point, keeping the
/// exact candidates first and the total bounded.
fn widen_with_walks<S: StreetNetwork>(
    model: &TransitModel,
    streets: &S,
    budget: Time,
    side: AccessDirection,
    candidates: &mut Vec<Candidate>,
) {
    let anchor = model.stop(candidates[0].stop).coord;
    let reached = match streets.reachable_stops(anchor, budget, side) {
        Ok(reached) => reached,
        Err(err) => {
            warn!("street network degraded, keeping exact candidates only: {err}");
            return;
        }
    };

    let limit = candidates.len().max(MAX_CANDIDATE_STOPS);
    let mut extra = valid_candidates(model, reached);
    extra.sort_by_key(|c| (c.walk, c.stop));
    for candidate in extra {
        if candidates.len() >= limit {
            break;
        }
        if candidates.iter().all(|c| c.stop != candidate.stop) {
            candidates.push(candidate);
        }
    }
}

fn valid_candidates(model: &TransitModel, reached: Vec<(StopIdx, Time)>) -> Vec<Candidate> {
    reached
        .into_iter()
        .filter(|&(stop, walk)| stop < model.num_stops() && walk >= 0)
        .map(|(stop, walk)| Candidate { stop, walk })
        .collect()
}
