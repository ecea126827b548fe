//! Round-based label propagation (RAPTOR) over the transit model.
//!
//! One round corresponds to one trip boarding; round `k` labels hold the
//! best time achievable with at most `k` trips. The two search directions
//! are duals: `DepartAfter` propagates earliest arrivals forward along
//! routes, `ArriveBefore` propagates latest departures backward.

pub(crate) mod scan;
pub(crate) mod state;

pub(crate) use scan::{SearchContext, SearchSeed, SearchTarget, run};
pub(crate) use state::{Predecessor, RaptorState};

use crate::Time;

/// Which way the search optimizes: earliest arrival for a requested
/// departure, or latest departure for a requested arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    DepartAfter,
    ArriveBefore,
}

impl Direction {
    /// Sentinel for "no label yet".
    pub(crate) fn unreached(self) -> Time {
        match self {
            Direction::DepartAfter => Time::MAX,
            Direction::ArriveBefore => Time::MIN,
        }
    }

    /// Strict improvement in this direction.
    pub(crate) fn is_better(self, a: Time, b: Time) -> bool {
        match self {
            Direction::DepartAfter => a < b,
            Direction::ArriveBefore => a > b,
        }
    }

    /// Moves a time along the journey: forward in `DepartAfter`, backward in
    /// `ArriveBefore`.
    pub(crate) fn shift(self, time: Time, duration: Time) -> Time {
        match self {
            Direction::DepartAfter => time.saturating_add(duration),
            Direction::ArriveBefore => time.saturating_sub(duration),
        }
    }
}
