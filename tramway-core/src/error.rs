use chrono::NaiveDate;
use thiserror::Error;

/// Construction-time invariant violations. Fatal: the model refuses to build.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("route {route} route point order is not contiguous at position {position}")]
    NonContiguousOrder { route: usize, position: usize },
    #[error("trip {trip} has {stop_times} stop times but its route has {route_points} route points")]
    StopTimeCardinality {
        trip: usize,
        stop_times: usize,
        route_points: usize,
    },
    #[error("trip {trip} stop times are not monotonic at order {order}")]
    NonMonotonicStopTimes { trip: usize, order: usize },
    #[error("{entity} {index}: {field} {target} does not exist")]
    DanglingIndex {
        entity: &'static str,
        index: usize,
        field: &'static str,
        target: usize,
    },
    #[error("duplicate external id `{0}`")]
    DuplicateId(String),
}

/// Calendar mutators and offset queries outside the 366-day window.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CalendarError {
    #[error("date {0} is outside the calendar window")]
    OutOfRange(NaiveDate),
}

/// Query-time failures. Recoverable: reported to the caller, the model is
/// never affected. An empty journey list is a valid result, not an error.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown entry point `{0}`")]
    UnknownEntryPoint(String),
    #[error("entry point `{0}` resolves to no boardable stop")]
    InvalidEntryPoint(String),
    #[error("date {0} is outside the model calendar window")]
    DateOutOfCalendarRange(NaiveDate),
}

/// Street-network collaborator failures. The orchestrator degrades on these
/// instead of aborting the query.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AccessError {
    #[error("street network query timed out")]
    Timeout,
    #[error("no street node near the requested point")]
    Unreachable,
}
