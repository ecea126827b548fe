//! Round-based multi-criteria journey planning over a scheduled transit
//! network.
//!
//! The crate is organised around an immutable, densely indexed
//! [`TransitModel`](model::TransitModel) built once by an ingestion layer and
//! shared read-only across queries, a RAPTOR-style routing engine working in
//! rounds (one round per allowed trip boarding), and an orchestration front
//! door ([`plan_journeys`](routing::plan_journeys)) that resolves entry
//! points, applies forbidden filters and turns engine labels into
//! Pareto-optimal journeys.
//!
//! Street-network walking for access and egress is delegated to an external
//! collaborator behind the [`StreetNetwork`](routing::StreetNetwork) trait;
//! the core never parses feeds, never serializes responses and never touches
//! the network.

pub mod error;
pub mod model;
pub mod prelude;
pub mod routing;

/// Seconds since local midnight of a query date. May exceed 86 400 for
/// service running past midnight.
pub type Time = i32;

pub type StopIdx = usize;
pub type StopAreaIdx = usize;
pub type RoutePointIdx = usize;
pub type RouteIdx = usize;
pub type TripIdx = usize;
pub type ConnectionIdx = usize;
pub type CalendarIdx = usize;
pub type LineIdx = usize;
pub type NetworkIdx = usize;
pub type ModeIdx = usize;
pub type ModeTypeIdx = usize;
pub type CompanyIdx = usize;

/// Upper bound on access/egress stop candidates kept per entry point.
pub const MAX_CANDIDATE_STOPS: usize = 5;

/// Default bound on the number of boardings explored by the engine.
pub const DEFAULT_MAX_TRANSFERS: usize = 10;

pub use error::{AccessError, CalendarError, ModelError, QueryError};
pub use model::{
    EntryPoint, ObjectKind, PtObject, ServiceCalendar, TransitModel, TransitModelBuilder,
};
pub use routing::{
    AccessDirection, Direction, Journey, JourneyRequest, Leg, NoStreetNetwork, StreetNetwork,
    plan_journeys, plan_journeys_batch,
};
