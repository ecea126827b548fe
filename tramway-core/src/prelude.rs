//! Convenience re-exports for typical library consumers.

pub use crate::error::{AccessError, CalendarError, ModelError, QueryError};
pub use crate::model::{
    EntryPoint, ObjectKind, PtObject, ServiceCalendar, TransitModel, TransitModelBuilder,
};
pub use crate::routing::{
    AccessDirection, Direction, Journey, JourneyRequest, Leg, NoStreetNetwork, StreetNetwork,
    plan_journeys, plan_journeys_batch,
};
pub use crate::{DEFAULT_MAX_TRANSFERS, MAX_CANDIDATE_STOPS, Time};
