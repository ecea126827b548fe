//! The journey-planning engine and its orchestration layer.

pub mod access;
pub(crate) mod filters;
pub mod journey;
pub mod multimodal;
pub mod raptor;

pub use access::{AccessDirection, NoStreetNetwork, StreetNetwork};
pub use journey::{Journey, Leg};
pub use multimodal::{
    DEFAULT_WALKING_BUDGET, JourneyRequest, plan_journeys, plan_journeys_batch,
};
pub use raptor::Direction;
