//! Data model for the scheduled transit network.

pub mod builder;
pub mod calendar;
pub mod transit;
pub mod types;

pub use builder::TransitModelBuilder;
pub use calendar::{ALL_WEEKDAYS, CALENDAR_DAYS, ServiceCalendar};
pub use transit::TransitModel;
pub use types::{
    Company, Connection, EntryPoint, Line, Mode, ModeType, Network, OBJECT_CAPTIONS, ObjectKind,
    PtObject, Route, RoutePoint, Stop, StopArea, StopTime, Trip,
};
