//! Transit entities and the indices that tie them together.
//!
//! Every relationship is a dense index into the owning container held by
//! [`TransitModel`](super::TransitModel); entities never hold pointers. The
//! back-reference lists (`route_points` on a stop, `routes` on a line, ...)
//! are filled by the builder, not by callers.

use geo::Point;

use crate::error::QueryError;
use crate::{
    CalendarIdx, CompanyIdx, ConnectionIdx, LineIdx, ModeIdx, ModeTypeIdx, NetworkIdx, RouteIdx,
    RoutePointIdx, StopAreaIdx, StopIdx, Time, TripIdx,
};

/// A boardable/alightable point (a platform, a pole).
#[derive(Debug, Clone)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub coord: Point<f64>,
    pub stop_area: StopAreaIdx,
    /// Positions of this stop in every route that serves it.
    pub route_points: Vec<RoutePointIdx>,
    /// Outgoing in-station transfer edges.
    pub outgoing_connections: Vec<ConnectionIdx>,
    /// Incoming in-station transfer edges, for the reversed search.
    pub incoming_connections: Vec<ConnectionIdx>,
}

/// A named group of stops (a station). Entry points may name either a stop
/// area or one of its member stops.
#[derive(Debug, Clone)]
pub struct StopArea {
    pub id: String,
    pub name: String,
    pub coord: Point<f64>,
    pub stops: Vec<StopIdx>,
}

/// One position of a stop within a route's canonical sequence.
#[derive(Debug, Clone, Copy)]
pub struct RoutePoint {
    /// 0-based position; contiguous within the owning route.
    pub order: u32,
    pub route: RouteIdx,
    pub stop: StopIdx,
}

/// An ordered stop sequence plus the trips traversing it in that sequence.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub line: LineIdx,
    pub is_forward: bool,
    /// In travel order; defines the canonical stop sequence.
    pub route_points: Vec<RoutePointIdx>,
    /// Sorted by departure time at the first route point.
    pub trips: Vec<TripIdx>,
}

/// One scheduled vehicle run of a route.
#[derive(Debug, Clone)]
pub struct Trip {
    pub id: String,
    pub route: RouteIdx,
    pub calendar: CalendarIdx,
    pub mode: ModeIdx,
    pub company: CompanyIdx,
    /// One per route point, same ordering.
    pub stop_times: Vec<StopTime>,
}

/// Arrival/departure offsets at one route point for one trip.
#[derive(Debug, Clone, Copy)]
pub struct StopTime {
    /// Seconds since local midnight; may exceed 86 400 past midnight.
    pub arrival: Time,
    pub departure: Time,
    pub order: u32,
    /// On-demand service: the vehicle only calls here when booked.
    pub odt: bool,
}

impl StopTime {
    pub fn new(arrival: Time, departure: Time, order: u32) -> Self {
        Self {
            arrival,
            departure,
            order,
            odt: false,
        }
    }
}

/// A directed in-station transfer edge between two stops.
#[derive(Debug, Clone, Copy)]
pub struct Connection {
    pub from: StopIdx,
    pub to: StopIdx,
    pub duration: Time,
    /// Largest duration still considered a valid use of this transfer.
    pub max_duration: Time,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub id: String,
    pub name: String,
    pub code: String,
    pub color: String,
    pub mode_type: ModeTypeIdx,
    pub network: NetworkIdx,
    pub routes: Vec<RouteIdx>,
}

#[derive(Debug, Clone)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub lines: Vec<LineIdx>,
}

/// A physical way of moving (bus, tram, metro). Groups into a [`ModeType`].
#[derive(Debug, Clone)]
pub struct Mode {
    pub id: String,
    pub name: String,
    pub mode_type: ModeTypeIdx,
}

#[derive(Debug, Clone)]
pub struct ModeType {
    pub id: String,
    pub name: String,
    pub modes: Vec<ModeIdx>,
    pub lines: Vec<LineIdx>,
}

#[derive(Debug, Clone)]
pub struct Company {
    pub id: String,
    pub name: String,
}

/// The closed set of referencable object kinds, used by entry-point and
/// forbidden-filter uris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    StopArea,
    StopPoint,
    Route,
    Line,
    Network,
    Mode,
    ModeType,
    Company,
    Trip,
    Coord,
}

/// Caption table for uri parsing. A plain static so construction order stays
/// explicit; looked up linearly, the table is tiny.
pub static OBJECT_CAPTIONS: &[(ObjectKind, &str)] = &[
    (ObjectKind::StopArea, "stop_area"),
    (ObjectKind::StopPoint, "stop_point"),
    (ObjectKind::Route, "route"),
    (ObjectKind::Line, "line"),
    (ObjectKind::Network, "network"),
    (ObjectKind::Mode, "mode"),
    (ObjectKind::ModeType, "mode_type"),
    (ObjectKind::Company, "company"),
    (ObjectKind::Trip, "trip"),
    (ObjectKind::Coord, "coord"),
];

impl ObjectKind {
    pub fn from_caption(caption: &str) -> Option<Self> {
        OBJECT_CAPTIONS
            .iter()
            .find(|(_, c)| *c == caption)
            .map(|(kind, _)| *kind)
    }

    pub fn caption(self) -> &'static str {
        OBJECT_CAPTIONS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, c)| *c)
            .unwrap_or("unknown")
    }
}

/// A typed reference to one model entity, for relation lookup and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtObject {
    StopArea(StopAreaIdx),
    Stop(StopIdx),
    Route(RouteIdx),
    Line(LineIdx),
    Network(NetworkIdx),
    Mode(ModeIdx),
    ModeType(ModeTypeIdx),
    Company(CompanyIdx),
    Trip(TripIdx),
}

/// A parsed query endpoint: `"<type>:<external_code>"`, or
/// `"coord:<lon>;<lat>"` for a raw coordinate resolved through the street
/// network.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPoint {
    Object { kind: ObjectKind, code: String },
    Coord(Point<f64>),
}

impl EntryPoint {
    pub fn parse(uri: &str) -> Result<Self, QueryError> {
        let (caption, rest) = uri
            .split_once(':')
            .ok_or_else(|| QueryError::UnknownEntryPoint(uri.to_string()))?;
        match ObjectKind::from_caption(caption) {
            Some(ObjectKind::Coord) => {
                let (lon, lat) = rest
                    .split_once(';')
                    .ok_or_else(|| QueryError::UnknownEntryPoint(uri.to_string()))?;
                let lon: f64 = lon
                    .parse()
                    .map_err(|_| QueryError::UnknownEntryPoint(uri.to_string()))?;
                let lat: f64 = lat
                    .parse()
                    .map_err(|_| QueryError::UnknownEntryPoint(uri.to_string()))?;
                Ok(EntryPoint::Coord(Point::new(lon, lat)))
            }
            Some(kind) => Ok(EntryPoint::Object {
                kind,
                code: rest.to_string(),
            }),
            None => Err(QueryError::UnknownEntryPoint(uri.to_string())),
        }
    }

    pub fn uri(&self) -> String {
        match self {
            EntryPoint::Object { kind, code } => format!("{}:{}", kind.caption(), code),
            EntryPoint::Coord(point) => format!("coord:{};{}", point.x(), point.y()),
        }
    }
}
