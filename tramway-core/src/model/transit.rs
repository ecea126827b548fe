//! The immutable indexed transit graph shared read-only across queries.

use chrono::{NaiveDate, TimeDelta};
use hashbrown::HashMap;

use super::calendar::{CALENDAR_DAYS, ServiceCalendar};
use super::types::{
    Company, Connection, Line, Mode, ModeType, Network, ObjectKind, PtObject, Route, RoutePoint,
    Stop, StopArea, StopTime, Trip,
};
use crate::{
    CalendarIdx, CompanyIdx, ConnectionIdx, LineIdx, ModeIdx, ModeTypeIdx, NetworkIdx, RouteIdx,
    RoutePointIdx, StopAreaIdx, StopIdx, TripIdx,
};

/// The read-only routing graph: stops, routes, trips and their temporal and
/// topological relationships, all referenced by dense indices.
///
/// Built once through [`TransitModelBuilder`](super::TransitModelBuilder) and
/// never mutated afterwards, so it is safely shared across concurrent
/// queries without locking.
#[derive(Debug, Clone)]
pub struct TransitModel {
    pub(crate) stops: Vec<Stop>,
    pub(crate) stop_areas: Vec<StopArea>,
    pub(crate) route_points: Vec<RoutePoint>,
    pub(crate) routes: Vec<Route>,
    pub(crate) trips: Vec<Trip>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) calendars: Vec<ServiceCalendar>,
    pub(crate) lines: Vec<Line>,
    pub(crate) networks: Vec<Network>,
    pub(crate) modes: Vec<Mode>,
    pub(crate) mode_types: Vec<ModeType>,
    pub(crate) companies: Vec<Company>,

    pub(crate) stops_by_id: HashMap<String, StopIdx>,
    pub(crate) stop_areas_by_id: HashMap<String, StopAreaIdx>,
    pub(crate) routes_by_id: HashMap<String, RouteIdx>,
    pub(crate) lines_by_id: HashMap<String, LineIdx>,
    pub(crate) networks_by_id: HashMap<String, NetworkIdx>,
    pub(crate) modes_by_id: HashMap<String, ModeIdx>,
    pub(crate) mode_types_by_id: HashMap<String, ModeTypeIdx>,
}

impl TransitModel {
    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn num_trips(&self) -> usize {
        self.trips.len()
    }

    pub fn stop(&self, idx: StopIdx) -> &Stop {
        &self.stops[idx]
    }

    pub fn stop_area(&self, idx: StopAreaIdx) -> &StopArea {
        &self.stop_areas[idx]
    }

    pub fn route(&self, idx: RouteIdx) -> &Route {
        &self.routes[idx]
    }

    pub fn route_point(&self, idx: RoutePointIdx) -> &RoutePoint {
        &self.route_points[idx]
    }

    /// Owning route of a route point.
    pub fn route_of_route_point(&self, idx: RoutePointIdx) -> RouteIdx {
        self.route_points[idx].route
    }

    pub fn trip(&self, idx: TripIdx) -> &Trip {
        &self.trips[idx]
    }

    pub fn connection(&self, idx: ConnectionIdx) -> &Connection {
        &self.connections[idx]
    }

    pub fn calendar(&self, idx: CalendarIdx) -> &ServiceCalendar {
        &self.calendars[idx]
    }

    pub fn line(&self, idx: LineIdx) -> &Line {
        &self.lines[idx]
    }

    pub fn network(&self, idx: NetworkIdx) -> &Network {
        &self.networks[idx]
    }

    pub fn mode(&self, idx: ModeIdx) -> &Mode {
        &self.modes[idx]
    }

    pub fn mode_type(&self, idx: ModeTypeIdx) -> &ModeType {
        &self.mode_types[idx]
    }

    pub fn company(&self, idx: CompanyIdx) -> &Company {
        &self.companies[idx]
    }

    /// Canonical stop sequence of a route, in travel order.
    pub fn route_points_of_route(&self, route: RouteIdx) -> &[RoutePointIdx] {
        &self.routes[route].route_points
    }

    /// Trips of a route, sorted by departure at the first route point.
    pub fn trips_of_route(&self, route: RouteIdx) -> &[TripIdx] {
        &self.routes[route].trips
    }

    /// Positions of a stop within every route serving it. Precomputed; the
    /// engine calls this in its innermost marking loop.
    pub fn route_points_of_stop(&self, stop: StopIdx) -> &[RoutePointIdx] {
        &self.stops[stop].route_points
    }

    pub fn stop_times(&self, trip: TripIdx) -> &[StopTime] {
        &self.trips[trip].stop_times
    }

    pub fn outgoing_connections(&self, stop: StopIdx) -> &[ConnectionIdx] {
        &self.stops[stop].outgoing_connections
    }

    pub fn incoming_connections(&self, stop: StopIdx) -> &[ConnectionIdx] {
        &self.stops[stop].incoming_connections
    }

    pub fn stop_by_code(&self, code: &str) -> Option<StopIdx> {
        self.stops_by_id.get(code).copied()
    }

    pub fn stop_area_by_code(&self, code: &str) -> Option<StopAreaIdx> {
        self.stop_areas_by_id.get(code).copied()
    }

    pub fn route_by_code(&self, code: &str) -> Option<RouteIdx> {
        self.routes_by_id.get(code).copied()
    }

    pub fn line_by_code(&self, code: &str) -> Option<LineIdx> {
        self.lines_by_id.get(code).copied()
    }

    pub fn network_by_code(&self, code: &str) -> Option<NetworkIdx> {
        self.networks_by_id.get(code).copied()
    }

    pub fn mode_by_code(&self, code: &str) -> Option<ModeIdx> {
        self.modes_by_id.get(code).copied()
    }

    pub fn mode_type_by_code(&self, code: &str) -> Option<ModeTypeIdx> {
        self.mode_types_by_id.get(code).copied()
    }

    /// Trip eligibility for a query date, per its validity pattern.
    pub fn trip_runs_on(&self, trip: TripIdx, date: NaiveDate) -> bool {
        self.calendars[self.trips[trip].calendar].is_active(date)
    }

    /// The union window of all validity patterns. Queries dated outside it
    /// are rejected with `DateOutOfCalendarRange` before any search runs.
    pub fn calendar_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.calendars.iter().map(ServiceCalendar::beginning_date).min()?;
        let end = self
            .calendars
            .iter()
            .map(ServiceCalendar::beginning_date)
            .max()?
            + TimeDelta::days(CALENDAR_DAYS as i64 - 1);
        Some((start, end))
    }

    /// Related-object lookup, one closed match per (object, kind) pair.
    ///
    /// Relations that do not exist in the model (a company's trips are not
    /// back-referenced, for instance) answer with an empty list.
    pub fn related(&self, object: PtObject, kind: ObjectKind) -> Vec<PtObject> {
        match (object, kind) {
            (PtObject::StopArea(idx), ObjectKind::StopPoint) => self.stop_areas[idx]
                .stops
                .iter()
                .map(|&s| PtObject::Stop(s))
                .collect(),
            (PtObject::Stop(idx), ObjectKind::StopArea) => {
                vec![PtObject::StopArea(self.stops[idx].stop_area)]
            }
            (PtObject::Stop(idx), ObjectKind::Route) => {
                let mut routes: Vec<RouteIdx> = self.stops[idx]
                    .route_points
                    .iter()
                    .map(|&rp| self.route_points[rp].route)
                    .collect();
                routes.sort_unstable();
                routes.dedup();
                routes.into_iter().map(PtObject::Route).collect()
            }
            (PtObject::Route(idx), ObjectKind::Line) => {
                vec![PtObject::Line(self.routes[idx].line)]
            }
            (PtObject::Route(idx), ObjectKind::Trip) => self.routes[idx]
                .trips
                .iter()
                .map(|&t| PtObject::Trip(t))
                .collect(),
            (PtObject::Route(idx), ObjectKind::StopPoint) => self.routes[idx]
                .route_points
                .iter()
                .map(|&rp| PtObject::Stop(self.route_points[rp].stop))
                .collect(),
            (PtObject::Line(idx), ObjectKind::Route) => self.lines[idx]
                .routes
                .iter()
                .map(|&r| PtObject::Route(r))
                .collect(),
            (PtObject::Line(idx), ObjectKind::Network) => {
                vec![PtObject::Network(self.lines[idx].network)]
            }
            (PtObject::Line(idx), ObjectKind::ModeType) => {
                vec![PtObject::ModeType(self.lines[idx].mode_type)]
            }
            (PtObject::Network(idx), ObjectKind::Line) => self.networks[idx]
                .lines
                .iter()
                .map(|&l| PtObject::Line(l))
                .collect(),
            (PtObject::Mode(idx), ObjectKind::ModeType) => {
                vec![PtObject::ModeType(self.modes[idx].mode_type)]
            }
            (PtObject::ModeType(idx), ObjectKind::Mode) => self.mode_types[idx]
                .modes
                .iter()
                .map(|&m| PtObject::Mode(m))
                .collect(),
            (PtObject::ModeType(idx), ObjectKind::Line) => self.mode_types[idx]
                .lines
                .iter()
                .map(|&l| PtObject::Line(l))
                .collect(),
            (PtObject::Trip(idx), ObjectKind::Route) => {
                vec![PtObject::Route(self.trips[idx].route)]
            }
            (PtObject::Trip(idx), ObjectKind::Mode) => {
                vec![PtObject::Mode(self.trips[idx].mode)]
            }
            (PtObject::Trip(idx), ObjectKind::Company) => {
                vec![PtObject::Company(self.trips[idx].company)]
            }
            _ => Vec::new(),
        }
    }
}
