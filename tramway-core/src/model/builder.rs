//! Single-pass model construction.
//!
//! The ingestion layer pushes entities into dense containers in any order;
//! every cross-reference is validated once at `build`, surfacing any
//! referential error as a single [`ModelError`] instead of scattered
//! failures. The builder also derives what the forward references imply:
//! back-reference lists, external-code maps, and the per-route trip ordering
//! the engine's trip selection relies on.

use geo::Point;
use hashbrown::HashMap;
use itertools::Itertools;
use log::info;

use super::calendar::ServiceCalendar;
use super::transit::TransitModel;
use super::types::{
    Company, Connection, Line, Mode, ModeType, Network, Route, RoutePoint, Stop, StopArea,
    StopTime, Trip,
};
use crate::error::ModelError;
use crate::{
    CalendarIdx, CompanyIdx, ConnectionIdx, LineIdx, ModeIdx, ModeTypeIdx, NetworkIdx, RouteIdx,
    RoutePointIdx, StopAreaIdx, StopIdx, TripIdx,
};

#[derive(Debug, Default)]
pub struct TransitModelBuilder {
    stops: Vec<Stop>,
    stop_areas: Vec<StopArea>,
    route_points: Vec<RoutePoint>,
    routes: Vec<Route>,
    trips: Vec<Trip>,
    connections: Vec<Connection>,
    calendars: Vec<ServiceCalendar>,
    lines: Vec<Line>,
    networks: Vec<Network>,
    modes: Vec<Mode>,
    mode_types: Vec<ModeType>,
    companies: Vec<Company>,
}

impl TransitModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_network(&mut self, id: &str, name: &str) -> NetworkIdx {
        self.networks.push(Network {
            id: id.to_string(),
            name: name.to_string(),
            lines: Vec::new(),
        });
        self.networks.len() - 1
    }

    pub fn add_mode_type(&mut self, id: &str, name: &str) -> ModeTypeIdx {
        self.mode_types.push(ModeType {
            id: id.to_string(),
            name: name.to_string(),
            modes: Vec::new(),
            lines: Vec::new(),
        });
        self.mode_types.len() - 1
    }

    pub fn add_mode(&mut self, id: &str, name: &str, mode_type: ModeTypeIdx) -> ModeIdx {
        self.modes.push(Mode {
            id: id.to_string(),
            name: name.to_string(),
            mode_type,
        });
        self.modes.len() - 1
    }

    pub fn add_company(&mut self, id: &str, name: &str) -> CompanyIdx {
        self.companies.push(Company {
            id: id.to_string(),
            name: name.to_string(),
        });
        self.companies.len() - 1
    }

    pub fn add_line(
        &mut self,
        id: &str,
        name: &str,
        code: &str,
        mode_type: ModeTypeIdx,
        network: NetworkIdx,
    ) -> LineIdx {
        self.lines.push(Line {
            id: id.to_string(),
            name: name.to_string(),
            code: code.to_string(),
            color: String::new(),
            mode_type,
            network,
            routes: Vec::new(),
        });
        self.lines.len() - 1
    }

    pub fn add_stop_area(&mut self, id: &str, name: &str, coord: Point<f64>) -> StopAreaIdx {
        self.stop_areas.push(StopArea {
            id: id.to_string(),
            name: name.to_string(),
            coord,
            stops: Vec::new(),
        });
        self.stop_areas.len() - 1
    }

    pub fn add_stop(
        &mut self,
        id: &str,
        name: &str,
        coord: Point<f64>,
        stop_area: StopAreaIdx,
    ) -> StopIdx {
        self.stops.push(Stop {
            id: id.to_string(),
            name: name.to_string(),
            coord,
            stop_area,
            route_points: Vec::new(),
            outgoing_connections: Vec::new(),
            incoming_connections: Vec::new(),
        });
        self.stops.len() - 1
    }

    pub fn add_route(&mut self, id: &str, name: &str, line: LineIdx, is_forward: bool) -> RouteIdx {
        self.routes.push(Route {
            id: id.to_string(),
            name: name.to_string(),
            line,
            is_forward,
            route_points: Vec::new(),
            trips: Vec::new(),
        });
        self.routes.len() - 1
    }

    /// Appends one route point; orders must end up contiguous from 0 per
    /// route, checked at `build`.
    pub fn add_route_point(&mut self, route: RouteIdx, order: u32, stop: StopIdx) -> RoutePointIdx {
        self.route_points.push(RoutePoint { order, route, stop });
        self.route_points.len() - 1
    }

    /// Convenience for the common case: one route point per stop, in travel
    /// order.
    pub fn add_route_stops(&mut self, route: RouteIdx, stops: &[StopIdx]) {
        for (order, &stop) in stops.iter().enumerate() {
            self.add_route_point(route, order as u32, stop);
        }
    }

    pub fn add_calendar(&mut self, calendar: ServiceCalendar) -> CalendarIdx {
        self.calendars.push(calendar);
        self.calendars.len() - 1
    }

    pub fn add_trip(
        &mut self,
        id: &str,
        route: RouteIdx,
        calendar: CalendarIdx,
        mode: ModeIdx,
        company: CompanyIdx,
        stop_times: Vec<StopTime>,
    ) -> TripIdx {
        self.trips.push(Trip {
            id: id.to_string(),
            route,
            calendar,
            mode,
            company,
            stop_times,
        });
        self.trips.len() - 1
    }

    pub fn add_connection(
        &mut self,
        from: StopIdx,
        to: StopIdx,
        duration: crate::Time,
        max_duration: crate::Time,
    ) -> ConnectionIdx {
        self.connections.push(Connection {
            from,
            to,
            duration,
            max_duration,
        });
        self.connections.len() - 1
    }

    /// Validates every invariant, resolves back-references and freezes the
    /// model.
    pub fn build(mut self) -> Result<TransitModel, ModelError> {
        self.check_references()?;
        self.link_route_points()?;
        self.check_trips()?;
        self.sort_trips();
        self.link_back_references();

        let stops_by_id = index_by_id("stop", self.stops.iter().map(|s| s.id.as_str()))?;
        let stop_areas_by_id =
            index_by_id("stop_area", self.stop_areas.iter().map(|s| s.id.as_str()))?;
        let routes_by_id = index_by_id("route", self.routes.iter().map(|r| r.id.as_str()))?;
        let lines_by_id = index_by_id("line", self.lines.iter().map(|l| l.id.as_str()))?;
        let networks_by_id = index_by_id("network", self.networks.iter().map(|n| n.id.as_str()))?;
        let modes_by_id = index_by_id("mode", self.modes.iter().map(|m| m.id.as_str()))?;
        let mode_types_by_id =
            index_by_id("mode_type", self.mode_types.iter().map(|m| m.id.as_str()))?;

        info!(
            "transit model built: {} stops, {} routes, {} trips, {} connections",
            self.stops.len(),
            self.routes.len(),
            self.trips.len(),
            self.connections.len()
        );

        Ok(TransitModel {
            stops: self.stops,
            stop_areas: self.stop_areas,
            route_points: self.route_points,
            routes: self.routes,
            trips: self.trips,
            connections: self.connections,
            calendars: self.calendars,
            lines: self.lines,
            networks: self.networks,
            modes: self.modes,
            mode_types: self.mode_types,
            companies: self.companies,
            stops_by_id,
            stop_areas_by_id,
            routes_by_id,
            lines_by_id,
            networks_by_id,
            modes_by_id,
            mode_types_by_id,
        })
    }

    /// Every cross-index must land inside its owning container.
    fn check_references(&self) -> Result<(), ModelError> {
        let check = |entity: &'static str,
                     index: usize,
                     field: &'static str,
                     target: usize,
                     len: usize| {
            if target < len {
                Ok(())
            } else {
                Err(ModelError::DanglingIndex {
                    entity,
                    index,
                    field,
                    target,
                })
            }
        };

        for (i, stop) in self.stops.iter().enumerate() {
            check("stop", i, "stop_area", stop.stop_area, self.stop_areas.len())?;
        }
        for (i, mode) in self.modes.iter().enumerate() {
            check("mode", i, "mode_type", mode.mode_type, self.mode_types.len())?;
        }
        for (i, line) in self.lines.iter().enumerate() {
            check("line", i, "mode_type", line.mode_type, self.mode_types.len())?;
            check("line", i, "network", line.network, self.networks.len())?;
        }
        for (i, route) in self.routes.iter().enumerate() {
            check("route", i, "line", route.line, self.lines.len())?;
        }
        for (i, rp) in self.route_points.iter().enumerate() {
            check("route_point", i, "route", rp.route, self.routes.len())?;
            check("route_point", i, "stop", rp.stop, self.stops.len())?;
        }
        for (i, trip) in self.trips.iter().enumerate() {
            check("trip", i, "route", trip.route, self.routes.len())?;
            check("trip", i, "calendar", trip.calendar, self.calendars.len())?;
            check("trip", i, "mode", trip.mode, self.modes.len())?;
            check("trip", i, "company", trip.company, self.companies.len())?;
        }
        for (i, connection) in self.connections.iter().enumerate() {
            check("connection", i, "from", connection.from, self.stops.len())?;
            check("connection", i, "to", connection.to, self.stops.len())?;
        }
        Ok(())
    }

    /// Groups route points under their route, in insertion order, and checks
    /// that each route's orders are contiguous from 0.
    fn link_route_points(&mut self) -> Result<(), ModelError> {
        for (rp_idx, rp) in self.route_points.iter().enumerate() {
            self.routes[rp.route].route_points.push(rp_idx);
        }
        for (route_idx, route) in self.routes.iter().enumerate() {
            for (position, &rp_idx) in route.route_points.iter().enumerate() {
                if self.route_points[rp_idx].order != position as u32 {
                    return Err(ModelError::NonContiguousOrder {
                        route: route_idx,
                        position,
                    });
                }
            }
        }
        Ok(())
    }

    /// Stop-time cardinality, ordering and monotonicity per trip.
    fn check_trips(&self) -> Result<(), ModelError> {
        for (trip_idx, trip) in self.trips.iter().enumerate() {
            let route_points = self.routes[trip.route].route_points.len();
            if trip.stop_times.len() != route_points {
                return Err(ModelError::StopTimeCardinality {
                    trip: trip_idx,
                    stop_times: trip.stop_times.len(),
                    route_points,
                });
            }
            for (order, st) in trip.stop_times.iter().enumerate() {
                if st.order != order as u32 || st.arrival < 0 || st.arrival > st.departure {
                    return Err(ModelError::NonMonotonicStopTimes {
                        trip: trip_idx,
                        order,
                    });
                }
            }
            for ((order, a), (_, b)) in trip.stop_times.iter().enumerate().tuple_windows() {
                if a.departure > b.arrival {
                    return Err(ModelError::NonMonotonicStopTimes {
                        trip: trip_idx,
                        order,
                    });
                }
            }
        }
        Ok(())
    }

    /// Orders each route's trips by departure at the first route point (trip
    /// index breaks ties, keeping the order deterministic) so trip selection
    /// can stop at the first admissible candidate.
    fn sort_trips(&mut self) {
        for (trip_idx, trip) in self.trips.iter().enumerate() {
            self.routes[trip.route].trips.push(trip_idx);
        }
        for route in &mut self.routes {
            route.trips.sort_by_key(|&t| {
                let first = self.trips[t].stop_times.first();
                (first.map_or(0, |st| st.departure), t)
            });
        }
    }

    fn link_back_references(&mut self) {
        for (rp_idx, rp) in self.route_points.iter().enumerate() {
            self.stops[rp.stop].route_points.push(rp_idx);
        }
        for (connection_idx, connection) in self.connections.iter().enumerate() {
            self.stops[connection.from]
                .outgoing_connections
                .push(connection_idx);
            self.stops[connection.to]
                .incoming_connections
                .push(connection_idx);
        }
        for (stop_idx, stop) in self.stops.iter().enumerate() {
            self.stop_areas[stop.stop_area].stops.push(stop_idx);
        }
        for (line_idx, line) in self.lines.iter().enumerate() {
            self.networks[line.network].lines.push(line_idx);
            self.mode_types[line.mode_type].lines.push(line_idx);
        }
        for (mode_idx, mode) in self.modes.iter().enumerate() {
            self.mode_types[mode.mode_type].modes.push(mode_idx);
        }
        for (route_idx, route) in self.routes.iter().enumerate() {
            self.lines[route.line].routes.push(route_idx);
        }
    }
}

fn index_by_id<'a>(
    entity: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>, ModelError> {
    let mut map = HashMap::new();
    for (idx, id) in ids.enumerate() {
        if map.insert(id.to_string(), idx).is_some() {
            return Err(ModelError::DuplicateId(format!("{entity}:{id}")));
        }
    }
    Ok(map)
}
