//! Forbidden line/mode filters, resolved to route and trip sets before the
//! search so the engine only tests bits.

use fixedbitset::FixedBitSet;
use log::warn;

use crate::model::{ObjectKind, PtObject, TransitModel};
use crate::{ModeIdx, RouteIdx, TripIdx};

/// Routes the scan skips entirely and trips the selection passes over.
/// Equivalent to the forbidden objects being absent from the model.
#[derive(Debug)]
pub(crate) struct ResolvedFilters {
    routes: FixedBitSet,
    trips: FixedBitSet,
}

impl ResolvedFilters {
    pub(crate) fn none(model: &TransitModel) -> Self {
        Self {
            routes: FixedBitSet::with_capacity(model.num_routes()),
            trips: FixedBitSet::with_capacity(model.num_trips()),
        }
    }

    /// Parses `"<type>:<code>"` uris and resolves them against the model.
    /// Uris naming nothing are ignored with a warning: an object that does
    /// not exist cannot be ridden anyway.
    pub(crate) fn resolve(model: &TransitModel, uris: &[String]) -> Self {
        let mut filters = Self::none(model);
        for uri in uris {
            let Some((caption, code)) = uri.split_once(':') else {
                warn!("ignoring malformed forbidden uri `{uri}`");
                continue;
            };
            let resolved = match ObjectKind::from_caption(caption) {
                Some(ObjectKind::Route) => model
                    .route_by_code(code)
                    .map(|route| filters.forbid_route(route))
                    .is_some(),
                Some(ObjectKind::Line) => model
                    .line_by_code(code)
                    .map(|line| filters.forbid_line(model, line))
                    .is_some(),
                Some(ObjectKind::Network) => model
                    .network_by_code(code)
                    .map(|network| {
                        for line in model.related(PtObject::Network(network), ObjectKind::Line) {
                            if let PtObject::Line(line) = line {
                                filters.forbid_line(model, line);
                            }
                        }
                    })
                    .is_some(),
                Some(ObjectKind::Mode) => model
                    .mode_by_code(code)
                    .map(|mode| filters.forbid_mode(model, mode))
                    .is_some(),
                Some(ObjectKind::ModeType) => model
                    .mode_type_by_code(code)
                    .map(|mode_type| {
                        for mode in model.related(PtObject::ModeType(mode_type), ObjectKind::Mode) {
                            if let PtObject::Mode(mode) = mode {
                                filters.forbid_mode(model, mode);
                            }
                        }
                        for line in model.related(PtObject::ModeType(mode_type), ObjectKind::Line) {
                            if let PtObject::Line(line) = line {
                                filters.forbid_line(model, line);
                            }
                        }
                    })
                    .is_some(),
                _ => {
                    warn!("ignoring unsupported forbidden uri `{uri}`");
                    continue;
                }
            };
            if !resolved {
                warn!("forbidden uri `{uri}` matches nothing in the model");
            }
        }
        filters
    }

    fn forbid_route(&mut self, route: RouteIdx) {
        self.routes.insert(route);
    }

    fn forbid_line(&mut self, model: &TransitModel, line: crate::LineIdx) {
        for object in model.related(PtObject::Line(line), ObjectKind::Route) {
            if let PtObject::Route(route) = object {
                self.routes.insert(route);
            }
        }
    }

    fn forbid_mode(&mut self, model: &TransitModel, mode: ModeIdx) {
        for trip in 0..model.num_trips() {
            if model.trip(trip).mode == mode {
                self.trips.insert(trip);
            }
        }
    }

    pub(crate) fn route_forbidden(&self, route: RouteIdx) -> bool {
        self.routes.contains(route)
    }

    pub(crate) fn trip_forbidden(&self, trip: TripIdx) -> bool {
        self.trips.contains(trip)
    }
}
