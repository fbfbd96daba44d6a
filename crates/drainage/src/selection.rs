//! Shared selection state read by the UI popup.

use std::cell::RefCell;

use foundation::math::{Ecef, Vec3, ecef_to_geodetic};
use scene::components::PropertyBag;

use crate::geometry::display_elevation;
use crate::id::NetworkEntityId;

/// A clicked globe position in degrees, with the displayed elevation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
    pub height: f64,
}

impl Coordinate {
    pub fn from_cartesian(position: Vec3) -> Self {
        let geo = ecef_to_geodetic(Ecef::from(position));
        Self {
            lon: geo.lon_deg(),
            lat: geo.lat_deg(),
            height: display_elevation(geo.alt_m),
        }
    }
}

/// The active entity and the property snapshot taken when it was selected.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub id: NetworkEntityId,
    pub properties: PropertyBag,
    pub coordinate: Option<Coordinate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub active: Option<Selection>,
    /// Survives clearing the active selection.
    pub last_coordinate: Option<Coordinate>,
    /// Bumped on every change.
    pub revision: u64,
}

/// External state container the controllers publish into.
pub trait SelectionStore {
    fn publish(&self, selection: Selection);
    /// Drops the active selection; the last coordinate is kept.
    fn clear(&self);
    fn set_coordinate(&self, coordinate: Coordinate);
    fn state(&self) -> SelectionState;

    fn current(&self) -> Option<Selection> {
        self.state().active
    }

    fn active_id(&self) -> Option<NetworkEntityId> {
        self.current().map(|s| s.id)
    }
}

/// In-memory store for a single viewer session.
#[derive(Debug, Default)]
pub struct SelectionCell {
    state: RefCell<SelectionState>,
}

impl SelectionCell {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, f: impl FnOnce(&mut SelectionState)) {
        let mut state = self.state.borrow_mut();
        f(&mut state);
        state.revision += 1;
    }
}

impl SelectionStore for SelectionCell {
    fn publish(&self, selection: Selection) {
        self.update(|s| {
            if let Some(c) = selection.coordinate {
                s.last_coordinate = Some(c);
            }
            s.active = Some(selection);
        });
    }

    fn clear(&self) {
        self.update(|s| s.active = None);
    }

    fn set_coordinate(&self, coordinate: Coordinate) {
        self.update(|s| s.last_coordinate = Some(coordinate));
    }

    fn state(&self) -> SelectionState {
        self.state.borrow().clone()
    }
}
