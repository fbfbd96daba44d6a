use std::fmt;
use std::rc::Rc;

use foundation::math::Vec3;

use crate::host::PositionLookup;

type DerivedFn = dyn Fn(&dyn PositionLookup) -> Vec<Vec3>;

/// Positions recomputed by the host on every frame from other entities.
///
/// The callback must be side-effect free; an empty result means "draw nothing".
#[derive(Clone)]
pub struct DerivedPositions(Rc<DerivedFn>);

impl DerivedPositions {
    pub fn new(f: impl Fn(&dyn PositionLookup) -> Vec<Vec3> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn evaluate(&self, lookup: &dyn PositionLookup) -> Vec<Vec3> {
        (self.0)(lookup)
    }
}

impl fmt::Debug for DerivedPositions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedPositions(..)")
    }
}

#[derive(Debug, Clone)]
pub enum Positions {
    Static(Vec<Vec3>),
    Derived(DerivedPositions),
}

impl Positions {
    pub fn resolve(&self, lookup: &dyn PositionLookup) -> Vec<Vec3> {
        match self {
            Positions::Static(v) => v.clone(),
            Positions::Derived(d) => d.evaluate(lookup),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryKind {
    Point,
    Polyline,
    Polygon,
}

#[derive(Debug, Clone)]
pub enum Geometry {
    Point { position: Vec3 },
    Polyline { positions: Positions },
    Polygon { rings: Vec<Vec<Vec3>> },
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point { .. } => GeometryKind::Point,
            Geometry::Polyline { .. } => GeometryKind::Polyline,
            Geometry::Polygon { .. } => GeometryKind::Polygon,
        }
    }

    pub fn point(position: Vec3) -> Self {
        Geometry::Point { position }
    }

    pub fn derived_polyline(positions: DerivedPositions) -> Self {
        Geometry::Polyline {
            positions: Positions::Derived(positions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DerivedPositions, Geometry, GeometryKind, Positions};
    use crate::host::PositionLookup;
    use foundation::math::Vec3;

    struct Fixed;

    impl PositionLookup for Fixed {
        fn position_of(&self, key: &str) -> Option<Vec3> {
            (key == "a").then_some(Vec3::new(1.0, 2.0, 3.0))
        }
    }

    #[test]
    fn derived_positions_follow_lookup() {
        let derived = DerivedPositions::new(|lookup| lookup.position_of("a").into_iter().collect());
        let positions = Positions::Derived(derived);
        assert_eq!(positions.resolve(&Fixed), vec![Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn geometry_kind() {
        assert_eq!(Geometry::point(Vec3::ZERO).kind(), GeometryKind::Point);
        let line = Geometry::derived_polyline(DerivedPositions::new(|_| Vec::new()));
        assert_eq!(line.kind(), GeometryKind::Polyline);
    }
}
