//! Derived geometry: conduit endpoints and subcatchment outlet connectors.
//!
//! Nothing here is cached. Lines and connectors are re-resolved from the
//! current point positions every time the host asks, so moving or removing a
//! point is reflected on the next frame without any invalidation.

use foundation::math::{Vec3, cartesian_from_degrees};
use scene::components::DerivedPositions;
use scene::host::PositionLookup;

use crate::config::HEIGHT_GEOID_OFFSET_M;
use crate::id::NetworkEntityId;

/// Current positions of both conduit endpoints, or `None` if either is gone.
pub fn line_endpoints(
    lookup: &dyn PositionLookup,
    from: &NetworkEntityId,
    to: &NetworkEntityId,
) -> Option<[Vec3; 2]> {
    resolve_pair(lookup, &from.key(), &to.key())
}

/// Unweighted mean of the vertex longitudes and latitudes.
///
/// A closing vertex equal to the first one is ignored so closed and open
/// rings give the same result. This is a display approximation, not the
/// area centroid.
pub fn polygon_centroid(vertices: &[[f64; 2]]) -> Option<[f64; 2]> {
    let ring = drop_closing_duplicate(vertices);
    if ring.is_empty() {
        return None;
    }
    let n = ring.len() as f64;
    let (lon, lat) = ring
        .iter()
        .fold((0.0, 0.0), |(lon, lat), v| (lon + v[0], lat + v[1]));
    Some([lon / n, lat / n])
}

/// Cartesian position of the centroid on the ellipsoid surface.
pub fn centroid_position(vertices: &[[f64; 2]]) -> Option<Vec3> {
    polygon_centroid(vertices).map(|[lon, lat]| cartesian_from_degrees(lon, lat, 0.0))
}

/// `[centroid, outlet]` segment, or `None` when the outlet point is absent.
pub fn connector(
    lookup: &dyn PositionLookup,
    centroid: Vec3,
    outlet: &NetworkEntityId,
) -> Option<[Vec3; 2]> {
    lookup.position_of(&outlet.key()).map(|p| [centroid, p])
}

/// Height shown to the user for a sampled ellipsoidal height.
pub fn display_elevation(ellipsoidal_height_m: f64) -> f64 {
    ellipsoidal_height_m + HEIGHT_GEOID_OFFSET_M
}

/// Per-frame positions of a conduit drawn between two point keys.
pub fn line_callback(from_key: String, to_key: String) -> DerivedPositions {
    DerivedPositions::new(move |lookup| {
        resolve_pair(lookup, &from_key, &to_key).map_or_else(Vec::new, Vec::from)
    })
}

/// Per-frame positions of an outlet connector.
pub fn connector_callback(centroid: Vec3, outlet_key: String) -> DerivedPositions {
    DerivedPositions::new(move |lookup| {
        lookup
            .position_of(&outlet_key)
            .map_or_else(Vec::new, |p| vec![centroid, p])
    })
}

fn resolve_pair(lookup: &dyn PositionLookup, a: &str, b: &str) -> Option<[Vec3; 2]> {
    Some([lookup.position_of(a)?, lookup.position_of(b)?])
}

fn drop_closing_duplicate(vertices: &[[f64; 2]]) -> &[[f64; 2]] {
    match vertices {
        [first, .., last] if vertices.len() > 1 && first == last => {
            &vertices[..vertices.len() - 1]
        }
        _ => vertices,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        connector_callback, display_elevation, line_callback, line_endpoints, polygon_centroid,
    };
    use crate::id::NetworkEntityId;
    use foundation::math::Vec3;
    use scene::host::PositionLookup;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Points(HashMap<String, Vec3>);

    impl PositionLookup for Points {
        fn position_of(&self, key: &str) -> Option<Vec3> {
            self.0.get(key).copied()
        }
    }

    #[test]
    fn centroid_ignores_closing_vertex() {
        let open = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        let closed = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]];
        assert_eq!(polygon_centroid(&open), Some([1.0, 1.0]));
        assert_eq!(polygon_centroid(&closed), Some([1.0, 1.0]));
        assert_eq!(polygon_centroid(&[]), None);
    }

    #[test]
    fn line_follows_moved_endpoint() {
        let mut points = Points::default();
        points.0.insert("POINT#A".into(), Vec3::new(1.0, 0.0, 0.0));
        points.0.insert("POINT#B".into(), Vec3::new(2.0, 0.0, 0.0));
        let line = line_callback("POINT#A".into(), "POINT#B".into());

        assert_eq!(line.evaluate(&points)[1], Vec3::new(2.0, 0.0, 0.0));
        points.0.insert("POINT#B".into(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(line.evaluate(&points)[1], Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn missing_endpoint_resolves_to_empty() {
        let mut points = Points::default();
        points.0.insert("POINT#A".into(), Vec3::new(1.0, 0.0, 0.0));
        let line = line_callback("POINT#A".into(), "POINT#B".into());
        assert!(line.evaluate(&points).is_empty());
        assert_eq!(
            line_endpoints(&points, &NetworkEntityId::point("A"), &NetworkEntityId::point("B")),
            None
        );

        let conn = connector_callback(Vec3::ZERO, "POINT#B".into());
        assert!(conn.evaluate(&points).is_empty());
    }

    #[test]
    fn display_elevation_adds_local_offset() {
        assert_eq!(display_elevation(-40.0), 4.0);
    }
}
