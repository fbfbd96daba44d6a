use std::cmp::Ordering;

use foundation::math::{Vec2, Vec3, ecef_to_geodetic, ray_ellipsoid_intersection};

use crate::World;
use crate::components::{Geometry, GeometryKind};
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub key: String,
    pub kind: GeometryKind,
    pub distance: f64,
    pub point: Vec3,
}

/// World-space pick tolerances.
///
/// Points and lines are drawn with a pixel size, so picking treats them as
/// spheres and capsules of a fixed radius.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
    pub point_radius_m: f64,
    pub line_tolerance_m: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
            point_radius_m: 15.0,
            line_tolerance_m: 8.0,
        }
    }
}

/// Deterministic ray picking over the resolved geometry of pickable entities.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - Equal distances prefer points, then lines, then polygons, then the lower
///   `EntityId::index()`.
///
/// Derived line geometry is resolved at pick time, so a line follows its
/// endpoints exactly as it is drawn.
pub fn pick_ray(world: &World, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let dir = ray.dir.normalize()?;
    let ray = Ray::new(ray.origin, dir);

    let mut best: Option<(f64, GeometryKind, EntityId, &str)> = None;

    for view in world.iter() {
        if !view.pickable {
            continue;
        }
        let hit_t = match view.geometry {
            Geometry::Point { position } => ray_sphere_t(ray, *position, opts.point_radius_m),
            Geometry::Polyline { positions } => {
                let vertices = positions.resolve(world);
                ray_polyline_t(ray, &vertices, opts.line_tolerance_m)
            }
            Geometry::Polygon { rings } => ray_polygon_t(ray, rings),
        };
        let Some(t) = hit_t else { continue };
        if t > opts.max_distance {
            continue;
        }

        let kind = view.geometry.kind();
        let candidate = (t, kind, view.id, view.key);
        best = match best {
            None => Some(candidate),
            Some(current) => {
                let ord = t
                    .total_cmp(&current.0)
                    .then_with(|| kind.cmp(&current.1))
                    .then_with(|| view.id.index().cmp(&current.2.index()));
                if ord == Ordering::Less {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }

    let (t, kind, entity, key) = best?;
    Some(PickHit {
        entity,
        key: key.to_string(),
        kind,
        distance: t,
        point: ray.at(t),
    })
}

/// Screen picking wrapper.
///
/// The caller supplies a deterministic screen->ray mapping via `make_ray`.
pub fn pick_screen<F>(world: &World, screen: Vec2, mut make_ray: F, opts: PickOptions) -> Option<PickHit>
where
    F: FnMut(Vec2) -> Option<Ray>,
{
    let ray = make_ray(screen)?;
    pick_ray(world, ray, opts)
}

/// Globe surface point hit by `ray`, ignoring entities.
pub fn pick_globe(ray: Ray) -> Option<Vec3> {
    ray_ellipsoid_intersection(ray.origin, ray.dir)
}

fn ray_sphere_t(ray: Ray, center: Vec3, radius: f64) -> Option<f64> {
    let oc = center - ray.origin;
    let tca = oc.dot(ray.dir);
    let d2 = oc.dot(oc) - tca * tca;
    let r2 = radius * radius;
    if d2 > r2 {
        return None;
    }
    let thc = (r2 - d2).sqrt();
    let t0 = tca - thc;
    let t1 = tca + thc;
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(0.0)
    } else {
        None
    }
}

fn ray_polyline_t(ray: Ray, vertices: &[Vec3], tolerance: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for seg in vertices.windows(2) {
        let (t, dist) = ray_segment_closest(ray, seg[0], seg[1]);
        if dist <= tolerance {
            best = Some(best.map_or(t, |b: f64| b.min(t)));
        }
    }
    best
}

/// Closest approach between a normalized ray and a segment: (ray t, distance).
fn ray_segment_closest(ray: Ray, a: Vec3, b: Vec3) -> (f64, f64) {
    let u = ray.dir;
    let v = b - a;
    let w0 = ray.origin - a;
    let bb = u.dot(v);
    let cc = v.dot(v);
    let dd = u.dot(w0);
    let ee = v.dot(w0);

    let denom = cc - bb * bb;
    let s = if cc <= 1e-12 {
        0.0
    } else if denom.abs() < 1e-12 {
        ee / cc
    } else {
        (ee - bb * dd) / denom
    }
    .clamp(0.0, 1.0);

    let on_segment = a + v * s;
    let t = (on_segment - ray.origin).dot(u).max(0.0);
    (t, ray.at(t).distance(on_segment))
}

fn ray_polygon_t(ray: Ray, rings: &[Vec<Vec3>]) -> Option<f64> {
    let outer = rings.first()?;
    if outer.len() < 3 {
        return None;
    }
    let hit = pick_globe(ray)?;
    let geo = ecef_to_geodetic(hit.into());
    let p = Vec2::new(geo.lon_deg(), geo.lat_deg());

    let to_lon_lat = |ring: &Vec<Vec3>| -> Vec<Vec2> {
        ring.iter()
            .map(|v| {
                let g = ecef_to_geodetic((*v).into());
                Vec2::new(g.lon_deg(), g.lat_deg())
            })
            .collect()
    };

    if !point_in_ring(p, &to_lon_lat(outer)) {
        return None;
    }
    if rings[1..].iter().any(|hole| point_in_ring(p, &to_lon_lat(hole))) {
        return None;
    }
    Some(hit.distance(ray.origin))
}

/// Even-odd rule; the ring may or may not repeat its first vertex.
fn point_in_ring(p: Vec2, ring: &[Vec2]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
