//! Look-at perspective camera used to turn screen positions into world rays.

use foundation::math::{Geodetic, Vec2, Vec3, WGS84_A, WGS84_B, geodetic_to_ecef};

use crate::picking::Ray;

/// Default vertical field of view (radians).
const DEFAULT_FOV_Y: f64 = std::f64::consts::FRAC_PI_3;

/// Default camera: straight down over the study area at 27 km.
const HOME_LON_DEG: f64 = 103.764_722_222_222_22;
const HOME_LAT_DEG: f64 = 29.552_777_777_777_777;
const HOME_RANGE_M: f64 = 27_000.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Approximate up direction; re-orthogonalized when building rays.
    pub up: Vec3,
    pub fov_y_rad: f64,
    /// Canvas size in pixels.
    pub viewport: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        let target = geodetic_to_ecef(Geodetic::from_degrees(HOME_LON_DEG, HOME_LAT_DEG, 0.0));
        Self::looking_down_at(target.into(), HOME_RANGE_M, Vec2::new(1280.0, 720.0))
    }
}

impl Camera {
    /// Camera placed `range_m` above `target` along the ellipsoid normal, looking straight down.
    pub fn looking_down_at(target: Vec3, range_m: f64, viewport: Vec2) -> Self {
        let normal = ellipsoid_normal(target);
        Self {
            eye: target + normal * range_m,
            target,
            up: Vec3::new(0.0, 0.0, 1.0),
            fov_y_rad: DEFAULT_FOV_Y,
            viewport,
        }
    }

    pub fn range(&self) -> f64 {
        self.eye.distance(self.target)
    }

    /// Re-targets the camera, keeping the current range.
    pub fn fly_to(&mut self, destination: Vec3) {
        let range = self.range().max(1.0);
        *self = Self::looking_down_at(destination, range, self.viewport);
    }

    /// Ray from the eye through a pixel (origin top-left).
    pub fn ray_through(&self, screen: Vec2) -> Option<Ray> {
        let forward = (self.target - self.eye).normalize()?;
        let right = forward
            .cross(self.up)
            .normalize()
            .or_else(|| forward.cross(Vec3::new(0.0, 1.0, 0.0)).normalize())?;
        let up = right.cross(forward);

        let w = self.viewport.x.max(1.0);
        let h = self.viewport.y.max(1.0);
        let ndc_x = 2.0 * screen.x / w - 1.0;
        let ndc_y = 1.0 - 2.0 * screen.y / h;
        let tan_half = (self.fov_y_rad * 0.5).tan();
        let aspect = w / h;

        let dir = forward + right * (ndc_x * tan_half * aspect) + up * (ndc_y * tan_half);
        Some(Ray::new(self.eye, dir.normalize()?))
    }

    /// Pixel at the center of the viewport.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.viewport.x * 0.5, self.viewport.y * 0.5)
    }
}

/// Outward surface normal of the WGS84 ellipsoid at `p`.
pub fn ellipsoid_normal(p: Vec3) -> Vec3 {
    let a2 = WGS84_A * WGS84_A;
    let b2 = WGS84_B * WGS84_B;
    Vec3::new(p.x / a2, p.y / a2, p.z / b2)
        .normalize()
        .unwrap_or(Vec3::new(0.0, 0.0, 1.0))
}
