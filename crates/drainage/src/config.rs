use std::time::Duration;

use scene::components::{Color, Style};

use crate::definition::NodeType;
use crate::error::ConfigError;
use crate::id::EntityKind;

/// Local offset from WGS84 ellipsoidal height to orthometric height (meters).
///
/// Only used when displaying elevations sampled from the globe surface.
pub const HEIGHT_GEOID_OFFSET_M: f64 = 44.0;

pub const ENV_API_BASE: &str = "DRAINAGE_API_BASE";
pub const ENV_API_TIMEOUT_SECS: &str = "DRAINAGE_API_TIMEOUT_SECS";
pub const ENV_BOUNDARY_PATH: &str = "DRAINAGE_BOUNDARY_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Path of the boundary GeoJSON, relative to `base_url`.
    pub boundary_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/swmm".to_string(),
            timeout: Duration::from_secs(100),
            boundary_path: "static/boundary.geojson".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(base) = lookup(ENV_API_BASE) {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    key: ENV_API_BASE,
                    value: base,
                });
            }
            cfg.base_url = base;
        }
        if let Some(raw) = lookup(ENV_API_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_API_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup(ENV_BOUNDARY_PATH) {
            cfg.boundary_path = path;
        }
        Ok(cfg)
    }

    /// Absolute URL of an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Default and highlight styles per entity kind.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NetworkStyles {
    pub junction: Style,
    pub outfall: Style,
    pub conduit: Style,
    pub subcatchment: Style,
    pub point_highlight: Style,
    pub line_highlight: Style,
    pub polygon_highlight: Style,
    pub connector: Style,
    pub boundary: Style,
}

impl Default for NetworkStyles {
    fn default() -> Self {
        Self {
            junction: Style::new(Color::YELLOW, 10.0)
                .outlined(Color::WHITE, 2.0)
                .clamped(),
            outfall: Style::new(Color::ORANGE, 12.0)
                .outlined(Color::WHITE, 2.0)
                .clamped(),
            conduit: Style::new(Color::BLUE.with_alpha(0.5), 10.0).clamped(),
            subcatchment: Style::new(Color::GREEN.with_alpha(0.3), 2.0)
                .outlined(Color::GREEN, 2.0)
                .clamped(),
            point_highlight: Style::new(Color::RED, 14.0)
                .outlined(Color::WHITE, 3.0)
                .clamped(),
            line_highlight: Style::new(Color::RED.with_alpha(0.8), 12.0).clamped(),
            polygon_highlight: Style::new(Color::RED.with_alpha(0.35), 3.0)
                .outlined(Color::RED, 3.0)
                .clamped(),
            connector: Style::new(Color::CYAN, 3.0).clamped(),
            boundary: Style::new(Color::RED.with_alpha(0.9), 3.0).clamped(),
        }
    }
}

impl NetworkStyles {
    pub fn point(&self, node: NodeType) -> Style {
        match node {
            NodeType::Junction => self.junction,
            NodeType::Outfall => self.outfall,
        }
    }

    pub fn highlight(&self, kind: EntityKind) -> Style {
        match kind {
            EntityKind::Point => self.point_highlight,
            EntityKind::Line => self.line_highlight,
            EntityKind::Polygon => self.polygon_highlight,
        }
    }
}
