use std::fmt;

/// Namespace of a network entity.
///
/// Junctions and outfalls share the `Point` namespace so a conduit can use
/// either as an endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Point,
    Line,
    Polygon,
}

impl EntityKind {
    /// Lookup order used when resolving a bare name.
    pub const ALL: [EntityKind; 3] = [EntityKind::Point, EntityKind::Line, EntityKind::Polygon];

    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Point => "POINT#",
            EntityKind::Line => "POLYLINE#",
            EntityKind::Polygon => "POLYGON#",
        }
    }
}

/// Host key prefix for transient decorations (connectors, boundary).
pub const OVERLAY_PREFIX: &str = "OVERLAY#";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkEntityId {
    pub kind: EntityKind,
    pub name: String,
}

impl NetworkEntityId {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn point(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Point, name)
    }

    pub fn line(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Line, name)
    }

    pub fn polygon(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Polygon, name)
    }

    /// Key of the viewer entity, e.g. `POINT#J1`.
    pub fn key(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.name)
    }

    /// Inverse of [`NetworkEntityId::key`]. Overlay keys and unknown prefixes yield `None`.
    pub fn parse_key(key: &str) -> Option<Self> {
        EntityKind::ALL.into_iter().find_map(|kind| {
            key.strip_prefix(kind.prefix())
                .map(|name| Self::new(kind, name))
        })
    }
}

impl fmt::Display for NetworkEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.name)
    }
}

/// Everything after the first `#`, or the whole string when there is none.
///
/// Turns a prefixed key back into the backend name: `junction#1#1` -> `1#1`.
pub fn strip_prefix(key: &str) -> &str {
    key.split_once('#').map_or(key, |(_, rest)| rest)
}

pub fn connector_key(polygon: &NetworkEntityId) -> String {
    format!("{OVERLAY_PREFIX}connector#{}", polygon.name)
}

pub fn boundary_key(index: usize) -> String {
    format!("{OVERLAY_PREFIX}boundary#{index}")
}
