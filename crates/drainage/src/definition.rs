//! Per-kind entity builders with explicit defaults.

use scene::components::PropertyBag;

use crate::id::EntityKind;
use crate::records::{
    ConduitRecord, CrossSectionShape, JunctionRecord, OutfallKind, OutfallRecord,
    SubcatchmentRecord,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    Junction,
    Outfall,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Junction => "junction",
            NodeType::Outfall => "outfall",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeAttributes {
    Junction {
        depth_max: f64,
        depth_init: f64,
        depth_surcharge: f64,
        area_ponded: f64,
    },
    Outfall {
        kind: OutfallKind,
        stage: Option<f64>,
    },
}

impl NodeAttributes {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeAttributes::Junction { .. } => NodeType::Junction,
            NodeAttributes::Outfall { .. } => NodeType::Outfall,
        }
    }
}

/// Junction or outfall.
#[derive(Debug, Clone, PartialEq)]
pub struct PointDefinition {
    pub lon: f64,
    pub lat: f64,
    pub elevation: f64,
    pub attributes: NodeAttributes,
}

impl Default for PointDefinition {
    fn default() -> Self {
        Self {
            lon: 0.0,
            lat: 0.0,
            elevation: 0.0,
            attributes: NodeAttributes::Junction {
                depth_max: 0.0,
                depth_init: 0.0,
                depth_surcharge: 0.0,
                area_ponded: 0.0,
            },
        }
    }
}

impl PointDefinition {
    pub fn node_type(&self) -> NodeType {
        self.attributes.node_type()
    }

    fn properties(&self, name: &str) -> PropertyBag {
        let mut bag = PropertyBag::new()
            .with("type", self.node_type().as_str())
            .with("name", name)
            .with("lon", self.lon)
            .with("lat", self.lat)
            .with("elevation", self.elevation);
        match &self.attributes {
            NodeAttributes::Junction {
                depth_max,
                depth_init,
                depth_surcharge,
                area_ponded,
            } => {
                bag.set("depth_max", *depth_max);
                bag.set("depth_init", *depth_init);
                bag.set("depth_surcharge", *depth_surcharge);
                bag.set("area_ponded", *area_ponded);
            }
            NodeAttributes::Outfall { kind, stage } => {
                bag.set("kind", kind.as_str());
                bag.set("data", *stage);
            }
        }
        bag
    }
}

impl From<&JunctionRecord> for PointDefinition {
    fn from(r: &JunctionRecord) -> Self {
        Self {
            lon: r.lon,
            lat: r.lat,
            elevation: r.elevation,
            attributes: NodeAttributes::Junction {
                depth_max: r.depth_max,
                depth_init: r.depth_init,
                depth_surcharge: r.depth_surcharge,
                area_ponded: r.area_ponded,
            },
        }
    }
}

impl From<&OutfallRecord> for PointDefinition {
    fn from(r: &OutfallRecord) -> Self {
        Self {
            lon: r.lon,
            lat: r.lat,
            elevation: r.elevation,
            attributes: NodeAttributes::Outfall {
                kind: r.kind,
                stage: if r.kind == OutfallKind::Fixed {
                    Some(r.data.unwrap_or(0.0))
                } else {
                    None
                },
            },
        }
    }
}

/// Conduit between two point names.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDefinition {
    pub from_node: String,
    pub to_node: String,
    pub length: f64,
    pub roughness: f64,
    pub transect: Option<String>,
    pub shape: CrossSectionShape,
    pub height: f64,
    pub parameter_2: f64,
    pub parameter_3: f64,
    pub parameter_4: f64,
}

impl Default for LineDefinition {
    fn default() -> Self {
        Self {
            from_node: String::new(),
            to_node: String::new(),
            length: 100.0,
            roughness: 0.01,
            transect: None,
            shape: CrossSectionShape::Trapezoidal,
            height: 10.0,
            parameter_2: 20.0,
            parameter_3: 0.5,
            parameter_4: 0.5,
        }
    }
}

impl LineDefinition {
    pub fn between(from_node: impl Into<String>, to_node: impl Into<String>) -> Self {
        Self {
            from_node: from_node.into(),
            to_node: to_node.into(),
            ..Self::default()
        }
    }

    fn properties(&self, name: &str) -> PropertyBag {
        PropertyBag::new()
            .with("type", "conduit")
            .with("name", name)
            .with("from_node", self.from_node.as_str())
            .with("to_node", self.to_node.as_str())
            .with("length", self.length)
            .with("roughness", self.roughness)
            .with("transect", self.transect.clone())
            .with("shape", self.shape.as_str())
            .with("height", self.height)
            .with("parameter_2", self.parameter_2)
            .with("parameter_3", self.parameter_3)
            .with("parameter_4", self.parameter_4)
    }
}

impl From<&ConduitRecord> for LineDefinition {
    fn from(r: &ConduitRecord) -> Self {
        let d = Self::default();
        Self {
            from_node: r.from_node.clone(),
            to_node: r.to_node.clone(),
            length: r.length.unwrap_or(d.length),
            roughness: r.roughness.unwrap_or(d.roughness),
            transect: r.transect.clone().filter(|t| !t.is_empty()),
            shape: r.shape.unwrap_or(d.shape),
            height: r.height.unwrap_or(d.height),
            parameter_2: r.parameter_2.unwrap_or(d.parameter_2),
            parameter_3: r.parameter_3.unwrap_or(d.parameter_3),
            parameter_4: r.parameter_4.unwrap_or(d.parameter_4),
        }
    }
}

/// Subcatchment area draining to an outlet point.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonDefinition {
    /// `[lon, lat]` vertices in degrees.
    pub vertices: Vec<[f64; 2]>,
    /// Outlet point name; `None` when unassigned.
    pub outlet: Option<String>,
    pub rain_gage: String,
    pub area: f64,
    pub imperviousness: f64,
    pub width: f64,
    pub slope: f64,
}

impl Default for PolygonDefinition {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            outlet: None,
            rain_gage: "*".to_string(),
            area: 5.0,
            imperviousness: 25.0,
            width: 500.0,
            slope: 0.5,
        }
    }
}

impl PolygonDefinition {
    fn properties(&self, name: &str) -> PropertyBag {
        PropertyBag::new()
            .with("type", "subcatchment")
            .with("name", name)
            .with("rain_gage", self.rain_gage.as_str())
            .with("outlet", self.outlet.clone().unwrap_or_else(|| "*".to_string()))
            .with("area", self.area)
            .with("imperviousness", self.imperviousness)
            .with("width", self.width)
            .with("slope", self.slope)
    }
}

impl From<&SubcatchmentRecord> for PolygonDefinition {
    fn from(r: &SubcatchmentRecord) -> Self {
        let outlet = r.outlet.trim();
        Self {
            vertices: r.polygon.clone(),
            outlet: (!outlet.is_empty() && outlet != "*").then(|| outlet.to_string()),
            rain_gage: r.rain_gage.clone(),
            area: r.area,
            imperviousness: r.imperviousness,
            width: r.width,
            slope: r.slope,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityDefinition {
    Point(PointDefinition),
    Line(LineDefinition),
    Polygon(PolygonDefinition),
}

impl EntityDefinition {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDefinition::Point(_) => EntityKind::Point,
            EntityDefinition::Line(_) => EntityKind::Line,
            EntityDefinition::Polygon(_) => EntityKind::Polygon,
        }
    }

    /// Attribute snapshot shown for the entity.
    pub fn properties(&self, name: &str) -> PropertyBag {
        match self {
            EntityDefinition::Point(p) => p.properties(name),
            EntityDefinition::Line(l) => l.properties(name),
            EntityDefinition::Polygon(p) => p.properties(name),
        }
    }
}

impl From<PointDefinition> for EntityDefinition {
    fn from(d: PointDefinition) -> Self {
        EntityDefinition::Point(d)
    }
}

impl From<LineDefinition> for EntityDefinition {
    fn from(d: LineDefinition) -> Self {
        EntityDefinition::Line(d)
    }
}

impl From<PolygonDefinition> for EntityDefinition {
    fn from(d: PolygonDefinition) -> Self {
        EntityDefinition::Polygon(d)
    }
}
