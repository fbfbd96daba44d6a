//! Wire records returned by the network data API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ApiError, BoundaryError};

/// Reads `null` as the type's default. The backend writes NaN as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionRecord {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub elevation: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub depth_max: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub depth_init: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub depth_surcharge: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub area_ponded: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutfallKind {
    #[default]
    Free,
    Normal,
    Fixed,
}

impl OutfallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutfallKind::Free => "FREE",
            OutfallKind::Normal => "NORMAL",
            OutfallKind::Fixed => "FIXED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfallRecord {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub elevation: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: OutfallKind,
    /// Fixed stage; only meaningful for `FIXED` outfalls.
    #[serde(default)]
    pub data: Option<f64>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CrossSectionShape {
    #[default]
    Trapezoidal,
    Irregular,
    Circular,
}

impl CrossSectionShape {
    pub fn as_str(self) -> &'static str {
        match self {
            CrossSectionShape::Trapezoidal => "TRAPEZOIDAL",
            CrossSectionShape::Irregular => "IRREGULAR",
            CrossSectionShape::Circular => "CIRCULAR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConduitRecord {
    pub name: String,
    pub from_node: String,
    pub to_node: String,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub roughness: Option<f64>,
    #[serde(default)]
    pub transect: Option<String>,
    #[serde(default)]
    pub shape: Option<CrossSectionShape>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub parameter_2: Option<f64>,
    #[serde(default)]
    pub parameter_3: Option<f64>,
    #[serde(default)]
    pub parameter_4: Option<f64>,
}

fn any_node() -> String {
    "*".to_string()
}

fn default_area() -> f64 {
    5.0
}

fn default_imperviousness() -> f64 {
    25.0
}

fn default_width() -> f64 {
    500.0
}

fn default_slope() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcatchmentRecord {
    pub name: String,
    #[serde(default = "any_node")]
    pub rain_gage: String,
    /// Receiving node name, `*` when unassigned.
    #[serde(default = "any_node")]
    pub outlet: String,
    #[serde(default = "default_area")]
    pub area: f64,
    #[serde(default = "default_imperviousness")]
    pub imperviousness: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_slope")]
    pub slope: f64,
    /// `[lon, lat]` vertices in degrees.
    #[serde(default)]
    pub polygon: Vec<[f64; 2]>,
}

/// Response body as sent by the backend: either the bare data or wrapped in
/// its `{code, message, data}` result envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Bare(T),
    Envelope {
        code: i64,
        #[serde(default)]
        message: String,
        data: Option<T>,
    },
}

impl<T: Default> Payload<T> {
    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            Payload::Bare(data) => Ok(data),
            Payload::Envelope { code: 200, data, .. } => Ok(data.unwrap_or_default()),
            Payload::Envelope { code, message, .. } => Err(ApiError::Rejected { code, message }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryShape {
    /// Polygon rings, outer first.
    Area(Vec<Vec<[f64; 2]>>),
    Path(Vec<[f64; 2]>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub name: Option<String>,
    pub shape: BoundaryShape,
}

/// Static study-area boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Boundary {
    pub features: Vec<BoundaryFeature>,
    /// Features that could not be read; the rest of the boundary is still usable.
    pub skipped: Vec<BoundaryError>,
}

impl Boundary {
    /// Reads a FeatureCollection, a single Feature, or a bare geometry.
    ///
    /// Multi-geometries are split into one feature per part. Only a malformed
    /// top level is an error; bad features are collected in `skipped`.
    pub fn from_geojson(value: &Value) -> Result<Self, BoundaryError> {
        let obj = value.as_object().ok_or(BoundaryError::NotAnObject)?;
        let ty = obj.get("type").and_then(Value::as_str).unwrap_or_default();

        let features: Vec<&Value> = match ty {
            "FeatureCollection" => obj
                .get("features")
                .and_then(Value::as_array)
                .map(|a| a.iter().collect())
                .unwrap_or_default(),
            "Feature" => vec![value],
            "Polygon" | "MultiPolygon" | "LineString" | "MultiLineString" => vec![value],
            other => return Err(BoundaryError::UnsupportedType(other.to_string())),
        };

        let mut out = Boundary::default();
        for (index, feature) in features.into_iter().enumerate() {
            match read_feature(feature) {
                Ok(mut parts) => out.features.append(&mut parts),
                Err(reason) => out.skipped.push(BoundaryError::Feature { index, reason }),
            }
        }
        Ok(out)
    }
}

fn read_feature(value: &Value) -> Result<Vec<BoundaryFeature>, String> {
    let (geometry, name) = match value.get("type").and_then(Value::as_str) {
        Some("Feature") => {
            let name = value
                .get("properties")
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let geometry = value.get("geometry").ok_or("missing geometry")?;
            (geometry, name)
        }
        _ => (value, None),
    };

    let ty = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry without type")?;
    let coords = geometry.get("coordinates").ok_or("missing coordinates")?;

    let shapes = match ty {
        "Polygon" => vec![BoundaryShape::Area(read_rings(coords)?)],
        "MultiPolygon" => as_array(coords)?
            .iter()
            .map(|p| read_rings(p).map(BoundaryShape::Area))
            .collect::<Result<_, _>>()?,
        "LineString" => vec![BoundaryShape::Path(read_positions(coords)?)],
        "MultiLineString" => as_array(coords)?
            .iter()
            .map(|l| read_positions(l).map(BoundaryShape::Path))
            .collect::<Result<_, _>>()?,
        other => return Err(format!("unsupported geometry `{other}`")),
    };

    Ok(shapes
        .into_iter()
        .map(|shape| BoundaryFeature {
            name: name.clone(),
            shape,
        })
        .collect())
}

fn as_array(value: &Value) -> Result<&Vec<Value>, String> {
    value.as_array().ok_or_else(|| "coordinates are not an array".to_string())
}

fn read_rings(value: &Value) -> Result<Vec<Vec<[f64; 2]>>, String> {
    let rings = as_array(value)?
        .iter()
        .map(read_positions)
        .collect::<Result<Vec<_>, _>>()?;
    match rings.first() {
        Some(outer) if outer.len() >= 3 => Ok(rings),
        _ => Err("polygon needs an outer ring of at least 3 positions".to_string()),
    }
}

fn read_positions(value: &Value) -> Result<Vec<[f64; 2]>, String> {
    as_array(value)?
        .iter()
        .map(|p| {
            let lon = p.get(0).and_then(Value::as_f64);
            let lat = p.get(1).and_then(Value::as_f64);
            match (lon, lat) {
                (Some(lon), Some(lat)) => Ok([lon, lat]),
                _ => Err(format!("invalid position {p}")),
            }
        })
        .collect()
}
