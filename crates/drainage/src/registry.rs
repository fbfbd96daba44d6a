use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use foundation::math::{Ecef, Vec3, cartesian_from_degrees, ecef_to_geodetic};
use scene::components::{Geometry, Positions, PropertyBag, Style};
use scene::entity::EntityId;
use scene::host::{NewEntity, ViewerHost};
use tracing::{debug, warn};

use crate::config::NetworkStyles;
use crate::definition::{EntityDefinition, LineDefinition, PolygonDefinition};
use crate::geometry;
use crate::id::{EntityKind, NetworkEntityId, boundary_key, connector_key};
use crate::records::{Boundary, BoundaryShape};

/// Single-threaded shared handle used by the controllers.
pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// A network entity currently rendered by the host.
#[derive(Debug, Clone)]
pub struct MapEntity {
    pub id: NetworkEntityId,
    pub handle: EntityId,
    pub definition: EntityDefinition,
}

/// Maps network ids to host entities.
///
/// The registry is the only writer of `POINT#`, `POLYLINE#`, `POLYGON#` and
/// `OVERLAY#` keys on its host.
pub struct EntityRegistry<H: ViewerHost> {
    host: H,
    styles: NetworkStyles,
    entities: BTreeMap<NetworkEntityId, MapEntity>,
    /// Polygons whose outlet connector is currently drawn.
    connectors: BTreeSet<NetworkEntityId>,
    highlighted: BTreeSet<NetworkEntityId>,
    overlays: Vec<String>,
}

impl<H: ViewerHost> EntityRegistry<H> {
    pub fn new(host: H, styles: NetworkStyles) -> Self {
        Self {
            host,
            styles,
            entities: BTreeMap::new(),
            connectors: BTreeSet::new(),
            highlighted: BTreeSet::new(),
            overlays: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn styles(&self) -> &NetworkStyles {
        &self.styles
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NetworkEntityId> + '_ {
        self.entities.keys()
    }

    pub fn get(&self, id: &NetworkEntityId) -> Option<&MapEntity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &NetworkEntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Creates or replaces the entity for `id`.
    ///
    /// A highlighted entity stays highlighted across the replacement.
    ///
    /// Returns `None` without touching the host when the definition cannot be
    /// rendered: a kind that does not match the id, a conduit whose endpoints
    /// are not registered points, or a subcatchment with fewer than three
    /// vertices.
    pub fn upsert(&mut self, id: NetworkEntityId, definition: EntityDefinition) -> Option<EntityId> {
        if id.kind != definition.kind() {
            warn!("refusing to register {id}: definition is a {:?}", definition.kind());
            return None;
        }

        let geometry = match &definition {
            EntityDefinition::Point(p) => {
                Geometry::point(cartesian_from_degrees(p.lon, p.lat, p.elevation))
            }
            EntityDefinition::Line(l) => self.line_geometry(&id, l)?,
            EntityDefinition::Polygon(p) => {
                if p.vertices.len() < 3 {
                    warn!("skipping {id}: polygon has {} vertices", p.vertices.len());
                    return None;
                }
                Geometry::Polygon {
                    rings: vec![surface_ring(&p.vertices)],
                }
            }
        };

        if self.connectors.remove(&id) {
            self.host.remove(&connector_key(&id));
        }

        let entity = NewEntity::new(id.key(), geometry, self.default_style(&definition))
            .with_properties(definition.properties(&id.name));
        let handle = self.host.add(entity);
        self.entities.insert(
            id.clone(),
            MapEntity {
                id: id.clone(),
                handle,
                definition,
            },
        );
        if self.highlighted.contains(&id) {
            self.highlight(&id, true);
        }
        Some(handle)
    }

    /// Explicit delete. Lines that referenced a removed point stop drawing.
    pub fn remove(&mut self, id: &NetworkEntityId) -> bool {
        if self.entities.remove(id).is_none() {
            return false;
        }
        self.highlighted.remove(id);
        if self.connectors.remove(id) {
            self.host.remove(&connector_key(id));
        }
        self.host.remove(&id.key());
        true
    }

    /// Drops every entity and overlay.
    pub fn remove_all(&mut self) {
        self.host.remove_all();
        self.entities.clear();
        self.connectors.clear();
        self.highlighted.clear();
        self.overlays.clear();
    }

    /// Switches between the default and the highlight style.
    ///
    /// Highlighting a subcatchment also draws its outlet connector when the
    /// outlet point exists; reversing removes it. Returns `false` for
    /// unknown ids.
    pub fn highlight(&mut self, id: &NetworkEntityId, on: bool) -> bool {
        let Some(entity) = self.entities.get(id) else {
            return false;
        };
        let style = if on {
            self.styles.highlight(id.kind)
        } else {
            self.default_style(&entity.definition)
        };

        if let EntityDefinition::Polygon(polygon) = &entity.definition {
            if on {
                let connector = self.connector_entity(id, polygon);
                if let Some(connector) = connector {
                    self.host.add(connector);
                    self.connectors.insert(id.clone());
                }
            } else if self.connectors.remove(id) {
                self.host.remove(&connector_key(id));
            }
        }

        if on {
            self.highlighted.insert(id.clone());
        } else {
            self.highlighted.remove(id);
        }

        self.host.set_style(&id.key(), style)
    }

    pub fn is_highlighted(&self, id: &NetworkEntityId) -> bool {
        self.highlighted.contains(id)
    }

    pub fn has_connector(&self, polygon: &NetworkEntityId) -> bool {
        self.connectors.contains(polygon)
    }

    /// Moves a point to a Cartesian position and refreshes its lon/lat and
    /// displayed elevation. The definition keeps the ellipsoidal height; the
    /// local offset only reaches the property bag. Returns the new property
    /// snapshot.
    pub fn move_point(&mut self, id: &NetworkEntityId, position: Vec3) -> Option<PropertyBag> {
        let entity = self.entities.get_mut(id)?;
        let EntityDefinition::Point(point) = &mut entity.definition else {
            return None;
        };

        let geo = ecef_to_geodetic(Ecef::from(position));
        let (lon, lat) = (geo.lon_deg(), geo.lat_deg());
        point.lon = lon;
        point.lat = lat;
        point.elevation = geo.alt_m;
        let elevation = geometry::display_elevation(geo.alt_m);

        let key = id.key();
        if !self.host.set_position(&key, position) {
            return None;
        }
        let mut properties = self.snapshot(id)?;
        properties.set("lon", lon);
        properties.set("lat", lat);
        properties.set("elevation", elevation);
        self.host.set_properties(&key, properties.clone());
        Some(properties)
    }

    /// Copy of the entity's current property bag.
    pub fn snapshot(&self, id: &NetworkEntityId) -> Option<PropertyBag> {
        self.host
            .entity(&id.key())
            .map(|view| view.properties.clone())
    }

    pub fn style_of(&self, id: &NetworkEntityId) -> Option<Style> {
        self.host.entity(&id.key()).map(|view| view.style)
    }

    /// Resolves a bare backend name, trying points, then lines, then polygons.
    pub fn find_by_name(&self, name: &str) -> Option<NetworkEntityId> {
        EntityKind::ALL
            .into_iter()
            .map(|kind| NetworkEntityId::new(kind, name))
            .find(|id| self.entities.contains_key(id))
    }

    /// Current endpoints of a registered conduit.
    pub fn line_endpoints(&self, id: &NetworkEntityId) -> Option<[Vec3; 2]> {
        match &self.entities.get(id)?.definition {
            EntityDefinition::Line(l) => geometry::line_endpoints(
                &self.host,
                &NetworkEntityId::point(&l.from_node),
                &NetworkEntityId::point(&l.to_node),
            ),
            _ => None,
        }
    }

    /// Current `[centroid, outlet]` segment of a registered subcatchment.
    pub fn connector(&self, id: &NetworkEntityId) -> Option<[Vec3; 2]> {
        match &self.entities.get(id)?.definition {
            EntityDefinition::Polygon(p) => {
                let outlet = NetworkEntityId::point(p.outlet.as_deref()?);
                geometry::connector(&self.host, geometry::centroid_position(&p.vertices)?, &outlet)
            }
            _ => None,
        }
    }

    /// Where the camera should look to show the entity.
    pub fn focus(&self, id: &NetworkEntityId) -> Option<Vec3> {
        match &self.entities.get(id)?.definition {
            EntityDefinition::Point(_) => self.host.position_of(&id.key()),
            EntityDefinition::Line(_) => self.line_endpoints(id).map(|[a, b]| a.lerp(b, 0.5)),
            EntityDefinition::Polygon(p) => geometry::centroid_position(&p.vertices),
        }
    }

    /// Draws the study-area boundary as unpickable overlays. Returns the
    /// number of overlays added.
    pub fn add_boundary(&mut self, boundary: &Boundary) -> usize {
        let style = self.styles.boundary;
        let mut added = 0;
        for feature in &boundary.features {
            let geometry = match &feature.shape {
                BoundaryShape::Area(rings) => Geometry::Polygon {
                    rings: rings.iter().map(|r| surface_ring(r)).collect(),
                },
                BoundaryShape::Path(path) if path.len() >= 2 => Geometry::Polyline {
                    positions: Positions::Static(surface_ring(path)),
                },
                BoundaryShape::Path(_) => continue,
            };
            let key = boundary_key(self.overlays.len());
            self.host
                .add(NewEntity::new(key.clone(), geometry, style).unpickable());
            self.overlays.push(key);
            added += 1;
        }
        added
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len() + self.connectors.len()
    }

    fn default_style(&self, definition: &EntityDefinition) -> Style {
        match definition {
            EntityDefinition::Point(p) => self.styles.point(p.node_type()),
            EntityDefinition::Line(_) => self.styles.conduit,
            EntityDefinition::Polygon(_) => self.styles.subcatchment,
        }
    }

    fn line_geometry(&self, id: &NetworkEntityId, line: &LineDefinition) -> Option<Geometry> {
        let from = NetworkEntityId::point(&line.from_node);
        let to = NetworkEntityId::point(&line.to_node);
        for end in [&from, &to] {
            if !self.entities.contains_key(end) {
                warn!("skipping {id}: endpoint {end} is not registered");
                return None;
            }
        }
        Some(Geometry::derived_polyline(geometry::line_callback(
            from.key(),
            to.key(),
        )))
    }

    fn connector_entity(&self, id: &NetworkEntityId, polygon: &PolygonDefinition) -> Option<NewEntity> {
        if self.connectors.contains(id) {
            return None;
        }
        let Some(outlet) = polygon.outlet.as_deref().map(NetworkEntityId::point) else {
            debug!("{id} has no outlet");
            return None;
        };
        if !self.entities.contains_key(&outlet) {
            debug!("{id} outlet {outlet} is not registered");
            return None;
        }
        let centroid = geometry::centroid_position(&polygon.vertices)?;
        Some(
            NewEntity::new(
                connector_key(id),
                Geometry::derived_polyline(geometry::connector_callback(centroid, outlet.key())),
                self.styles.connector,
            )
            .unpickable(),
        )
    }
}

fn surface_ring(vertices: &[[f64; 2]]) -> Vec<Vec3> {
    vertices
        .iter()
        .map(|&[lon, lat]| cartesian_from_degrees(lon, lat, 0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::EntityRegistry;
    use crate::config::NetworkStyles;
    use crate::definition::{
        EntityDefinition, LineDefinition, NodeAttributes, PointDefinition, PolygonDefinition,
    };
    use crate::id::NetworkEntityId;
    use crate::records::{OutfallKind, SubcatchmentRecord};
    use foundation::math::{Ecef, Vec3, cartesian_from_degrees, ecef_to_geodetic};
    use scene::World;
    use scene::host::PositionLookup;

    fn junction(lon: f64, lat: f64, elevation: f64) -> EntityDefinition {
        PointDefinition {
            lon,
            lat,
            elevation,
            ..PointDefinition::default()
        }
        .into()
    }

    fn outfall(lon: f64, lat: f64, elevation: f64) -> EntityDefinition {
        PointDefinition {
            lon,
            lat,
            elevation,
            attributes: NodeAttributes::Outfall {
                kind: OutfallKind::Free,
                stage: None,
            },
        }
        .into()
    }

    fn scenario() -> EntityRegistry<World> {
        let mut reg = EntityRegistry::new(World::new(), NetworkStyles::default());
        reg.upsert(NetworkEntityId::point("J1"), junction(103.0, 29.0, 10.0));
        reg.upsert(NetworkEntityId::point("O1"), outfall(103.01, 29.0, 5.0));
        reg.upsert(
            NetworkEntityId::line("C1"),
            LineDefinition::between("J1", "O1").into(),
        );
        reg
    }

    fn subcatchment(outlet: &str) -> EntityDefinition {
        PolygonDefinition::from(&SubcatchmentRecord {
            name: "S1".into(),
            rain_gage: "*".into(),
            outlet: outlet.into(),
            area: 5.0,
            imperviousness: 25.0,
            width: 500.0,
            slope: 0.5,
            polygon: vec![[103.0, 29.01], [103.01, 29.01], [103.01, 29.02], [103.0, 29.02]],
        })
        .into()
    }

    #[test]
    fn example_network_resolves_and_breaks_cleanly() {
        let mut reg = scenario();
        assert_eq!(reg.len(), 3);

        let c1 = NetworkEntityId::line("C1");
        let [a, b] = reg.line_endpoints(&c1).unwrap();
        assert!(a.distance(cartesian_from_degrees(103.0, 29.0, 10.0)) < 1e-6);
        assert!(b.distance(cartesian_from_degrees(103.01, 29.0, 5.0)) < 1e-6);

        assert!(reg.remove(&NetworkEntityId::point("J1")));
        assert_eq!(reg.line_endpoints(&c1), None);
        let frame = reg.host().resolve_frame();
        assert!(frame.lines.is_empty());
    }

    #[test]
    fn line_with_unknown_endpoint_is_not_added() {
        let mut reg = scenario();
        let before = reg.host().len();
        let added = reg.upsert(
            NetworkEntityId::line("C2"),
            LineDefinition::between("J1", "MISSING").into(),
        );
        assert_eq!(added, None);
        assert_eq!(reg.host().len(), before);
        assert!(!reg.contains(&NetworkEntityId::line("C2")));
    }

    #[test]
    fn names_may_repeat_across_kinds() {
        let mut reg = scenario();
        reg.upsert(NetworkEntityId::polygon("J1"), subcatchment("O1"));
        assert_eq!(reg.len(), 4);
        assert_eq!(reg.find_by_name("J1"), Some(NetworkEntityId::point("J1")));
        assert_eq!(reg.find_by_name("C1"), Some(NetworkEntityId::line("C1")));
    }

    #[test]
    fn mismatched_kind_is_rejected() {
        let mut reg = scenario();
        assert_eq!(reg.upsert(NetworkEntityId::line("X"), junction(0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn moving_a_point_moves_its_lines() {
        let mut reg = scenario();
        let target = cartesian_from_degrees(103.005, 29.005, 0.0);
        let props = reg.move_point(&NetworkEntityId::point("J1"), target).unwrap();

        assert!((props.number("lon").unwrap() - 103.005).abs() < 1e-7);
        assert!((props.number("elevation").unwrap() - 44.0).abs() < 1e-3);
        let [a, _] = reg.line_endpoints(&NetworkEntityId::line("C1")).unwrap();
        assert!(a.distance(target) < 1e-6);
    }

    #[test]
    fn moving_a_line_is_refused() {
        let mut reg = scenario();
        assert!(reg.move_point(&NetworkEntityId::line("C1"), Vec3::ZERO).is_none());
    }

    #[test]
    fn highlight_swaps_style_and_back() {
        let mut reg = scenario();
        let j1 = NetworkEntityId::point("J1");
        let default = reg.style_of(&j1).unwrap();

        assert!(reg.highlight(&j1, true));
        assert_eq!(reg.style_of(&j1), Some(reg.styles().point_highlight));
        assert!(reg.highlight(&j1, false));
        assert_eq!(reg.style_of(&j1), Some(default));
        assert!(!reg.highlight(&NetworkEntityId::point("nope"), true));
    }

    #[test]
    fn connector_is_drawn_once_and_removed_on_reverse() {
        let mut reg = scenario();
        let s1 = NetworkEntityId::polygon("S1");
        reg.upsert(s1.clone(), subcatchment("O1"));
        let base = reg.host().len();

        reg.highlight(&s1, true);
        reg.highlight(&s1, true);
        assert_eq!(reg.host().len(), base + 1);
        assert!(reg.has_connector(&s1));
        assert!(reg.connector(&s1).is_some());

        reg.highlight(&s1, false);
        assert_eq!(reg.host().len(), base);
        assert!(!reg.has_connector(&s1));
    }

    #[test]
    fn unresolvable_outlet_draws_no_connector() {
        let mut reg = scenario();
        let s1 = NetworkEntityId::polygon("S1");
        reg.upsert(s1.clone(), subcatchment("*"));
        let base = reg.host().len();

        assert!(reg.highlight(&s1, true));
        assert_eq!(reg.host().len(), base);
        assert!(!reg.has_connector(&s1));

        let s2 = NetworkEntityId::polygon("S2");
        reg.upsert(s2.clone(), subcatchment("GONE"));
        assert!(reg.highlight(&s2, true));
        assert!(!reg.has_connector(&s2));
    }

    #[test]
    fn remove_all_clears_host() {
        let mut reg = scenario();
        reg.remove_all();
        assert!(reg.is_empty());
        assert!(reg.host().is_empty());
    }

    #[test]
    fn upsert_replaces_existing_entity() {
        let mut reg = scenario();
        reg.upsert(NetworkEntityId::point("J1"), junction(103.002, 29.0, 12.0));
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.host().len(), 3);
        let props = reg.snapshot(&NetworkEntityId::point("J1")).unwrap();
        assert_eq!(props.number("elevation"), Some(12.0));
    }

    #[test]
    fn dragged_point_keeps_its_height_when_re_registered() {
        let mut reg = scenario();
        let j1 = NetworkEntityId::point("J1");
        let target = cartesian_from_degrees(103.005, 29.005, 0.0);
        reg.move_point(&j1, target).unwrap();

        let definition = reg.get(&j1).unwrap().definition.clone();
        reg.upsert(j1.clone(), definition);

        let position = reg.host().position_of(&j1.key()).unwrap();
        assert!(position.distance(target) < 1e-3);
        let height = ecef_to_geodetic(Ecef::from(position)).alt_m;
        assert!(height.abs() < 1e-3);
    }

    #[test]
    fn replacing_a_highlighted_point_keeps_the_highlight() {
        let mut reg = scenario();
        let j1 = NetworkEntityId::point("J1");
        reg.highlight(&j1, true);

        reg.upsert(j1.clone(), junction(103.002, 29.0, 12.0));
        assert!(reg.is_highlighted(&j1));
        assert_eq!(reg.style_of(&j1), Some(reg.styles().point_highlight));

        reg.highlight(&j1, false);
        reg.upsert(j1.clone(), junction(103.003, 29.0, 12.0));
        assert!(!reg.is_highlighted(&j1));
        assert_ne!(reg.style_of(&j1), Some(reg.styles().point_highlight));
    }

    #[test]
    fn replacing_a_highlighted_subcatchment_redraws_its_connector() {
        let mut reg = scenario();
        let s1 = NetworkEntityId::polygon("S1");
        reg.upsert(s1.clone(), subcatchment("O1"));
        let base = reg.host().len();
        reg.highlight(&s1, true);

        reg.upsert(s1.clone(), subcatchment("O1"));
        assert!(reg.has_connector(&s1));
        assert_eq!(reg.host().len(), base + 1);
        assert_eq!(reg.style_of(&s1), Some(reg.styles().polygon_highlight));
    }

    #[test]
    fn removing_drops_the_highlight() {
        let mut reg = scenario();
        let j1 = NetworkEntityId::point("J1");
        reg.highlight(&j1, true);
        reg.remove(&j1);
        assert!(!reg.is_highlighted(&j1));

        reg.upsert(j1.clone(), junction(103.0, 29.0, 10.0));
        assert_ne!(reg.style_of(&j1), Some(reg.styles().point_highlight));
    }
}
