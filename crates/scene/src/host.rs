use foundation::math::{Vec2, Vec3};

use crate::components::{Geometry, PropertyBag, Style};
use crate::entity::EntityId;
use crate::input::{BindingId, InputKind};

/// Read access to the current position of keyed point entities.
pub trait PositionLookup {
    fn position_of(&self, key: &str) -> Option<Vec3>;
}

/// Everything needed to add one renderable entity to a host.
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub key: String,
    pub geometry: Geometry,
    pub style: Style,
    pub properties: PropertyBag,
    pub pickable: bool,
}

impl NewEntity {
    pub fn new(key: impl Into<String>, geometry: Geometry, style: Style) -> Self {
        Self {
            key: key.into(),
            geometry,
            style,
            properties: PropertyBag::new(),
            pickable: true,
        }
    }

    pub fn with_properties(mut self, properties: PropertyBag) -> Self {
        self.properties = properties;
        self
    }

    /// Decoration that picking looks through.
    pub fn unpickable(mut self) -> Self {
        self.pickable = false;
        self
    }
}

/// Borrowed view of a live host entity.
#[derive(Debug, Copy, Clone)]
pub struct EntityView<'a> {
    pub id: EntityId,
    pub key: &'a str,
    pub geometry: &'a Geometry,
    pub style: Style,
    pub properties: &'a PropertyBag,
    pub pickable: bool,
}

/// Capability interface of a 3D globe viewer.
///
/// Entities are addressed by string key. Adding an entity with a key that is
/// already present replaces the previous entity.
pub trait ViewerHost: PositionLookup {
    fn add(&mut self, entity: NewEntity) -> EntityId;
    fn remove(&mut self, key: &str) -> bool;
    fn remove_all(&mut self);
    fn contains(&self, key: &str) -> bool;
    fn entity(&self, key: &str) -> Option<EntityView<'_>>;
    fn keys(&self) -> Vec<String>;

    /// Moves a point entity. Returns `false` for unknown keys and non-points.
    fn set_position(&mut self, key: &str, position: Vec3) -> bool;
    fn set_style(&mut self, key: &str, style: Style) -> bool;
    fn set_properties(&mut self, key: &str, properties: PropertyBag) -> bool;

    /// Key of the front-most entity under a screen position.
    fn pick(&self, screen: Vec2) -> Option<String>;
    /// Globe surface position under a screen position.
    fn pick_globe(&self, screen: Vec2) -> Option<Vec3>;

    fn bind_input(&mut self, kind: InputKind) -> BindingId;
    fn unbind_input(&mut self, binding: BindingId) -> bool;
    fn set_camera_rotation(&mut self, enabled: bool);
    fn fly_to(&mut self, destination: Vec3);
}
