use std::collections::HashMap;

use foundation::handles::Handle;
use foundation::math::{Vec2, Vec3};

use crate::camera::Camera;
use crate::components::{Geometry, PropertyBag, Style};
use crate::entity::EntityId;
use crate::host::{EntityView, NewEntity, PositionLookup, ViewerHost};
use crate::input::{BindingId, InputBindings, InputKind};
use crate::picking::{self, PickOptions, pick_screen};

#[derive(Debug)]
struct Slot {
    key: String,
    geometry: Geometry,
    style: Style,
    properties: PropertyBag,
    pickable: bool,
}

/// In-process viewer host.
///
/// Entity slots are recycled; a recycled slot bumps its generation so stale
/// `EntityId`s never alias a newer entity.
#[derive(Debug)]
pub struct World {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free: Vec<u32>,
    by_key: HashMap<String, EntityId>,
    bindings: InputBindings,
    camera: Camera,
    camera_rotation: bool,
    pick_options: PickOptions,
}

impl Default for World {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            by_key: HashMap::new(),
            bindings: InputBindings::new(),
            camera: Camera::default(),
            camera_rotation: true,
            pick_options: PickOptions::default(),
        }
    }
}

/// Geometry of every visible entity with derived positions evaluated.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub points: Vec<(EntityId, Vec3, Style)>,
    pub lines: Vec<(EntityId, Vec<Vec3>, Style)>,
    pub polygons: Vec<(EntityId, Vec<Vec<Vec3>>, Style)>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(camera: Camera) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn camera_rotation_enabled(&self) -> bool {
        self.camera_rotation
    }

    pub fn set_pick_options(&mut self, opts: PickOptions) {
        self.pick_options = opts;
    }

    pub fn binding_count(&self, kind: InputKind) -> usize {
        self.bindings.count(kind)
    }

    pub fn bindings(&self) -> &InputBindings {
        &self.bindings
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = EntityView<'_>> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            let slot = slot.as_ref()?;
            Some(self.view(idx as u32, slot))
        })
    }

    /// Evaluates every entity for one rendered frame.
    ///
    /// Lines whose derived positions resolve to fewer than two vertices are
    /// left out, so a line never dangles from a missing endpoint.
    pub fn resolve_frame(&self) -> FrameSnapshot {
        let mut out = FrameSnapshot::default();
        for view in self.iter() {
            match view.geometry {
                Geometry::Point { position } => out.points.push((view.id, *position, view.style)),
                Geometry::Polyline { positions } => {
                    let vertices = positions.resolve(self);
                    if vertices.len() >= 2 {
                        out.lines.push((view.id, vertices, view.style));
                    }
                }
                Geometry::Polygon { rings } => {
                    out.polygons.push((view.id, rings.clone(), view.style))
                }
            }
        }
        out
    }

    fn view<'a>(&'a self, idx: u32, slot: &'a Slot) -> EntityView<'a> {
        EntityView {
            id: EntityId(Handle::new(idx, self.generations[idx as usize])),
            key: &slot.key,
            geometry: &slot.geometry,
            style: slot.style,
            properties: &slot.properties,
            pickable: slot.pickable,
        }
    }

    fn slot(&self, key: &str) -> Option<&Slot> {
        let id = self.by_key.get(key)?;
        self.slots.get(id.index() as usize)?.as_ref()
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Slot> {
        let id = *self.by_key.get(key)?;
        self.slots.get_mut(id.index() as usize)?.as_mut()
    }

    fn allocate(&mut self) -> EntityId {
        if let Some(idx) = self.free.pop() {
            let generation = &mut self.generations[idx as usize];
            *generation += 1;
            return EntityId(Handle::new(idx, *generation));
        }
        let idx = self.slots.len() as u32;
        self.slots.push(None);
        self.generations.push(0);
        EntityId(Handle::new(idx, 0))
    }
}

impl PositionLookup for World {
    fn position_of(&self, key: &str) -> Option<Vec3> {
        match self.slot(key)?.geometry {
            Geometry::Point { position } => Some(position),
            _ => None,
        }
    }
}

impl ViewerHost for World {
    fn add(&mut self, entity: NewEntity) -> EntityId {
        self.remove(&entity.key);
        let id = self.allocate();
        self.by_key.insert(entity.key.clone(), id);
        self.slots[id.index() as usize] = Some(Slot {
            key: entity.key,
            geometry: entity.geometry,
            style: entity.style,
            properties: entity.properties,
            pickable: entity.pickable,
        });
        id
    }

    fn remove(&mut self, key: &str) -> bool {
        let Some(id) = self.by_key.remove(key) else {
            return false;
        };
        self.slots[id.index() as usize] = None;
        self.free.push(id.index());
        true
    }

    /// Empties every slot; later adds reuse slots from index 0 upward.
    fn remove_all(&mut self) {
        self.by_key.clear();
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.free = (0..self.slots.len() as u32).rev().collect();
    }

    fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    fn entity(&self, key: &str) -> Option<EntityView<'_>> {
        let id = self.by_key.get(key)?;
        let slot = self.slots.get(id.index() as usize)?.as_ref()?;
        Some(self.view(id.index(), slot))
    }

    fn keys(&self) -> Vec<String> {
        self.iter().map(|v| v.key.to_string()).collect()
    }

    fn set_position(&mut self, key: &str, position: Vec3) -> bool {
        match self.slot_mut(key) {
            Some(Slot {
                geometry: Geometry::Point { position: p },
                ..
            }) => {
                *p = position;
                true
            }
            _ => false,
        }
    }

    fn set_style(&mut self, key: &str, style: Style) -> bool {
        let Some(slot) = self.slot_mut(key) else {
            return false;
        };
        slot.style = style;
        true
    }

    fn set_properties(&mut self, key: &str, properties: PropertyBag) -> bool {
        let Some(slot) = self.slot_mut(key) else {
            return false;
        };
        slot.properties = properties;
        true
    }

    fn pick(&self, screen: Vec2) -> Option<String> {
        let camera = self.camera;
        pick_screen(self, screen, |s| camera.ray_through(s), self.pick_options).map(|hit| hit.key)
    }

    fn pick_globe(&self, screen: Vec2) -> Option<Vec3> {
        picking::pick_globe(self.camera.ray_through(screen)?)
    }

    fn bind_input(&mut self, kind: InputKind) -> BindingId {
        self.bindings.bind(kind)
    }

    fn unbind_input(&mut self, binding: BindingId) -> bool {
        self.bindings.unbind(binding)
    }

    fn set_camera_rotation(&mut self, enabled: bool) {
        self.camera_rotation = enabled;
    }

    fn fly_to(&mut self, destination: Vec3) {
        self.camera.fly_to(destination);
    }
}
