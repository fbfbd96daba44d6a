//! Click and drag handling on top of a [`ViewerHost`].
//!
//! The embedder forwards raw pointer events with
//! [`InteractionController::handle_input`]; the controller only reacts to
//! kinds it has bound on the host, so the host's binding table always shows
//! what the controller is listening to.

use std::rc::Rc;

use foundation::math::Vec2;
use scene::host::ViewerHost;
use scene::input::{BindingId, InputEvent, InputKind};
use tracing::debug;

use crate::id::{EntityKind, NetworkEntityId};
use crate::notify::NotificationSink;
use crate::registry::{EntityRegistry, Shared};
use crate::selection::{Coordinate, Selection, SelectionStore};

const DRAG_INPUTS: [InputKind; 3] = [
    InputKind::PointerDown,
    InputKind::PointerMove,
    InputKind::PointerUp,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging { id: NetworkEntityId },
}

pub struct InteractionController<H: ViewerHost> {
    pub(crate) registry: Shared<EntityRegistry<H>>,
    pub(crate) selection: Rc<dyn SelectionStore>,
    pub(crate) notifier: Rc<dyn NotificationSink>,
    click_binding: Option<BindingId>,
    drag_bindings: Vec<BindingId>,
    editing: bool,
    state: InteractionState,
}

impl<H: ViewerHost> InteractionController<H> {
    pub fn new(
        registry: Shared<EntityRegistry<H>>,
        selection: Rc<dyn SelectionStore>,
        notifier: Rc<dyn NotificationSink>,
    ) -> Self {
        Self {
            registry,
            selection,
            notifier,
            click_binding: None,
            drag_bindings: Vec::new(),
            editing: false,
            state: InteractionState::Idle,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_started(&self) -> bool {
        self.click_binding.is_some()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Binds the click handler, plus the drag handlers when editing.
    /// Calling it again while started changes nothing.
    pub fn start(&mut self) {
        if self.is_started() {
            return;
        }
        let mut registry = self.registry.borrow_mut();
        self.click_binding = Some(registry.host_mut().bind_input(InputKind::Click));
        if self.editing {
            self.drag_bindings = bind_drag(registry.host_mut());
        }
    }

    /// Releases every binding this controller added and ends a drag in
    /// progress. Safe to call in any state.
    pub fn stop(&mut self) {
        self.end_drag();
        let mut registry = self.registry.borrow_mut();
        let host = registry.host_mut();
        if let Some(binding) = self.click_binding.take() {
            host.unbind_input(binding);
        }
        for binding in self.drag_bindings.drain(..) {
            host.unbind_input(binding);
        }
    }

    /// Points can only be dragged while editing is on.
    pub fn set_editing(&mut self, editing: bool) {
        if self.editing == editing {
            return;
        }
        self.editing = editing;
        if !self.is_started() {
            return;
        }
        if editing {
            let mut registry = self.registry.borrow_mut();
            self.drag_bindings = bind_drag(registry.host_mut());
        } else {
            self.end_drag();
            let mut registry = self.registry.borrow_mut();
            for binding in self.drag_bindings.drain(..) {
                registry.host_mut().unbind_input(binding);
            }
        }
    }

    /// Feeds one pointer event. Returns whether the event changed anything.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        match event.kind {
            InputKind::Click if self.click_binding.is_some() => {
                if matches!(self.state, InteractionState::Dragging { .. }) {
                    return false;
                }
                self.click(event.position)
            }
            InputKind::PointerDown if !self.drag_bindings.is_empty() => {
                self.begin_drag(event.position)
            }
            InputKind::PointerMove if !self.drag_bindings.is_empty() => {
                self.drag_to(event.position)
            }
            InputKind::PointerUp if !self.drag_bindings.is_empty() => self.end_drag(),
            _ => false,
        }
    }

    /// Resolves a click: an entity becomes the selection, empty globe clears
    /// it and records the coordinate, a miss on both changes nothing.
    pub fn click(&mut self, screen: Vec2) -> bool {
        let (picked, ground) = {
            let registry = self.registry.borrow();
            let host = registry.host();
            (host.pick(screen), host.pick_globe(screen))
        };
        let coordinate = ground.map(Coordinate::from_cartesian);

        if let Some(id) = picked.as_deref().and_then(NetworkEntityId::parse_key) {
            return self.select(&id, coordinate);
        }

        let Some(coordinate) = coordinate else {
            return false;
        };
        if let Some(previous) = self.selection.active_id() {
            self.registry.borrow_mut().highlight(&previous, false);
        }
        self.selection.clear();
        self.selection.set_coordinate(coordinate);
        true
    }

    /// Makes `id` the only highlighted entity and publishes its snapshot.
    pub fn select(&mut self, id: &NetworkEntityId, coordinate: Option<Coordinate>) -> bool {
        activate(
            &mut *self.registry.borrow_mut(),
            &*self.selection,
            id,
            coordinate,
        )
    }

    /// Explicit delete. Clears the selection when it names `id` and ends a
    /// drag of it.
    pub fn delete(&mut self, id: &NetworkEntityId) -> bool {
        if matches!(&self.state, InteractionState::Dragging { id: dragged } if dragged == id) {
            self.end_drag();
        }
        if self.selection.active_id().as_ref() == Some(id) {
            self.selection.clear();
        }
        let removed = self.registry.borrow_mut().remove(id);
        if removed {
            debug!("deleted {id}");
        }
        removed
    }

    fn begin_drag(&mut self, screen: Vec2) -> bool {
        if self.state != InteractionState::Idle {
            return false;
        }
        let picked = self.registry.borrow().host().pick(screen);
        let Some(id) = picked.as_deref().and_then(NetworkEntityId::parse_key) else {
            return false;
        };
        if id.kind != EntityKind::Point {
            return false;
        }

        debug!("dragging {id}");
        self.select(&id, None);
        self.registry.borrow_mut().host_mut().set_camera_rotation(false);
        self.state = InteractionState::Dragging { id };
        true
    }

    fn drag_to(&mut self, screen: Vec2) -> bool {
        let InteractionState::Dragging { id } = &self.state else {
            return false;
        };
        let mut registry = self.registry.borrow_mut();
        let Some(ground) = registry.host().pick_globe(screen) else {
            return false;
        };
        let Some(properties) = registry.move_point(id, ground) else {
            return false;
        };
        drop(registry);

        self.selection.publish(Selection {
            id: id.clone(),
            properties,
            coordinate: Some(Coordinate::from_cartesian(ground)),
        });
        true
    }

    fn end_drag(&mut self) -> bool {
        let InteractionState::Dragging { .. } = self.state else {
            return false;
        };
        self.state = InteractionState::Idle;
        self.registry
            .borrow_mut()
            .host_mut()
            .set_camera_rotation(true);
        true
    }
}

/// Swaps the highlight from the current selection to `id` and publishes the
/// new snapshot. Clears the selection when `id` is not registered.
pub(crate) fn activate<H: ViewerHost>(
    registry: &mut EntityRegistry<H>,
    selection: &dyn SelectionStore,
    id: &NetworkEntityId,
    coordinate: Option<Coordinate>,
) -> bool {
    if let Some(previous) = selection.active_id() {
        if &previous != id {
            registry.highlight(&previous, false);
        }
    }
    let Some(properties) = registry.snapshot(id) else {
        selection.clear();
        return false;
    };
    registry.highlight(id, true);
    selection.publish(Selection {
        id: id.clone(),
        properties,
        coordinate,
    });
    true
}

fn bind_drag(host: &mut impl ViewerHost) -> Vec<BindingId> {
    DRAG_INPUTS.iter().map(|&kind| host.bind_input(kind)).collect()
}
