use std::collections::BTreeMap;

use foundation::math::Vec2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputKind {
    Click,
    PointerDown,
    PointerMove,
    PointerUp,
}

/// Screen-space input event, position in canvas pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub position: Vec2,
}

impl InputEvent {
    pub fn click(x: f64, y: f64) -> Self {
        Self::new(InputKind::Click, x, y)
    }

    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::new(InputKind::PointerDown, x, y)
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::new(InputKind::PointerMove, x, y)
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::new(InputKind::PointerUp, x, y)
    }

    fn new(kind: InputKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            position: Vec2::new(x, y),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u64);

/// Input subscriptions registered on a host.
#[derive(Debug, Default, Clone)]
pub struct InputBindings {
    next: u64,
    bound: BTreeMap<BindingId, InputKind>,
}

impl InputBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, kind: InputKind) -> BindingId {
        let id = BindingId(self.next);
        self.next += 1;
        self.bound.insert(id, kind);
        id
    }

    pub fn unbind(&mut self, id: BindingId) -> bool {
        self.bound.remove(&id).is_some()
    }

    pub fn count(&self, kind: InputKind) -> usize {
        self.bound.values().filter(|k| **k == kind).count()
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{InputBindings, InputKind};

    #[test]
    fn bind_and_unbind() {
        let mut b = InputBindings::new();
        let click = b.bind(InputKind::Click);
        let down = b.bind(InputKind::PointerDown);
        assert_ne!(click, down);
        assert_eq!(b.count(InputKind::Click), 1);
        assert!(b.unbind(click));
        assert!(!b.unbind(click));
        assert_eq!(b.count(InputKind::Click), 0);
        assert_eq!(b.len(), 1);
    }
}
