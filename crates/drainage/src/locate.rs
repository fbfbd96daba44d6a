//! Fly to a network entity by name.

use foundation::math::Vec3;
use scene::host::ViewerHost;
use tracing::info;

use crate::error::LocateError;
use crate::id::NetworkEntityId;
use crate::interaction::{InteractionController, activate};

/// Outcome of a successful [`InteractionController::locate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub id: NetworkEntityId,
    /// Where the camera was sent: the point itself, the conduit midpoint or
    /// the subcatchment centroid.
    pub focus: Vec3,
}

impl<H: ViewerHost> InteractionController<H> {
    /// Selects the entity named `name` and flies the camera to it.
    ///
    /// Points win over lines and lines over polygons when a name is used in
    /// several namespaces. Failures are also reported to the notifier.
    pub fn locate(&mut self, name: &str) -> Result<Located, LocateError> {
        let result = self.try_locate(name.trim());
        match &result {
            Ok(located) => {
                info!("located {}", located.id);
                self.notifier.success(&format!("located {}", located.id.name));
            }
            Err(err) => self.notifier.error(&err.to_string()),
        }
        result
    }

    fn try_locate(&mut self, name: &str) -> Result<Located, LocateError> {
        let mut registry = self.registry.borrow_mut();
        let id = registry
            .find_by_name(name)
            .ok_or_else(|| LocateError::NotFound(name.to_string()))?;
        let focus = registry
            .focus(&id)
            .ok_or_else(|| LocateError::NoFocus(id.clone()))?;

        activate(&mut *registry, &*self.selection, &id, None);
        registry.host_mut().fly_to(focus);
        Ok(Located { id, focus })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::NetworkStyles;
    use crate::definition::{LineDefinition, PointDefinition, PolygonDefinition};
    use crate::error::LocateError;
    use crate::id::NetworkEntityId;
    use crate::interaction::InteractionController;
    use crate::notify::RecordingSink;
    use crate::registry::{EntityRegistry, shared};
    use crate::selection::{SelectionCell, SelectionStore};
    use foundation::math::cartesian_from_degrees;
    use scene::World;
    use std::rc::Rc;

    fn controller() -> (InteractionController<World>, Rc<SelectionCell>, Rc<RecordingSink>) {
        let mut reg = EntityRegistry::new(World::new(), NetworkStyles::default());
        for (name, lon) in [("J1", 103.0), ("J2", 103.02)] {
            reg.upsert(
                NetworkEntityId::point(name),
                PointDefinition {
                    lon,
                    lat: 29.0,
                    ..PointDefinition::default()
                }
                .into(),
            );
        }
        reg.upsert(
            NetworkEntityId::line("C1"),
            LineDefinition::between("J1", "J2").into(),
        );
        reg.upsert(
            NetworkEntityId::polygon("S1"),
            PolygonDefinition {
                vertices: vec![[103.0, 29.1], [103.2, 29.1], [103.2, 29.3], [103.0, 29.3]],
                ..PolygonDefinition::default()
            }
            .into(),
        );
        let selection = Rc::new(SelectionCell::new());
        let sink = Rc::new(RecordingSink::new());
        let c = InteractionController::new(shared(reg), selection.clone(), sink.clone());
        (c, selection, sink)
    }

    #[test]
    fn locating_a_point_flies_to_it() {
        let (mut c, selection, _) = controller();
        let located = c.locate("J2").unwrap();
        assert!(located.focus.distance(cartesian_from_degrees(103.02, 29.0, 0.0)) < 1e-6);
        assert_eq!(selection.active_id(), Some(NetworkEntityId::point("J2")));
        let target = c.registry.borrow().host().camera().target;
        assert!(target.distance(located.focus) < 1e-6);
    }

    #[test]
    fn line_focus_is_its_midpoint() {
        let (mut c, _, _) = controller();
        let located = c.locate("C1").unwrap();
        let a = cartesian_from_degrees(103.0, 29.0, 0.0);
        let b = cartesian_from_degrees(103.02, 29.0, 0.0);
        assert!(located.focus.distance(a.lerp(b, 0.5)) < 1e-6);
    }

    #[test]
    fn polygon_focus_is_its_centroid() {
        let (mut c, _, _) = controller();
        let located = c.locate("S1").unwrap();
        assert!(located.focus.distance(cartesian_from_degrees(103.1, 29.2, 0.0)) < 1e-6);
    }

    #[test]
    fn unknown_name_is_reported() {
        let (mut c, selection, sink) = controller();
        c.locate("J1").unwrap();
        assert_eq!(
            c.locate("nowhere"),
            Err(LocateError::NotFound("nowhere".into()))
        );
        assert_eq!(sink.errors().len(), 1);
        assert_eq!(selection.active_id(), Some(NetworkEntityId::point("J1")));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let (mut c, selection, sink) = controller();
        let located = c.locate("  J1 ").unwrap();
        assert_eq!(located.id, NetworkEntityId::point("J1"));
        assert_eq!(selection.active_id(), Some(NetworkEntityId::point("J1")));
        let messages: Vec<String> = sink.all().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["located J1".to_string()]);
    }
}
