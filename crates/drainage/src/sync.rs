//! Full rebuild of the registry from the backend.

use std::rc::Rc;

use scene::host::ViewerHost;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::{Collection, NetworkApi};
use crate::definition::{EntityDefinition, LineDefinition, PointDefinition, PolygonDefinition};
use crate::error::{ApiError, SyncError};
use crate::id::NetworkEntityId;
use crate::interaction::activate;
use crate::notify::NotificationSink;
use crate::records::Boundary;
use crate::registry::{EntityRegistry, Shared};
use crate::selection::{Selection, SelectionStore};

/// What a reload rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    pub junctions: usize,
    pub outfalls: usize,
    pub conduits: usize,
    pub subcatchments: usize,
    pub boundary_overlays: usize,
    /// Conduits left out because an endpoint was missing.
    pub skipped_lines: Vec<String>,
    /// Subcatchments left out because their outline was unusable.
    pub skipped_polygons: Vec<String>,
    pub skipped_boundary_features: usize,
    /// The selection from before the reload is active again.
    pub selection_restored: bool,
}

pub struct SyncOrchestrator<H: ViewerHost, A: NetworkApi> {
    registry: Shared<EntityRegistry<H>>,
    api: A,
    selection: Rc<dyn SelectionStore>,
    notifier: Rc<dyn NotificationSink>,
    reloading: Mutex<()>,
}

impl<H: ViewerHost, A: NetworkApi> SyncOrchestrator<H, A> {
    pub fn new(
        registry: Shared<EntityRegistry<H>>,
        api: A,
        selection: Rc<dyn SelectionStore>,
        notifier: Rc<dyn NotificationSink>,
    ) -> Self {
        Self {
            registry,
            api,
            selection,
            notifier,
            reloading: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Shared<EntityRegistry<H>> {
        &self.registry
    }

    /// Clears the registry and rebuilds it collection by collection:
    /// junctions, outfalls, conduits, subcatchments, boundary.
    ///
    /// A failed fetch stops the reload there; whatever was built so far stays
    /// on screen. The previous selection is restored if its entity came back
    /// and cleared otherwise. Overlapping calls run one after the other.
    pub async fn reload(&self) -> Result<ReloadReport, SyncError> {
        let _running = self.reloading.lock().await;

        let previous = self.selection.current();
        self.registry.borrow_mut().remove_all();

        let mut report = ReloadReport::default();
        let result = self.rebuild(&mut report).await;
        report.selection_restored = self.restore(previous);

        match result {
            Ok(()) => {
                info!(
                    "reloaded {} junctions, {} outfalls, {} conduits, {} subcatchments",
                    report.junctions, report.outfalls, report.conduits, report.subcatchments
                );
                Ok(report)
            }
            Err(err) => {
                warn!("reload aborted: {err}");
                self.notifier.error(&err.to_string());
                Err(err)
            }
        }
    }

    async fn rebuild(&self, report: &mut ReloadReport) -> Result<(), SyncError> {
        let junctions = fetched(Collection::Junctions, self.api.list_junctions().await)?;
        report.junctions =
            self.upsert_points(junctions.iter().map(|r| (&r.name, PointDefinition::from(r))));

        let outfalls = fetched(Collection::Outfalls, self.api.list_outfalls().await)?;
        report.outfalls =
            self.upsert_points(outfalls.iter().map(|r| (&r.name, PointDefinition::from(r))));

        let conduits = fetched(Collection::Conduits, self.api.list_conduits().await)?;
        {
            let mut registry = self.registry.borrow_mut();
            for r in &conduits {
                let id = NetworkEntityId::line(&r.name);
                match registry.upsert(id, LineDefinition::from(r).into()) {
                    Some(_) => report.conduits += 1,
                    None => report.skipped_lines.push(r.name.clone()),
                }
            }
        }
        if !report.skipped_lines.is_empty() {
            self.notifier.error(&format!(
                "{} conduit(s) reference missing nodes: {}",
                report.skipped_lines.len(),
                report.skipped_lines.join(", ")
            ));
        }

        let subcatchments =
            fetched(Collection::Subcatchments, self.api.list_subcatchments().await)?;
        {
            let mut registry = self.registry.borrow_mut();
            for r in &subcatchments {
                let id = NetworkEntityId::polygon(&r.name);
                match registry.upsert(id, PolygonDefinition::from(r).into()) {
                    Some(_) => report.subcatchments += 1,
                    None => report.skipped_polygons.push(r.name.clone()),
                }
            }
        }

        let geojson = fetched(Collection::Boundary, self.api.get_boundary().await)?;
        match Boundary::from_geojson(&geojson) {
            Ok(boundary) => {
                for skipped in &boundary.skipped {
                    self.notifier.error(&format!("boundary: {skipped}"));
                }
                report.skipped_boundary_features = boundary.skipped.len();
                report.boundary_overlays = self.registry.borrow_mut().add_boundary(&boundary);
            }
            Err(err) => self.notifier.error(&format!("boundary: {err}")),
        }
        Ok(())
    }

    fn upsert_points<'a>(
        &self,
        points: impl Iterator<Item = (&'a String, PointDefinition)>,
    ) -> usize {
        let mut registry = self.registry.borrow_mut();
        points
            .filter_map(|(name, point)| {
                registry.upsert(NetworkEntityId::point(name), EntityDefinition::Point(point))
            })
            .count()
    }

    fn restore(&self, previous: Option<Selection>) -> bool {
        let Some(previous) = previous else {
            return false;
        };
        let mut registry = self.registry.borrow_mut();
        if !registry.contains(&previous.id) {
            self.selection.clear();
            return false;
        }
        activate(
            &mut *registry,
            &*self.selection,
            &previous.id,
            previous.coordinate,
        )
    }
}

fn fetched<T>(collection: Collection, result: Result<T, ApiError>) -> Result<T, SyncError> {
    result.map_err(|source| SyncError::Fetch { collection, source })
}

#[cfg(test)]
mod tests {
    use super::SyncOrchestrator;
    use crate::api::{BoxFuture, Collection, NetworkApi};
    use crate::config::NetworkStyles;
    use crate::error::{ApiError, SyncError};
    use crate::id::NetworkEntityId;
    use crate::notify::RecordingSink;
    use crate::records::{
        ConduitRecord, JunctionRecord, OutfallKind, OutfallRecord, SubcatchmentRecord,
    };
    use crate::registry::{EntityRegistry, shared};
    use crate::selection::{Selection, SelectionCell, SelectionStore};
    use foundation::math::cartesian_from_degrees;
    use pretty_assertions::assert_eq;
    use scene::World;
    use scene::components::PropertyBag;
    use scene::host::ViewerHost;
    use serde_json::{Value, json};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeApi {
        junctions: RefCell<Vec<JunctionRecord>>,
        outfalls: Vec<OutfallRecord>,
        conduits: Vec<ConduitRecord>,
        subcatchments: Vec<SubcatchmentRecord>,
        boundary: Value,
        fail: Cell<Option<Collection>>,
        calls: RefCell<Vec<Collection>>,
    }

    impl FakeApi {
        fn respond<T: 'static>(
            &self,
            collection: Collection,
            data: T,
        ) -> BoxFuture<'_, Result<T, ApiError>> {
            Box::pin(async move {
                tokio::task::yield_now().await;
                self.calls.borrow_mut().push(collection);
                if self.fail.get() == Some(collection) {
                    return Err(ApiError::Rejected {
                        code: 500,
                        message: format!("{collection} unavailable"),
                    });
                }
                Ok(data)
            })
        }
    }

    impl NetworkApi for FakeApi {
        fn list_junctions(&self) -> BoxFuture<'_, Result<Vec<JunctionRecord>, ApiError>> {
            self.respond(Collection::Junctions, self.junctions.borrow().clone())
        }

        fn list_outfalls(&self) -> BoxFuture<'_, Result<Vec<OutfallRecord>, ApiError>> {
            self.respond(Collection::Outfalls, self.outfalls.clone())
        }

        fn list_conduits(&self) -> BoxFuture<'_, Result<Vec<ConduitRecord>, ApiError>> {
            self.respond(Collection::Conduits, self.conduits.clone())
        }

        fn list_subcatchments(&self) -> BoxFuture<'_, Result<Vec<SubcatchmentRecord>, ApiError>> {
            self.respond(Collection::Subcatchments, self.subcatchments.clone())
        }

        fn get_boundary(&self) -> BoxFuture<'_, Result<Value, ApiError>> {
            self.respond(Collection::Boundary, self.boundary.clone())
        }
    }

    fn junction(name: &str, lon: f64, lat: f64, elevation: f64) -> JunctionRecord {
        JunctionRecord {
            name: name.into(),
            lon,
            lat,
            elevation,
            depth_max: 2.0,
            depth_init: 0.0,
            depth_surcharge: 0.0,
            area_ponded: 0.0,
        }
    }

    fn conduit(name: &str, from: &str, to: &str) -> ConduitRecord {
        serde_json::from_value(json!({ "name": name, "from_node": from, "to_node": to })).unwrap()
    }

    fn example_api() -> FakeApi {
        FakeApi {
            junctions: RefCell::new(vec![junction("J1", 103.0, 29.0, 10.0)]),
            outfalls: vec![OutfallRecord {
                name: "O1".into(),
                lon: 103.01,
                lat: 29.0,
                elevation: 5.0,
                kind: OutfallKind::Free,
                data: None,
            }],
            conduits: vec![conduit("C1", "J1", "O1")],
            boundary: json!({ "type": "FeatureCollection", "features": [] }),
            ..FakeApi::default()
        }
    }

    struct Fixture {
        sync: SyncOrchestrator<World, Rc<FakeApi>>,
        api: Rc<FakeApi>,
        selection: Rc<SelectionCell>,
        sink: Rc<RecordingSink>,
    }

    fn fixture(api: Rc<FakeApi>) -> Fixture {
        let registry = shared(EntityRegistry::new(World::new(), NetworkStyles::default()));
        let selection = Rc::new(SelectionCell::new());
        let sink = Rc::new(RecordingSink::new());
        let sync = SyncOrchestrator::new(registry, api.clone(), selection.clone(), sink.clone());
        Fixture {
            sync,
            api,
            selection,
            sink,
        }
    }

    fn host_state(sync: &SyncOrchestrator<World, Rc<FakeApi>>) -> Vec<(String, PropertyBag)> {
        let registry = sync.registry().borrow();
        let host = registry.host();
        let mut keys = host.keys();
        keys.sort();
        keys.into_iter()
            .map(|k| {
                let props = host.entity(&k).unwrap().properties.clone();
                (k, props)
            })
            .collect()
    }

    #[tokio::test]
    async fn example_network_reloads() {
        let f = fixture(Rc::new(example_api()));
        let report = f.sync.reload().await.unwrap();
        assert_eq!((report.junctions, report.outfalls, report.conduits), (1, 1, 1));

        let mut registry = f.sync.registry().borrow_mut();
        assert_eq!(registry.len(), 3);
        let c1 = NetworkEntityId::line("C1");
        let [a, b] = registry.line_endpoints(&c1).unwrap();
        assert!(a.distance(cartesian_from_degrees(103.0, 29.0, 10.0)) < 1e-6);
        assert!(b.distance(cartesian_from_degrees(103.01, 29.0, 5.0)) < 1e-6);

        registry.remove(&NetworkEntityId::point("J1"));
        assert_eq!(registry.line_endpoints(&c1), None);
    }

    #[tokio::test]
    async fn collections_are_fetched_in_dependency_order() {
        let f = fixture(Rc::new(example_api()));
        f.sync.reload().await.unwrap();
        assert_eq!(*f.api.calls.borrow(), Collection::ORDER.to_vec());
    }

    #[tokio::test]
    async fn reload_on_populated_registry_matches_fresh_reload() {
        let f = fixture(Rc::new(example_api()));
        f.sync.reload().await.unwrap();
        let once = host_state(&f.sync);
        f.sync.reload().await.unwrap();
        assert_eq!(host_state(&f.sync), once);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_remaining_steps() {
        let f = fixture(Rc::new(example_api()));
        f.api.fail.set(Some(Collection::Conduits));

        let err = f.sync.reload().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Fetch {
                collection: Collection::Conduits,
                ..
            }
        ));
        assert_eq!(f.sink.errors().len(), 1);
        assert_eq!(f.api.calls.borrow().len(), 3);

        let registry = f.sync.registry().borrow();
        assert_eq!(registry.len(), 2);
        assert!(registry.host().resolve_frame().lines.is_empty());
    }

    #[tokio::test]
    async fn overlapping_reloads_run_in_sequence() {
        let f = fixture(Rc::new(example_api()));
        let (a, b) = tokio::join!(f.sync.reload(), f.sync.reload());
        a.unwrap();
        b.unwrap();

        let expected: Vec<Collection> = Collection::ORDER
            .iter()
            .chain(Collection::ORDER.iter())
            .copied()
            .collect();
        assert_eq!(*f.api.calls.borrow(), expected);
        assert_eq!(f.sync.registry().borrow().len(), 3);
    }

    #[tokio::test]
    async fn conduit_with_missing_node_is_skipped_and_reported() {
        let mut api = example_api();
        api.conduits.push(conduit("C2", "J1", "J9"));
        let f = fixture(Rc::new(api));

        let report = f.sync.reload().await.unwrap();
        assert_eq!(report.conduits, 1);
        assert_eq!(report.skipped_lines, vec!["C2".to_string()]);
        assert_eq!(f.sink.errors().len(), 1);
    }

    #[tokio::test]
    async fn selection_survives_reload_when_entity_returns() {
        let f = fixture(Rc::new(example_api()));
        f.sync.reload().await.unwrap();
        let j1 = NetworkEntityId::point("J1");
        f.selection.publish(Selection {
            id: j1.clone(),
            properties: PropertyBag::new(),
            coordinate: None,
        });

        f.api.junctions.borrow_mut()[0].elevation = 12.0;
        let report = f.sync.reload().await.unwrap();
        assert!(report.selection_restored);

        let current = f.selection.current().unwrap();
        assert_eq!(current.id, j1);
        assert_eq!(current.properties.number("elevation"), Some(12.0));
        let registry = f.sync.registry().borrow();
        assert_eq!(
            registry.style_of(&j1),
            Some(NetworkStyles::default().point_highlight)
        );
    }

    #[tokio::test]
    async fn selection_is_cleared_when_entity_disappears() {
        let f = fixture(Rc::new(example_api()));
        f.sync.reload().await.unwrap();
        f.selection.publish(Selection {
            id: NetworkEntityId::point("J1"),
            properties: PropertyBag::new(),
            coordinate: None,
        });

        f.api.junctions.borrow_mut().clear();
        let report = f.sync.reload().await.unwrap();
        assert!(!report.selection_restored);
        assert!(f.selection.current().is_none());
    }

    #[tokio::test]
    async fn malformed_boundary_is_reported_not_fatal() {
        let mut api = example_api();
        api.boundary = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "LineString", "coordinates": [[103.0, 29.0], [103.1, 29.1]] } },
                { "type": "Feature", "properties": {} }
            ]
        });
        let f = fixture(Rc::new(api));

        let report = f.sync.reload().await.unwrap();
        assert_eq!(report.boundary_overlays, 1);
        assert_eq!(report.skipped_boundary_features, 1);
        assert_eq!(f.sink.errors().len(), 1);
    }
}
