//! Owner of the canonical snapshot.
//!
//! Loads are single-flight: one load runs at a time, and any number of
//! refresh requests that arrive while it runs collapse into exactly one
//! follow-up load. The load loop runs on its own task so that a caller
//! giving up on its wait never strands the flight.

use crate::backend::{Backend, MemoryBackend};
use crate::error::BackendError;
use crate::fixtures::FixtureDataset;
use crate::snapshot::{FallbackReason, RawCollections, Snapshot, SnapshotSource};
use pulse_events::{ChangeSignal, Collection};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct FlightState {
    running: bool,
    pending: bool,
    /// Generation of the most recently started load.
    started: u64,
}

pub struct SyncController {
    remote: Option<Arc<dyn Backend>>,
    local: Arc<MemoryBackend>,
    fixtures: &'static FixtureDataset,
    flight: Mutex<FlightState>,
    snapshot: watch::Sender<Arc<Snapshot>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SyncController {
    /// `remote = None` runs in fixture mode: reads and writes go to an
    /// in-memory backend seeded from the bundled dataset.
    pub fn new(remote: Option<Arc<dyn Backend>>) -> Arc<Self> {
        let fixtures = FixtureDataset::bundled();
        Self::with_parts(remote, Arc::new(MemoryBackend::seeded(fixtures)), fixtures)
    }

    pub fn with_parts(
        remote: Option<Arc<dyn Backend>>,
        local: Arc<MemoryBackend>,
        fixtures: &'static FixtureDataset,
    ) -> Arc<Self> {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::empty()));
        Arc::new(Self {
            remote,
            local,
            fixtures,
            flight: Mutex::new(FlightState::default()),
            snapshot,
            listener: Mutex::new(None),
        })
    }

    /// Backend that mutations write through.
    pub fn write_target(&self) -> Arc<dyn Backend> {
        match &self.remote {
            Some(remote) => Arc::clone(remote),
            None => Arc::clone(&self.local) as Arc<dyn Backend>,
        }
    }

    /// Most recently committed snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    /// Loads once and starts reacting to change notifications. Calling it
    /// again replaces the listener.
    pub async fn initialize(self: &Arc<Self>) -> Arc<Snapshot> {
        // Subscribe before the first load so no change slips between them.
        let mut changes = self.write_target().changes(&Collection::ALL);
        let snapshot = self.refresh().await;

        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            while let Some(signal) = changes.next().await {
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                match &signal {
                    ChangeSignal::Changed(note) => {
                        debug!(collection = %note.collection, kind = ?note.kind, "remote change");
                    }
                    ChangeSignal::Lagged(skipped) => {
                        debug!(skipped, "change feed lagged");
                    }
                }
                controller.request_refresh().await;
            }
            debug!("change feed closed");
        });
        if let Some(previous) = self.listener.lock().await.replace(handle) {
            previous.abort();
        }
        snapshot
    }

    /// Loads (or joins a pending load) and returns a snapshot at least as new
    /// as the load this call caused.
    pub async fn refresh(self: &Arc<Self>) -> Arc<Snapshot> {
        let target = self.schedule().await;
        let mut receiver = self.snapshot.subscribe();
        match receiver.wait_for(|snapshot| snapshot.generation >= target).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Schedules a load without waiting for it.
    pub async fn request_refresh(self: &Arc<Self>) {
        self.schedule().await;
    }

    pub async fn shutdown(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
        }
    }

    /// Returns the generation whose commit satisfies the request.
    async fn schedule(self: &Arc<Self>) -> u64 {
        let mut flight = self.flight.lock().await;
        if flight.running {
            flight.pending = true;
            return flight.started + 1;
        }
        flight.running = true;
        flight.started += 1;
        let target = flight.started;
        drop(flight);

        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.drain().await });
        target
    }

    async fn drain(self: Arc<Self>) {
        let mut generation = self.flight.lock().await.started;
        loop {
            let snapshot = self.load(generation).await;
            info!(
                generation,
                source = ?snapshot.source,
                events = snapshot.events.len(),
                sponsors = snapshot.sponsors.len(),
                "snapshot committed"
            );
            self.snapshot.send_replace(Arc::new(snapshot));

            let mut flight = self.flight.lock().await;
            if !flight.pending {
                flight.running = false;
                return;
            }
            flight.pending = false;
            flight.started += 1;
            generation = flight.started;
        }
    }

    async fn load(&self, generation: u64) -> Snapshot {
        let Some(remote) = &self.remote else {
            return match read_all(self.local.as_ref()).await {
                Ok(raw) => Snapshot::from_raw(
                    &raw,
                    SnapshotSource::Fixture(FallbackReason::Unconfigured),
                    generation,
                ),
                Err(err) => {
                    warn!(error = %err, "local store read failed, serving bundled fixtures");
                    self.fixtures.snapshot(FallbackReason::Unconfigured, generation)
                }
            };
        };
        match read_all(remote.as_ref()).await {
            Ok(raw) => Snapshot::from_raw(&raw, SnapshotSource::Remote, generation),
            Err(err) => {
                warn!(error = %err, "snapshot load failed, serving bundled fixtures");
                self.fixtures.snapshot(
                    FallbackReason::RemoteFailure {
                        message: err.to_string(),
                    },
                    generation,
                )
            }
        }
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}

/// Reads every collection concurrently. Any failure fails the whole read.
async fn read_all(backend: &dyn Backend) -> Result<RawCollections, BackendError> {
    let (events, event_sponsors, sponsors, my_events, market_gaps, activities, tasks, profiles) =
        futures::try_join!(
            backend.select_all(Collection::Events),
            backend.select_all(Collection::EventSponsors),
            backend.select_all(Collection::Sponsors),
            backend.select_all(Collection::MyEvents),
            backend.select_all(Collection::MarketGaps),
            backend.select_all(Collection::Activities),
            backend.select_all(Collection::Tasks),
            backend.select_all(Collection::Profiles),
        )?;
    Ok(RawCollections {
        events,
        event_sponsors,
        sponsors,
        my_events,
        market_gaps,
        activities,
        tasks,
        profiles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Row;
    use async_trait::async_trait;
    use pulse_events::ChangeSubscription;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Delegates to a memory backend, counting event-collection reads and
    /// optionally holding each one until a permit is released.
    struct ScriptedBackend {
        inner: MemoryBackend,
        loads: AtomicUsize,
        gate: Option<Semaphore>,
        failing: Option<Collection>,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                inner: MemoryBackend::seeded(FixtureDataset::bundled()),
                loads: AtomicUsize::new(0),
                gate: None,
                failing: None,
            }
        }

        fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::new()
            }
        }

        fn failing_on(collection: Collection) -> Self {
            Self {
                failing: Some(collection),
                ..Self::new()
            }
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn select_all(&self, collection: Collection) -> Result<Vec<Row>, BackendError> {
            if collection == Collection::Events {
                self.loads.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = &self.gate {
                    gate.acquire().await.unwrap().forget();
                }
            }
            if self.failing == Some(collection) {
                return Err(BackendError::unavailable("connection reset"));
            }
            self.inner.select_all(collection).await
        }

        async fn insert(&self, collection: Collection, row: Row) -> Result<Row, BackendError> {
            self.inner.insert(collection, row).await
        }

        async fn update(
            &self,
            collection: Collection,
            id: &str,
            patch: Row,
        ) -> Result<Row, BackendError> {
            self.inner.update(collection, id, patch).await
        }

        async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError> {
            self.inner.delete(collection, id).await
        }

        fn changes(&self, collections: &[Collection]) -> ChangeSubscription {
            self.inner.changes(collections)
        }
    }

    fn controller(backend: &Arc<ScriptedBackend>) -> Arc<SyncController> {
        SyncController::new(Some(Arc::clone(backend) as Arc<dyn Backend>))
    }

    async fn wait_for_loads(backend: &ScriptedBackend, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while backend.loads() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn unconfigured_backend_serves_fixtures() {
        let controller = SyncController::new(None);
        let snapshot = controller.refresh().await;
        assert!(snapshot.is_degraded());
        assert_eq!(
            snapshot.source,
            SnapshotSource::Fixture(FallbackReason::Unconfigured)
        );
        assert_eq!(
            snapshot.events.len(),
            FixtureDataset::bundled().rows(Collection::Events).len()
        );
        assert_eq!(snapshot.generation, 1);
    }

    #[tokio::test]
    async fn remote_load_is_not_degraded() {
        let backend = Arc::new(ScriptedBackend::new());
        let snapshot = controller(&backend).refresh().await;
        assert_eq!(snapshot.source, SnapshotSource::Remote);
        assert!(!snapshot.is_degraded());
    }

    #[tokio::test]
    async fn partial_failure_falls_back_to_full_fixture_snapshot() {
        let backend = Arc::new(ScriptedBackend::failing_on(Collection::Sponsors));
        backend
            .insert(Collection::Events, json!({"id": "evt_remote_only", "name": "Remote"}))
            .await
            .unwrap();
        let snapshot = controller(&backend).refresh().await;
        assert!(matches!(
            snapshot.source,
            SnapshotSource::Fixture(FallbackReason::RemoteFailure { .. })
        ));
        assert!(snapshot.event(&"evt_remote_only".into()).is_none());
        assert!(!snapshot.sponsors.is_empty());
    }

    #[tokio::test]
    async fn concurrent_refreshes_collapse_into_one_follow_up() {
        let backend = Arc::new(ScriptedBackend::gated());
        let controller = controller(&backend);

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.refresh().await }
        });
        wait_for_loads(&backend, 1).await;

        let second = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.refresh().await }
        });
        let third = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.refresh().await }
        });
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        backend.gate.as_ref().unwrap().add_permits(10);

        assert_eq!(first.await.unwrap().generation, 1);
        assert_eq!(second.await.unwrap().generation, 2);
        assert_eq!(third.await.unwrap().generation, 2);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.loads(), 2);
        assert_eq!(controller.snapshot().generation, 2);
    }

    #[tokio::test]
    async fn sequential_refreshes_each_load() {
        let backend = Arc::new(ScriptedBackend::new());
        let controller = controller(&backend);
        controller.refresh().await;
        controller.refresh().await;
        assert_eq!(backend.loads(), 2);
        assert_eq!(controller.snapshot().generation, 2);
    }

    #[tokio::test]
    async fn change_notification_triggers_full_refresh() {
        let backend = Arc::new(ScriptedBackend::new());
        let controller = controller(&backend);
        let initial = controller.initialize().await;
        assert!(initial.event(&"evt_pushed".into()).is_none());

        let mut updates = controller.watch();
        backend
            .insert(Collection::Events, json!({"id": "evt_pushed", "name": "Pushed"}))
            .await
            .unwrap();

        let refreshed = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|snapshot| snapshot.event(&"evt_pushed".into()).is_some()),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert!(refreshed.generation > initial.generation);
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn offline_writes_are_visible_after_refresh() {
        let controller = SyncController::new(None);
        controller.refresh().await;
        controller
            .write_target()
            .insert(Collection::Tasks, json!({"id": "tsk_offline", "title": "Offline"}))
            .await
            .unwrap();
        let snapshot = controller.refresh().await;
        assert!(snapshot.task(&"tsk_offline".into()).is_some());
        assert!(snapshot.is_degraded());
    }
}
