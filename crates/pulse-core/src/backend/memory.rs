use crate::backend::{merge_patch, prepare_insert, row_id, Backend, Row};
use crate::error::BackendError;
use crate::fixtures::FixtureDataset;
use async_trait::async_trait;
use pulse_events::{ChangeBus, ChangeKind, ChangeNotification, ChangeSubscription, Collection};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Process-local backend. Serves as the write target in offline mode, seeded
/// from the fixture dataset.
pub struct MemoryBackend {
    rows: RwLock<BTreeMap<Collection, Vec<Row>>>,
    bus: ChangeBus,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            bus: ChangeBus::default(),
        }
    }

    pub fn seeded(dataset: &FixtureDataset) -> Self {
        let rows = Collection::ALL
            .into_iter()
            .map(|collection| (collection, dataset.rows(collection).to_vec()))
            .collect();
        Self {
            rows: RwLock::new(rows),
            bus: ChangeBus::default(),
        }
    }

    fn notify(&self, collection: Collection, kind: ChangeKind, id: &str) {
        self.bus
            .publish(ChangeNotification::new(collection, kind, Some(id.to_string())));
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select_all(&self, collection: Collection) -> Result<Vec<Row>, BackendError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&collection).cloned().unwrap_or_default())
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, BackendError> {
        let (id, row) = prepare_insert(collection, row)?;
        {
            let mut rows = self.rows.write().await;
            let table = rows.entry(collection).or_default();
            if table.iter().any(|existing| row_id(existing) == Some(id.as_str())) {
                return Err(BackendError::Rejected {
                    message: format!("duplicate {collection} id: {id}"),
                });
            }
            table.push(row.clone());
        }
        self.notify(collection, ChangeKind::Insert, &id);
        Ok(row)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Row,
    ) -> Result<Row, BackendError> {
        let merged = {
            let mut rows = self.rows.write().await;
            let slot = rows
                .get_mut(&collection)
                .and_then(|table| table.iter_mut().find(|row| row_id(row) == Some(id)))
                .ok_or_else(|| BackendError::NotFound {
                    collection,
                    id: id.to_string(),
                })?;
            let merged = merge_patch(slot, patch)?;
            *slot = merged.clone();
            merged
        };
        self.notify(collection, ChangeKind::Update, id);
        Ok(merged)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError> {
        {
            let mut rows = self.rows.write().await;
            let table = rows.entry(collection).or_default();
            let before = table.len();
            table.retain(|row| row_id(row) != Some(id));
            if table.len() == before {
                return Err(BackendError::NotFound {
                    collection,
                    id: id.to_string(),
                });
            }
        }
        self.notify(collection, ChangeKind::Delete, id);
        Ok(())
    }

    fn changes(&self, collections: &[Collection]) -> ChangeSubscription {
        self.bus.subscribe_to(collections)
    }
}
