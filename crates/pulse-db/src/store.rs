use crate::collection_repo::CollectionRepo;
use crate::schema;
use crate::util::{to_rfc3339, DbError};
use async_trait::async_trait;
use chrono::Utc;
use pulse_core::backend::{merge_patch, prepare_insert, row_id, Backend, Row};
use pulse_core::error::BackendError;
use pulse_core::fixtures::FixtureDataset;
use pulse_events::{ChangeBus, ChangeKind, ChangeNotification, ChangeSubscription, Collection};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// SQLite-backed relational store. Every committed write publishes a change
/// notification for its collection.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    bus: ChangeBus,
}

impl SqliteBackend {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            bus: ChangeBus::default(),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref();
        let conn = schema::open_and_migrate(path).map_err(DbError::from)?;
        info!(path = %path.display(), "sqlite backend opened");
        Ok(Self::new(conn))
    }

    pub fn in_memory() -> Result<Self, BackendError> {
        let conn = schema::with_test_db().map_err(DbError::from)?;
        Ok(Self::new(conn))
    }

    /// Loads every fixture collection that is still empty. A dataset
    /// version is applied at most once. Returns the number of rows written.
    pub async fn seed(&self, dataset: &FixtureDataset) -> Result<usize, BackendError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(DbError::from)?;
        let seeded: Option<String> = tx
            .query_row(
                "SELECT version FROM seed_history WHERE version = ?1",
                [dataset.version.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)?;
        if seeded.is_some() {
            debug!(version = %dataset.version, "fixture dataset already seeded");
            return Ok(0);
        }

        let mut written = 0;
        let mut touched = Vec::new();
        for collection in Collection::ALL {
            let repo = CollectionRepo::new(&tx, collection);
            if repo.count()? > 0 {
                continue;
            }
            for row in dataset.rows(collection) {
                let (id, row) = prepare_insert(collection, row.clone())?;
                repo.insert(&id, &row)?;
                written += 1;
            }
            touched.push(collection);
        }
        tx.execute(
            "INSERT INTO seed_history (version, seeded_at, rows) VALUES (?1, ?2, ?3)",
            (
                dataset.version.as_str(),
                to_rfc3339(&Utc::now()),
                i64::try_from(written).unwrap_or(i64::MAX),
            ),
        )
        .map_err(DbError::from)?;
        tx.commit().map_err(DbError::from)?;
        drop(conn);

        info!(version = %dataset.version, rows = written, "fixture dataset seeded");
        for collection in touched {
            self.notify(collection, ChangeKind::Insert, None);
        }
        Ok(written)
    }

    fn notify(&self, collection: Collection, kind: ChangeKind, id: Option<&str>) {
        self.bus
            .publish(ChangeNotification::new(collection, kind, id.map(str::to_string)));
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn select_all(&self, collection: Collection) -> Result<Vec<Row>, BackendError> {
        let conn = self.conn.lock().await;
        Ok(CollectionRepo::new(&conn, collection).select_all()?)
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, BackendError> {
        let (id, row) = prepare_insert(collection, row)?;
        {
            let conn = self.conn.lock().await;
            CollectionRepo::new(&conn, collection).insert(&id, &row)?;
        }
        debug!(collection = %collection, id = %id, "row inserted");
        self.notify(collection, ChangeKind::Insert, Some(&id));
        Ok(row)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Row,
    ) -> Result<Row, BackendError> {
        let merged = {
            let conn = self.conn.lock().await;
            let repo = CollectionRepo::new(&conn, collection);
            let existing = repo.get(id)?.ok_or_else(|| BackendError::NotFound {
                collection,
                id: id.to_string(),
            })?;
            let merged = merge_patch(&existing, patch)?;
            repo.replace(id, &merged)?;
            merged
        };
        debug!(collection = %collection, id, "row updated");
        self.notify(collection, ChangeKind::Update, row_id(&merged));
        Ok(merged)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError> {
        let removed = {
            let conn = self.conn.lock().await;
            CollectionRepo::new(&conn, collection).delete(id)?
        };
        if !removed {
            return Err(BackendError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        debug!(collection = %collection, id, "row deleted");
        self.notify(collection, ChangeKind::Delete, Some(id));
        Ok(())
    }

    fn changes(&self, collections: &[Collection]) -> ChangeSubscription {
        self.bus.subscribe_to(collections)
    }
}
