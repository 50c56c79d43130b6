//! Row-oriented view of the relational store.
//!
//! The core needs four things from a backend: bulk read per collection,
//! single-row insert/update/delete, and a feed of "collection X changed"
//! notifications. Rows travel as raw JSON objects in the backend's own
//! (snake_case) shape; the mapper turns them into domain types.

pub mod memory;

use crate::error::BackendError;
use async_trait::async_trait;
use chrono::Utc;
use pulse_events::{ChangeSubscription, Collection};
use serde_json::{Map, Value};
use ulid::Ulid;

pub use memory::MemoryBackend;

pub type Row = Value;

#[async_trait]
pub trait Backend: Send + Sync {
    async fn select_all(&self, collection: Collection) -> Result<Vec<Row>, BackendError>;

    /// Inserts `row`, minting `id`/`created_at` when absent. Returns the stored row.
    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, BackendError>;

    /// Shallow-merges `patch` into the stored row. Returns the stored row.
    async fn update(&self, collection: Collection, id: &str, patch: Row)
    -> Result<Row, BackendError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError>;

    /// Change feed restricted to `collections` (empty = all).
    fn changes(&self, collections: &[Collection]) -> ChangeSubscription;
}

/// Normalizes a row for insertion and returns its id.
pub fn prepare_insert(collection: Collection, row: Row) -> Result<(String, Row), BackendError> {
    let Value::Object(mut fields) = row else {
        return Err(BackendError::Rejected {
            message: format!("{collection} row must be an object"),
        });
    };
    let id = match fields.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("{}{}", collection.id_prefix(), Ulid::new()),
    };
    fields.insert("id".to_string(), Value::String(id.clone()));
    if !fields.get("created_at").is_some_and(Value::is_string) {
        fields.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }
    Ok((id, Value::Object(fields)))
}

/// Applies `patch` over `existing`. `id` and `created_at` are immutable.
pub fn merge_patch(existing: &Row, patch: Row) -> Result<Row, BackendError> {
    let Value::Object(patch) = patch else {
        return Err(BackendError::Rejected {
            message: "patch must be an object".to_string(),
        });
    };
    let mut merged = existing.as_object().cloned().unwrap_or_else(Map::new);
    for (key, value) in patch {
        if key == "id" || key == "created_at" {
            continue;
        }
        merged.insert(key, value);
    }
    merged.insert(
        "updated_at".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    Ok(Value::Object(merged))
}

pub fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}
