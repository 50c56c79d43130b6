use crate::util::{decode_json, encode_json, is_unique_violation, to_rfc3339, DbError};
use chrono::Utc;
use pulse_events::Collection;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

/// Row access for one collection table. Table names come from
/// [`Collection::as_str`], never from input.
pub struct CollectionRepo<'a> {
    pub conn: &'a Connection,
    pub collection: Collection,
}

impl<'a> CollectionRepo<'a> {
    pub fn new(conn: &'a Connection, collection: Collection) -> Self {
        Self { conn, collection }
    }

    /// All rows in insertion order.
    pub fn select_all(&self) -> Result<Vec<Value>, DbError> {
        let sql = format!("SELECT row_json FROM {} ORDER BY seq ASC", self.collection);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            let json: String = row.get(0)?;
            values.push(decode_json(&json)?);
        }
        Ok(values)
    }

    pub fn get(&self, id: &str) -> Result<Option<Value>, DbError> {
        let sql = format!("SELECT row_json FROM {} WHERE id = ?1", self.collection);
        let json: Option<String> = self
            .conn
            .query_row(&sql, [id], |row| row.get(0))
            .optional()?;
        json.map(|json| decode_json(&json)).transpose()
    }

    pub fn insert(&self, id: &str, row: &Value) -> Result<(), DbError> {
        let sql = format!(
            "INSERT INTO {} (id, row_json, created_at) VALUES (?1, ?2, ?3)",
            self.collection
        );
        let params = (id, encode_json(row)?, to_rfc3339(&Utc::now()));
        self.conn.execute(&sql, params).map_err(|err| {
            if is_unique_violation(&err) {
                DbError::Duplicate { id: id.to_string() }
            } else {
                DbError::from(err)
            }
        })?;
        Ok(())
    }

    /// Returns false when no row has `id`.
    pub fn replace(&self, id: &str, row: &Value) -> Result<bool, DbError> {
        let sql = format!(
            "UPDATE {} SET row_json = ?2, updated_at = ?3 WHERE id = ?1",
            self.collection
        );
        let params = (id, encode_json(row)?, to_rfc3339(&Utc::now()));
        Ok(self.conn.execute(&sql, params)? > 0)
    }

    /// Returns false when no row has `id`.
    pub fn delete(&self, id: &str) -> Result<bool, DbError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.collection);
        Ok(self.conn.execute(&sql, [id])? > 0)
    }

    pub fn count(&self) -> Result<usize, DbError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.collection);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::with_test_db;
    use serde_json::json;

    #[test]
    fn rows_round_trip_in_insertion_order() {
        let conn = with_test_db().unwrap();
        let repo = CollectionRepo::new(&conn, Collection::Tasks);
        repo.insert("tsk_b", &json!({"id": "tsk_b", "title": "second"}))
            .unwrap();
        repo.insert("tsk_a", &json!({"id": "tsk_a", "title": "first"}))
            .unwrap();
        let rows = repo.select_all().unwrap();
        assert_eq!(rows[0]["id"], "tsk_b");
        assert_eq!(rows[1]["id"], "tsk_a");
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn duplicate_id_is_reported() {
        let conn = with_test_db().unwrap();
        let repo = CollectionRepo::new(&conn, Collection::Sponsors);
        repo.insert("spn_x", &json!({"id": "spn_x"})).unwrap();
        let err = repo.insert("spn_x", &json!({"id": "spn_x"})).unwrap_err();
        assert!(matches!(err, DbError::Duplicate { .. }));
    }

    #[test]
    fn replace_and_delete_report_missing_rows() {
        let conn = with_test_db().unwrap();
        let repo = CollectionRepo::new(&conn, Collection::Events);
        assert!(!repo.replace("evt_missing", &json!({})).unwrap());
        assert!(!repo.delete("evt_missing").unwrap());

        repo.insert("evt_x", &json!({"id": "evt_x", "name": "A"})).unwrap();
        assert!(repo.replace("evt_x", &json!({"id": "evt_x", "name": "B"})).unwrap());
        assert_eq!(repo.get("evt_x").unwrap().unwrap()["name"], "B");
        assert!(repo.delete("evt_x").unwrap());
        assert!(repo.get("evt_x").unwrap().is_none());
    }
}
