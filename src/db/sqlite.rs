//! SQLite storage for schedule documents

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Collection, DocumentStore, Subscribers, Subscription, merge_fields};
use crate::error::StoreError;

/// Document store backed by one SQLite table
pub struct Database {
    conn: Connection,
    subscribers: Subscribers,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let db = Self {
            conn,
            subscribers: Subscribers::default(),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (collection, key)
            )",
            [],
        )?;
        Ok(())
    }

    fn read_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let read_err = |e: rusqlite::Error| StoreError::Read {
            collection: collection.name(),
            reason: e.to_string(),
        };

        let mut stmt = self
            .conn
            .prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY key")
            .map_err(read_err)?;

        let bodies = stmt
            .query_map(params![collection.name()], |row| row.get::<_, String>(0))
            .map_err(read_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StoreError::from))
            .collect()
    }

    fn write(&self, collection: Collection, key: &str, value: &Value) -> Result<(), StoreError> {
        let body = serde_json::to_string(value)?;
        self.conn
            .execute(
                "INSERT INTO documents (collection, key, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT(collection, key)
                 DO UPDATE SET body = excluded.body, updated_at = CURRENT_TIMESTAMP",
                params![collection.name(), key, body],
            )
            .map_err(|e| StoreError::Write {
                collection: collection.name(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Push a fresh snapshot to live subscriptions of `collection`. Runs
    /// after the write has landed, so a failed re-read only skips the push.
    fn notify(&self, collection: Collection) {
        if !self.subscribers.watches(collection) {
            return;
        }
        match self.read_all(collection) {
            Ok(records) => self.subscribers.publish(collection, &records),
            Err(e) => warn!(collection = collection.name(), "Snapshot refresh failed: {}", e),
        }
    }
}

impl DocumentStore for Database {
    fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        self.read_all(collection)
    }

    fn subscribe(&self, collection: Collection, order_key: &str) -> Result<Subscription, StoreError> {
        let records = self.read_all(collection)?;
        Ok(self.subscribers.add(collection, order_key, records))
    }

    fn get_one(&self, collection: Collection, key: &str) -> Result<Option<Value>, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND key = ?2",
                params![collection.name(), key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Read {
                collection: collection.name(),
                reason: e.to_string(),
            })?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn set_record(&self, collection: Collection, key: &str, value: &Value) -> Result<(), StoreError> {
        debug!(collection = collection.name(), key, "set record");
        self.write(collection, key, value)?;
        self.notify(collection);
        Ok(())
    }

    fn update_fields(&self, collection: Collection, key: &str, partial: &Value) -> Result<(), StoreError> {
        let mut current = self
            .get_one(collection, key)?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.name(),
                key: key.to_string(),
            })?;
        merge_fields(&mut current, partial);

        debug!(collection = collection.name(), key, "update fields");
        self.write(collection, key, &current)?;
        self.notify(collection);
        Ok(())
    }

    fn batch_set(&self, collection: Collection, records: &[(String, Value)]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in records {
            self.write(collection, key, value)?;
        }
        tx.commit()?;

        debug!(collection = collection.name(), count = records.len(), "batch set");
        self.notify(collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_one(Collection::Exercises, "Squat").unwrap().is_none());

        db.set_record(Collection::Exercises, "Squat", &json!({"name": "Squat"}))
            .unwrap();
        assert_eq!(
            db.get_one(Collection::Exercises, "Squat").unwrap(),
            Some(json!({"name": "Squat"}))
        );

        // full replace
        db.set_record(Collection::Exercises, "Squat", &json!({"name": "Squat", "x": 1}))
            .unwrap();
        assert_eq!(db.get_all(Collection::Exercises).unwrap().len(), 1);
    }

    #[test]
    fn test_collections_are_separate() {
        let db = Database::open_in_memory().unwrap();
        db.set_record(Collection::Exercises, "k", &json!({"a": 1})).unwrap();
        assert!(db.get_all(Collection::WorkoutDays).unwrap().is_empty());
    }

    #[test]
    fn test_update_fields_merges() {
        let db = Database::open_in_memory().unwrap();
        db.set_record(Collection::WorkoutDays, "Domingo", &json!({"name": "Domingo", "order": 0}))
            .unwrap();
        db.update_fields(Collection::WorkoutDays, "Domingo", &json!({"exercises": []}))
            .unwrap();

        let doc = db.get_one(Collection::WorkoutDays, "Domingo").unwrap().unwrap();
        assert_eq!(doc, json!({"name": "Domingo", "order": 0, "exercises": []}));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .update_fields(Collection::WorkoutDays, "Domingo", &json!({"exercises": []}))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_batch_and_subscribe() {
        let db = Database::open_in_memory().unwrap();
        let mut sub = db.subscribe(Collection::WorkoutDays, "order").unwrap();
        assert!(sub.snapshot().is_empty());

        db.batch_set(
            Collection::WorkoutDays,
            &[
                ("b".to_string(), json!({"order": 1})),
                ("a".to_string(), json!({"order": 0})),
            ],
        )
        .unwrap();

        let snapshot = sub.take_if_changed().unwrap();
        assert_eq!(snapshot, vec![json!({"order": 0}), json!({"order": 1})]);
    }

    #[test]
    fn test_write_succeeds_when_snapshot_refresh_fails() {
        let db = Database::open_in_memory().unwrap();
        let mut sub = db.subscribe(Collection::Exercises, "name").unwrap();
        db.conn
            .execute(
                "INSERT INTO documents (collection, key, body) VALUES ('exercises', 'Bad', 'not json')",
                [],
            )
            .unwrap();

        db.set_record(Collection::Exercises, "Plank", &json!({"name": "Plank"}))
            .unwrap();
        db.update_fields(Collection::Exercises, "Plank", &json!({"sets": 3}))
            .unwrap();
        db.batch_set(Collection::Exercises, &[("Squat".to_string(), json!({"name": "Squat"}))])
            .unwrap();

        assert_eq!(
            db.get_one(Collection::Exercises, "Plank").unwrap(),
            Some(json!({"name": "Plank", "sets": 3}))
        );
        assert!(db.get_one(Collection::Exercises, "Squat").unwrap().is_some());
        assert!(sub.take_if_changed().is_none());
    }

    #[test]
    fn test_reopen_keeps_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treino.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::open(path).unwrap();
            db.set_record(Collection::Exercises, "Plank", &json!({"name": "Plank"}))
                .unwrap();
        }

        let db = Database::open(path).unwrap();
        assert_eq!(db.get_all(Collection::Exercises).unwrap(), vec![json!({"name": "Plank"})]);
    }
}
