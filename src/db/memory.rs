//! In-memory document store with fault injection

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use super::{Collection, DocumentStore, Subscribers, Subscription, merge_fields};
use crate::error::StoreError;

/// Volatile store used by tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<(Collection, String), Value>>,
    failing_keys: Mutex<HashSet<(Collection, String)>>,
    fail_reads: Mutex<bool>,
    writes: AtomicUsize,
    subscribers: Subscribers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `collection/key` fail until cleared
    pub fn fail_writes_to(&self, collection: Collection, key: &str) {
        lock(&self.failing_keys).insert((collection, key.to_string()));
    }

    pub fn clear_failures(&self) {
        lock(&self.failing_keys).clear();
        *lock(&self.fail_reads) = false;
    }

    /// Make every read fail until cleared
    pub fn fail_reads(&self) {
        *lock(&self.fail_reads) = true;
    }

    /// Successful writes so far (batch entries count one each)
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_read(&self, collection: Collection) -> Result<(), StoreError> {
        if *lock(&self.fail_reads) {
            return Err(StoreError::Read {
                collection: collection.name(),
                reason: "injected read failure".to_string(),
            });
        }
        Ok(())
    }

    fn check_write(&self, collection: Collection, key: &str) -> Result<(), StoreError> {
        if lock(&self.failing_keys).contains(&(collection, key.to_string())) {
            return Err(StoreError::Write {
                collection: collection.name(),
                key: key.to_string(),
                reason: "injected write failure".to_string(),
            });
        }
        Ok(())
    }

    fn records(&self, collection: Collection) -> Vec<Value> {
        lock(&self.docs)
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn notify(&self, collection: Collection) {
        if self.subscribers.watches(collection) {
            let records = self.records(collection);
            self.subscribers.publish(collection, &records);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DocumentStore for MemoryStore {
    fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        self.check_read(collection)?;
        Ok(self.records(collection))
    }

    fn subscribe(&self, collection: Collection, order_key: &str) -> Result<Subscription, StoreError> {
        self.check_read(collection)?;
        Ok(self
            .subscribers
            .add(collection, order_key, self.records(collection)))
    }

    fn get_one(&self, collection: Collection, key: &str) -> Result<Option<Value>, StoreError> {
        self.check_read(collection)?;
        Ok(lock(&self.docs).get(&(collection, key.to_string())).cloned())
    }

    fn set_record(&self, collection: Collection, key: &str, value: &Value) -> Result<(), StoreError> {
        self.check_write(collection, key)?;
        lock(&self.docs).insert((collection, key.to_string()), value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.notify(collection);
        Ok(())
    }

    fn update_fields(&self, collection: Collection, key: &str, partial: &Value) -> Result<(), StoreError> {
        self.check_write(collection, key)?;
        {
            let mut docs = lock(&self.docs);
            let doc = docs
                .get_mut(&(collection, key.to_string()))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.name(),
                    key: key.to_string(),
                })?;
            merge_fields(doc, partial);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.notify(collection);
        Ok(())
    }

    fn batch_set(&self, collection: Collection, records: &[(String, Value)]) -> Result<(), StoreError> {
        // all-or-nothing: check every key before touching anything
        for (key, _) in records {
            self.check_write(collection, key)?;
        }
        {
            let mut docs = lock(&self.docs);
            for (key, value) in records {
                docs.insert((collection, key.clone()), value.clone());
            }
        }
        self.writes.fetch_add(records.len(), Ordering::SeqCst);
        self.notify(collection);
        Ok(())
    }
}
