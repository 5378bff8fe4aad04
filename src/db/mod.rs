//! Document store - collections of JSON documents keyed by string
//!
//! The schedule only needs a handful of operations (full reads, keyed reads,
//! upserts, merge updates, one batch write and live subscriptions), so the
//! store is a trait with a SQLite implementation for real use and an
//! in-memory one for tests.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::Database;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::watch;

use crate::error::StoreError;

/// Collections used by the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Current-week slots, key = weekday label
    WorkoutDays,
    /// Per-date snapshots, key = YYYY-MM-DD
    ExercisesByDate,
    /// Exercise name catalog, key = name
    Exercises,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::WorkoutDays => "workout_days",
            Collection::ExercisesByDate => "exercises_by_date",
            Collection::Exercises => "exercises",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Minimal read/write/subscribe interface over the document store
pub trait DocumentStore {
    /// Every record of a collection
    fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;

    /// Live view of a collection ordered by `order_key`, refreshed on every write
    fn subscribe(&self, collection: Collection, order_key: &str)
        -> Result<Subscription, StoreError>;

    fn get_one(&self, collection: Collection, key: &str) -> Result<Option<Value>, StoreError>;

    /// Upsert with full replace
    fn set_record(&self, collection: Collection, key: &str, value: &Value)
        -> Result<(), StoreError>;

    /// Merge top-level fields into an existing record; missing record is an error
    fn update_fields(&self, collection: Collection, key: &str, partial: &Value)
        -> Result<(), StoreError>;

    /// Upsert several records atomically
    fn batch_set(&self, collection: Collection, records: &[(String, Value)])
        -> Result<(), StoreError>;
}

/// Receiving side of a live collection view
pub struct Subscription {
    rx: watch::Receiver<Vec<Value>>,
}

impl Subscription {
    /// Latest ordered snapshot, marking it as seen
    pub fn snapshot(&mut self) -> Vec<Value> {
        self.rx.borrow_and_update().clone()
    }

    /// New snapshot if the collection changed since the last look
    pub fn take_if_changed(&mut self) -> Option<Vec<Value>> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.snapshot()),
            _ => None,
        }
    }
}

struct Subscriber {
    collection: Collection,
    order_key: String,
    tx: watch::Sender<Vec<Value>>,
}

/// Fan-out of collection snapshots to live subscriptions
#[derive(Default)]
pub(crate) struct Subscribers {
    inner: Mutex<Vec<Subscriber>>,
}

impl Subscribers {
    pub(crate) fn add(
        &self,
        collection: Collection,
        order_key: &str,
        mut records: Vec<Value>,
    ) -> Subscription {
        sort_by_field(&mut records, order_key);
        let (tx, rx) = watch::channel(records);
        self.lock().push(Subscriber {
            collection,
            order_key: order_key.to_string(),
            tx,
        });
        Subscription { rx }
    }

    pub(crate) fn watches(&self, collection: Collection) -> bool {
        let mut subs = self.lock();
        subs.retain(|s| !s.tx.is_closed());
        subs.iter().any(|s| s.collection == collection)
    }

    pub(crate) fn publish(&self, collection: Collection, records: &[Value]) {
        let mut subs = self.lock();
        subs.retain(|s| !s.tx.is_closed());
        for sub in subs.iter().filter(|s| s.collection == collection) {
            let mut ordered = records.to_vec();
            sort_by_field(&mut ordered, &sub.order_key);
            sub.tx.send_replace(ordered);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Stable sort by one top-level field: missing first, then numbers, then strings
pub(crate) fn sort_by_field(records: &mut [Value], key: &str) {
    records.sort_by(|a, b| compare_field(a.get(key), b.get(key)));
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Merge `partial`'s top-level fields into `target`
pub(crate) fn merge_fields(target: &mut Value, partial: &Value) {
    match (target.as_object_mut(), partial.as_object()) {
        (Some(target), Some(partial)) => {
            for (k, v) in partial {
                target.insert(k.clone(), v.clone());
            }
        }
        _ => *target = partial.clone(),
    }
}
