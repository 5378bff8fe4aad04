//! Exercise name catalog for autocomplete

use serde_json::Value;
use tracing::warn;

use crate::db::{Collection, DocumentStore};
use crate::error::StoreError;
use crate::exercises::CatalogEntry;

/// Add a name to the catalog (upsert keyed by the name itself)
pub fn remember(store: &dyn DocumentStore, name: &str) -> Result<(), StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(());
    }
    let entry = serde_json::to_value(CatalogEntry {
        name: name.to_string(),
    })?;
    store.set_record(Collection::Exercises, name, &entry)
}

/// All known names, sorted
pub fn names(store: &dyn DocumentStore) -> Result<Vec<String>, StoreError> {
    let mut names: Vec<String> = store
        .get_all(Collection::Exercises)?
        .into_iter()
        .filter_map(|doc: Value| match serde_json::from_value::<CatalogEntry>(doc) {
            Ok(entry) => Some(entry.name),
            Err(e) => {
                warn!("Skipping malformed catalog entry: {}", e);
                None
            }
        })
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

/// Names containing `filter`, case-insensitive; empty filter keeps all
pub fn suggestions<'a>(names: &'a [String], filter: &str) -> Vec<&'a str> {
    let filter = filter.trim().to_lowercase();
    names
        .iter()
        .filter(|name| filter.is_empty() || name.to_lowercase().contains(&filter))
        .map(String::as_str)
        .collect()
}
