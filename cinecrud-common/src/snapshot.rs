//! Local snapshot store
//!
//! Persists two record sets per named collection:
//! - **init**: the snapshot captured at the last reset from the remote source
//! - **work**: the user-editable copy; new records are prepended
//!
//! Every mutation reads the whole work set, applies the change, and writes the
//! whole set back. Storage and serialization failures propagate to the caller
//! untouched; nothing is retried.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::kv::KeyValueStore;
use crate::models::{Patch, Record};
use crate::time::now_millis;
use crate::Result;

/// Default key prefix for persisted collections
pub const DEFAULT_KEY_PREFIX: &str = "crud";

/// Default identity field used by update/delete
pub const DEFAULT_ID_FIELD: &str = "id";

type IdGenerator = Box<dyn Fn() -> i64 + Send + Sync>;

/// Init/work record sets keyed by collection name
pub struct SnapshotStore<R: Record> {
    kv: Arc<dyn KeyValueStore>,
    prefix: String,
    next_id: IdGenerator,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SnapshotStore<R> {
    /// Store using the default `crud` key prefix and millisecond ids
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_prefix(kv, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(kv: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
            next_id: Box::new(now_millis),
            _record: PhantomData,
        }
    }

    /// Replace the id source used by [`create`](Self::create)
    ///
    /// The default is the current time in milliseconds, which collides when two
    /// records are created within the same millisecond.
    pub fn with_id_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.next_id = Box::new(generator);
        self
    }

    pub fn init_key(&self, name: &str) -> String {
        format!("{}_init_{}", self.prefix, name)
    }

    pub fn work_key(&self, name: &str) -> String {
        format!("{}_work_{}", self.prefix, name)
    }

    fn read_list(&self, key: &str) -> Result<Vec<R>> {
        match self.kv.get(key)? {
            Some(raw) if !raw.is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    fn write_list(&self, key: &str, records: &[R]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.kv.set(key, &raw)
    }

    /// Overwrite both init and work with `records`
    pub fn reset_from_source(&self, name: &str, records: Vec<R>) -> Result<Vec<R>> {
        self.write_list(&self.init_key(name), &records)?;
        self.write_list(&self.work_key(name), &records)?;
        info!(collection = %name, count = records.len(), "Collection reset from source");
        Ok(records)
    }

    /// Init set, or empty when the collection was never seeded
    pub fn get_init(&self, name: &str) -> Result<Vec<R>> {
        self.read_list(&self.init_key(name))
    }

    /// Work set, or empty when the collection was never seeded
    pub fn get_work(&self, name: &str) -> Result<Vec<R>> {
        self.read_list(&self.work_key(name))
    }

    /// Overwrite the work set only
    pub fn save_work(&self, name: &str, records: &[R]) -> Result<()> {
        self.write_list(&self.work_key(name), records)
    }

    /// Prepend `record` to the work set, assigning an id when absent or zero
    pub fn create(&self, name: &str, mut record: R) -> Result<Vec<R>> {
        if record.id().unwrap_or(0) == 0 {
            record.set_id((self.next_id)());
        }
        debug!(collection = %name, id = ?record.id(), "Creating record");

        let mut work = self.get_work(name)?;
        work.insert(0, record);
        self.save_work(name, &work)?;
        Ok(work)
    }

    /// Merge `patch` over every work record whose `id` equals `id`
    pub fn update(&self, name: &str, id: i64, patch: &Patch) -> Result<Vec<R>> {
        self.update_by(name, DEFAULT_ID_FIELD, id, patch)
    }

    /// Merge `patch` over every work record whose `id_field` equals `id`
    ///
    /// Non-matching records pass through untouched. An unknown id is a silent
    /// no-op (the work set is still written back).
    pub fn update_by(&self, name: &str, id_field: &str, id: i64, patch: &Patch) -> Result<Vec<R>> {
        let target = Value::from(id);
        let work = self
            .get_work(name)?
            .into_iter()
            .map(|record| -> Result<R> {
                let mut value = serde_json::to_value(&record)?;
                if value.get(id_field) != Some(&target) {
                    return Ok(record);
                }
                if let Value::Object(fields) = &mut value {
                    merge_patch(fields, patch);
                }
                Ok(serde_json::from_value(value)?)
            })
            .collect::<Result<Vec<R>>>()?;

        debug!(collection = %name, id_field = %id_field, id = id, "Updating record");
        self.save_work(name, &work)?;
        Ok(work)
    }

    /// Remove every work record whose `id` equals `id`
    pub fn delete(&self, name: &str, id: i64) -> Result<Vec<R>> {
        self.delete_by(name, DEFAULT_ID_FIELD, id)
    }

    /// Remove every work record whose `id_field` equals `id`
    pub fn delete_by(&self, name: &str, id_field: &str, id: i64) -> Result<Vec<R>> {
        let target = Value::from(id);
        let mut work = Vec::new();
        for record in self.get_work(name)? {
            let value = serde_json::to_value(&record)?;
            if value.get(id_field) != Some(&target) {
                work.push(record);
            }
        }

        debug!(collection = %name, id_field = %id_field, id = id, "Deleting record");
        self.save_work(name, &work)?;
        Ok(work)
    }

    /// Copy init into work, discarding all local edits
    pub fn restore_init(&self, name: &str) -> Result<Vec<R>> {
        let init = self.get_init(name)?;
        self.save_work(name, &init)?;
        info!(collection = %name, count = init.len(), "Work set restored from init snapshot");
        Ok(init)
    }
}

/// Shallow merge; `null` in the patch removes the field
fn merge_patch(fields: &mut serde_json::Map<String, Value>, patch: &Patch) {
    for (key, value) in patch {
        if value.is_null() {
            fields.remove(key);
        } else {
            fields.insert(key.clone(), value.clone());
        }
    }
}
