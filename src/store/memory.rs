// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::types::LightId;

use super::{LightFilter, LightRecord, LightRecordFields, LightStore};

/// An in-process [`LightStore`].
///
/// Counts writes so callers can check that nothing was persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<LightRecord>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `records`. Seeding is not counted as a write.
    #[must_use]
    pub fn with_records(records: Vec<LightRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            writes: AtomicUsize::new(0),
        }
    }

    /// Snapshot of all records.
    #[must_use]
    pub fn records(&self) -> Vec<LightRecord> {
        self.records.lock().clone()
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LightStore for MemoryStore {
    async fn list_lights(&self, filter: &LightFilter) -> Result<Vec<LightRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn save_light(&self, id: LightId, fields: &LightRecordFields) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.ip.clone_from(&fields.ip);
        record.name.clone_from(&fields.name);
        record.is_default = fields.is_default;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save_new_light(&self, fields: &LightRecordFields) -> Result<LightId, StoreError> {
        let id = LightId::new();
        self.records.lock().push(LightRecord {
            id,
            ip: fields.ip.clone(),
            name: fields.name.clone(),
            is_default: fields.is_default,
        });
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(ip: &str, name: &str) -> LightRecordFields {
        LightRecordFields {
            ip: ip.to_string(),
            name: name.to_string(),
            is_default: false,
        }
    }

    #[tokio::test]
    async fn save_new_then_list() {
        let store = MemoryStore::new();
        let id = store.save_new_light(&fields("10.0.0.1", "desk")).await.unwrap();

        let all = store.list_lights(&LightFilter::all()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(store.write_count(), 1);

        let none = store.list_lights(&LightFilter::by_ip("10.0.0.2")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn save_light_overwrites_fields() {
        let store = MemoryStore::new();
        let id = store.save_new_light(&fields("10.0.0.1", "desk")).await.unwrap();

        let mut updated = fields("10.0.0.1", "reading");
        updated.is_default = true;
        store.save_light(id, &updated).await.unwrap();

        let rec = &store.records()[0];
        assert_eq!(rec.name, "reading");
        assert!(rec.is_default);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn save_light_unknown_id() {
        let store = MemoryStore::new();
        let result = store.save_light(LightId::new(), &fields("10.0.0.1", "desk")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn seeding_is_not_a_write() {
        let store = MemoryStore::with_records(vec![LightRecord {
            id: LightId::new(),
            ip: "10.0.0.1".to_string(),
            name: "desk".to_string(),
            is_default: true,
        }]);
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.write_count(), 0);
    }
}
