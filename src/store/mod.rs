// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light metadata store.
//!
//! Only three attributes of a light outlive the process: its address, its
//! display name and whether it belongs to the default group. The store
//! assigns each light a stable [`LightId`] the first time it is saved.
//!
//! Two implementations are provided: [`MemoryStore`] for tests and
//! embedders that persist elsewhere, and [`JsonFileStore`] which keeps all
//! records in one JSON file.

mod json_file;
mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::LightId;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// A stored light.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LightRecord {
    /// Identifier assigned by the store.
    pub id: LightId,
    /// Address of the bulb.
    pub ip: String,
    /// Display name.
    pub name: String,
    /// Membership of the default group.
    #[serde(default)]
    pub is_default: bool,
}

impl LightRecord {
    /// The persisted fields of this record.
    #[must_use]
    pub fn fields(&self) -> LightRecordFields {
        LightRecordFields {
            ip: self.ip.clone(),
            name: self.name.clone(),
            is_default: self.is_default,
        }
    }
}

/// The persisted fields of a light, without its id.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LightRecordFields {
    /// Address of the bulb.
    pub ip: String,
    /// Display name.
    pub name: String,
    /// Membership of the default group.
    pub is_default: bool,
}

/// Selects records in [`LightStore::list_lights`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightFilter {
    /// Only records with this id.
    pub id: Option<LightId>,
    /// Only records with this address.
    pub ip: Option<String>,
}

impl LightFilter {
    /// Matches every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches the record with the given id.
    #[must_use]
    pub fn by_id(id: LightId) -> Self {
        Self {
            id: Some(id),
            ip: None,
        }
    }

    /// Matches records with the given address.
    #[must_use]
    pub fn by_ip(ip: impl Into<String>) -> Self {
        Self {
            id: None,
            ip: Some(ip.into()),
        }
    }

    /// Returns true if `record` passes the filter.
    #[must_use]
    pub fn matches(&self, record: &LightRecord) -> bool {
        self.id.is_none_or(|id| id == record.id)
            && self.ip.as_deref().is_none_or(|ip| ip == record.ip)
    }
}

/// Persistence of light metadata.
#[async_trait]
pub trait LightStore: Send + Sync {
    /// Lists the records that pass `filter`.
    async fn list_lights(&self, filter: &LightFilter) -> Result<Vec<LightRecord>, StoreError>;

    /// Overwrites the fields of an existing record.
    ///
    /// Fails with [`StoreError::NotFound`] if no record has `id`.
    async fn save_light(&self, id: LightId, fields: &LightRecordFields) -> Result<(), StoreError>;

    /// Creates a record and returns its new id.
    async fn save_new_light(&self, fields: &LightRecordFields) -> Result<LightId, StoreError>;
}
