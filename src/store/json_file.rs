// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::types::LightId;

use super::{LightFilter, LightRecord, LightRecordFields, LightStore};

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct StoreFile {
    #[serde(default)]
    lights: Vec<LightRecord>,
}

/// A [`LightStore`] backed by a single JSON file.
///
/// The file is read on every call and rewritten on every write; a missing
/// file is an empty store. Writes are serialized within the process.
///
/// File layout:
///
/// ```json
/// { "lights": [ { "id": "…", "ip": "192.168.0.20", "name": "bedroom", "is_default": true } ] }
/// ```
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store using the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoreFile, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no light store file yet");
                Ok(StoreFile::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, file: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(file)?;
        tokio::fs::write(&self.path, contents).await?;
        tracing::debug!(path = %self.path.display(), count = file.lights.len(), "saved light store");
        Ok(())
    }
}

#[async_trait]
impl LightStore for JsonFileStore {
    async fn list_lights(&self, filter: &LightFilter) -> Result<Vec<LightRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let file = self.load().await?;
        Ok(file.lights.into_iter().filter(|r| filter.matches(r)).collect())
    }

    async fn save_light(&self, id: LightId, fields: &LightRecordFields) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let record = file
            .lights
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.ip.clone_from(&fields.ip);
        record.name.clone_from(&fields.name);
        record.is_default = fields.is_default;
        self.persist(&file).await
    }

    async fn save_new_light(&self, fields: &LightRecordFields) -> Result<LightId, StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        if file.lights.iter().any(|r| r.ip == fields.ip) {
            return Err(StoreError::Invalid(format!(
                "a light with ip {} already exists",
                fields.ip
            )));
        }
        let id = LightId::new();
        file.lights.push(LightRecord {
            id,
            ip: fields.ip.clone(),
            name: fields.name.clone(),
            is_default: fields.is_default,
        });
        self.persist(&file).await?;
        Ok(id)
    }
}
