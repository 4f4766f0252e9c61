// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::light::Light;
use crate::manager::LightManager;

/// Which lights a group command addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "room", content = "name")]
pub enum RoomTarget {
    /// Lights flagged as default.
    Default,
    /// Every known light.
    All,
    /// The light with this name, compared case-insensitively.
    Named(String),
}

impl RoomTarget {
    /// Parses a spoken room slot.
    ///
    /// A missing or blank room means the default group; `all` and
    /// `everywhere` mean every light.
    #[must_use]
    pub fn parse(room: Option<&str>) -> Self {
        let Some(room) = room.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::Default;
        };
        if room.eq_ignore_ascii_case("all") || room.eq_ignore_ascii_case("everywhere") {
            Self::All
        } else {
            Self::Named(room.to_string())
        }
    }
}

impl From<Option<&str>> for RoomTarget {
    fn from(room: Option<&str>) -> Self {
        Self::parse(room)
    }
}

impl fmt::Display for RoomTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default lights"),
            Self::All => f.write_str("all lights"),
            Self::Named(name) => write!(f, "{name} light"),
        }
    }
}

impl LightManager {
    /// Returns the lights addressed by `target`.
    ///
    /// # Errors
    ///
    /// - `Error::NoLights` if no light is known at all, whatever the target
    /// - `Error::NoDefaultLights` if the default group is empty
    /// - `Error::NoSuchLight` if no light has the given name
    pub async fn resolve(&self, target: &RoomTarget) -> Result<Vec<Arc<Light>>> {
        let lights = self.get_all_lights().await;
        if lights.is_empty() {
            return Err(Error::NoLights);
        }

        match target {
            RoomTarget::All => Ok(lights),
            RoomTarget::Default => {
                let defaults: Vec<_> = lights.into_iter().filter(|l| l.is_default()).collect();
                if defaults.is_empty() {
                    Err(Error::NoDefaultLights)
                } else {
                    Ok(defaults)
                }
            }
            RoomTarget::Named(name) => lights
                .into_iter()
                .find(|l| l.name().to_lowercase() == name.to_lowercase())
                .map(|l| vec![l])
                .ok_or_else(|| Error::NoSuchLight(name.clone())),
        }
    }
}
