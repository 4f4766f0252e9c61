// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// A partial update for [`Light::apply_update`](crate::Light::apply_update).
///
/// Unknown keys are rejected when deserializing.
///
/// # Examples
///
/// ```
/// use lumenctl::LightUpdate;
///
/// let update: LightUpdate = serde_json::from_str(r##"{"color": "#ff0000", "on": true}"##).unwrap();
/// assert!(update.touches_device());
/// assert!(!update.touches_metadata());
///
/// assert!(serde_json::from_str::<LightUpdate>(r#"{"volume": 3}"#).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New default-group membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    /// New color as a hex string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New brightness percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<i64>,
    /// New power state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
}

impl LightUpdate {
    /// Returns true if a persisted field is set.
    #[must_use]
    pub fn touches_metadata(&self) -> bool {
        self.name.is_some() || self.is_default.is_some()
    }

    /// Returns true if a field that needs the bulb is set.
    #[must_use]
    pub fn touches_device(&self) -> bool {
        self.color.is_some() || self.brightness.is_some() || self.on.is_some()
    }

    /// Returns true if nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.touches_metadata() && !self.touches_device()
    }
}
