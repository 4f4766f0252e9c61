// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::effect::{EffectKind, EffectProps};
use crate::types::{Color, LightId};

/// Point-in-time view of a light, as returned by
/// [`Light::dump_props`](crate::Light::dump_props).
///
/// Serializes flat: identity fields always, live fields only while the
/// light is connected.
///
/// ```json
/// {
///   "id": "…", "ip": "192.168.0.20", "name": "bedroom",
///   "is_default": true, "is_connected": true,
///   "brightness": 80, "on": true, "color": "#ff00ff",
///   "is_flowing": false, "effect": null, "effect_props": {}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LightSnapshot {
    /// Store-assigned identifier.
    pub id: LightId,
    /// Address of the bulb.
    pub ip: String,
    /// Display name.
    pub name: String,
    /// Membership of the default group.
    pub is_default: bool,
    /// Whether the bulb currently answers.
    pub is_connected: bool,
    /// Live state; `None` while disconnected.
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub live: Option<LiveSnapshot>,
}

/// Live fields of a [`LightSnapshot`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LiveSnapshot {
    /// Brightness percentage.
    pub brightness: u8,
    /// Power state.
    pub on: bool,
    /// Current color.
    pub color: Color,
    /// Whether the bulb is playing a flow.
    pub is_flowing: bool,
    /// Running effect, if any.
    pub effect: Option<EffectKind>,
    /// Parameters the running effect was started with.
    pub effect_props: EffectProps,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(live: Option<LiveSnapshot>) -> LightSnapshot {
        LightSnapshot {
            id: LightId::new(),
            ip: "192.168.0.20".to_string(),
            name: "bedroom".to_string(),
            is_default: true,
            is_connected: live.is_some(),
            live,
        }
    }

    #[test]
    fn disconnected_snapshot_has_identity_only() {
        let value = serde_json::to_value(snapshot(None)).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(value["is_connected"], json!(false));
        assert!(value.get("brightness").is_none());
    }

    #[test]
    fn connected_snapshot_is_flat() {
        let value = serde_json::to_value(snapshot(Some(LiveSnapshot {
            brightness: 80,
            on: true,
            color: Color::new(255, 0, 255),
            is_flowing: false,
            effect: None,
            effect_props: EffectProps::new(),
        })))
        .unwrap();

        assert_eq!(value["brightness"], json!(80));
        assert_eq!(value["color"], json!("#ff00ff"));
        assert_eq!(value["effect"], json!(null));
        assert_eq!(value["effect_props"], json!({}));
    }

    #[test]
    fn effect_name_is_serialized() {
        let mut props = EffectProps::new();
        props.insert("count".to_string(), json!(2));
        let value = serde_json::to_value(LiveSnapshot {
            brightness: 100,
            on: true,
            color: Color::white(),
            is_flowing: true,
            effect: Some(EffectKind::RandomLoop),
            effect_props: props,
        })
        .unwrap();
        assert_eq!(value["effect"], json!("random"));
        assert_eq!(value["effect_props"]["count"], json!(2));
    }
}
