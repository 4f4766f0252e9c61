// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for a single light against a simulated bulb.

use std::sync::Arc;
use std::time::Duration;

use lumenctl::device::{DeviceCommand, SimulatedBulb};
use lumenctl::store::{LightRecord, LightStore, MemoryStore};
use lumenctl::{
    Color, EffectKind, EffectProps, Error, EventBus, Light, LightId, LightSettings, LightUpdate,
    ValueError,
};
use serde_json::json;

struct Fixture {
    light: Arc<Light>,
    bulb: Arc<SimulatedBulb>,
    store: Arc<MemoryStore>,
}

async fn connected_light() -> Fixture {
    let record = LightRecord {
        id: LightId::new(),
        ip: "192.168.0.20".to_string(),
        name: "bedroom".to_string(),
        is_default: true,
    };
    let bulb = Arc::new(SimulatedBulb::new("192.168.0.20", "bedroom"));
    let store = Arc::new(MemoryStore::with_records(vec![record.clone()]));
    let light = Arc::new(Light::new(
        record,
        bulb.clone(),
        store.clone(),
        EventBus::new(),
        LightSettings::default(),
    ));
    light.refresh_props().await.unwrap();
    bulb.clear_commands();
    Fixture { light, bulb, store }
}

// ============================================================================
// Color and brightness
// ============================================================================

mod values {
    use super::*;

    #[tokio::test]
    async fn color_round_trips_through_the_snapshot() {
        let f = connected_light().await;
        f.light.set_color("#FF00ff").await.unwrap();

        let snapshot = serde_json::to_value(f.light.dump_props().await).unwrap();
        assert_eq!(snapshot["color"], json!("#ff00ff"));
        assert_eq!(f.bulb.properties().rgb, 16_711_935);
    }

    #[tokio::test]
    async fn every_color_form_is_accepted() {
        let f = connected_light().await;
        f.light.set_color((255_i64, 136, 0)).await.unwrap();
        f.light.set_color(Color::new(1, 2, 3)).await.unwrap();
        f.light.set_color("#00ff00".to_string()).await.unwrap();
        assert_eq!(f.light.color().await, Some(Color::new(0, 255, 0)));
        assert_eq!(f.bulb.command_count(), 3);
    }

    #[tokio::test]
    async fn malformed_colors_never_reach_the_bulb() {
        let f = connected_light().await;
        for bad in ["#fff", "#ff00f", "#gg0000", ""] {
            let err = f.light.set_color(bad).await.unwrap_err();
            assert!(matches!(err, Error::Value(ValueError::InvalidColor(_))), "{bad}");
        }
        assert!(f.light.set_color((256_i64, 0, 0)).await.is_err());
        assert_eq!(f.bulb.command_count(), 0);
    }

    #[tokio::test]
    async fn brightness_bounds() {
        let f = connected_light().await;
        for bad in [0, 101, -5] {
            assert!(f.light.set_brightness(bad).await.unwrap_err().is_validation());
        }
        f.light.set_brightness(1).await.unwrap();
        f.light.set_brightness(100).await.unwrap();
        assert_eq!(
            f.bulb.commands(),
            vec![DeviceCommand::SetBrightness(1), DeviceCommand::SetBrightness(100)]
        );
    }
}

// ============================================================================
// Modes
// ============================================================================

mod modes {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn effect_and_fade_exclude_each_other() {
        let f = connected_light().await;

        f.light.start_effect("lsd", &EffectProps::new()).await.unwrap();
        assert_eq!(f.light.effect().await, Some(EffectKind::Lsd));

        f.light.start_fade(Duration::from_secs(60), false).await.unwrap();
        assert!(f.light.is_fading());
        assert_eq!(f.light.effect().await, None);
        assert!(f.bulb.commands().contains(&DeviceCommand::StopFlow));

        f.light.start_effect("strobe", &EffectProps::new()).await.unwrap();
        assert!(!f.light.is_fading());
        assert_eq!(f.light.effect().await, Some(EffectKind::Strobe));
    }

    #[tokio::test]
    async fn effect_parameters_are_checked() {
        let f = connected_light().await;
        let mut props = EffectProps::new();
        props.insert("duration".to_string(), json!(100));

        let err = f.light.start_effect("disco", &props).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Value(ValueError::InvalidEffectParameters { ref effect, .. }) if effect == "disco"
        ));
        assert_eq!(f.bulb.command_count(), 0);

        f.light.start_effect("police", &props).await.unwrap();
        let snapshot = f.light.dump_props().await;
        let live = snapshot.live.unwrap();
        assert_eq!(live.effect, Some(EffectKind::Police));
        assert_eq!(live.effect_props["duration"], json!(100));
    }
}

// ============================================================================
// Connectivity
// ============================================================================

mod connectivity {
    use super::*;

    #[tokio::test]
    async fn failure_clears_live_state() {
        let f = connected_light().await;
        f.bulb.set_reachable(false);

        let err = f.light.set_power(false).await.unwrap_err();
        assert!(err.is_unreachable());
        assert!(!f.light.is_connected());

        let snapshot = f.light.dump_props().await;
        assert!(!snapshot.is_connected);
        assert!(snapshot.live.is_none());
        assert_eq!(f.light.brightness().await, None);

        // only a read is attempted while the bulb is down
        f.bulb.clear_commands();
        assert!(f.light.set_brightness(20).await.is_err());
        assert_eq!(f.bulb.commands(), vec![DeviceCommand::GetProperties]);

        f.bulb.set_reachable(true);
        f.light.refresh_props().await.unwrap();
        assert!(f.light.is_connected());
        assert!(f.light.last_seen().is_some());
    }

    #[tokio::test]
    async fn bulb_back_online_takes_commands_without_a_refresh() {
        let f = connected_light().await;
        f.bulb.set_reachable(false);
        assert!(f.light.set_brightness(40).await.is_err());

        f.bulb.set_reachable(true);
        f.bulb.clear_commands();
        f.light.set_brightness(40).await.unwrap();

        assert!(f.light.is_connected());
        assert_eq!(
            f.bulb.commands(),
            vec![DeviceCommand::GetProperties, DeviceCommand::SetBrightness(40)]
        );
        assert_eq!(f.bulb.properties().brightness, 40);
        assert_eq!(f.light.brightness().await.map(|b| b.value()), Some(40));
    }
}

// ============================================================================
// Metadata
// ============================================================================

mod metadata {
    use super::*;

    #[tokio::test]
    async fn json_update_is_applied_and_persisted() {
        let f = connected_light().await;
        let update: LightUpdate = serde_json::from_value(json!({
            "name": "reading",
            "is_default": false,
            "on": true,
            "brightness": 35
        }))
        .unwrap();

        f.light.apply_update(&update).await.unwrap();

        assert_eq!(f.light.name(), "reading");
        assert!(!f.light.is_default());
        let stored = f
            .store
            .list_lights(&lumenctl::store::LightFilter::by_id(f.light.id()))
            .await
            .unwrap();
        assert_eq!(stored[0].name, "reading");
        assert!(!stored[0].is_default);
        assert_eq!(
            f.bulb.commands(),
            vec![DeviceCommand::TurnOn, DeviceCommand::SetBrightness(35)]
        );
    }

    #[tokio::test]
    async fn too_long_name_is_rejected() {
        let f = connected_light().await;
        let err = f.light.set_name(&"a".repeat(33)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Value(ValueError::NameTooLong { max: 32, actual: 33 })
        ));
        assert_eq!(f.store.write_count(), 0);
    }
}
