// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A simulated home with three bulbs.
//!
//! Discovers the bulbs, marks the bedroom as default, plays an effect,
//! flashes a notification and fades the default lights, printing every
//! event as JSON.
//!
//! ```sh
//! cargo run --example simulated_home
//! ```

use std::sync::Arc;
use std::time::Duration;

use lumenctl::device::{SimulatedBulb, SimulatedNetwork};
use lumenctl::group::{GroupAction, NotificationLevel, RoomTarget};
use lumenctl::store::MemoryStore;
use lumenctl::{FadeConfig, LightEvent, LightManager, ManagerConfig};

#[tokio::main]
async fn main() -> lumenctl::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let network = Arc::new(SimulatedNetwork::new());
    network.add_bulb(SimulatedBulb::new("192.168.0.20", "Bedroom"));
    network.add_bulb(SimulatedBulb::new("192.168.0.21", "Kitchen"));
    network.add_bulb(SimulatedBulb::new("192.168.0.22", "Lounge"));

    // a fast rate limit keeps the demo short
    let config = ManagerConfig::default()
        .with_fade(FadeConfig::default().with_max_calls_per_minute(600));
    let manager = LightManager::new(config, network.clone(), Arc::new(MemoryStore::new()));

    let mut events = manager.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                println!("event: {json}");
            }
            if let LightEvent::FadeFinished { outcome, .. } = event {
                println!("fade ended: {outcome}");
            }
        }
    });

    let report = manager.start().await?;
    println!("discovered {} lights", report.added.len());

    if let Some(bedroom) = manager.get_light_by_name("bedroom").await {
        bedroom.set_is_default(true).await?;
        bedroom.set_color("#ff8800").await?;
    }

    let rooms = GroupAction::new(manager.clone());
    rooms.start_effect(&RoomTarget::parse(Some("kitchen")), "police").await?;
    rooms
        .notify(&RoomTarget::parse(Some("everywhere")), NotificationLevel::Warning)
        .await?;

    // unplug the lounge; the others keep working
    if let Some(lounge) = network.bulb("192.168.0.22") {
        lounge.set_reachable(false);
    }
    let outcome = rooms.stop_effect(&RoomTarget::All).await?;
    for (light_id, error) in &outcome.failures {
        println!("{light_id} failed: {error}");
    }

    rooms.start_fade(&RoomTarget::parse(None), Some("PT5S"), true).await?;
    tokio::time::sleep(Duration::from_secs(8)).await;

    for light in manager.get_all_lights().await {
        let snapshot = light.dump_props().await;
        if let Ok(json) = serde_json::to_string_pretty(&snapshot) {
            println!("{json}");
        }
    }

    manager.shutdown().await;
    Ok(())
}
