// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `lumenctl` - A Rust library to run a home's smart lights.
//!
//! This library keeps a registry of Wi-Fi color bulbs found on the local
//! network, caches their state, and drives them with async APIs.
//!
//! # Supported Features
//!
//! - **Discovery**: periodic network scans, persisted light records, a
//!   default group of lights
//! - **Light control**: power, brightness, color from hex strings, RGB
//!   triples or packed integers
//! - **Effects**: device-executed flows (disco, strobe, lsd, police, random)
//! - **Fades**: host-driven, rate-limited dimming that stops as soon as
//!   anyone else touches the light
//! - **Rooms**: voice-style commands addressed to a room, the default group
//!   or every light
//! - **Events**: connection, effect and fade changes on a broadcast bus
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use lumenctl::{LightManager, ManagerConfig};
//! use lumenctl::device::SimulatedNetwork;
//! use lumenctl::store::JsonFileStore;
//!
//! #[tokio::main]
//! async fn main() -> lumenctl::Result<()> {
//!     let config = ManagerConfig::from_json_file("lumenctl.json")?;
//!     let network = Arc::new(SimulatedNetwork::new());
//!     let store = Arc::new(JsonFileStore::new("lights.json"));
//!
//!     let manager = LightManager::new(config, network, store);
//!     manager.start().await?;
//!
//!     if let Some(light) = manager.get_light_by_name("bedroom").await {
//!         light.set_color("#ff8800").await?;
//!         light.set_brightness(40).await?;
//!     }
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Room Commands
//!
//! ```no_run
//! use lumenctl::group::{GroupAction, NotificationLevel, RoomTarget};
//!
//! # async fn example(manager: lumenctl::LightManager) -> lumenctl::Result<()> {
//! let rooms = GroupAction::new(manager);
//!
//! // "fade the lights over two and a half minutes"
//! rooms.start_fade(&RoomTarget::parse(None), Some("PT2M30S"), true).await?;
//!
//! // "flash the kitchen"
//! let outcome = rooms
//!     .notify(&RoomTarget::parse(Some("kitchen")), NotificationLevel::Warning)
//!     .await?;
//! for (light_id, error) in &outcome.failures {
//!     eprintln!("{light_id}: {error}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Events
//!
//! ```ignore
//! let mut events = manager.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```

pub mod device;
pub mod effect;
pub mod error;
pub mod event;
pub mod group;
pub mod light;
pub mod manager;
pub mod store;
pub mod types;

pub use effect::{EffectKind, EffectProps, LightEffect};
pub use error::{ConfigError, DeviceError, Error, Result, StoreError, ValueError};
pub use event::{EventBus, FadeOutcome, LightEvent};
pub use group::{GroupAction, GroupOutcome, NotificationLevel, RoomTarget};
pub use light::{Light, LightSettings, LightSnapshot, LightUpdate, LiveSnapshot};
pub use manager::{DiscoveryReport, FadeConfig, LightManager, ManagerConfig};
pub use types::{Brightness, Color, ColorSpec, LightId};
