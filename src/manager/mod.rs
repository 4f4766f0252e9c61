// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light manager for discovering and tracking every bulb in the home.
//!
//! # Overview
//!
//! The [`LightManager`] is the registry applications construct once and pass
//! around. It provides:
//!
//! - **Discovery**: bulbs announced on the network are persisted and turned
//!   into [`Light`](crate::Light)s, together with stored bulbs that are
//!   currently offline
//! - **Refresh**: every light re-reads its bulb on a fixed interval
//! - **Lookup**: by id, address or case-insensitive name, plus the default
//!   group
//! - **Events**: one broadcast stream for all lights
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use lumenctl::device::SimulatedNetwork;
//! use lumenctl::event::LightEvent;
//! use lumenctl::manager::{LightManager, ManagerConfig};
//! use lumenctl::store::JsonFileStore;
//!
//! #[tokio::main]
//! async fn main() -> lumenctl::Result<()> {
//!     let config = ManagerConfig::from_json_file("lights.json")?;
//!     let manager = LightManager::new(
//!         config,
//!         Arc::new(SimulatedNetwork::new()),
//!         Arc::new(JsonFileStore::new("light-store.json")),
//!     );
//!
//!     let mut events = manager.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let LightEvent::FadeFinished { light_id, outcome } = event {
//!                 println!("fade on {light_id} ended: {outcome}");
//!             }
//!         }
//!     });
//!
//!     manager.start().await?;
//!     for light in manager.default_lights().await {
//!         light.set_brightness(40).await?;
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod light_manager;

pub use config::{FadeConfig, ManagerConfig};
pub use light_manager::{DiscoveryReport, LightManager};
