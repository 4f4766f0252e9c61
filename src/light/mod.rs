// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The light entity.
//!
//! A [`Light`] represents one bulb: its stored identity and metadata, the
//! cached live state while the bulb answers, the effect it is playing and
//! at most one background fade.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use lumenctl::device::SimulatedBulb;
//! use lumenctl::event::EventBus;
//! use lumenctl::store::{LightRecord, MemoryStore};
//! use lumenctl::types::LightId;
//! use lumenctl::{Light, LightSettings};
//!
//! # async fn example() -> lumenctl::Result<()> {
//! let bulb = Arc::new(SimulatedBulb::new("192.168.0.20", "bedroom"));
//! let record = LightRecord {
//!     id: LightId::new(),
//!     ip: "192.168.0.20".to_string(),
//!     name: "bedroom".to_string(),
//!     is_default: true,
//! };
//! let light = Light::new(record, bulb, Arc::new(MemoryStore::new()), EventBus::new(), LightSettings::default());
//!
//! light.refresh_props().await?;
//! light.set_color("#ff00ff").await?;
//! light.set_brightness(80).await?;
//!
//! let snapshot = light.dump_props().await;
//! assert_eq!(snapshot.live.unwrap().color.hex(), "#ff00ff");
//! # Ok(())
//! # }
//! ```

mod entity;
mod fade;
mod snapshot;
mod update;

pub use entity::{Light, LightSettings};
pub use snapshot::{LightSnapshot, LiveSnapshot};
pub use update::LightUpdate;
