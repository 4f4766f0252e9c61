// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events about lights.
//!
//! Lights and the [`LightManager`](crate::LightManager) publish
//! [`LightEvent`]s on a shared [`EventBus`] backed by a tokio broadcast
//! channel. Fades in particular report how they ended only through this
//! bus, since their initiator has already returned.
//!
//! # Examples
//!
//! ```
//! use lumenctl::event::{EventBus, LightEvent};
//! use lumenctl::types::LightId;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(LightEvent::connected(LightId::new()));
//! assert!(rx.try_recv().unwrap().is_connection());
//! ```

mod event_bus;
mod light_event;

pub use event_bus::EventBus;
pub use light_event::{FadeOutcome, LightEvent};
