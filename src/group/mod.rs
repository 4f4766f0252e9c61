// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Commands addressed to a room rather than a single light.
//!
//! Voice assistants and similar front ends name a room, or nothing at all,
//! and expect every matching light to react. This module turns such a
//! request into a set of lights and runs the command on each of them:
//!
//! - [`RoomTarget`] parses the spoken room (`None` means the default group,
//!   `"all"` or `"everywhere"` means every light)
//! - [`LightManager::resolve`](crate::LightManager::resolve) maps a target to
//!   lights
//! - [`GroupAction`] runs effects, fades and notifications on the result and
//!   reports per-light failures in a [`GroupOutcome`]
//! - [`parse_spoken_duration`] reads ISO-8601 durations such as `PT1M30S`
//!
//! # Examples
//!
//! ```
//! use lumenctl::group::RoomTarget;
//!
//! assert_eq!(RoomTarget::parse(None), RoomTarget::Default);
//! assert_eq!(RoomTarget::parse(Some("Everywhere")), RoomTarget::All);
//! assert_eq!(RoomTarget::parse(Some("kitchen")), RoomTarget::Named("kitchen".to_string()));
//! ```

mod action;
mod duration;
mod room;

pub use action::{GroupAction, GroupOutcome, NotificationLevel};
pub use duration::{DEFAULT_FADE_DURATION, describe_duration, parse_spoken_duration};
pub use room::RoomTarget;
