// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for light control.
//!
//! Each type ensures values are within their valid ranges at construction
//! time, so a [`Light`](crate::Light) never sends an invalid value to a bulb.
//!
//! # Types
//!
//! - [`Color`] - RGB color, convertible to/from hex and packed integers
//! - [`ColorSpec`] - Unvalidated color input (color, hex string or triple)
//! - [`Brightness`] - Brightness level (1-100%) and the fade decay function
//! - [`LightId`] - Stable light identifier assigned by the store

mod brightness;
mod color;
mod light_id;

pub use brightness::Brightness;
pub use color::{Color, ColorSpec, MAX_PACKED_RGB};
pub use light_id::LightId;
