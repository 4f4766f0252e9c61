// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device-link collaborators.
//!
//! The crate does not speak any bulb wire protocol itself. Instead, a
//! [`DeviceNetwork`] discovers bulbs and hands out one [`DeviceLink`] per
//! address, and every [`Light`](crate::Light) talks to its bulb only through
//! that link.
//!
//! [`SimulatedNetwork`] and [`SimulatedBulb`] are in-memory implementations
//! used by the tests and the demo; they record every command and can be
//! told to fail.

mod simulated;

use std::sync::Arc;

use async_trait::async_trait;

use crate::effect::Flow;
use crate::error::DeviceError;
use crate::types::{Brightness, Color};

pub use simulated::{DeviceCommand, SimulatedBulb, SimulatedNetwork};

/// Power state reported by a bulb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    /// The bulb is lit.
    On,
    /// The bulb is dark.
    Off,
}

impl Power {
    /// Returns true for [`Power::On`].
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<bool> for Power {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// Live properties read from a bulb.
///
/// Two readings that compare equal mean nothing observable changed on the
/// device in between; the fade engine relies on this as its fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DeviceProperties {
    /// Raw brightness as reported (1-100 on a lit bulb).
    pub brightness: u8,
    /// Color temperature in kelvin.
    pub color_temperature: u16,
    /// Packed `0xRRGGBB` color.
    pub rgb: u32,
    /// Whether a flow is running.
    pub flowing: bool,
    /// Power state.
    pub power: Power,
}

impl DeviceProperties {
    /// The brightness as a validated level.
    #[must_use]
    pub fn brightness_level(&self) -> Brightness {
        Brightness::clamped(self.brightness)
    }

    /// The color as a validated value, falling back to white for garbage.
    #[must_use]
    pub fn color(&self) -> Color {
        Color::from_packed_int(i64::from(self.rgb)).unwrap_or_default()
    }
}

/// A bulb announced on the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DiscoveredDevice {
    /// IP address of the bulb.
    pub address: String,
    /// Name the bulb advertises.
    pub name: String,
}

/// Connection to one bulb.
///
/// Every method may fail with a [`DeviceError`]; implementations are
/// expected to bound blocking calls with their own timeouts.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Reads the live properties.
    async fn get_properties(&self) -> Result<DeviceProperties, DeviceError>;

    /// Sets the brightness.
    async fn set_brightness(&self, brightness: Brightness) -> Result<(), DeviceError>;

    /// Sets the RGB color.
    async fn set_rgb(&self, color: Color) -> Result<(), DeviceError>;

    /// Turns the bulb on.
    async fn turn_on(&self) -> Result<(), DeviceError>;

    /// Turns the bulb off.
    async fn turn_off(&self) -> Result<(), DeviceError>;

    /// Starts a flow program.
    async fn start_flow(&self, flow: &Flow) -> Result<(), DeviceError>;

    /// Stops the running flow.
    async fn stop_flow(&self) -> Result<(), DeviceError>;
}

/// Discovery of bulbs and creation of their links.
#[async_trait]
pub trait DeviceNetwork: Send + Sync {
    /// Lists the bulbs currently reachable on the network.
    async fn discover(&self) -> Result<Vec<DiscoveredDevice>, DeviceError>;

    /// Returns the link for the bulb at `address`.
    fn link(&self, address: &str) -> Arc<dyn DeviceLink>;
}
