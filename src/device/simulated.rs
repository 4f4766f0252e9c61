// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory bulbs for tests and demos.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::effect::Flow;
use crate::error::DeviceError;
use crate::types::{Brightness, Color};

use super::{DeviceLink, DeviceNetwork, DeviceProperties, DiscoveredDevice, Power};

/// A command received by a [`SimulatedBulb`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// `get_properties`
    GetProperties,
    /// `set_brightness`
    SetBrightness(u8),
    /// `set_rgb`
    SetRgb(Color),
    /// `turn_on`
    TurnOn,
    /// `turn_off`
    TurnOff,
    /// `start_flow`
    StartFlow(Flow),
    /// `stop_flow`
    StopFlow,
}

impl DeviceCommand {
    /// Returns true for commands that change the bulb.
    #[must_use]
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::GetProperties)
    }
}

#[derive(Debug)]
struct BulbState {
    props: DeviceProperties,
    reachable: bool,
    failures_remaining: u32,
    log: Vec<DeviceCommand>,
}

/// A scriptable in-memory bulb.
///
/// Every call is appended to a command log, including calls that fail.
///
/// # Examples
///
/// ```
/// use lumenctl::device::{DeviceCommand, DeviceLink, SimulatedBulb};
/// use lumenctl::types::Brightness;
///
/// # async fn example() {
/// let bulb = SimulatedBulb::new("192.168.0.20", "bedroom");
/// bulb.set_brightness(Brightness::new(30).unwrap()).await.unwrap();
/// assert_eq!(bulb.properties().brightness, 30);
/// assert_eq!(bulb.commands(), vec![DeviceCommand::SetBrightness(30)]);
///
/// bulb.set_reachable(false);
/// assert!(bulb.get_properties().await.is_err());
/// # }
/// ```
#[derive(Debug)]
pub struct SimulatedBulb {
    address: String,
    name: String,
    state: Mutex<BulbState>,
}

impl SimulatedBulb {
    /// Creates a reachable bulb: on, 50% brightness, color `0x000100`.
    #[must_use]
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            state: Mutex::new(BulbState {
                props: DeviceProperties {
                    brightness: 50,
                    color_temperature: 6500,
                    rgb: 256,
                    flowing: false,
                    power: Power::On,
                },
                reachable: true,
                failures_remaining: 0,
                log: Vec::new(),
            }),
        }
    }

    /// Replaces the initial properties.
    #[must_use]
    pub fn with_properties(self, props: DeviceProperties) -> Self {
        self.state.lock().props = props;
        self
    }

    /// Address of the bulb.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Advertised name of the bulb.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current properties, without logging a command.
    #[must_use]
    pub fn properties(&self) -> DeviceProperties {
        self.state.lock().props
    }

    /// Makes the bulb answer or stop answering.
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// Returns true if the bulb currently answers.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.state.lock().reachable
    }

    /// Makes the next `count` calls answer with an error, then recover.
    pub fn fail_next(&self, count: u32) {
        self.state.lock().failures_remaining = count;
    }

    /// Changes the brightness as another controller would (not logged).
    pub fn external_set_brightness(&self, brightness: u8) {
        self.state.lock().props.brightness = brightness;
    }

    /// Changes the power as another controller would (not logged).
    pub fn external_set_power(&self, power: Power) {
        self.state.lock().props.power = power;
    }

    /// All commands received so far.
    #[must_use]
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.state.lock().log.clone()
    }

    /// Number of commands received so far.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.state.lock().log.len()
    }

    /// Forgets the command log.
    pub fn clear_commands(&self) {
        self.state.lock().log.clear();
    }

    fn handle<T>(
        &self,
        command: DeviceCommand,
        apply: impl FnOnce(&mut DeviceProperties) -> T,
    ) -> Result<T, DeviceError> {
        let mut state = self.state.lock();
        if !state.reachable {
            state.log.push(command);
            return Err(DeviceError::Unreachable(self.address.clone()));
        }
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            let rejected = DeviceError::Rejected(format!("{command:?} on {}", self.address));
            state.log.push(command);
            return Err(rejected);
        }
        state.log.push(command);
        Ok(apply(&mut state.props))
    }
}

#[async_trait]
impl DeviceLink for SimulatedBulb {
    async fn get_properties(&self) -> Result<DeviceProperties, DeviceError> {
        self.handle(DeviceCommand::GetProperties, |props| *props)
    }

    async fn set_brightness(&self, brightness: Brightness) -> Result<(), DeviceError> {
        self.handle(DeviceCommand::SetBrightness(brightness.value()), |props| {
            props.brightness = brightness.value();
        })
    }

    async fn set_rgb(&self, color: Color) -> Result<(), DeviceError> {
        self.handle(DeviceCommand::SetRgb(color), |props| {
            props.rgb = color.packed();
        })
    }

    async fn turn_on(&self) -> Result<(), DeviceError> {
        self.handle(DeviceCommand::TurnOn, |props| props.power = Power::On)
    }

    async fn turn_off(&self) -> Result<(), DeviceError> {
        self.handle(DeviceCommand::TurnOff, |props| {
            props.power = Power::Off;
            props.flowing = false;
        })
    }

    async fn start_flow(&self, flow: &Flow) -> Result<(), DeviceError> {
        self.handle(DeviceCommand::StartFlow(flow.clone()), |props| {
            props.flowing = true;
        })
    }

    async fn stop_flow(&self) -> Result<(), DeviceError> {
        self.handle(DeviceCommand::StopFlow, |props| props.flowing = false)
    }
}

/// A network of [`SimulatedBulb`]s.
///
/// Only reachable bulbs are returned by discovery. Links for unknown
/// addresses are bulbs that never answer.
#[derive(Debug, Default)]
pub struct SimulatedNetwork {
    bulbs: RwLock<Vec<Arc<SimulatedBulb>>>,
    discovery_down: Mutex<bool>,
}

impl SimulatedNetwork {
    /// Creates an empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bulb and returns a handle to it.
    pub fn add_bulb(&self, bulb: SimulatedBulb) -> Arc<SimulatedBulb> {
        let bulb = Arc::new(bulb);
        self.bulbs.write().push(Arc::clone(&bulb));
        bulb
    }

    /// Looks up a bulb by address.
    #[must_use]
    pub fn bulb(&self, address: &str) -> Option<Arc<SimulatedBulb>> {
        self.bulbs
            .read()
            .iter()
            .find(|b| b.address() == address)
            .cloned()
    }

    /// Makes discovery itself fail.
    pub fn set_discovery_down(&self, down: bool) {
        *self.discovery_down.lock() = down;
    }
}

#[async_trait]
impl DeviceNetwork for SimulatedNetwork {
    async fn discover(&self) -> Result<Vec<DiscoveredDevice>, DeviceError> {
        if *self.discovery_down.lock() {
            return Err(DeviceError::Unreachable("discovery".to_string()));
        }
        Ok(self
            .bulbs
            .read()
            .iter()
            .filter(|b| b.is_reachable())
            .map(|b| DiscoveredDevice {
                address: b.address().to_string(),
                name: b.name().to_string(),
            })
            .collect())
    }

    fn link(&self, address: &str) -> Arc<dyn DeviceLink> {
        if let Some(bulb) = self.bulb(address) {
            return bulb;
        }
        let ghost = SimulatedBulb::new(address, "");
        ghost.set_reachable(false);
        Arc::new(ghost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commands_update_properties() {
        let bulb = SimulatedBulb::new("10.0.0.1", "desk");

        bulb.set_rgb(Color::new(255, 0, 0)).await.unwrap();
        bulb.turn_off().await.unwrap();

        let props = bulb.properties();
        assert_eq!(props.rgb, 0x00FF_0000);
        assert_eq!(props.power, Power::Off);
        assert_eq!(
            bulb.commands(),
            vec![DeviceCommand::SetRgb(Color::new(255, 0, 0)), DeviceCommand::TurnOff]
        );
    }

    #[tokio::test]
    async fn fail_next_recovers() {
        let bulb = SimulatedBulb::new("10.0.0.1", "desk");
        bulb.fail_next(2);

        let err = bulb.get_properties().await.unwrap_err();
        assert_eq!(err, DeviceError::Rejected("GetProperties on 10.0.0.1".to_string()));
        assert!(bulb.get_properties().await.is_err());
        assert!(bulb.get_properties().await.is_ok());
        assert_eq!(bulb.command_count(), 3);
    }

    #[tokio::test]
    async fn flows_toggle_flowing() {
        let bulb = SimulatedBulb::new("10.0.0.1", "desk");
        bulb.start_flow(&Flow::new(0, crate::effect::strobe())).await.unwrap();
        assert!(bulb.properties().flowing);
        bulb.stop_flow().await.unwrap();
        assert!(!bulb.properties().flowing);
    }

    #[tokio::test]
    async fn network_discovers_reachable_bulbs_only() {
        let network = SimulatedNetwork::new();
        network.add_bulb(SimulatedBulb::new("10.0.0.1", "desk"));
        let porch = network.add_bulb(SimulatedBulb::new("10.0.0.2", "porch"));
        porch.set_reachable(false);

        let found = network.discover().await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address, "10.0.0.1");
        assert_eq!(found[0].name, "desk");

        network.set_discovery_down(true);
        assert!(network.discover().await.is_err());
    }

    #[tokio::test]
    async fn unknown_address_link_never_answers() {
        let network = SimulatedNetwork::new();
        let link = network.link("10.9.9.9");
        assert!(link.get_properties().await.is_err());
    }
}
