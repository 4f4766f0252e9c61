// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex as SyncMutex, RwLock};
use tokio::sync::Mutex;

use crate::device::{DeviceLink, DeviceProperties, Power};
use crate::effect::{EffectKind, EffectProps, Flow, LightEffect};
use crate::error::{DeviceError, Error, Result, ValueError};
use crate::event::{EventBus, LightEvent};
use crate::manager::{FadeConfig, ManagerConfig};
use crate::store::{LightRecord, LightRecordFields, LightStore};
use crate::types::{Brightness, Color, ColorSpec, LightId};

use super::fade::{self, FadeControl, FadePlan};
use super::{LightSnapshot, LightUpdate, LiveSnapshot};

/// Per-light settings taken from the manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSettings {
    /// Longest accepted name, in characters.
    pub max_name_length: usize,
    /// Fade pacing and retries.
    pub fade: FadeConfig,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self::from(&ManagerConfig::default())
    }
}

impl From<&ManagerConfig> for LightSettings {
    fn from(config: &ManagerConfig) -> Self {
        Self {
            max_name_length: config.max_light_name_length,
            fade: config.fade.clone(),
        }
    }
}

/// Cached device state. Present only while the light is connected.
#[derive(Debug, Clone)]
pub(super) struct LiveState {
    pub(super) props: DeviceProperties,
    pub(super) effect: Option<ActiveEffect>,
}

#[derive(Debug, Clone)]
pub(super) struct ActiveEffect {
    kind: EffectKind,
    props: EffectProps,
}

#[derive(Debug)]
struct Metadata {
    name: String,
    is_default: bool,
}

/// One physical bulb.
///
/// A `Light` caches the last known device state and funnels every device
/// command through a single async mutex, so operations on the same light
/// never interleave. Name and default-group membership live behind a
/// separate lock and can be read without waiting on the device.
///
/// Every device failure marks the light disconnected and surfaces as
/// [`Error::LightUnreachable`]. A device command on a disconnected light
/// first re-reads the bulb; if it answers, the light reconnects and the
/// command is sent.
pub struct Light {
    pub(super) id: LightId,
    pub(super) ip: String,
    pub(super) link: Arc<dyn DeviceLink>,
    store: Arc<dyn LightStore>,
    pub(super) events: EventBus,
    pub(super) settings: LightSettings,
    meta: RwLock<Metadata>,
    persist: Mutex<()>,
    connected: AtomicBool,
    last_seen: SyncMutex<Option<DateTime<Utc>>>,
    pub(super) live: Mutex<Option<LiveState>>,
    pub(super) fade: SyncMutex<Option<Arc<FadeControl>>>,
}

impl fmt::Debug for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.meta.read();
        f.debug_struct("Light")
            .field("id", &self.id)
            .field("ip", &self.ip)
            .field("name", &meta.name)
            .field("is_default", &meta.is_default)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Light {
    /// Creates a disconnected light from its stored record.
    ///
    /// Call [`refresh_props`](Self::refresh_props) to connect it.
    #[must_use]
    pub fn new(
        record: LightRecord,
        link: Arc<dyn DeviceLink>,
        store: Arc<dyn LightStore>,
        events: EventBus,
        settings: LightSettings,
    ) -> Self {
        tracing::debug!(light_id = %record.id, ip = %record.ip, "creating light");
        Self {
            id: record.id,
            ip: record.ip,
            link,
            store,
            events,
            settings,
            meta: RwLock::new(Metadata {
                name: record.name,
                is_default: record.is_default,
            }),
            persist: Mutex::new(()),
            connected: AtomicBool::new(false),
            last_seen: SyncMutex::new(None),
            live: Mutex::new(None),
            fade: SyncMutex::new(None),
        }
    }

    // ========================================================================
    // Identity and metadata
    // ========================================================================

    /// Store-assigned identifier.
    #[must_use]
    pub fn id(&self) -> LightId {
        self.id
    }

    /// Address of the bulb.
    #[must_use]
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> String {
        self.meta.read().name.clone()
    }

    /// Membership of the default group.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.meta.read().is_default
    }

    /// Whether the bulb answered the last exchange.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Time of the last successful device exchange.
    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        *self.last_seen.lock()
    }

    /// Whether a fade is running.
    #[must_use]
    pub fn is_fading(&self) -> bool {
        self.fade.lock().is_some()
    }

    /// The persisted record of this light.
    #[must_use]
    pub fn record(&self) -> LightRecord {
        let meta = self.meta.read();
        LightRecord {
            id: self.id,
            ip: self.ip.clone(),
            name: meta.name.clone(),
            is_default: meta.is_default,
        }
    }

    /// Renames the light and persists the change.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::NameTooLong` if `name` has more characters than
    /// allowed, or `Error::Store` if persisting fails.
    pub async fn set_name(&self, name: &str) -> Result<()> {
        self.validate_name(name)?;
        self.save_metadata(Some(name), None).await
    }

    /// Adds the light to or removes it from the default group, and persists
    /// the change.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if persisting fails.
    pub async fn set_is_default(&self, is_default: bool) -> Result<()> {
        self.save_metadata(None, Some(is_default)).await
    }

    fn validate_name(&self, name: &str) -> Result<()> {
        let max = self.settings.max_name_length;
        let actual = name.chars().count();
        if actual > max {
            return Err(ValueError::NameTooLong { max, actual }.into());
        }
        Ok(())
    }

    async fn save_metadata(&self, name: Option<&str>, is_default: Option<bool>) -> Result<()> {
        let _guard = self.persist.lock().await;
        let fields = {
            let meta = self.meta.read();
            LightRecordFields {
                ip: self.ip.clone(),
                name: name.map_or_else(|| meta.name.clone(), str::to_string),
                is_default: is_default.unwrap_or(meta.is_default),
            }
        };
        self.store.save_light(self.id, &fields).await?;

        let mut meta = self.meta.write();
        meta.name = fields.name;
        meta.is_default = fields.is_default;
        tracing::info!(light_id = %self.id, name = %meta.name, is_default = meta.is_default, "saved light");
        Ok(())
    }

    // ========================================================================
    // Cached state
    // ========================================================================

    /// Cached brightness, `None` while disconnected.
    pub async fn brightness(&self) -> Option<Brightness> {
        self.live.lock().await.as_ref().map(|s| s.props.brightness_level())
    }

    /// Cached color, `None` while disconnected.
    pub async fn color(&self) -> Option<Color> {
        self.live.lock().await.as_ref().map(|s| s.props.color())
    }

    /// Cached power state, `None` while disconnected.
    pub async fn is_on(&self) -> Option<bool> {
        self.live.lock().await.as_ref().map(|s| s.props.power.is_on())
    }

    /// Running effect, if any.
    pub async fn effect(&self) -> Option<EffectKind> {
        self.live
            .lock()
            .await
            .as_ref()
            .and_then(|s| s.effect.as_ref().map(|e| e.kind))
    }

    /// Snapshot of identity, metadata and (when connected) live state.
    pub async fn dump_props(&self) -> LightSnapshot {
        let live = self.live.lock().await;
        let meta = self.meta.read();
        LightSnapshot {
            id: self.id,
            ip: self.ip.clone(),
            name: meta.name.clone(),
            is_default: meta.is_default,
            is_connected: live.is_some(),
            live: live.as_ref().map(|state| LiveSnapshot {
                brightness: state.props.brightness,
                on: state.props.power.is_on(),
                color: state.props.color(),
                is_flowing: state.props.flowing,
                effect: state.effect.as_ref().map(|e| e.kind),
                effect_props: state
                    .effect
                    .as_ref()
                    .map(|e| e.props.clone())
                    .unwrap_or_default(),
            }),
        }
    }

    /// Reads the live properties from the bulb and overwrites the cache.
    ///
    /// Reconnects a disconnected light. A running effect is forgotten once
    /// the bulb reports it is no longer flowing.
    ///
    /// # Errors
    ///
    /// Returns `Error::LightUnreachable` (and marks the light disconnected)
    /// if the bulb does not answer.
    pub async fn refresh_props(&self) -> Result<()> {
        let mut live = self.live.lock().await;
        tracing::trace!(light_id = %self.id, ip = %self.ip, "refreshing light");
        let result = self.link.get_properties().await;
        let props = self.settle(&mut live, result)?;
        self.apply_props(&mut live, props);
        Ok(())
    }

    // ========================================================================
    // Device commands
    // ========================================================================

    /// Sets the brightness percentage.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidBrightness` unless `1 <= value <= 100`,
    /// or `Error::LightUnreachable`.
    pub async fn set_brightness(&self, value: i64) -> Result<()> {
        let brightness = Brightness::from_input(Some(value))?;
        let mut live = self.live.lock().await;
        self.reconnect_locked(&mut live).await?;

        let result = self.link.set_brightness(brightness).await;
        self.settle(&mut live, result)?;
        if let Some(state) = live.as_mut() {
            state.props.brightness = brightness.value();
        }
        tracing::debug!(light_id = %self.id, %brightness, "set brightness");
        Ok(())
    }

    /// Sets the color from a [`Color`], a hex string or an RGB triple.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidColor` for malformed input, or
    /// `Error::LightUnreachable`.
    pub async fn set_color(&self, color: impl Into<ColorSpec>) -> Result<()> {
        let color = color.into().resolve()?;
        let mut live = self.live.lock().await;
        self.reconnect_locked(&mut live).await?;

        let result = self.link.set_rgb(color).await;
        self.settle(&mut live, result)?;
        if let Some(state) = live.as_mut() {
            state.props.rgb = color.packed();
        }
        tracing::debug!(light_id = %self.id, %color, "set color");
        Ok(())
    }

    /// Turns the light on or off.
    ///
    /// Turning off stops any effect and cancels any fade.
    ///
    /// # Errors
    ///
    /// Returns `Error::LightUnreachable`.
    pub async fn set_power(&self, on: bool) -> Result<()> {
        let mut live = self.live.lock().await;
        self.reconnect_locked(&mut live).await?;

        if !on {
            self.cancel_fade();
        }
        let result = if on {
            self.link.turn_on().await
        } else {
            self.link.turn_off().await
        };
        self.settle(&mut live, result)?;
        if let Some(state) = live.as_mut() {
            state.props.power = Power::from(on);
            if !on {
                state.props.flowing = false;
                self.clear_effect(state);
            }
        }
        tracing::debug!(light_id = %self.id, on, "set power");
        Ok(())
    }

    /// Starts a named effect, replacing any effect or fade in progress.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownEffect` or
    /// `ValueError::InvalidEffectParameters` before touching the bulb, or
    /// `Error::LightUnreachable`.
    pub async fn start_effect(&self, name: &str, props: &EffectProps) -> Result<()> {
        let effect = LightEffect::build(name, props)?;
        let mut live = self.live.lock().await;
        self.reconnect_locked(&mut live).await?;

        self.cancel_fade();
        let flow = effect.to_flow();
        let result = self.link.start_flow(&flow).await;
        self.settle(&mut live, result)?;
        if let Some(state) = live.as_mut() {
            state.props.flowing = true;
            state.effect = Some(ActiveEffect {
                kind: effect.kind(),
                props: props.clone(),
            });
        }
        self.events.publish(LightEvent::EffectChanged {
            light_id: self.id,
            effect: Some(effect.kind()),
        });
        tracing::info!(light_id = %self.id, effect = %effect.kind(), count = flow.count(), "started effect");
        Ok(())
    }

    /// Stops the running effect.
    ///
    /// # Errors
    ///
    /// Returns `Error::LightUnreachable`.
    pub async fn stop_effect(&self) -> Result<()> {
        let mut live = self.live.lock().await;
        self.reconnect_locked(&mut live).await?;
        self.stop_flow_locked(&mut live).await
    }

    /// Starts the named effect, or stops the running one for `None`.
    ///
    /// # Errors
    ///
    /// See [`start_effect`](Self::start_effect) and
    /// [`stop_effect`](Self::stop_effect).
    pub async fn set_effect(&self, name: Option<&str>, props: &EffectProps) -> Result<()> {
        match name {
            Some(name) => self.start_effect(name, props).await,
            None => self.stop_effect().await,
        }
    }

    /// Plays a short one-off flow, such as a notification pulse.
    ///
    /// Replaces any effect or fade in progress. The flow is not recorded as
    /// an effect; with a finite count the bulb returns to its previous state
    /// on its own.
    ///
    /// # Errors
    ///
    /// Returns `Error::LightUnreachable`.
    pub async fn play_flow(&self, flow: &Flow) -> Result<()> {
        let mut live = self.live.lock().await;
        self.reconnect_locked(&mut live).await?;

        self.cancel_fade();
        let result = self.link.start_flow(flow).await;
        self.settle(&mut live, result)?;
        if let Some(state) = live.as_mut() {
            state.props.flowing = true;
            self.clear_effect(state);
        }
        tracing::debug!(light_id = %self.id, count = flow.count(), "played flow");
        Ok(())
    }

    /// Applies a partial update.
    ///
    /// All values are validated before anything is changed. Persisted
    /// fields (`name`, `is_default`) are saved first, then device fields
    /// (`on`, `color`, `brightness`) are sent in that order. With device
    /// fields, a disconnected light is reconnected before anything is saved.
    ///
    /// # Errors
    ///
    /// Returns a `ValueError` for invalid values, `Error::LightUnreachable`
    /// if the bulb does not answer, or `Error::Store` if persisting fails.
    ///
    /// The update is not atomic. If a device field fails, the persisted
    /// fields and any device fields sent before it stay applied.
    pub async fn apply_update(&self, update: &LightUpdate) -> Result<()> {
        if let Some(name) = &update.name {
            self.validate_name(name)?;
        }
        let color = update.color.as_deref().map(Color::from_hex).transpose()?;
        let brightness = update
            .brightness
            .map(|b| Brightness::from_input(Some(b)))
            .transpose()?;

        if update.touches_device() {
            let mut live = self.live.lock().await;
            self.reconnect_locked(&mut live).await?;
        }

        if update.touches_metadata() {
            self.save_metadata(update.name.as_deref(), update.is_default)
                .await?;
        }
        if let Some(on) = update.on {
            self.set_power(on).await?;
        }
        if let Some(color) = color {
            self.set_color(color).await?;
        }
        if let Some(brightness) = brightness {
            self.set_brightness(i64::from(brightness.value())).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Fades
    // ========================================================================

    /// Starts dimming the light down to minimum brightness over `duration`.
    ///
    /// Any running effect is stopped and any previous fade is cancelled.
    /// The fade then runs in the background: each step re-reads the bulb and
    /// gives up silently if anything else changed it. Steps are never closer
    /// together than the device rate limit allows, so short fades take
    /// longer than asked. How the fade ended is published as
    /// [`LightEvent::FadeFinished`].
    ///
    /// # Errors
    ///
    /// Returns `Error::LightUnreachable` if the initial read fails. Failures after this call returns are retried and
    /// reported only through events.
    pub async fn start_fade(self: &Arc<Self>, duration: Duration, turn_off: bool) -> Result<()> {
        let mut live = self.live.lock().await;
        self.reconnect_locked(&mut live).await?;

        self.cancel_fade();
        if live
            .as_ref()
            .is_some_and(|s| s.props.flowing || s.effect.is_some())
        {
            self.stop_flow_locked(&mut live).await?;
        }

        let result = self.link.get_properties().await;
        let props = self.settle(&mut live, result)?;
        self.apply_props(&mut live, props);

        let steps = props.brightness_level().fade_steps();
        let plan = FadePlan::new(
            self.settings.fade.step_interval(duration, steps),
            turn_off,
            &self.settings.fade,
        );
        let interval_ms = u64::try_from(plan.interval.as_millis()).unwrap_or(u64::MAX);
        let control = Arc::new(FadeControl::default());
        *self.fade.lock() = Some(Arc::clone(&control));
        tokio::spawn(fade::run(
            Arc::downgrade(self),
            self.id,
            self.events.clone(),
            control,
            props,
            plan,
        ));

        self.events.publish(LightEvent::FadeStarted {
            light_id: self.id,
            steps,
            interval_ms,
        });
        tracing::info!(light_id = %self.id, steps, interval_ms, turn_off, "started fade");
        Ok(())
    }

    /// Cancels the running fade.
    ///
    /// Once this returns the fade issues no further device command. Returns
    /// `false` if no fade was running.
    pub async fn stop_fade(&self) -> bool {
        if !self.cancel_fade() {
            return false;
        }
        // a step in progress holds the lock; after it the flag is seen
        drop(self.live.lock().await);
        tracing::debug!(light_id = %self.id, "stopped fade");
        true
    }

    /// Flags the fade as cancelled without waiting for it.
    fn cancel_fade(&self) -> bool {
        let control = self.fade.lock().take();
        match control {
            Some(control) => {
                control.cancel();
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn stop_flow_locked(&self, live: &mut Option<LiveState>) -> Result<()> {
        let result = self.link.stop_flow().await;
        self.settle(live, result)?;
        if let Some(state) = live.as_mut() {
            state.props.flowing = false;
            self.clear_effect(state);
        }
        tracing::debug!(light_id = %self.id, "stopped effect");
        Ok(())
    }

    fn clear_effect(&self, state: &mut LiveState) {
        if state.effect.take().is_some() {
            self.events.publish(LightEvent::EffectChanged {
                light_id: self.id,
                effect: None,
            });
        }
    }

    /// Reads the bulb if the light is disconnected.
    async fn reconnect_locked(&self, live: &mut Option<LiveState>) -> Result<()> {
        if live.is_some() {
            return Ok(());
        }
        let result = self.link.get_properties().await;
        let props = self.settle(live, result)?;
        self.apply_props(live, props);
        Ok(())
    }

    fn unreachable(&self, source: DeviceError) -> Error {
        Error::LightUnreachable {
            ip: self.ip.clone(),
            source: Some(source),
        }
    }

    /// Translates a device result: success refreshes `last_seen`, failure
    /// disconnects the light.
    fn settle<T>(
        &self,
        live: &mut Option<LiveState>,
        result: std::result::Result<T, DeviceError>,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                self.touch();
                Ok(value)
            }
            Err(e) => {
                self.mark_disconnected(live, &e);
                Err(self.unreachable(e))
            }
        }
    }

    pub(super) fn touch(&self) {
        *self.last_seen.lock() = Some(Utc::now());
    }

    pub(super) fn mark_disconnected(&self, live: &mut Option<LiveState>, error: &DeviceError) {
        if live.take().is_some() {
            self.connected.store(false, Ordering::SeqCst);
            tracing::warn!(light_id = %self.id, ip = %self.ip, error = %error, "light disconnected");
            self.events
                .publish(LightEvent::disconnected(self.id, Some(error.to_string())));
        }
    }

    fn apply_props(&self, live: &mut Option<LiveState>, props: DeviceProperties) {
        if let Some(state) = live.as_mut() {
            state.props = props;
            if !props.flowing {
                self.clear_effect(state);
            }
            return;
        }
        *live = Some(LiveState {
            props,
            effect: None,
        });
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(light_id = %self.id, ip = %self.ip, "light connected");
        self.events.publish(LightEvent::connected(self.id));
    }
}

impl Drop for Light {
    fn drop(&mut self) {
        if let Some(control) = self.fade.get_mut().take() {
            control.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCommand, SimulatedBulb};
    use crate::store::MemoryStore;
    use serde_json::json;

    struct Fixture {
        light: Arc<Light>,
        bulb: Arc<SimulatedBulb>,
        store: Arc<MemoryStore>,
    }

    async fn fixture() -> Fixture {
        let bulb = Arc::new(SimulatedBulb::new("192.168.0.20", "bedroom"));
        let store = Arc::new(MemoryStore::new());
        let fields = LightRecordFields {
            ip: "192.168.0.20".to_string(),
            name: "bedroom".to_string(),
            is_default: true,
        };
        let id = store.save_new_light(&fields).await.unwrap();
        let record = LightRecord {
            id,
            ip: fields.ip,
            name: fields.name,
            is_default: fields.is_default,
        };
        let light = Arc::new(Light::new(
            record,
            bulb.clone(),
            store.clone(),
            EventBus::new(),
            LightSettings::default(),
        ));
        Fixture { light, bulb, store }
    }

    async fn connected() -> Fixture {
        let f = fixture().await;
        f.light.refresh_props().await.unwrap();
        f.bulb.clear_commands();
        f
    }

    fn props(value: serde_json::Value) -> EffectProps {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn new_light_is_disconnected() {
        let f = fixture().await;
        assert!(!f.light.is_connected());
        assert!(f.light.last_seen().is_none());
        assert!(f.light.dump_props().await.live.is_none());
    }

    #[tokio::test]
    async fn refresh_connects_and_caches() {
        let f = fixture().await;
        f.light.refresh_props().await.unwrap();

        assert!(f.light.is_connected());
        assert!(f.light.last_seen().is_some());
        assert_eq!(f.light.brightness().await, Some(Brightness::new(50).unwrap()));
        assert_eq!(f.light.is_on().await, Some(true));
    }

    #[tokio::test]
    async fn brightness_out_of_range_sends_nothing() {
        let f = connected().await;
        for bad in [0, 101, -5] {
            let err = f.light.set_brightness(bad).await.unwrap_err();
            assert!(matches!(err, Error::Value(ValueError::InvalidBrightness(_))));
        }
        assert_eq!(f.bulb.command_count(), 0);
        assert_eq!(f.light.brightness().await.unwrap().value(), 50);
    }

    #[tokio::test]
    async fn set_color_accepts_every_spec() {
        let f = connected().await;
        f.light.set_color("#FF00FF").await.unwrap();
        assert_eq!(f.light.color().await, Some(Color::new(255, 0, 255)));

        f.light.set_color((0_i64, 255, 0)).await.unwrap();
        assert_eq!(f.bulb.properties().rgb, 0x0000_FF00);

        let err = f.light.set_color((0_i64, 256, 0)).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn device_failure_disconnects_and_clears_live_state() {
        let f = connected().await;
        f.light.start_effect("police", &EffectProps::new()).await.unwrap();

        f.bulb.set_reachable(false);
        let err = f.light.set_brightness(40).await.unwrap_err();
        assert!(err.is_unreachable());
        assert_eq!(err.to_string(), "cannot connect to the smart bulb with IP: 192.168.0.20");

        assert!(!f.light.is_connected());
        let snapshot = f.light.dump_props().await;
        assert!(!snapshot.is_connected);
        assert!(snapshot.live.is_none());
        assert_eq!(f.light.effect().await, None);
    }

    #[tokio::test]
    async fn command_reconnects_a_light_that_came_back() {
        let f = fixture().await;
        f.light.set_power(true).await.unwrap();

        assert!(f.light.is_connected());
        assert_eq!(
            f.bulb.commands(),
            vec![DeviceCommand::GetProperties, DeviceCommand::TurnOn]
        );
    }

    #[tokio::test]
    async fn command_to_a_dead_bulb_is_not_sent() {
        let f = fixture().await;
        f.bulb.set_reachable(false);

        let err = f.light.set_power(true).await.unwrap_err();
        assert!(matches!(err, Error::LightUnreachable { source: Some(_), .. }));
        assert_eq!(f.bulb.commands(), vec![DeviceCommand::GetProperties]);
        assert!(!f.light.is_connected());
    }

    #[tokio::test]
    async fn effects_start_and_stop() {
        let f = connected().await;
        let p = props(json!({"count": 3, "duration": 200}));
        f.light.start_effect("lsd", &p).await.unwrap();

        let live = f.light.dump_props().await.live.unwrap();
        assert!(live.is_flowing);
        assert_eq!(live.effect, Some(EffectKind::Lsd));
        assert_eq!(live.effect_props, p);

        f.light.set_effect(None, &EffectProps::new()).await.unwrap();
        let live = f.light.dump_props().await.live.unwrap();
        assert!(!live.is_flowing);
        assert_eq!(live.effect, None);
        assert!(live.effect_props.is_empty());
        assert_eq!(f.bulb.commands().last(), Some(&DeviceCommand::StopFlow));
    }

    #[tokio::test]
    async fn bad_effect_is_rejected_before_device() {
        let f = connected().await;
        let err = f
            .light
            .start_effect("disco", &props(json!({"unknown_prop": "unknown_value"})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Value(ValueError::InvalidEffectParameters { .. })
        ));
        let err = f.light.start_effect("rave", &EffectProps::new()).await.unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::UnknownEffect(_))));
        assert_eq!(f.bulb.command_count(), 0);
    }

    #[tokio::test]
    async fn power_off_clears_effect() {
        let f = connected().await;
        f.light.start_effect("strobe", &EffectProps::new()).await.unwrap();
        f.light.set_power(false).await.unwrap();

        let live = f.light.dump_props().await.live.unwrap();
        assert!(!live.on);
        assert!(!live.is_flowing);
        assert_eq!(live.effect, None);
    }

    #[tokio::test]
    async fn refresh_forgets_finished_effect() {
        let f = connected().await;
        f.light.start_effect("police", &props(json!({"count": 1}))).await.unwrap();
        f.bulb.stop_flow().await.unwrap();

        f.light.refresh_props().await.unwrap();
        assert_eq!(f.light.effect().await, None);
    }

    #[tokio::test]
    async fn name_is_validated_and_persisted() {
        let f = fixture().await;
        let long = "x".repeat(33);
        let err = f.light.set_name(&long).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Value(ValueError::NameTooLong { max: 32, actual: 33 })
        ));

        f.light.set_name("reading nook").await.unwrap();
        assert_eq!(f.light.name(), "reading nook");
        assert_eq!(f.store.records()[0].name, "reading nook");

        f.light.set_is_default(false).await.unwrap();
        assert!(!f.store.records()[0].is_default);
        assert_eq!(f.store.records()[0].name, "reading nook");
    }

    #[tokio::test]
    async fn name_length_counts_characters() {
        let f = fixture().await;
        let name = "é".repeat(32);
        f.light.set_name(&name).await.unwrap();
        assert_eq!(f.light.name(), name);
    }

    #[tokio::test]
    async fn update_of_metadata_works_while_disconnected() {
        let f = fixture().await;
        let update = LightUpdate {
            name: Some("hall".to_string()),
            is_default: Some(false),
            ..LightUpdate::default()
        };
        f.light.apply_update(&update).await.unwrap();
        assert_eq!(f.light.name(), "hall");
        assert!(!f.light.is_default());
    }

    #[tokio::test]
    async fn update_of_device_fields_needs_connection() {
        let f = fixture().await;
        f.bulb.set_reachable(false);
        let update = LightUpdate {
            name: Some("hall".to_string()),
            brightness: Some(20),
            ..LightUpdate::default()
        };
        let err = f.light.apply_update(&update).await.unwrap_err();
        assert!(err.is_unreachable());
        assert_eq!(f.light.name(), "bedroom");
    }

    #[tokio::test]
    async fn failed_device_field_keeps_saved_metadata() {
        let f = connected().await;
        f.bulb.fail_next(1);
        let update = LightUpdate {
            name: Some("hall".to_string()),
            brightness: Some(20),
            ..LightUpdate::default()
        };

        assert!(f.light.apply_update(&update).await.unwrap_err().is_unreachable());
        assert_eq!(f.light.name(), "hall");
        assert_eq!(f.store.records()[0].name, "hall");
        assert_eq!(f.bulb.properties().brightness, 50);
        assert!(!f.light.is_connected());
    }

    #[tokio::test]
    async fn update_validates_everything_first() {
        let f = connected().await;
        let update = LightUpdate {
            name: Some("hall".to_string()),
            color: Some("#nothex".to_string()),
            ..LightUpdate::default()
        };
        assert!(f.light.apply_update(&update).await.unwrap_err().is_validation());
        assert_eq!(f.light.name(), "bedroom");
        assert_eq!(f.bulb.command_count(), 0);

        let update = LightUpdate {
            on: Some(true),
            color: Some("#00ff64".to_string()),
            brightness: Some(70),
            ..LightUpdate::default()
        };
        f.light.apply_update(&update).await.unwrap();
        assert_eq!(
            f.bulb.commands(),
            vec![
                DeviceCommand::TurnOn,
                DeviceCommand::SetRgb(Color::new(0, 255, 100)),
                DeviceCommand::SetBrightness(70),
            ]
        );
    }

    #[tokio::test]
    async fn events_report_connection_changes() {
        let f = fixture().await;
        let mut rx = f.light.events.subscribe();

        f.light.refresh_props().await.unwrap();
        f.bulb.set_reachable(false);
        let _ = f.light.refresh_props().await;

        assert_eq!(rx.recv().await.unwrap(), LightEvent::connected(f.light.id()));
        let LightEvent::ConnectionChanged { connected, error, .. } = rx.recv().await.unwrap() else {
            panic!("Expected ConnectionChanged event");
        };
        assert!(!connected);
        assert!(error.is_some());
    }

    #[tokio::test]
    async fn played_flow_replaces_effect() {
        let f = connected().await;
        f.light.start_effect("police", &props(json!({}))).await.unwrap();
        f.bulb.clear_commands();

        let flow = Flow::new(3, crate::effect::pulse(Color::new(0, 150, 255), 250));
        f.light.play_flow(&flow).await.unwrap();

        assert_eq!(f.bulb.commands(), vec![DeviceCommand::StartFlow(flow)]);
        assert_eq!(f.light.effect().await, None);
    }
}
