// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-driven brightness fades.
//!
//! A fade is one spawned task per light. Every step takes the light lock,
//! checks the cancellation flag, re-reads the bulb and compares the reading
//! with what the previous step left behind. Any difference means someone
//! else touched the light and the fade ends quietly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Notify;

use crate::device::{DeviceProperties, Power};
use crate::error::DeviceError;
use crate::event::{EventBus, FadeOutcome, LightEvent};
use crate::manager::FadeConfig;
use crate::types::LightId;

use super::Light;
use super::entity::LiveState;

/// Cancellation flag shared by a light and its fade task.
#[derive(Debug, Default)]
pub(super) struct FadeControl {
    cancelled: AtomicBool,
    wake: Notify,
}

impl FadeControl {
    pub(super) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` unless cancelled first.
    async fn sleep(&self, duration: Duration) {
        if self.is_cancelled() {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => {}
            () = self.wake.notified() => {}
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct FadePlan {
    pub(super) interval: Duration,
    turn_off: bool,
    retries: u32,
    retry_delay: Duration,
}

impl FadePlan {
    pub(super) fn new(interval: Duration, turn_off: bool, config: &FadeConfig) -> Self {
        Self {
            interval,
            turn_off,
            retries: config.retries,
            retry_delay: config.retry_delay(),
        }
    }
}

enum Tick {
    Continue,
    Done(FadeOutcome),
}

/// Body of the fade task.
pub(super) async fn run(
    light: Weak<Light>,
    light_id: LightId,
    events: EventBus,
    control: Arc<FadeControl>,
    mut expected: DeviceProperties,
    plan: FadePlan,
) {
    loop {
        let Some(strong) = light.upgrade() else {
            tracing::debug!(%light_id, "light dropped, fade ends");
            events.publish(LightEvent::fade_finished(light_id, FadeOutcome::Cancelled));
            return;
        };
        if let Tick::Done(outcome) = tick(&strong, &control, &mut expected, &plan).await {
            finish(&strong, &control, outcome);
            return;
        }
        drop(strong);
        control.sleep(plan.interval).await;
    }
}

async fn tick(
    light: &Light,
    control: &FadeControl,
    expected: &mut DeviceProperties,
    plan: &FadePlan,
) -> Tick {
    let mut attempt = 0;
    loop {
        let mut live = light.live.lock().await;
        if control.is_cancelled() {
            return Tick::Done(FadeOutcome::Cancelled);
        }
        if live.is_none() {
            return Tick::Done(FadeOutcome::Unreachable);
        }

        match step(light, &mut live, expected, plan.turn_off).await {
            Ok(tick) => return tick,
            Err(e) if attempt < plan.retries => {
                drop(live);
                attempt += 1;
                tracing::warn!(light_id = %light.id, attempt, error = %e, "fade step failed, retrying");
                control.sleep(plan.retry_delay).await;
            }
            Err(e) => {
                tracing::error!(light_id = %light.id, ip = %light.ip, error = %e, "fade step failed, giving up");
                light.mark_disconnected(&mut live, &e);
                return Tick::Done(FadeOutcome::Unreachable);
            }
        }
    }
}

async fn step(
    light: &Light,
    live: &mut Option<LiveState>,
    expected: &mut DeviceProperties,
    turn_off: bool,
) -> Result<Tick, DeviceError> {
    let props = light.link.get_properties().await?;
    light.touch();

    if props != *expected {
        tracing::debug!(light_id = %light.id, ?props, ?expected, "light changed during fade");
        return Ok(Tick::Done(FadeOutcome::Interrupted));
    }
    if !props.power.is_on() {
        return Ok(Tick::Done(FadeOutcome::PoweredOff));
    }

    let current = props.brightness_level();
    if current.is_min() {
        if turn_off {
            light.link.turn_off().await?;
            if let Some(state) = live.as_mut() {
                state.props.power = Power::Off;
            }
        }
        return Ok(Tick::Done(FadeOutcome::Completed {
            turned_off: turn_off,
        }));
    }

    let next = current.decay();
    light.link.set_brightness(next).await?;
    light.touch();
    expected.brightness = next.value();
    if let Some(state) = live.as_mut() {
        state.props = *expected;
    }
    tracing::trace!(light_id = %light.id, brightness = %next, "fade step");
    Ok(Tick::Continue)
}

fn finish(light: &Light, control: &Arc<FadeControl>, outcome: FadeOutcome) {
    {
        let mut slot = light.fade.lock();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, control)) {
            *slot = None;
        }
    }
    match outcome {
        FadeOutcome::Unreachable => {
            tracing::error!(light_id = %light.id, "fade aborted, light unreachable");
        }
        FadeOutcome::Completed { .. } => tracing::info!(light_id = %light.id, %outcome, "fade finished"),
        _ => tracing::debug!(light_id = %light.id, %outcome, "fade finished"),
    }
    light
        .events
        .publish(LightEvent::fade_finished(light.id, outcome));
}
