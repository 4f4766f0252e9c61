// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::effect::{EffectProps, Flow, LightEffect, pulse};
use crate::error::{Error, Result};
use crate::light::Light;
use crate::manager::LightManager;
use crate::types::{Color, LightId};

use super::duration::parse_spoken_duration;
use super::room::RoomTarget;

/// Number of pulses in a notification.
const NOTIFY_PULSES: u32 = 3;

/// Severity of a notification, shown as a color.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Green.
    Ok,
    /// Blue.
    #[default]
    Info,
    /// Orange.
    Warning,
    /// Red.
    Error,
}

impl NotificationLevel {
    /// The pulse color for this level.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Ok => Color::new(0, 255, 100),
            Self::Info => Color::new(0, 150, 255),
            Self::Warning => Color::new(255, 150, 0),
            Self::Error => Color::new(255, 0, 50),
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Result of a group command: which lights were addressed and which of
/// them failed.
#[derive(Debug, Default)]
pub struct GroupOutcome {
    /// Every light the command was sent to.
    pub lights: Vec<LightId>,
    /// Lights for which the command failed, with the error.
    pub failures: Vec<(LightId, Error)>,
}

impl GroupOutcome {
    /// Returns true if no light failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Lights for which the command succeeded.
    #[must_use]
    pub fn succeeded(&self) -> Vec<LightId> {
        self.lights
            .iter()
            .copied()
            .filter(|id| !self.failures.iter().any(|(failed, _)| failed == id))
            .collect()
    }
}

/// Room-level commands on top of a [`LightManager`].
///
/// Every command first resolves the room with
/// [`LightManager::resolve`]; resolution errors are returned as `Err`.
/// The command then runs on all resolved lights concurrently, and a failing
/// light is recorded in the [`GroupOutcome`] without stopping the others.
#[derive(Debug, Clone)]
pub struct GroupAction {
    manager: LightManager,
}

impl GroupAction {
    /// Creates group commands over `manager`.
    #[must_use]
    pub fn new(manager: LightManager) -> Self {
        Self { manager }
    }

    /// The underlying manager.
    #[must_use]
    pub fn manager(&self) -> &LightManager {
        &self.manager
    }

    /// Starts the named effect with default parameters.
    ///
    /// # Errors
    ///
    /// Returns a resolution error (`NoLights`, `NoDefaultLights`,
    /// `NoSuchLight`), or `ValueError::UnknownEffect` before any light is
    /// touched.
    pub async fn start_effect(&self, room: &RoomTarget, effect: &str) -> Result<GroupOutcome> {
        LightEffect::build(effect, &EffectProps::new())?;
        let lights = self.manager.resolve(room).await?;
        tracing::info!(%room, effect, lights = lights.len(), "starting effect");

        let effect = effect.to_string();
        Ok(for_each(lights, move |light| {
            let effect = effect.clone();
            async move {
                light
                    .set_effect(Some(&effect), &EffectProps::new())
                    .await
            }
        })
        .await)
    }

    /// Stops the running effect.
    ///
    /// # Errors
    ///
    /// Returns a resolution error.
    pub async fn stop_effect(&self, room: &RoomTarget) -> Result<GroupOutcome> {
        let lights = self.manager.resolve(room).await?;
        tracing::info!(%room, lights = lights.len(), "stopping effect");
        Ok(for_each(lights, |light| async move {
            light.set_effect(None, &EffectProps::new()).await
        })
        .await)
    }

    /// Starts a fade over a spoken ISO-8601 duration, or two minutes when
    /// none is given.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidDuration` before any light is touched, or
    /// a resolution error.
    pub async fn start_fade(
        &self,
        room: &RoomTarget,
        spoken_duration: Option<&str>,
        turn_off: bool,
    ) -> Result<GroupOutcome> {
        let duration = parse_spoken_duration(spoken_duration)?;
        self.fade_for(room, duration, turn_off).await
    }

    /// Starts a fade over `duration`.
    ///
    /// # Errors
    ///
    /// Returns a resolution error.
    pub async fn fade_for(
        &self,
        room: &RoomTarget,
        duration: Duration,
        turn_off: bool,
    ) -> Result<GroupOutcome> {
        let lights = self.manager.resolve(room).await?;
        tracing::info!(%room, ?duration, turn_off, lights = lights.len(), "starting fade");
        Ok(for_each(lights, move |light| async move {
            light.start_fade(duration, turn_off).await
        })
        .await)
    }

    /// Cancels running fades.
    ///
    /// # Errors
    ///
    /// Returns a resolution error.
    pub async fn stop_fade(&self, room: &RoomTarget) -> Result<GroupOutcome> {
        let lights = self.manager.resolve(room).await?;
        tracing::info!(%room, lights = lights.len(), "stopping fade");
        Ok(for_each(lights, |light| async move {
            light.stop_fade().await;
            Ok(())
        })
        .await)
    }

    /// Pulses the level color three times.
    ///
    /// # Errors
    ///
    /// Returns a resolution error.
    pub async fn notify(&self, room: &RoomTarget, level: NotificationLevel) -> Result<GroupOutcome> {
        let lights = self.manager.resolve(room).await?;
        let flow = Flow::new(
            NOTIFY_PULSES,
            pulse(level.color(), self.manager.config().notify_duration_ms),
        );
        tracing::info!(%room, %level, lights = lights.len(), "notifying");
        Ok(for_each(lights, move |light| {
            let flow = flow.clone();
            async move { light.play_flow(&flow).await }
        })
        .await)
    }
}

/// Runs `op` on every light concurrently and collects failures.
async fn for_each<F, Fut>(lights: Vec<Arc<Light>>, op: F) -> GroupOutcome
where
    F: Fn(Arc<Light>) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let mut outcome = GroupOutcome {
        lights: lights.iter().map(|l| l.id()).collect(),
        failures: Vec::new(),
    };

    let mut set = JoinSet::new();
    for light in lights {
        let id = light.id();
        let fut = op(light);
        set.spawn(async move { (id, fut.await) });
    }
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((id, Err(e))) => {
                tracing::warn!(light_id = %id, error = %e, "group command failed for light");
                outcome.failures.push((id, e));
            }
            Err(e) => tracing::error!(error = %e, "group command task failed"),
        }
    }
    outcome
}
