// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light event types.

use std::fmt;

use crate::effect::EffectKind;
use crate::types::LightId;

/// How a fade ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeOutcome {
    /// The light reached minimum brightness.
    Completed {
        /// Whether the light was turned off at the end.
        turned_off: bool,
    },
    /// Something else changed the light; the fade gave up silently.
    Interrupted,
    /// The light was found switched off.
    PoweredOff,
    /// The fade was stopped or replaced.
    Cancelled,
    /// The light stopped answering and was marked disconnected.
    Unreachable,
}

impl fmt::Display for FadeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { turned_off: true } => f.write_str("completed, turned off"),
            Self::Completed { turned_off: false } => f.write_str("completed"),
            Self::Interrupted => f.write_str("interrupted"),
            Self::PoweredOff => f.write_str("powered off"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Unreachable => f.write_str("unreachable"),
        }
    }
}

/// Events emitted by lights and the light manager.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LightEvent {
    /// A light was added to the registry.
    LightAdded {
        /// The new light.
        light_id: LightId,
        /// Its address.
        ip: String,
    },

    /// A light became reachable or unreachable.
    ConnectionChanged {
        /// The light.
        light_id: LightId,
        /// Whether the light is now connected.
        connected: bool,
        /// The failure that caused a disconnect.
        error: Option<String>,
    },

    /// An effect was started or stopped.
    EffectChanged {
        /// The light.
        light_id: LightId,
        /// The running effect, `None` once stopped.
        effect: Option<EffectKind>,
    },

    /// A fade began.
    FadeStarted {
        /// The light.
        light_id: LightId,
        /// Number of brightness steps planned.
        steps: u32,
        /// Time between steps in milliseconds.
        interval_ms: u64,
    },

    /// A fade ended.
    FadeFinished {
        /// The light.
        light_id: LightId,
        /// How it ended.
        outcome: FadeOutcome,
    },
}

impl LightEvent {
    /// Returns the light this event is about.
    #[must_use]
    pub fn light_id(&self) -> LightId {
        match self {
            Self::LightAdded { light_id, .. }
            | Self::ConnectionChanged { light_id, .. }
            | Self::EffectChanged { light_id, .. }
            | Self::FadeStarted { light_id, .. }
            | Self::FadeFinished { light_id, .. } => *light_id,
        }
    }

    /// Returns `true` for connection events.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionChanged { .. })
    }

    /// Returns `true` for fade start and end events.
    #[must_use]
    pub fn is_fade(&self) -> bool {
        matches!(self, Self::FadeStarted { .. } | Self::FadeFinished { .. })
    }

    /// Creates a connected event.
    #[must_use]
    pub fn connected(light_id: LightId) -> Self {
        Self::ConnectionChanged {
            light_id,
            connected: true,
            error: None,
        }
    }

    /// Creates a disconnected event with the failure that caused it.
    #[must_use]
    pub fn disconnected(light_id: LightId, error: Option<String>) -> Self {
        Self::ConnectionChanged {
            light_id,
            connected: false,
            error,
        }
    }

    /// Creates a fade finished event.
    #[must_use]
    pub fn fade_finished(light_id: LightId, outcome: FadeOutcome) -> Self {
        Self::FadeFinished { light_id, outcome }
    }
}
