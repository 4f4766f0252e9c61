// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color flow programs executed autonomously by a bulb.
//!
//! A [`Flow`] is a list of [`Transition`]s that the device plays in order,
//! `count` times over (0 loops forever). Once started the host does not
//! drive individual steps.
//!
//! The preset constructors ([`disco`], [`strobe`], [`lsd`], [`police`],
//! [`random_loop`], [`pulse`]) produce the transition lists used by the
//! named effects and by notifications.

use uuid::Uuid;

use crate::types::{Brightness, Color};

/// Shortest transition a bulb accepts, in milliseconds.
pub const MIN_TRANSITION_MS: u32 = 50;

/// What the bulb does after the last loop of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    /// Return to the state before the flow started.
    #[default]
    Recover,
    /// Keep the state of the last transition.
    Stay,
    /// Turn the bulb off.
    Off,
}

/// A single step of a flow.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Transition {
    /// Move to an RGB color.
    Rgb {
        /// Target color.
        color: Color,
        /// Target brightness.
        brightness: Brightness,
        /// Transition time in milliseconds.
        duration_ms: u32,
    },
    /// Move to a hue/saturation pair.
    Hsv {
        /// Hue in degrees (0-359).
        hue: u16,
        /// Saturation percentage (0-100).
        saturation: u8,
        /// Target brightness.
        brightness: Brightness,
        /// Transition time in milliseconds.
        duration_ms: u32,
    },
    /// Hold the current state.
    Sleep {
        /// Hold time in milliseconds.
        duration_ms: u32,
    },
}

impl Transition {
    /// Creates an RGB transition, clamping the duration to the device minimum.
    #[must_use]
    pub fn rgb(color: Color, brightness: Brightness, duration_ms: u32) -> Self {
        Self::Rgb {
            color,
            brightness,
            duration_ms: duration_ms.max(MIN_TRANSITION_MS),
        }
    }

    /// Creates an HSV transition, clamping hue, saturation and duration.
    #[must_use]
    pub fn hsv(hue: u16, saturation: u8, brightness: Brightness, duration_ms: u32) -> Self {
        Self::Hsv {
            hue: hue % 360,
            saturation: saturation.min(100),
            brightness,
            duration_ms: duration_ms.max(MIN_TRANSITION_MS),
        }
    }

    /// Creates a sleep step.
    #[must_use]
    pub fn sleep(duration_ms: u32) -> Self {
        Self::Sleep {
            duration_ms: duration_ms.max(MIN_TRANSITION_MS),
        }
    }

    /// Returns the step duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u32 {
        match self {
            Self::Rgb { duration_ms, .. }
            | Self::Hsv { duration_ms, .. }
            | Self::Sleep { duration_ms } => *duration_ms,
        }
    }
}

/// A device-executed transition program.
///
/// # Examples
///
/// ```
/// use lumenctl::effect::{Flow, FlowAction, police};
///
/// let flow = Flow::new(3, police(300));
/// assert_eq!(flow.count(), 3);
/// assert_eq!(flow.action(), FlowAction::Recover);
/// assert_eq!(flow.transitions().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Flow {
    count: u32,
    action: FlowAction,
    transitions: Vec<Transition>,
}

impl Flow {
    /// Creates a flow that recovers the previous state when it ends.
    #[must_use]
    pub fn new(count: u32, transitions: Vec<Transition>) -> Self {
        Self {
            count,
            action: FlowAction::default(),
            transitions,
        }
    }

    /// Sets the action taken after the flow ends.
    #[must_use]
    pub fn with_action(mut self, action: FlowAction) -> Self {
        self.action = action;
        self
    }

    /// Loop count; 0 runs until stopped.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns true if the flow runs until explicitly stopped.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.count == 0
    }

    /// Action after the last loop.
    #[must_use]
    pub fn action(&self) -> FlowAction {
        self.action
    }

    /// The transitions of one loop.
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Duration of a single loop in milliseconds.
    #[must_use]
    pub fn loop_duration_ms(&self) -> u64 {
        self.transitions
            .iter()
            .map(|t| u64::from(t.duration_ms()))
            .sum()
    }
}

/// Color changes at the given tempo, alternating full and minimum brightness.
#[must_use]
pub fn disco(bpm: u32) -> Vec<Transition> {
    let duration = 60_000 / bpm.max(1);
    [0, 90, 180, 270]
        .into_iter()
        .flat_map(|hue| {
            [
                Transition::hsv(hue, 100, Brightness::MAX, duration),
                Transition::hsv(hue, 100, Brightness::MIN, duration),
            ]
        })
        .collect()
}

/// Fast white flashing.
#[must_use]
pub fn strobe() -> Vec<Transition> {
    vec![
        Transition::hsv(0, 0, Brightness::MAX, MIN_TRANSITION_MS),
        Transition::hsv(0, 0, Brightness::MIN, MIN_TRANSITION_MS),
    ]
}

/// Slow drift through a fixed psychedelic palette.
#[must_use]
pub fn lsd(duration_ms: u32) -> Vec<Transition> {
    [(3, 85), (20, 90), (55, 95), (93, 50), (198, 97)]
        .into_iter()
        .map(|(hue, saturation)| Transition::hsv(hue, saturation, Brightness::MAX, duration_ms))
        .collect()
}

/// Alternating red and blue.
#[must_use]
pub fn police(duration_ms: u32) -> Vec<Transition> {
    vec![
        Transition::rgb(Color::new(255, 0, 0), Brightness::MAX, duration_ms),
        Transition::rgb(Color::new(0, 0, 255), Brightness::MAX, duration_ms),
    ]
}

/// Random hues, `steps` of them (1-9).
///
/// Hues are drawn from the random bytes of a v4 UUID.
#[must_use]
pub fn random_loop(duration_ms: u32, steps: usize) -> Vec<Transition> {
    let bytes = Uuid::new_v4().into_bytes();
    bytes
        .iter()
        .enumerate()
        // bytes 6 and 8 carry the version and variant bits
        .filter(|(i, _)| *i != 6 && *i != 8)
        .map(|(_, byte)| byte)
        .take(steps.clamp(1, 9))
        .map(|byte| {
            let hue = u16::try_from(u32::from(*byte) * 359 / 255).unwrap_or(0);
            Transition::hsv(hue, 100, Brightness::MAX, duration_ms)
        })
        .collect()
}

/// One bright-then-dim pulse of `color`.
#[must_use]
pub fn pulse(color: Color, duration_ms: u32) -> Vec<Transition> {
    vec![
        Transition::rgb(color, Brightness::MAX, duration_ms),
        Transition::rgb(color, Brightness::MIN, duration_ms),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_clamped_to_device_minimum() {
        let t = Transition::rgb(Color::white(), Brightness::MAX, 10);
        assert_eq!(t.duration_ms(), MIN_TRANSITION_MS);
        assert_eq!(Transition::sleep(0).duration_ms(), MIN_TRANSITION_MS);
    }

    #[test]
    fn hsv_is_normalized() {
        let t = Transition::hsv(400, 150, Brightness::MAX, 100);
        assert_eq!(
            t,
            Transition::Hsv {
                hue: 40,
                saturation: 100,
                brightness: Brightness::MAX,
                duration_ms: 100,
            }
        );
    }

    #[test]
    fn disco_alternates_brightness() {
        let steps = disco(120);
        assert_eq!(steps.len(), 8);
        assert!(steps.iter().all(|t| t.duration_ms() == 500));
        assert!(matches!(steps[0], Transition::Hsv { brightness, .. } if brightness == Brightness::MAX));
        assert!(matches!(steps[1], Transition::Hsv { brightness, .. } if brightness == Brightness::MIN));
    }

    #[test]
    fn random_loop_step_count_is_bounded() {
        assert_eq!(random_loop(500, 0).len(), 1);
        assert_eq!(random_loop(500, 5).len(), 5);
        assert_eq!(random_loop(500, 50).len(), 9);
        for t in random_loop(500, 9) {
            assert!(matches!(t, Transition::Hsv { hue, .. } if hue < 360));
        }
    }

    #[test]
    fn random_hues_cover_the_wheel_at_every_step() {
        let mut low = [u16::MAX; 9];
        let mut high = [0_u16; 9];
        for _ in 0..2000 {
            for (step, t) in random_loop(500, 9).into_iter().enumerate() {
                let Transition::Hsv { hue, .. } = t else {
                    panic!("Expected HSV transition");
                };
                low[step] = low[step].min(hue);
                high[step] = high[step].max(hue);
            }
        }
        for (step, (lo, hi)) in low.iter().zip(&high).enumerate() {
            assert!(*lo < 30, "step {step} never below {lo}");
            assert!(*hi > 330, "step {step} never above {hi}");
        }
    }

    #[test]
    fn flow_loop_duration() {
        let flow = Flow::new(0, pulse(Color::new(0, 255, 100), 250)).with_action(FlowAction::Stay);
        assert!(flow.is_infinite());
        assert_eq!(flow.action(), FlowAction::Stay);
        assert_eq!(flow.loop_duration_ms(), 500);
    }

    #[test]
    fn transition_serializes_with_mode_tag() {
        let json = serde_json::to_value(Transition::sleep(100)).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "sleep", "duration_ms": 100}));
    }
}
