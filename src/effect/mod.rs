// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named light effects.
//!
//! An effect is a named, parameterized [`Flow`] that the bulb plays on its
//! own once started. The set of effects is fixed:
//!
//! | Name     | Parameters            | Default duration |
//! |----------|-----------------------|------------------|
//! | `disco`  | `count`               | -                |
//! | `strobe` | `count`               | -                |
//! | `lsd`    | `count`, `duration`   | 1000 ms          |
//! | `police` | `count`, `duration`   | 300 ms           |
//! | `random` | `count`, `duration`   | 500 ms           |
//!
//! `count` is the number of loops, 0 (the default) meaning forever.
//!
//! # Examples
//!
//! ```
//! use lumenctl::effect::{EffectKind, EffectProps, LightEffect};
//! use serde_json::json;
//!
//! let mut props = EffectProps::new();
//! props.insert("count".to_string(), json!(5));
//!
//! let effect = LightEffect::build("police", &props).unwrap();
//! assert_eq!(effect.kind(), EffectKind::Police);
//! assert_eq!(effect.to_flow().count(), 5);
//!
//! assert!(LightEffect::build("rave", &props).is_err());
//! ```

mod flow;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ValueError;

pub use flow::{
    Flow, FlowAction, MIN_TRANSITION_MS, Transition, disco, lsd, police, pulse, random_loop,
    strobe,
};

/// Parameters passed to an effect, as received from callers.
pub type EffectProps = serde_json::Map<String, Value>;

/// Tempo of the disco effect.
const DISCO_BPM: u32 = 120;

/// Number of hues in one loop of the random effect.
const RANDOM_LOOP_STEPS: usize = 9;

/// The known effect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    /// Hue changes to a beat.
    Disco,
    /// White flashing.
    Strobe,
    /// Slow psychedelic palette.
    Lsd,
    /// Red/blue alternation.
    Police,
    /// Random hues.
    #[serde(rename = "random")]
    RandomLoop,
}

impl EffectKind {
    /// All effect variants.
    pub const ALL: [Self; 5] = [
        Self::Disco,
        Self::Strobe,
        Self::Lsd,
        Self::Police,
        Self::RandomLoop,
    ];

    /// The name callers use to select this effect.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disco => "disco",
            Self::Strobe => "strobe",
            Self::Lsd => "lsd",
            Self::Police => "police",
            Self::RandomLoop => "random",
        }
    }

    /// Parameter names this effect accepts.
    #[must_use]
    pub const fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::Disco | Self::Strobe => &["count"],
            Self::Lsd | Self::Police | Self::RandomLoop => &["count", "duration"],
        }
    }

    /// Default per-transition duration in milliseconds, if the effect takes one.
    #[must_use]
    pub const fn default_duration_ms(self) -> Option<u32> {
        match self {
            Self::Disco | Self::Strobe => None,
            Self::Lsd => Some(1000),
            Self::Police => Some(300),
            Self::RandomLoop => Some(500),
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ValueError::UnknownEffect(s.to_string()))
    }
}

/// A fully parameterized effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightEffect {
    /// See [`disco`].
    Disco {
        /// Loop count, 0 for forever.
        count: u32,
    },
    /// See [`strobe`].
    Strobe {
        /// Loop count, 0 for forever.
        count: u32,
    },
    /// See [`lsd`].
    Lsd {
        /// Loop count, 0 for forever.
        count: u32,
        /// Per-transition duration in milliseconds.
        duration_ms: u32,
    },
    /// See [`police`].
    Police {
        /// Loop count, 0 for forever.
        count: u32,
        /// Per-transition duration in milliseconds.
        duration_ms: u32,
    },
    /// See [`random_loop`].
    RandomLoop {
        /// Loop count, 0 for forever.
        count: u32,
        /// Per-transition duration in milliseconds.
        duration_ms: u32,
    },
}

impl LightEffect {
    /// Looks up an effect by name and applies its parameters.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownEffect` for an unrecognized name and
    /// `ValueError::InvalidEffectParameters` for unsupported or malformed
    /// parameters.
    pub fn build(name: &str, props: &EffectProps) -> Result<Self, ValueError> {
        Self::from_props(name.parse()?, props)
    }

    /// Builds an effect of the given kind from caller parameters.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidEffectParameters` if a parameter name is not
    /// supported by `kind` or a value is not a non-negative integer.
    pub fn from_props(kind: EffectKind, props: &EffectProps) -> Result<Self, ValueError> {
        if let Some(unknown) = props.keys().find(|k| !kind.parameters().contains(&k.as_str())) {
            return Err(ValueError::InvalidEffectParameters {
                effect: kind.name().to_string(),
                reason: format!("unexpected parameter '{unknown}'"),
            });
        }

        let count = param(kind, props, "count")?.unwrap_or(0);
        let duration_ms = param(kind, props, "duration")?
            .or(kind.default_duration_ms())
            .unwrap_or(MIN_TRANSITION_MS);

        Ok(match kind {
            EffectKind::Disco => Self::Disco { count },
            EffectKind::Strobe => Self::Strobe { count },
            EffectKind::Lsd => Self::Lsd { count, duration_ms },
            EffectKind::Police => Self::Police { count, duration_ms },
            EffectKind::RandomLoop => Self::RandomLoop { count, duration_ms },
        })
    }

    /// The variant of this effect.
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Disco { .. } => EffectKind::Disco,
            Self::Strobe { .. } => EffectKind::Strobe,
            Self::Lsd { .. } => EffectKind::Lsd,
            Self::Police { .. } => EffectKind::Police,
            Self::RandomLoop { .. } => EffectKind::RandomLoop,
        }
    }

    /// Builds the device program for this effect.
    #[must_use]
    pub fn to_flow(&self) -> Flow {
        match *self {
            Self::Disco { count } => Flow::new(count, disco(DISCO_BPM)),
            Self::Strobe { count } => Flow::new(count, strobe()),
            Self::Lsd { count, duration_ms } => Flow::new(count, lsd(duration_ms)),
            Self::Police { count, duration_ms } => Flow::new(count, police(duration_ms)),
            Self::RandomLoop { count, duration_ms } => {
                Flow::new(count, random_loop(duration_ms, RANDOM_LOOP_STEPS))
            }
        }
    }
}

fn param(kind: EffectKind, props: &EffectProps, name: &str) -> Result<Option<u32>, ValueError> {
    let Some(value) = props.get(name) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .map(Some)
        .ok_or_else(|| ValueError::InvalidEffectParameters {
            effect: kind.name().to_string(),
            reason: format!("'{name}' must be a non-negative integer, got {value}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> EffectProps {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn names_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(kind.name().parse::<EffectKind>().unwrap(), kind);
        }
        assert_eq!(
            "no_such_effect".parse::<EffectKind>(),
            Err(ValueError::UnknownEffect("no_such_effect".to_string()))
        );
    }

    #[test]
    fn defaults_apply_without_props() {
        let empty = EffectProps::new();
        assert_eq!(
            LightEffect::build("lsd", &empty).unwrap(),
            LightEffect::Lsd { count: 0, duration_ms: 1000 }
        );
        assert_eq!(
            LightEffect::build("police", &empty).unwrap(),
            LightEffect::Police { count: 0, duration_ms: 300 }
        );
        assert_eq!(
            LightEffect::build("random", &empty).unwrap(),
            LightEffect::RandomLoop { count: 0, duration_ms: 500 }
        );
        assert_eq!(LightEffect::build("disco", &empty).unwrap(), LightEffect::Disco { count: 0 });
    }

    #[test]
    fn count_and_duration_are_applied() {
        let effect = LightEffect::build("random", &props(json!({"count": 5, "duration": 10}))).unwrap();
        assert_eq!(effect, LightEffect::RandomLoop { count: 5, duration_ms: 10 });

        let flow = effect.to_flow();
        assert_eq!(flow.count(), 5);
        // device minimum applies inside the program
        assert!(flow.transitions().iter().all(|t| t.duration_ms() == MIN_TRANSITION_MS));
    }

    #[test]
    fn unsupported_parameter_names_are_rejected() {
        for kind in EffectKind::ALL {
            let err = LightEffect::from_props(kind, &props(json!({"unknown_prop": "unknown_value"})))
                .unwrap_err();
            assert!(matches!(err, ValueError::InvalidEffectParameters { .. }));
        }
        // duration is not a disco/strobe parameter
        assert!(LightEffect::build("strobe", &props(json!({"duration": 100}))).is_err());
    }

    #[test]
    fn malformed_parameter_values_are_rejected() {
        for bad in [json!(-1), json!("5"), json!(true), json!(null), json!(2.5)] {
            let result = LightEffect::build("police", &props(json!({"count": bad})));
            assert!(
                matches!(result, Err(ValueError::InvalidEffectParameters { .. })),
                "count {bad} should be rejected"
            );
        }
    }

    #[test]
    fn flows_have_expected_shape() {
        let empty = EffectProps::new();
        assert_eq!(LightEffect::build("disco", &empty).unwrap().to_flow().transitions().len(), 8);
        assert_eq!(LightEffect::build("strobe", &empty).unwrap().to_flow().transitions().len(), 2);
        assert_eq!(LightEffect::build("lsd", &empty).unwrap().to_flow().transitions().len(), 5);
        assert_eq!(LightEffect::build("random", &empty).unwrap().to_flow().transitions().len(), 9);
    }
}
