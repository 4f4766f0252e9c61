// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type and the fade decay function.
//!
//! Lights accept brightness as a percentage in `[1, 100]`; zero is not a
//! valid level (a light that should be dark is turned off instead).

use std::fmt;

use crate::error::ValueError;

/// Brightness level as a percentage (1-100).
///
/// # Examples
///
/// ```
/// use lumenctl::types::Brightness;
///
/// let half = Brightness::new(50).unwrap();
/// assert_eq!(half.value(), 50);
///
/// assert!(Brightness::new(0).is_err());
/// assert!(Brightness::new(101).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Brightness(u8);

impl Brightness {
    /// Minimum brightness (1%).
    pub const MIN: Self = Self(1);

    /// Maximum brightness (100%).
    pub const MAX: Self = Self(100);

    /// Creates a new brightness value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidBrightness` if the value is outside `[1, 100]`.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if (1..=100).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValueError::InvalidBrightness(value.to_string()))
        }
    }

    /// Validates untyped input, treating a missing value as invalid.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidBrightness` for `None` or values outside
    /// `[1, 100]`.
    pub fn from_input(value: Option<i64>) -> Result<Self, ValueError> {
        let Some(raw) = value else {
            return Err(ValueError::InvalidBrightness("none".to_string()));
        };
        u8::try_from(raw)
            .map_err(|_| ValueError::InvalidBrightness(raw.to_string()))
            .and_then(Self::new)
    }

    /// Creates a brightness from a device report, clamping into `[1, 100]`.
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value < 1 {
            Self(1)
        } else if value > 100 {
            Self(100)
        } else {
            Self(value)
        }
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns true at the lowest level.
    #[must_use]
    pub const fn is_min(&self) -> bool {
        self.0 <= 1
    }

    /// Returns the next level of a fade.
    ///
    /// Each step removes a tenth of the current level (rounded half up, at
    /// least 1). The result is floored at 1 and capped at 99, so the sequence
    /// is strictly decreasing until it reaches 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumenctl::types::Brightness;
    ///
    /// let b = Brightness::MAX.decay();
    /// assert_eq!(b.value(), 90);
    /// assert_eq!(b.decay().value(), 81);
    /// assert_eq!(Brightness::new(4).unwrap().decay().value(), 3);
    /// assert_eq!(Brightness::MIN.decay(), Brightness::MIN);
    /// ```
    #[must_use]
    pub fn decay(self) -> Self {
        let step = ((self.0 + 5) / 10).max(1);
        Self(self.0.saturating_sub(step).clamp(1, 99))
    }

    /// Number of [`decay`](Self::decay) steps needed to reach the minimum.
    #[must_use]
    pub fn fade_steps(self) -> u32 {
        let mut current = self;
        let mut steps = 0;
        while !current.is_min() {
            current = current.decay();
            steps += 1;
        }
        steps
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Brightness> for u8 {
    fn from(value: Brightness) -> Self {
        value.0
    }
}
