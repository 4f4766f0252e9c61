// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color type with hex and packed-integer conversions.
//!
//! A [`Color`] always holds three channels in `[0, 255]`. It can be built
//! from channel values, from the packed 24-bit integer that bulbs report
//! (`red << 16 | green << 8 | blue`), or from a 6-digit hex string, and all
//! three representations round-trip losslessly.
//!
//! [`ColorSpec`] is the loosely-typed input accepted by
//! [`Light::set_color`](crate::Light::set_color); it is normalized to a
//! [`Color`] before any device command is sent.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ValueError;

/// Largest value a packed 24-bit RGB integer can take.
pub const MAX_PACKED_RGB: i64 = 0x00FF_FFFF;

/// RGB color with 8-bit channels (0-255).
///
/// # Examples
///
/// ```
/// use lumenctl::types::Color;
///
/// let magenta = Color::new(255, 0, 255);
/// assert_eq!(magenta.hex(), "#ff00ff");
/// assert_eq!(magenta.packed(), 0xFF00FF);
///
/// let parsed = Color::from_hex("#FF00ff").unwrap();
/// assert_eq!(parsed, magenta);
///
/// let unpacked = Color::from_packed_int(16_711_935).unwrap();
/// assert_eq!(unpacked.rgb_tuple(), (255, 0, 255));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Creates a new color from in-range channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Creates a color from untyped integer channels.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidColor` if any channel is outside `[0, 255]`.
    pub fn from_channels(red: i64, green: i64, blue: i64) -> Result<Self, ValueError> {
        let channel = |name: &str, value: i64| {
            u8::try_from(value).map_err(|_| {
                ValueError::InvalidColor(format!("{name} channel {value} is out of range [0, 255]"))
            })
        };
        Ok(Self::new(
            channel("red", red)?,
            channel("green", green)?,
            channel("blue", blue)?,
        ))
    }

    /// Unpacks a 24-bit `0xRRGGBB` integer.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidColor` if the value is outside
    /// `[0, 16777215]`.
    pub fn from_packed_int(rgb: i64) -> Result<Self, ValueError> {
        if !(0..=MAX_PACKED_RGB).contains(&rgb) {
            return Err(ValueError::InvalidColor(format!(
                "invalid RGB int value: {rgb}"
            )));
        }
        let [_, red, green, blue] = u32::try_from(rgb)
            .map_err(|_| ValueError::InvalidColor(format!("invalid RGB int value: {rgb}")))?
            .to_be_bytes();
        Ok(Self::new(red, green, blue))
    }

    /// Parses a `#RRGGBB` or `RRGGBB` hex string, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidColor` unless the input is exactly six hex
    /// digits after an optional leading `#`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumenctl::types::Color;
    ///
    /// assert_eq!(Color::from_hex("00ff7f").unwrap().rgb_tuple(), (0, 255, 127));
    /// assert!(Color::from_hex("#fff").is_err());
    /// assert!(Color::from_hex("#gg0000").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ValueError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValueError::InvalidColor(format!(
                "hex color value '{hex}' is invalid"
            )));
        }
        let pair = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ValueError::InvalidColor(format!("hex color value '{hex}' is invalid")))
        };
        Ok(Self::new(pair(0..2)?, pair(2..4)?, pair(4..6)?))
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Returns the channels as a `(red, green, blue)` tuple.
    #[must_use]
    pub const fn rgb_tuple(&self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    /// Returns the packed `0xRRGGBB` value.
    #[must_use]
    pub fn packed(&self) -> u32 {
        u32::from_be_bytes([0, self.red, self.green, self.blue])
    }

    /// Returns the lowercase `#rrggbb` representation.
    #[must_use]
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Pure white.
    #[must_use]
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl FromStr for Color {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.hex()
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

/// Builds a color from dynamic (JSON) input.
///
/// Accepted shapes are a hex string, a `[r, g, b]` array of integers and a
/// `{"red": r, "green": g, "blue": b}` object. Booleans, `null`, floats and
/// anything else are rejected.
impl TryFrom<&Value> for Color {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(hex) => Self::from_hex(hex),
            Value::Array(items) if items.len() == 3 => Self::from_channels(
                json_channel(&items[0])?,
                json_channel(&items[1])?,
                json_channel(&items[2])?,
            ),
            Value::Object(map) => {
                let field = |name: &str| {
                    map.get(name)
                        .ok_or_else(|| ValueError::InvalidColor(format!("missing '{name}' channel")))
                        .and_then(json_channel)
                };
                Self::from_channels(field("red")?, field("green")?, field("blue")?)
            }
            other => Err(ValueError::InvalidColor(format!(
                "color must be a hex string or RGB triple, got {other}"
            ))),
        }
    }
}

fn json_channel(value: &Value) -> Result<i64, ValueError> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => n
            .as_i64()
            .ok_or_else(|| ValueError::InvalidColor(format!("channel {n} is out of range"))),
        other => Err(ValueError::InvalidColor(format!(
            "channel must be an integer, got {other}"
        ))),
    }
}

/// Color input accepted by [`Light::set_color`](crate::Light::set_color).
///
/// # Examples
///
/// ```
/// use lumenctl::types::{Color, ColorSpec};
///
/// let from_hex: ColorSpec = "#00ff00".into();
/// let from_triple: ColorSpec = (0, 255, 0).into();
/// assert_eq!(from_hex.resolve().unwrap(), Color::new(0, 255, 0));
/// assert_eq!(from_triple.resolve().unwrap(), Color::new(0, 255, 0));
/// assert!(ColorSpec::Rgb(0, 256, 0).resolve().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpec {
    /// An already validated color.
    Color(Color),
    /// A hex string, `#rrggbb` or `rrggbb`.
    Hex(String),
    /// An unvalidated `(red, green, blue)` triple.
    Rgb(i64, i64, i64),
}

impl ColorSpec {
    /// Normalizes the input to a [`Color`].
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidColor` if the input does not describe a
    /// valid color.
    pub fn resolve(&self) -> Result<Color, ValueError> {
        match self {
            Self::Color(color) => Ok(*color),
            Self::Hex(hex) => Color::from_hex(hex),
            Self::Rgb(red, green, blue) => Color::from_channels(*red, *green, *blue),
        }
    }
}

impl From<Color> for ColorSpec {
    fn from(color: Color) -> Self {
        Self::Color(color)
    }
}

impl From<&str> for ColorSpec {
    fn from(hex: &str) -> Self {
        Self::Hex(hex.to_string())
    }
}

impl From<String> for ColorSpec {
    fn from(hex: String) -> Self {
        Self::Hex(hex)
    }
}

impl From<(i64, i64, i64)> for ColorSpec {
    fn from((red, green, blue): (i64, i64, i64)) -> Self {
        Self::Rgb(red, green, blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_and_packed_round_trip() {
        let samples = [(0, 0, 0), (255, 255, 255), (255, 0, 255), (1, 2, 3), (18, 52, 86)];

        for (r, g, b) in samples {
            let color = Color::new(r, g, b);
            assert_eq!(Color::from_hex(&color.hex()).unwrap().rgb_tuple(), (r, g, b));
            assert_eq!(
                Color::from_packed_int(i64::from(color.packed()))
                    .unwrap()
                    .rgb_tuple(),
                (r, g, b)
            );
        }
    }

    #[test]
    fn packed_layout() {
        let color = Color::from_packed_int(256).unwrap();
        assert_eq!(color.rgb_tuple(), (0, 1, 0));
        assert_eq!(Color::new(0x12, 0x34, 0x56).packed(), 0x0012_3456);
    }

    #[test]
    fn packed_out_of_range() {
        assert!(Color::from_packed_int(-1).is_err());
        assert!(Color::from_packed_int(16_777_216).is_err());
        assert!(Color::from_packed_int(16_777_215).is_ok());
        assert!(Color::from_packed_int(0).is_ok());
    }

    #[test]
    fn hex_accepts_hash_and_any_case() {
        assert_eq!(Color::from_hex("#AbCdEf").unwrap(), Color::new(0xAB, 0xCD, 0xEF));
        assert_eq!(Color::from_hex("abcdef").unwrap(), Color::new(0xAB, 0xCD, 0xEF));
    }

    #[test]
    fn hex_rejects_malformed() {
        for bad in ["", "#", "#fff", "#ff00ff00", "##ff00ff", "+f00ff0", "#gg0000", "ff 0ff"] {
            assert!(
                matches!(Color::from_hex(bad), Err(ValueError::InvalidColor(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn channels_out_of_range() {
        assert!(Color::from_channels(-1, 0, 0).is_err());
        assert!(Color::from_channels(0, 256, 0).is_err());
        assert!(Color::from_channels(0, 0, 1000).is_err());
        assert_eq!(Color::from_channels(255, 0, 10).unwrap(), Color::new(255, 0, 10));
    }

    #[test]
    fn json_rejects_non_integer_channels() {
        for bad in [
            json!(true),
            json!(false),
            json!(null),
            json!({"some": "dict"}),
            json!([true, 0, 0]),
            json!([null, 0, 0]),
            json!([1.5, 0, 0]),
            json!([0, 0]),
            json!(42),
        ] {
            assert!(
                matches!(Color::try_from(&bad), Err(ValueError::InvalidColor(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn json_accepts_supported_shapes() {
        let expected = Color::new(10, 20, 30);
        assert_eq!(Color::try_from(&json!("#0a141e")).unwrap(), expected);
        assert_eq!(Color::try_from(&json!([10, 20, 30])).unwrap(), expected);
        assert_eq!(
            Color::try_from(&json!({"red": 10, "green": 20, "blue": 30})).unwrap(),
            expected
        );
    }

    #[test]
    fn serde_uses_hex_string() {
        let color = Color::new(255, 0, 255);
        assert_eq!(serde_json::to_value(color).unwrap(), json!("#ff00ff"));
        let back: Color = serde_json::from_value(json!("#FF00FF")).unwrap();
        assert_eq!(back, color);
        assert!(serde_json::from_value::<Color>(json!("nope")).is_err());
    }

    #[test]
    fn color_spec_resolves() {
        assert_eq!(
            ColorSpec::from(Color::white()).resolve().unwrap(),
            Color::white()
        );
        assert!(ColorSpec::from("zzzzzz").resolve().is_err());
        assert!(ColorSpec::from((0, 0, -5)).resolve().is_err());
    }
}
