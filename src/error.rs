// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `lumenctl` library.
//!
//! Errors are layered the same way callers handle them:
//!
//! - [`ValueError`]: input validation, raised synchronously and never retried
//! - [`DeviceError`]: failures of the device link for a single bulb
//! - [`StoreError`]: failures of the light metadata store
//! - [`ConfigError`]: failures loading a [`ManagerConfig`](crate::ManagerConfig)
//! - [`Error`]: everything a [`Light`](crate::Light) or
//!   [`LightManager`](crate::LightManager) operation can return

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The light could not be reached. The light is marked disconnected.
    #[error("cannot connect to the smart bulb with IP: {ip}")]
    LightUnreachable {
        /// Address of the light.
        ip: String,
        /// The device-link failure, if a device call was attempted.
        #[source]
        source: Option<DeviceError>,
    },

    /// No light with the given name or id is known.
    #[error("no such light: {0}")]
    NoSuchLight(String),

    /// The default group is empty.
    #[error("no default lights are configured")]
    NoDefaultLights,

    /// No lights are known at all.
    #[error("no lights are available")]
    NoLights,

    /// The metadata store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Network discovery failed as a whole.
    #[error("discovery failed: {0}")]
    Discovery(#[source] DeviceError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns true if the error was caused by invalid caller input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns true if the error means the light is not reachable.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::LightUnreachable { .. })
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A color could not be built from the given input.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A brightness value is outside `[1, 100]` or missing.
    #[error("brightness must be between 1 and 100, got {0}")]
    InvalidBrightness(String),

    /// An effect was given parameters it does not support.
    #[error("props supplied to effect '{effect}' are incorrect: {reason}")]
    InvalidEffectParameters {
        /// The effect name.
        effect: String,
        /// What was wrong with the parameters.
        reason: String,
    },

    /// The effect name is not one of the known variants.
    #[error("no such effect: {0}")]
    UnknownEffect(String),

    /// A light name exceeds the configured maximum length.
    #[error("light name may have a maximum of {max} characters, got {actual}")]
    NameTooLong {
        /// Maximum allowed length in characters.
        max: usize,
        /// Length of the rejected name.
        actual: usize,
    },

    /// A spoken/ISO-8601 duration could not be parsed.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}

/// Errors reported by a device link.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device did not answer.
    #[error("device {0} is unreachable")]
    Unreachable(String),

    /// The device did not answer in time.
    #[error("request to {address} timed out after {millis} ms")]
    Timeout {
        /// Address of the device.
        address: String,
        /// Elapsed time in milliseconds.
        millis: u64,
    },

    /// The device answered with an error.
    #[error("command rejected: {0}")]
    Rejected(String),
}

/// Errors related to the light metadata store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record addressed by id does not exist.
    #[error("light record not found: {0}")]
    NotFound(String),

    /// A record failed validation before being written.
    #[error("invalid light record: {0}")]
    Invalid(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The file that failed.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for the expected shape.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::NameTooLong { max: 10, actual: 12 };
        assert_eq!(
            err.to_string(),
            "light name may have a maximum of 10 characters, got 12"
        );
    }

    #[test]
    fn error_from_value_error() {
        let err: Error = ValueError::UnknownEffect("rave".to_string()).into();
        assert!(matches!(err, Error::Value(ValueError::UnknownEffect(ref n)) if n == "rave"));
        assert!(err.is_validation());
        assert!(!err.is_unreachable());
    }

    #[test]
    fn light_unreachable_keeps_source() {
        use std::error::Error as _;

        let err = Error::LightUnreachable {
            ip: "192.168.0.20".to_string(),
            source: Some(DeviceError::Unreachable("192.168.0.20".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "cannot connect to the smart bulb with IP: 192.168.0.20"
        );
        assert!(err.source().is_some());
        assert!(err.is_unreachable());
    }

    #[test]
    fn device_error_display() {
        let err = DeviceError::Timeout {
            address: "10.0.0.2".to_string(),
            millis: 5000,
        };
        assert_eq!(err.to_string(), "request to 10.0.0.2 timed out after 5000 ms");
    }
}
