// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration for the light manager and the fade engine.

use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Settings of a [`LightManager`](crate::LightManager).
///
/// Every field has a default, so a JSON file only needs the keys it
/// overrides.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lumenctl::manager::ManagerConfig;
///
/// let config = ManagerConfig::default()
///     .with_discovery_interval(Duration::from_secs(120))
///     .with_max_light_name_length(20);
/// assert_eq!(config.refresh_interval(), Duration::from_secs(30));
///
/// let parsed = ManagerConfig::from_json_str(r#"{"discovery_workers": 2}"#).unwrap();
/// assert_eq!(parsed.discovery_workers, 2);
/// assert_eq!(parsed.max_light_name_length, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Longest accepted light name, in characters.
    pub max_light_name_length: usize,
    /// Seconds between discovery cycles.
    pub discovery_interval_secs: u64,
    /// Seconds between refresh passes.
    pub refresh_interval_secs: u64,
    /// Candidates probed concurrently during discovery.
    pub discovery_workers: usize,
    /// Duration of one notification pulse transition, in milliseconds.
    pub notify_duration_ms: u32,
    /// Fade pacing and retries.
    pub fade: FadeConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_light_name_length: 32,
            discovery_interval_secs: 60,
            refresh_interval_secs: 30,
            discovery_workers: 8,
            notify_duration_ms: 250,
            fade: FadeConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Json` if it does not parse.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&contents)?;
        tracing::info!(path = %path.display(), "loaded manager configuration");
        Ok(config)
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the text does not parse.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Time between discovery cycles.
    #[must_use]
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs.max(1))
    }

    /// Time between refresh passes.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// Sets the maximum light name length.
    #[must_use]
    pub fn with_max_light_name_length(mut self, max: usize) -> Self {
        self.max_light_name_length = max;
        self
    }

    /// Sets the discovery interval (whole seconds, at least one).
    #[must_use]
    pub fn with_discovery_interval(mut self, interval: Duration) -> Self {
        self.discovery_interval_secs = interval.as_secs().max(1);
        self
    }

    /// Sets the refresh interval (whole seconds, at least one).
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval_secs = interval.as_secs().max(1);
        self
    }

    /// Sets how many discovery candidates are probed at once.
    #[must_use]
    pub fn with_discovery_workers(mut self, workers: usize) -> Self {
        self.discovery_workers = workers.max(1);
        self
    }

    /// Sets the notification pulse duration.
    #[must_use]
    pub fn with_notify_duration_ms(mut self, millis: u32) -> Self {
        self.notify_duration_ms = millis;
        self
    }

    /// Sets the fade settings.
    #[must_use]
    pub fn with_fade(mut self, fade: FadeConfig) -> Self {
        self.fade = fade;
        self
    }
}

/// Pacing and retry settings of the fade engine.
///
/// Bulbs limit how many commands they accept per minute. A fade step costs
/// `calls_per_step` commands (one read, one write), so steps are never
/// closer together than `60 s * calls_per_step / max_calls_per_minute`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lumenctl::manager::FadeConfig;
///
/// let fade = FadeConfig::default();
/// assert_eq!(fade.min_interval(), Duration::from_secs(2));
///
/// // 31 steps over 2 minutes is slower than the rate limit
/// assert_eq!(fade.step_interval(Duration::from_secs(120), 31), Duration::from_secs(120) / 31);
/// // 31 steps over 10 seconds is not
/// assert_eq!(fade.step_interval(Duration::from_secs(10), 31), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    /// Commands a bulb accepts per minute.
    pub max_calls_per_minute: u32,
    /// Commands issued per fade step.
    pub calls_per_step: u32,
    /// Extra attempts for a failed step.
    pub retries: u32,
    /// Delay before retrying a failed step, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            max_calls_per_minute: 60,
            calls_per_step: 2,
            retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl FadeConfig {
    /// Shortest allowed time between two steps.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(60) * self.calls_per_step / self.max_calls_per_minute.max(1)
    }

    /// Time between steps for a fade of `duration` in `steps` steps.
    #[must_use]
    pub fn step_interval(&self, duration: Duration, steps: u32) -> Duration {
        (duration / steps.max(1)).max(self.min_interval())
    }

    /// Delay before retrying a failed step.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Sets the device rate limit.
    #[must_use]
    pub fn with_max_calls_per_minute(mut self, calls: u32) -> Self {
        self.max_calls_per_minute = calls;
        self
    }

    /// Sets the number of retries per step.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
