// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Default polling period in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Longest accepted polling period; longer values are clamped to it.
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const DEFAULT_MANUFACTURER: &str = "Tauron";
const DEFAULT_MODEL_NAME: &str = "eLicznik";
const DEFAULT_SERIAL_NUMBER: &str = "Serial Number";
const DEFAULT_FIRMWARE_REVISION: &str = "Firmware Revision";

/// One entry of the `devices` list as it appears in the plugin configuration.
///
/// Every field is optional at this stage; [`DeviceEntry::into_config`] applies
/// defaults and rejects entries without a name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    /// Accessory name.
    #[serde(default)]
    pub name: Option<String>,
    /// Portal user name.
    #[serde(default)]
    pub user: Option<String>,
    /// Portal password.
    #[serde(default)]
    pub passwd: Option<String>,
    /// Meter identifier at the portal.
    #[serde(default)]
    pub meter_id: Option<String>,
    /// Polling period in seconds. Fractions and numeric strings are accepted.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub refresh_interval: Option<f64>,
    /// Base URL of the portal.
    #[serde(default)]
    pub portal_url: Option<String>,
    /// Manufacturer shown in the accessory information.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Model shown in the accessory information.
    #[serde(default)]
    pub model_name: Option<String>,
    /// Serial number shown in the accessory information.
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Firmware revision shown in the accessory information.
    #[serde(default)]
    pub firmware_revision: Option<String>,
    /// Suppresses the informational log line on every characteristic read.
    #[serde(default)]
    pub disable_log_info: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(f64),
    Text(String),
}

/// Reads a number of seconds given either as a JSON number or a string.
/// Unparseable strings read as unset.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Seconds>::deserialize(deserializer)? {
        Some(Seconds::Number(secs)) => Some(secs),
        Some(Seconds::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

/// Turns a configured number of seconds into a usable period.
///
/// Non-finite or non-positive values yield `None`; long ones are clamped to
/// [`MAX_REFRESH_INTERVAL`].
fn refresh_period(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    let period = Duration::from_secs_f64(secs.min(MAX_REFRESH_INTERVAL.as_secs_f64()));
    (!period.is_zero()).then_some(period)
}

impl DeviceEntry {
    /// Validates the entry and fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingName`] when the name is absent or blank.
    pub fn into_config(self) -> Result<DeviceConfig, ConfigError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(ConfigError::MissingName)?;

        let credentials = match (self.user, self.passwd) {
            (Some(user), Some(passwd)) => Some(Credentials { user, passwd }),
            _ => None,
        };

        Ok(DeviceConfig {
            name,
            credentials,
            meter_id: self.meter_id.unwrap_or_default(),
            // unusable values fall back to the default, as an unset value would
            refresh_interval: self
                .refresh_interval
                .and_then(refresh_period)
                .unwrap_or(Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS)),
            portal_url: self.portal_url.filter(|u| !u.is_empty()),
            manufacturer: self
                .manufacturer
                .unwrap_or_else(|| DEFAULT_MANUFACTURER.to_string()),
            model_name: self
                .model_name
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            serial_number: self
                .serial_number
                .unwrap_or_else(|| DEFAULT_SERIAL_NUMBER.to_string()),
            firmware_revision: self
                .firmware_revision
                .unwrap_or_else(|| DEFAULT_FIRMWARE_REVISION.to_string()),
            disable_log_info: self.disable_log_info,
        })
    }
}

/// Portal credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name.
    pub user: String,
    /// Password.
    pub passwd: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("passwd", &"***")
            .finish()
    }
}

/// Validated configuration of one metered device.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use elicznik_bridge::config::DeviceConfig;
///
/// let config = DeviceConfig::new("Meter1")
///     .with_meter_id("12345")
///     .with_refresh_interval(10);
///
/// assert_eq!(config.refresh_interval(), Duration::from_secs(10));
/// assert_eq!(config.manufacturer, "Tauron");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Accessory name.
    pub name: String,
    /// Portal credentials, if both user and password were given.
    pub credentials: Option<Credentials>,
    /// Meter identifier at the portal.
    pub meter_id: String,
    refresh_interval: Duration,
    /// Base URL of the portal. Without it the device serves static readings.
    pub portal_url: Option<String>,
    /// Manufacturer shown in the accessory information.
    pub manufacturer: String,
    /// Model shown in the accessory information.
    pub model_name: String,
    /// Serial number shown in the accessory information.
    pub serial_number: String,
    /// Firmware revision shown in the accessory information.
    pub firmware_revision: String,
    /// Suppresses the informational log line on every characteristic read.
    pub disable_log_info: bool,
}

impl DeviceConfig {
    /// Creates a configuration with defaults for everything but the name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credentials: None,
            meter_id: String::new(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            portal_url: None,
            manufacturer: DEFAULT_MANUFACTURER.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            serial_number: DEFAULT_SERIAL_NUMBER.to_string(),
            firmware_revision: DEFAULT_FIRMWARE_REVISION.to_string(),
            disable_log_info: false,
        }
    }

    /// Sets the meter identifier.
    #[must_use]
    pub fn with_meter_id(mut self, meter_id: impl Into<String>) -> Self {
        self.meter_id = meter_id.into();
        self
    }

    /// Sets the portal credentials.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, passwd: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            user: user.into(),
            passwd: passwd.into(),
        });
        self
    }

    /// Sets the polling period in seconds. Zero keeps the default; values
    /// above [`MAX_REFRESH_INTERVAL`] are clamped.
    #[must_use]
    pub fn with_refresh_interval(mut self, secs: u64) -> Self {
        if secs > 0 {
            self.refresh_interval = Duration::from_secs(secs).min(MAX_REFRESH_INTERVAL);
        }
        self
    }

    /// Sets the portal base URL.
    #[must_use]
    pub fn with_portal_url(mut self, url: impl Into<String>) -> Self {
        self.portal_url = Some(url.into());
        self
    }

    /// Disables the log line written on every characteristic read.
    #[must_use]
    pub fn with_log_info_disabled(mut self) -> Self {
        self.disable_log_info = true;
        self
    }

    /// Returns the polling period. Never zero.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}
