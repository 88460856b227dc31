// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform-level configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::DeviceEntry;
use crate::error::Result;

/// Name the plugin is registered under.
pub const PLUGIN_NAME: &str = "homebridge-tauron-elicznik";

/// Name of the platform inside the plugin.
pub const PLATFORM_NAME: &str = "tauroneLicznik";

/// The platform block of the bridge configuration.
///
/// A missing `devices` list is not an error; the registrar then stays inert.
/// A `devices` value that is not a list is treated as missing, and list
/// entries that do not have the shape of a device are dropped with a warning.
///
/// # Examples
///
/// ```
/// use elicznik_bridge::config::PlatformConfig;
///
/// let config: PlatformConfig = serde_json::from_str(
///     r#"{"platform": "tauroneLicznik", "devices": [{"name": "Meter1"}]}"#,
/// ).unwrap();
/// assert_eq!(config.devices.unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Platform identifier, normally [`PLATFORM_NAME`].
    #[serde(default)]
    pub platform: Option<String>,
    /// Configured devices.
    #[serde(default, deserialize_with = "lenient_devices")]
    pub devices: Option<Vec<DeviceEntry>>,
}

fn lenient_devices<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<DeviceEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Ok(None),
        Some(other) => {
            tracing::warn!(found = %other, "devices is not a list, ignoring it");
            return Ok(None);
        }
    };

    let entries = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match DeviceEntry::deserialize(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(index, error = %e, "Invalid device entry, skipped");
                None
            }
        })
        .collect();
    Ok(Some(entries))
}

impl PlatformConfig {
    /// Creates a platform configuration from device entries.
    #[must_use]
    pub fn with_devices(devices: Vec<DeviceEntry>) -> Self {
        Self {
            platform: Some(PLATFORM_NAME.to_string()),
            devices: Some(devices),
        }
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(crate::error::ParseError::from)?)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), "Loaded platform configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_devices_is_none() {
        let config = PlatformConfig::from_json(r#"{"platform": "tauroneLicznik"}"#).unwrap();
        assert!(config.devices.is_none());
    }

    #[test]
    fn devices_that_are_not_a_list_are_none() {
        for json in [
            r#"{"devices": {"name": "A"}}"#,
            r#"{"devices": "Meter1"}"#,
            r#"{"devices": 3}"#,
            r#"{"devices": null}"#,
        ] {
            let config = PlatformConfig::from_json(json).unwrap();
            assert!(config.devices.is_none(), "{json}");
        }
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let config = PlatformConfig::from_json(
            r#"{"devices": [
                {"name": "Good"},
                {"name": "Fractional", "refreshInterval": 2.5},
                {"name": "Text", "refreshInterval": "30"},
                {"name": 42},
                "Meter9",
                {"name": "Flag", "disableLogInfo": "yes"}
            ]}"#,
        )
        .unwrap();

        let names: Vec<_> = config
            .devices
            .unwrap()
            .into_iter()
            .map(|d| d.name.unwrap())
            .collect();
        assert_eq!(names, ["Good", "Fractional", "Text"]);
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(PlatformConfig::from_json("{").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"devices": [{"name": "Meter1"}, {"meterId": "42"}]}"#,
        )
        .unwrap();

        let config = PlatformConfig::load(&path).unwrap();
        let devices = config.devices.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name.as_deref(), Some("Meter1"));
        assert!(devices[1].name.is_none());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = PlatformConfig::load("/nonexistent/elicznik/config.json");
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
