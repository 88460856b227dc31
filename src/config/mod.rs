// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plugin configuration.
//!
//! The host hands the plugin a JSON block with a `devices` list. Each entry is
//! deserialized into a [`DeviceEntry`] and turned into a validated
//! [`DeviceConfig`] by the registrar.

mod device_config;
mod platform_config;

pub use device_config::{
    Credentials, DEFAULT_REFRESH_INTERVAL_SECS, DeviceConfig, DeviceEntry, MAX_REFRESH_INTERVAL,
};
pub use platform_config::{PLATFORM_NAME, PLUGIN_NAME, PlatformConfig};
