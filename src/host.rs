// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The host bridge framework, as seen from the plugin.

use std::path::PathBuf;

use parking_lot::Mutex;

use crate::hap::PlatformAccessory;

/// Operations the plugin consumes from the bridge it runs in.
///
/// The host owns pairing, persistence of accessories and the connection to
/// the controller. It calls back into the plugin through
/// [`PlatformRegistrar`](crate::platform::PlatformRegistrar).
pub trait Host: Send + Sync + 'static {
    /// Returns the per-install storage directory.
    fn storage_path(&self) -> PathBuf;

    /// Publishes accessories that are exposed as standalone devices.
    fn publish_external_accessories(&self, plugin_name: &str, accessories: Vec<PlatformAccessory>);

    /// Forgets previously registered accessories.
    fn unregister_platform_accessories(
        &self,
        plugin_name: &str,
        platform_name: &str,
        accessories: &[PlatformAccessory],
    );
}

/// A host that keeps published accessories in memory and logs every call.
///
/// Used by the standalone runner in place of a real bridge.
#[derive(Debug)]
pub struct LoggingHost {
    storage_path: PathBuf,
    published: Mutex<Vec<PlatformAccessory>>,
}

impl LoggingHost {
    /// Creates a host storing plugin data under `storage_path`.
    #[must_use]
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Returns the accessories published so far.
    #[must_use]
    pub fn published(&self) -> Vec<PlatformAccessory> {
        self.published.lock().clone()
    }
}

impl Host for LoggingHost {
    fn storage_path(&self) -> PathBuf {
        self.storage_path.clone()
    }

    fn publish_external_accessories(&self, plugin_name: &str, accessories: Vec<PlatformAccessory>) {
        for accessory in &accessories {
            tracing::info!(
                plugin = plugin_name,
                accessory = accessory.display_name(),
                uuid = %accessory.uuid(),
                services = accessory.services().len(),
                "Published external accessory"
            );
        }
        self.published.lock().extend(accessories);
    }

    fn unregister_platform_accessories(
        &self,
        plugin_name: &str,
        platform_name: &str,
        accessories: &[PlatformAccessory],
    ) {
        let mut published = self.published.lock();
        for accessory in accessories {
            tracing::info!(
                plugin = plugin_name,
                platform = platform_name,
                accessory = accessory.display_name(),
                "Unregistered accessory"
            );
            published.retain(|a| a.uuid() != accessory.uuid());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hap::{Category, generate_uuid};

    fn accessory(name: &str) -> PlatformAccessory {
        PlatformAccessory::new(name, generate_uuid(name), Category::Other)
    }

    #[test]
    fn publish_and_unregister() {
        let host = LoggingHost::new("/tmp/bridge");
        host.publish_external_accessories("plugin", vec![accessory("A"), accessory("B")]);
        assert_eq!(host.published().len(), 2);

        host.unregister_platform_accessories("plugin", "platform", &[accessory("A")]);
        let remaining = host.published();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].display_name(), "B");
    }

    #[test]
    fn storage_path_is_returned() {
        let host = LoggingHost::new("/tmp/bridge");
        assert_eq!(host.storage_path(), PathBuf::from("/tmp/bridge"));
    }
}
