// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform registrar.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::{DeviceConfig, DeviceEntry, PLATFORM_NAME, PLUGIN_NAME, PlatformConfig};
use crate::error::Error;
use crate::event::{DeviceEvent, EventBus};
use crate::hap::{CapabilityRegistry, PlatformAccessory};
use crate::host::Host;
use crate::poller::{DevicePoller, PollerHandle};
use crate::portal::{DeviceSource, EnergySource};

type SourceFactory<S> = Box<dyn Fn(&DeviceConfig) -> Result<S, Error> + Send + Sync>;

/// Entry point the host talks to.
///
/// The registrar reads the device list when it is created and starts one
/// [`DevicePoller`] per valid device when the host reports it has finished
/// launching. It also keeps the accessories the host restores from its cache
/// and forwards removal requests back to the host.
///
/// Must be used from within a tokio runtime: pollers are spawned as tasks.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use elicznik_bridge::config::PlatformConfig;
/// use elicznik_bridge::hap::CapabilityRegistry;
/// use elicznik_bridge::host::LoggingHost;
/// use elicznik_bridge::platform::PlatformRegistrar;
///
/// # #[tokio::main]
/// # async fn main() -> elicznik_bridge::Result<()> {
/// let config = PlatformConfig::load("config.json")?;
/// let host = Arc::new(LoggingHost::new("/var/lib/bridge"));
/// let registry = Arc::new(CapabilityRegistry::new());
///
/// let mut registrar = PlatformRegistrar::new(config, host, registry);
/// registrar.did_finish_launching();
/// # Ok(())
/// # }
/// ```
pub struct PlatformRegistrar<H, S = DeviceSource> {
    host: Arc<H>,
    registry: Arc<CapabilityRegistry>,
    devices: Option<Vec<DeviceEntry>>,
    accessories: Vec<PlatformAccessory>,
    pollers: Vec<PollerHandle>,
    event_bus: EventBus,
    source_factory: SourceFactory<S>,
    launched: bool,
}

impl<H: Host> PlatformRegistrar<H, DeviceSource> {
    /// Creates a registrar whose devices read from the portal, or serve zero
    /// readings when no portal URL is configured.
    #[must_use]
    pub fn new(config: PlatformConfig, host: Arc<H>, registry: Arc<CapabilityRegistry>) -> Self {
        Self::with_source_factory(config, host, registry, DeviceSource::from_config)
    }
}

impl<H, S> PlatformRegistrar<H, S>
where
    H: Host,
    S: EnergySource,
{
    /// Creates a registrar that builds each device's source with `factory`.
    ///
    /// Registers the energy characteristic and service types in `registry`.
    #[must_use]
    pub fn with_source_factory<F>(
        config: PlatformConfig,
        host: Arc<H>,
        registry: Arc<CapabilityRegistry>,
        factory: F,
    ) -> Self
    where
        F: Fn(&DeviceConfig) -> Result<S, Error> + Send + Sync + 'static,
    {
        registry.register_energy_types();

        if config.devices.is_none() {
            tracing::info!("No configuration found for {PLUGIN_NAME}");
        }

        Self {
            host,
            registry,
            devices: config.devices,
            accessories: Vec::new(),
            pollers: Vec::new(),
            event_bus: EventBus::new(),
            source_factory: Box::new(factory),
            launched: false,
        }
    }

    /// Returns true if there was no device list; such a registrar never
    /// creates accessories.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.devices.is_none()
    }

    /// Subscribes to events from all pollers.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_bus.subscribe()
    }

    /// Returns the spawned pollers.
    #[must_use]
    pub fn pollers(&self) -> &[PollerHandle] {
        &self.pollers
    }

    /// Returns the number of running pollers.
    #[must_use]
    pub fn poller_count(&self) -> usize {
        self.pollers.len()
    }

    /// Returns the accessories restored by the host.
    #[must_use]
    pub fn cached_accessories(&self) -> &[PlatformAccessory] {
        &self.accessories
    }

    /// Handles the host's "finished launching" signal.
    ///
    /// Starts one poller per device entry. Entries without a name, and
    /// entries whose source cannot be built, are skipped with a log line.
    /// Only the first call does anything. Returns the number of pollers
    /// started.
    pub fn did_finish_launching(&mut self) -> usize {
        tracing::debug!("didFinishLaunching");

        if self.launched {
            tracing::warn!("didFinishLaunching received twice, ignoring");
            return 0;
        }
        self.launched = true;

        let Some(entries) = self.devices.clone() else {
            return 0;
        };

        let mut started = 0;
        for entry in entries {
            let config = match entry.into_config() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "Device Name Missing");
                    continue;
                }
            };

            let source = match (self.source_factory)(&config) {
                Ok(source) => source,
                Err(e) => {
                    tracing::error!(
                        device = %config.name,
                        error = %e,
                        "Failed to create energy source, device skipped"
                    );
                    continue;
                }
            };

            let poller = DevicePoller::new(
                config,
                source,
                Arc::clone(&self.host),
                &self.registry,
                self.event_bus.clone(),
            );
            self.pollers.push(poller.spawn());
            started += 1;
        }

        tracing::debug!(pollers = started, "Device pollers started");
        started
    }

    /// Keeps an accessory the host restored from its cache.
    pub fn configure_accessory(&mut self, accessory: PlatformAccessory) {
        tracing::debug!(accessory = accessory.display_name(), "configurePlatformAccessory");
        self.accessories.push(accessory);
    }

    /// Asks the host to unregister an accessory.
    pub fn remove_accessory(&self, accessory: PlatformAccessory) {
        tracing::debug!(accessory = accessory.display_name(), "removePlatformAccessory");
        self.host
            .unregister_platform_accessories(PLUGIN_NAME, PLATFORM_NAME, &[accessory]);
    }

    /// Stops all pollers.
    pub fn shutdown(&mut self) {
        for poller in self.pollers.drain(..) {
            tracing::debug!(device = poller.name(), "Stopping poller");
            poller.abort();
        }
    }
}

impl<H, S> Drop for PlatformRegistrar<H, S> {
    fn drop(&mut self) {
        for poller in &self.pollers {
            poller.abort();
        }
    }
}

impl<H, S> std::fmt::Debug for PlatformRegistrar<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformRegistrar")
            .field("devices", &self.devices.as_ref().map(Vec::len))
            .field("accessories", &self.accessories.len())
            .field("pollers", &self.pollers)
            .field("launched", &self.launched)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hap::{Category, generate_uuid};
    use crate::host::LoggingHost;

    type Harness = (
        PlatformRegistrar<LoggingHost>,
        Arc<LoggingHost>,
        tempfile::TempDir,
    );

    fn registrar(config: PlatformConfig) -> Harness {
        let storage = tempfile::tempdir().unwrap();
        let host = Arc::new(LoggingHost::new(storage.path()));
        let registry = Arc::new(CapabilityRegistry::new());
        (
            PlatformRegistrar::new(config, Arc::clone(&host), registry),
            host,
            storage,
        )
    }

    fn named(name: &str) -> DeviceEntry {
        DeviceEntry {
            name: Some(name.to_string()),
            ..DeviceEntry::default()
        }
    }

    #[tokio::test]
    async fn without_devices_registrar_is_inert() {
        let (mut registrar, host, _storage) = registrar(PlatformConfig::default());

        assert!(registrar.is_inert());
        assert_eq!(registrar.did_finish_launching(), 0);
        assert!(host.published().is_empty());
    }

    #[tokio::test]
    async fn entries_without_name_are_skipped() {
        let config = PlatformConfig::with_devices(vec![
            named("Meter1"),
            DeviceEntry::default(),
            named(""),
            named("Meter2"),
        ]);
        let (mut registrar, host, _storage) = registrar(config);

        assert_eq!(registrar.did_finish_launching(), 2);
        let names: Vec<_> = registrar.pollers().iter().map(PollerHandle::name).collect();
        assert_eq!(names, ["Meter1", "Meter2"]);
        assert_eq!(host.published().len(), 2);
    }

    #[tokio::test]
    async fn malformed_entries_do_not_block_valid_devices() {
        let config = PlatformConfig::from_json(
            r#"{"devices": [
                {"name": "Meter1", "refreshInterval": 2.5},
                {"name": "Broken", "refreshInterval": [1]},
                {"name": "Meter2", "refreshInterval": "30"}
            ]}"#,
        )
        .unwrap();
        let (mut registrar, host, _storage) = registrar(config);

        assert_eq!(registrar.did_finish_launching(), 2);
        assert_eq!(host.published().len(), 2);
    }

    #[tokio::test]
    async fn devices_that_are_not_a_list_leave_registrar_inert() {
        let config = PlatformConfig::from_json(r#"{"devices": {"name": "A"}}"#).unwrap();
        let (mut registrar, host, _storage) = registrar(config);

        assert!(registrar.is_inert());
        assert_eq!(registrar.did_finish_launching(), 0);
        assert!(host.published().is_empty());
    }

    #[tokio::test]
    async fn second_launch_signal_is_ignored() {
        let (mut registrar, host, _storage) = registrar(PlatformConfig::with_devices(vec![named("Meter1")]));

        assert_eq!(registrar.did_finish_launching(), 1);
        assert_eq!(registrar.did_finish_launching(), 0);
        assert_eq!(registrar.pollers().len(), 1);
        assert_eq!(host.published().len(), 1);
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn invalid_portal_url_skips_device() {
        let bad = DeviceEntry {
            portal_url: Some("not-a-url".to_string()),
            ..named("Bad")
        };
        let (mut registrar, _host, _storage) =
            registrar(PlatformConfig::with_devices(vec![bad, named("Good")]));

        assert_eq!(registrar.did_finish_launching(), 1);
        assert_eq!(registrar.pollers()[0].name(), "Good");
    }

    #[test]
    fn configure_accessory_is_kept() {
        let (mut registrar, _host, _storage) = registrar(PlatformConfig::default());
        registrar.configure_accessory(PlatformAccessory::new(
            "Old",
            generate_uuid("Old"),
            Category::Other,
        ));
        assert_eq!(registrar.cached_accessories().len(), 1);
    }

    #[tokio::test]
    async fn remove_accessory_unregisters_with_host() {
        let (mut registrar, host, _storage) = registrar(PlatformConfig::with_devices(vec![named("Meter1")]));
        registrar.did_finish_launching();
        let published = host.published();
        assert_eq!(published.len(), 1);

        registrar.remove_accessory(published[0].clone());
        assert!(host.published().is_empty());
    }

    #[tokio::test]
    async fn shutdown_stops_pollers() {
        let (mut registrar, _host, _storage) = registrar(PlatformConfig::with_devices(vec![named("Meter1")]));
        registrar.did_finish_launching();
        assert_eq!(registrar.poller_count(), 1);
        registrar.shutdown();
        assert_eq!(registrar.poller_count(), 0);
    }
}
