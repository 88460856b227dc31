// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building the meter accessory.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::DeviceConfig;
use crate::error::ConfigError;
use crate::hap::{
    CapabilityRegistry, Category, CharacteristicType, CharacteristicValue, PlatformAccessory,
    Service, generate_uuid, types,
};
use crate::portal::EnergyReadings;

/// Subtype of the energy service.
pub const ENERGY_SERVICE_SUBTYPE: &str = "tauroneLicznikEnergyService";

/// Last readings a poller stored, shared with the characteristic getters.
#[derive(Debug, Clone, Default)]
pub struct EnergyCache {
    inner: Arc<RwLock<EnergyReadings>>,
}

impl EnergyCache {
    /// Returns the cached readings.
    #[must_use]
    pub fn get(&self) -> EnergyReadings {
        *self.inner.read()
    }

    pub(crate) fn set(&self, readings: EnergyReadings) {
        *self.inner.write() = readings;
    }
}

/// The accessory and a handle to its energy service.
#[derive(Debug)]
pub(crate) struct PreparedAccessory {
    pub accessory: PlatformAccessory,
    pub energy_service: Service,
}

/// Builds the accessory for a device: an information service and an energy
/// service whose getters serve `cache`.
pub(crate) fn prepare_accessory(
    config: &DeviceConfig,
    registry: &CapabilityRegistry,
    cache: &EnergyCache,
) -> Result<PreparedAccessory, ConfigError> {
    let name = config.name.as_str();
    let mut accessory = PlatformAccessory::new(name, generate_uuid(name), Category::Other);

    tracing::debug!(device = name, "Preparing information service");
    let mut information =
        registry.create_service(types::ACCESSORY_INFORMATION.uuid, name, None)?;
    information
        .set_characteristic(types::NAME, name)
        .set_characteristic(types::MANUFACTURER, config.manufacturer.as_str())
        .set_characteristic(types::MODEL, config.model_name.as_str())
        .set_characteristic(types::SERIAL_NUMBER, config.serial_number.as_str())
        .set_characteristic(types::FIRMWARE_REVISION, config.firmware_revision.as_str());
    accessory.add_service(information);

    tracing::debug!(device = name, "Preparing energy service");
    let mut energy = registry.create_service(
        types::ENERGY_SERVICE.uuid,
        format!("Meter {}", config.meter_id),
        Some(ENERGY_SERVICE_SUBTYPE),
    )?;
    install_getter(&mut energy, types::ENERGY_IMPORT, config, cache, |r| r.import_kwh)?;
    install_getter(&mut energy, types::ENERGY_EXPORT, config, cache, |r| r.export_kwh)?;
    accessory.add_service(energy.clone());

    Ok(PreparedAccessory {
        accessory,
        energy_service: energy,
    })
}

fn install_getter(
    service: &mut Service,
    kind: CharacteristicType,
    config: &DeviceConfig,
    cache: &EnergyCache,
    pick: fn(&EnergyReadings) -> f64,
) -> Result<(), ConfigError> {
    let characteristic = service
        .get_or_add_characteristic(kind)
        .ok_or_else(|| ConfigError::UnregisteredType(kind.uuid.to_string()))?;

    let cache = cache.clone();
    let name = config.name.clone();
    let meter_id = config.meter_id.clone();
    let log_reads = !config.disable_log_info;
    let label = kind.name.to_lowercase();

    characteristic.on_get(move || {
        let value = pick(&cache.get());
        if log_reads {
            tracing::info!("Device: {meter_id} {name}, {label}: {value} kWh");
        }
        CharacteristicValue::Float(value)
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CapabilityRegistry {
        let registry = CapabilityRegistry::new();
        registry.register_energy_types();
        registry
    }

    fn config() -> DeviceConfig {
        DeviceConfig::new("Meter1").with_meter_id("590243")
    }

    #[test]
    fn accessory_has_information_and_energy_services() {
        let prepared = prepare_accessory(&config(), &registry(), &EnergyCache::default()).unwrap();
        let accessory = &prepared.accessory;

        assert_eq!(accessory.display_name(), "Meter1");
        assert_eq!(accessory.uuid(), generate_uuid("Meter1"));
        assert_eq!(accessory.category(), Category::Other);
        assert_eq!(accessory.services().len(), 2);

        let info = accessory
            .service(types::ACCESSORY_INFORMATION.uuid, None)
            .unwrap();
        assert_eq!(
            info.characteristic(types::MANUFACTURER.uuid).unwrap().value().as_str(),
            Some("Tauron")
        );
        assert_eq!(
            info.characteristic(types::MODEL.uuid).unwrap().value().as_str(),
            Some("eLicznik")
        );

        let energy = accessory
            .service(types::ENERGY_SERVICE.uuid, Some(ENERGY_SERVICE_SUBTYPE))
            .unwrap();
        assert_eq!(energy.display_name(), "Meter 590243");
        assert!(energy.characteristic(types::ENERGY_IMPORT.uuid).is_some());
        assert!(energy.characteristic(types::ENERGY_EXPORT.uuid).is_some());
    }

    #[test]
    fn getters_serve_cached_readings() {
        let cache = EnergyCache::default();
        let prepared = prepare_accessory(&config(), &registry(), &cache).unwrap();
        let import = prepared
            .energy_service
            .characteristic(types::ENERGY_IMPORT.uuid)
            .unwrap()
            .clone();
        let export = prepared
            .energy_service
            .characteristic(types::ENERGY_EXPORT.uuid)
            .unwrap()
            .clone();

        assert_eq!(import.read().as_f64(), Some(0.0));

        cache.set(EnergyReadings::new(12.5, 3.25));
        assert_eq!(import.read().as_f64(), Some(12.5));
        assert_eq!(export.read().as_f64(), Some(3.25));
        assert_eq!(import.read(), import.read());
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Reads the import characteristic three times and returns the log output.
    fn logged_reads(config: &DeviceConfig) -> String {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();

        let cache = EnergyCache::default();
        cache.set(EnergyReadings::new(12.5, 3.25));
        let prepared = prepare_accessory(config, &registry(), &cache).unwrap();
        let import = prepared
            .energy_service
            .characteristic(types::ENERGY_IMPORT.uuid)
            .unwrap()
            .clone();

        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..3 {
                assert_eq!(import.read().as_f64(), Some(12.5));
            }
        });

        let bytes = capture.0.lock().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn getter_logs_every_read() {
        let output = logged_reads(&config());
        let lines = output
            .lines()
            .filter(|line| line.contains("Device: 590243 Meter1, energy import: 12.5 kWh"))
            .count();
        assert_eq!(lines, 3, "{output}");
    }

    #[test]
    fn getter_is_silent_when_log_info_disabled() {
        let output = logged_reads(&config().with_log_info_disabled());
        assert!(!output.contains("energy import"), "{output}");
    }

    #[test]
    fn service_handle_shares_characteristics_with_accessory() {
        let prepared = prepare_accessory(&config(), &registry(), &EnergyCache::default()).unwrap();
        prepared
            .energy_service
            .update_characteristic(&types::ENERGY_EXPORT, 8.0);

        let published = prepared
            .accessory
            .service(types::ENERGY_SERVICE.uuid, None)
            .unwrap()
            .characteristic(types::ENERGY_EXPORT.uuid)
            .unwrap()
            .value();
        assert_eq!(published.as_f64(), Some(8.0));
    }

    #[test]
    fn unregistered_energy_types_fail() {
        let result = prepare_accessory(&config(), &CapabilityRegistry::new(), &EnergyCache::default());
        assert!(matches!(result, Err(ConfigError::UnregisteredType(_))));
    }
}
