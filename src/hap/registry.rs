// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of known characteristic and service types.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use super::characteristic::CharacteristicType;
use super::service::{Service, ServiceType};
use super::types;
use crate::error::ConfigError;

/// Registry of the capability types an accessory may be built from.
///
/// The registry is shared as an `Arc` handle between the registrar and every
/// poller. It starts with the standard accessory information types; the
/// registrar adds the energy types when it is constructed.
///
/// # Examples
///
/// ```
/// use elicznik_bridge::hap::{types, CapabilityRegistry};
///
/// let registry = CapabilityRegistry::new();
/// registry.register_energy_types();
///
/// let service = registry
///     .create_service(types::ENERGY_SERVICE.uuid, "Meter 1", None)
///     .unwrap();
/// assert_eq!(service.characteristics().len(), 1);
/// ```
#[derive(Debug)]
pub struct CapabilityRegistry {
    characteristics: RwLock<HashMap<Uuid, CharacteristicType>>,
    services: RwLock<HashMap<Uuid, ServiceType>>,
}

impl CapabilityRegistry {
    /// Creates a registry holding the standard information types.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            characteristics: RwLock::new(HashMap::new()),
            services: RwLock::new(HashMap::new()),
        };
        for kind in [
            types::NAME,
            types::MANUFACTURER,
            types::MODEL,
            types::SERIAL_NUMBER,
            types::FIRMWARE_REVISION,
        ] {
            registry.register_characteristic(kind);
        }
        registry.register_service(types::ACCESSORY_INFORMATION);
        registry
    }

    /// Registers the energy import/export characteristics and the energy service.
    pub fn register_energy_types(&self) {
        self.register_characteristic(types::ENERGY_IMPORT);
        self.register_characteristic(types::ENERGY_EXPORT);
        self.register_service(types::ENERGY_SERVICE);
    }

    /// Registers a characteristic type. Re-registering replaces the entry.
    pub fn register_characteristic(&self, kind: CharacteristicType) {
        tracing::trace!(name = kind.name, uuid = %kind.uuid, "Registering characteristic type");
        self.characteristics.write().insert(kind.uuid, kind);
    }

    /// Registers a service type. Re-registering replaces the entry.
    pub fn register_service(&self, kind: ServiceType) {
        tracing::trace!(name = kind.name, uuid = %kind.uuid, "Registering service type");
        self.services.write().insert(kind.uuid, kind);
    }

    /// Looks up a characteristic type.
    #[must_use]
    pub fn characteristic_type(&self, uuid: Uuid) -> Option<CharacteristicType> {
        self.characteristics.read().get(&uuid).copied()
    }

    /// Looks up a service type.
    #[must_use]
    pub fn service_type(&self, uuid: Uuid) -> Option<ServiceType> {
        self.services.read().get(&uuid).copied()
    }

    /// Builds a service with its mandatory characteristics.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnregisteredType`] if the service type or one of
    /// its mandatory characteristic types is not registered.
    pub fn create_service(
        &self,
        kind: Uuid,
        display_name: impl Into<String>,
        subtype: Option<&str>,
    ) -> Result<Service, ConfigError> {
        let service_type = self
            .service_type(kind)
            .ok_or_else(|| ConfigError::UnregisteredType(kind.to_string()))?;

        let mandatory = service_type
            .mandatory
            .iter()
            .map(|uuid| {
                self.characteristic_type(*uuid)
                    .ok_or_else(|| ConfigError::UnregisteredType(uuid.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Service::new(
            service_type,
            display_name.into(),
            subtype.map(str::to_owned),
            mandatory,
        ))
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_types_are_present() {
        let registry = CapabilityRegistry::new();
        assert!(registry.service_type(types::ACCESSORY_INFORMATION.uuid).is_some());
        assert!(registry.characteristic_type(types::NAME.uuid).is_some());
        assert!(registry.service_type(types::ENERGY_SERVICE.uuid).is_none());
    }

    #[test]
    fn energy_service_needs_registration() {
        let registry = CapabilityRegistry::new();
        let result = registry.create_service(types::ENERGY_SERVICE.uuid, "Meter", None);
        assert!(matches!(result, Err(ConfigError::UnregisteredType(_))));

        registry.register_energy_types();
        let service = registry
            .create_service(types::ENERGY_SERVICE.uuid, "Meter", Some("sub"))
            .unwrap();
        assert_eq!(service.subtype(), Some("sub"));
        assert!(service.characteristic(types::ENERGY_IMPORT.uuid).is_some());
    }

    #[test]
    fn information_service_has_all_fields() {
        let registry = CapabilityRegistry::new();
        let service = registry
            .create_service(types::ACCESSORY_INFORMATION.uuid, "Meter", None)
            .unwrap();
        assert_eq!(service.characteristics().len(), 5);
    }
}
