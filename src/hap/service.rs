// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service descriptors and live services.

use uuid::Uuid;

use super::characteristic::{Characteristic, CharacteristicType, CharacteristicValue};

/// A bundle of characteristic types.
///
/// `mandatory` characteristics are created with the service; `optional` ones
/// are attached on first access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceType {
    /// Display name.
    pub name: &'static str,
    /// HAP type UUID.
    pub uuid: Uuid,
    /// Characteristics every instance carries.
    pub mandatory: &'static [Uuid],
    /// Characteristics an instance may carry.
    pub optional: &'static [Uuid],
}

impl ServiceType {
    /// Returns true if the characteristic belongs to this service type.
    #[must_use]
    pub fn allows(&self, characteristic: Uuid) -> bool {
        self.mandatory.contains(&characteristic) || self.optional.contains(&characteristic)
    }
}

/// A live service attached to an accessory.
#[derive(Debug, Clone)]
pub struct Service {
    kind: ServiceType,
    display_name: String,
    subtype: Option<String>,
    characteristics: Vec<Characteristic>,
}

impl Service {
    /// Creates a service holding its mandatory characteristics.
    ///
    /// Built by [`CapabilityRegistry::create_service`](super::CapabilityRegistry::create_service),
    /// which resolves the characteristic types.
    pub(crate) fn new(
        kind: ServiceType,
        display_name: String,
        subtype: Option<String>,
        mandatory: Vec<CharacteristicType>,
    ) -> Self {
        Self {
            kind,
            display_name,
            subtype,
            characteristics: mandatory.into_iter().map(Characteristic::new).collect(),
        }
    }

    /// Returns the service type.
    #[must_use]
    pub fn kind(&self) -> &ServiceType {
        &self.kind
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the subtype.
    #[must_use]
    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// Returns the attached characteristics.
    #[must_use]
    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }

    /// Finds an attached characteristic.
    #[must_use]
    pub fn characteristic(&self, uuid: Uuid) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.uuid() == uuid)
    }

    /// Returns the characteristic, attaching it first if it is optional and
    /// not yet present. Returns `None` for types the service does not allow.
    pub fn get_or_add_characteristic(&mut self, kind: CharacteristicType) -> Option<Characteristic> {
        if let Some(existing) = self.characteristic(kind.uuid) {
            return Some(existing.clone());
        }
        if !self.kind.allows(kind.uuid) {
            return None;
        }
        let characteristic = Characteristic::new(kind);
        self.characteristics.push(characteristic.clone());
        Some(characteristic)
    }

    /// Stores a value on an attached or allowed characteristic.
    ///
    /// Unknown types are ignored with a warning.
    pub fn set_characteristic(
        &mut self,
        kind: CharacteristicType,
        value: impl Into<CharacteristicValue>,
    ) -> &mut Self {
        match self.get_or_add_characteristic(kind) {
            Some(characteristic) => {
                characteristic.set_value(value);
            }
            None => {
                tracing::warn!(
                    service = self.kind.name,
                    characteristic = kind.name,
                    "Characteristic not allowed on service"
                );
            }
        }
        self
    }

    /// Updates a value and notifies subscribers.
    ///
    /// Characteristics that are not attached are ignored.
    pub fn update_characteristic(
        &self,
        kind: &CharacteristicType,
        value: impl Into<CharacteristicValue>,
    ) -> &Self {
        if let Some(characteristic) = self.characteristic(kind.uuid) {
            characteristic.update_value(value);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hap::types::{ENERGY_EXPORT, ENERGY_IMPORT, ENERGY_SERVICE, NAME};

    fn energy_service() -> Service {
        Service::new(
            ENERGY_SERVICE,
            "Meter 1".to_string(),
            Some("energy".to_string()),
            vec![ENERGY_IMPORT],
        )
    }

    #[test]
    fn mandatory_characteristics_are_attached() {
        let service = energy_service();
        assert_eq!(service.characteristics().len(), 1);
        assert!(service.characteristic(ENERGY_IMPORT.uuid).is_some());
        assert!(service.characteristic(ENERGY_EXPORT.uuid).is_none());
    }

    #[test]
    fn optional_characteristic_is_added_once() {
        let mut service = energy_service();
        let first = service.get_or_add_characteristic(ENERGY_EXPORT).unwrap();
        let second = service.get_or_add_characteristic(ENERGY_EXPORT).unwrap();

        first.update_value(4.0);
        assert_eq!(second.value().as_f64(), Some(4.0));
        assert_eq!(service.characteristics().len(), 2);
    }

    #[test]
    fn foreign_characteristic_is_rejected() {
        let mut service = energy_service();
        assert!(service.get_or_add_characteristic(NAME).is_none());
        service.set_characteristic(NAME, "ignored");
        assert!(service.characteristic(NAME.uuid).is_none());
    }

    #[test]
    fn update_characteristic_chains() {
        let mut service = energy_service();
        service.get_or_add_characteristic(ENERGY_EXPORT);
        service
            .update_characteristic(&ENERGY_IMPORT, 1.5)
            .update_characteristic(&ENERGY_EXPORT, 0.5);

        assert_eq!(
            service.characteristic(ENERGY_IMPORT.uuid).unwrap().value().as_f64(),
            Some(1.5)
        );
        assert_eq!(
            service.characteristic(ENERGY_EXPORT.uuid).unwrap().value().as_f64(),
            Some(0.5)
        );
    }
}
