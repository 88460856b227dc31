// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Publishable accessories.

use uuid::Uuid;

use super::service::Service;

/// Namespace for accessory UUIDs derived from names.
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x6ba7_b812_9dad_11d1_80b4_00c0_4fd4_30c8);

/// Accessory category shown by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Category {
    /// Generic device.
    Other = 1,
    /// Bridge.
    Bridge = 2,
    /// Sensor.
    Sensor = 10,
}

/// Derives a stable accessory UUID from a name.
///
/// The same name always yields the same UUID, so a republished accessory
/// keeps its identity across restarts.
#[must_use]
pub fn generate_uuid(name: &str) -> Uuid {
    Uuid::new_v5(&ACCESSORY_NAMESPACE, name.as_bytes())
}

/// An accessory as handed to the host for publishing.
#[derive(Debug, Clone)]
pub struct PlatformAccessory {
    display_name: String,
    uuid: Uuid,
    category: Category,
    services: Vec<Service>,
}

impl PlatformAccessory {
    /// Creates an accessory without services.
    #[must_use]
    pub fn new(display_name: impl Into<String>, uuid: Uuid, category: Category) -> Self {
        Self {
            display_name: display_name.into(),
            uuid,
            category,
            services: Vec::new(),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the accessory UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns the attached services.
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Finds a service by type and optional subtype.
    #[must_use]
    pub fn service(&self, kind: Uuid, subtype: Option<&str>) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.kind().uuid == kind && (subtype.is_none() || s.subtype() == subtype))
    }

    /// Attaches a service, replacing one with the same type and subtype.
    pub fn add_service(&mut self, service: Service) -> &mut Self {
        self.remove_service(service.kind().uuid, service.subtype());
        self.services.push(service);
        self
    }

    /// Detaches a service. Returns true if one was removed.
    pub fn remove_service(&mut self, kind: Uuid, subtype: Option<&str>) -> bool {
        let before = self.services.len();
        self.services
            .retain(|s| !(s.kind().uuid == kind && s.subtype() == subtype));
        self.services.len() != before
    }
}
