// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory model exposed to the host framework.
//!
//! An accessory is a set of services; a service is a set of typed
//! characteristics. Types are plain data descriptors kept in a
//! [`CapabilityRegistry`], and the live [`Characteristic`] handles are shared
//! between the poller that writes readings and the host that reads them.
//!
//! # Examples
//!
//! ```
//! use elicznik_bridge::hap::{types, CapabilityRegistry};
//!
//! let registry = CapabilityRegistry::new();
//! registry.register_energy_types();
//!
//! let mut service = registry
//!     .create_service(types::ENERGY_SERVICE.uuid, "Meter 42", None)
//!     .unwrap();
//! let export = service.get_or_add_characteristic(types::ENERGY_EXPORT).unwrap();
//!
//! service.update_characteristic(&types::ENERGY_EXPORT, 12.5);
//! assert_eq!(export.read().as_f64(), Some(12.5));
//! ```

mod accessory;
mod characteristic;
mod registry;
mod service;
pub mod types;

pub use accessory::{Category, PlatformAccessory, generate_uuid};
pub use characteristic::{
    Characteristic, CharacteristicProps, CharacteristicType, CharacteristicValue, Format, Perm,
};
pub use registry::CapabilityRegistry;
pub use service::{Service, ServiceType};
