// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;

use uuid::Uuid;

use crate::hap::generate_uuid;

/// Identifier of a polled device.
///
/// It is the UUID of the device's accessory, derived from the configured
/// name, so it is stable across restarts.
///
/// # Examples
///
/// ```
/// use elicznik_bridge::event::DeviceId;
///
/// assert_eq!(DeviceId::from_name("Meter1"), DeviceId::from_name("Meter1"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Derives the identifier of the device with the given name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(generate_uuid(name))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.to_string()[..8];
        write!(f, "DeviceId({short}...)")
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DeviceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_accessory_uuid() {
        assert_eq!(DeviceId::from_name("Meter1").as_uuid(), generate_uuid("Meter1"));
    }

    #[test]
    fn different_names_differ() {
        assert_ne!(DeviceId::from_name("Meter1"), DeviceId::from_name("Meter2"));
    }

    #[test]
    fn debug_is_shortened() {
        let id = DeviceId::from_name("Meter1");
        let debug = format!("{id:?}");
        assert!(debug.starts_with("DeviceId("));
        assert!(debug.ends_with("...)"));
        assert_eq!(debug.len(), "DeviceId(".len() + 8 + "...)".len());
    }

    #[test]
    fn display_is_full_uuid() {
        let id = DeviceId::from_name("Meter1");
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
