// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use crate::error::RefreshStage;
use crate::portal::EnergyReadings;

use super::DeviceId;

/// Events emitted by device pollers.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// The device's accessory was handed to the host.
    AccessoryPublished {
        /// The device.
        device_id: DeviceId,
    },

    /// Device info refresh succeeded.
    InfoRefreshed {
        /// The device.
        device_id: DeviceId,
    },

    /// Device state refresh succeeded.
    StateRefreshed {
        /// The device.
        device_id: DeviceId,
        /// The readings now cached and published.
        readings: EnergyReadings,
    },

    /// A refresh failed; the poller will retry on a later tick.
    RefreshFailed {
        /// The device.
        device_id: DeviceId,
        /// Which refresh failed.
        stage: RefreshStage,
        /// The error message.
        error: String,
    },
}

impl DeviceEvent {
    /// Returns the device ID associated with this event.
    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        match self {
            Self::AccessoryPublished { device_id }
            | Self::InfoRefreshed { device_id }
            | Self::StateRefreshed { device_id, .. }
            | Self::RefreshFailed { device_id, .. } => *device_id,
        }
    }

    /// Returns `true` if this event reports a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::RefreshFailed { .. })
    }

    /// Creates a refresh failed event.
    #[must_use]
    pub fn refresh_failed(
        device_id: DeviceId,
        stage: RefreshStage,
        error: impl Into<String>,
    ) -> Self {
        Self::RefreshFailed {
            device_id,
            stage,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_extraction() {
        let id = DeviceId::from_name("Meter1");

        assert_eq!(DeviceEvent::AccessoryPublished { device_id: id }.device_id(), id);
        assert_eq!(DeviceEvent::InfoRefreshed { device_id: id }.device_id(), id);
        assert_eq!(
            DeviceEvent::StateRefreshed {
                device_id: id,
                readings: EnergyReadings::default(),
            }
            .device_id(),
            id
        );
        assert_eq!(
            DeviceEvent::refresh_failed(id, RefreshStage::Info, "boom").device_id(),
            id
        );
    }

    #[test]
    fn failure_events() {
        let id = DeviceId::from_name("Meter1");
        assert!(DeviceEvent::refresh_failed(id, RefreshStage::State, "timeout").is_failure());
        assert!(!DeviceEvent::InfoRefreshed { device_id: id }.is_failure());
    }
}
