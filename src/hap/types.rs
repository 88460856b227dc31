// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Characteristic and service types used by the bridge.

use uuid::Uuid;

use super::characteristic::{CharacteristicProps, CharacteristicType, Format, Perm};
use super::service::ServiceType;

const ENERGY_PROPS: CharacteristicProps = CharacteristicProps {
    format: Format::Float,
    unit: Some("kWh"),
    min_value: Some(0.0),
    max_value: Some(1_000_000.0),
    min_step: Some(0.001),
    perms: &[Perm::Read, Perm::Notify],
};

// Standard HAP types.

/// Name.
pub const NAME: CharacteristicType = CharacteristicType {
    name: "Name",
    uuid: Uuid::from_u128(0x0000_0023_0000_1000_8000_0026_BB76_5291),
    props: CharacteristicProps::READ_ONLY_STRING,
};

/// Manufacturer.
pub const MANUFACTURER: CharacteristicType = CharacteristicType {
    name: "Manufacturer",
    uuid: Uuid::from_u128(0x0000_0020_0000_1000_8000_0026_BB76_5291),
    props: CharacteristicProps::READ_ONLY_STRING,
};

/// Model.
pub const MODEL: CharacteristicType = CharacteristicType {
    name: "Model",
    uuid: Uuid::from_u128(0x0000_0021_0000_1000_8000_0026_BB76_5291),
    props: CharacteristicProps::READ_ONLY_STRING,
};

/// Serial number.
pub const SERIAL_NUMBER: CharacteristicType = CharacteristicType {
    name: "Serial Number",
    uuid: Uuid::from_u128(0x0000_0030_0000_1000_8000_0026_BB76_5291),
    props: CharacteristicProps::READ_ONLY_STRING,
};

/// Firmware revision.
pub const FIRMWARE_REVISION: CharacteristicType = CharacteristicType {
    name: "Firmware Revision",
    uuid: Uuid::from_u128(0x0000_0052_0000_1000_8000_0026_BB76_5291),
    props: CharacteristicProps::READ_ONLY_STRING,
};

/// Accessory information service.
pub const ACCESSORY_INFORMATION: ServiceType = ServiceType {
    name: "Accessory Information",
    uuid: Uuid::from_u128(0x0000_003E_0000_1000_8000_0026_BB76_5291),
    mandatory: &[
        NAME.uuid,
        MANUFACTURER.uuid,
        MODEL.uuid,
        SERIAL_NUMBER.uuid,
        FIRMWARE_REVISION.uuid,
    ],
    optional: &[],
};

// Custom energy types.

/// Cumulative energy imported from the grid.
pub const ENERGY_IMPORT: CharacteristicType = CharacteristicType {
    name: "Energy import",
    uuid: Uuid::from_u128(0x0000_0001_000B_1000_8000_0026_BB76_5291),
    props: ENERGY_PROPS,
};

/// Cumulative energy exported to the grid.
pub const ENERGY_EXPORT: CharacteristicType = CharacteristicType {
    name: "Energy export",
    uuid: Uuid::from_u128(0x0000_0002_000B_1000_8000_0026_BB76_5291),
    props: ENERGY_PROPS,
};

/// Energy meter service: import is mandatory, export optional.
pub const ENERGY_SERVICE: ServiceType = ServiceType {
    name: "Energy",
    uuid: Uuid::from_u128(0x0000_0001_000A_1000_8000_0026_BB76_5291),
    mandatory: &[ENERGY_IMPORT.uuid],
    optional: &[ENERGY_EXPORT.uuid],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_render_in_hap_form() {
        assert_eq!(
            ENERGY_IMPORT.uuid.to_string().to_uppercase(),
            "00000001-000B-1000-8000-0026BB765291"
        );
        assert_eq!(
            ENERGY_SERVICE.uuid.to_string().to_uppercase(),
            "00000001-000A-1000-8000-0026BB765291"
        );
        assert_eq!(
            ACCESSORY_INFORMATION.uuid.to_string().to_uppercase(),
            "0000003E-0000-1000-8000-0026BB765291"
        );
    }
}
