// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poller events.
//!
//! Every poller reports what its ticks did on a shared [`EventBus`]. Nothing
//! in the polling loop depends on anyone listening; the bus exists so a
//! runner or a test can observe refreshes without scraping logs.
//!
//! # Examples
//!
//! ```
//! use elicznik_bridge::event::{DeviceEvent, DeviceId, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let device_id = DeviceId::from_name("Meter1");
//! bus.publish(DeviceEvent::InfoRefreshed { device_id });
//! ```

mod device_event;
mod device_id;
mod event_bus;

pub use device_event::DeviceEvent;
pub use device_id::DeviceId;
pub use event_bus::EventBus;
