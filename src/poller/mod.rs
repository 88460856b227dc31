// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device polling.
//!
//! One [`DevicePoller`] per configured meter. A poller publishes its
//! accessory once when created, then on every tick either refreshes device
//! info followed by device state, or device state alone, depending on its
//! [`PollState`]:
//!
//! - a new poller is [`PollState::Fresh`] and starts with an info refresh
//! - a successful state refresh makes it [`PollState::Steady`]
//! - a failed state refresh makes it [`PollState::Degraded`], so the next
//!   tick goes through info refresh again
//!
//! There is no retry limit: a failing poller keeps trying once per interval
//! and keeps serving the last good readings.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use elicznik_bridge::config::DeviceConfig;
//! use elicznik_bridge::event::EventBus;
//! use elicznik_bridge::hap::CapabilityRegistry;
//! use elicznik_bridge::host::LoggingHost;
//! use elicznik_bridge::poller::{DevicePoller, PollState};
//! use elicznik_bridge::portal::{EnergyReadings, StaticSource};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let storage = std::env::temp_dir().join("elicznik-doc");
//! let host = Arc::new(LoggingHost::new(&storage));
//! let registry = CapabilityRegistry::new();
//! registry.register_energy_types();
//!
//! let mut poller = DevicePoller::new(
//!     DeviceConfig::new("Meter1"),
//!     StaticSource::new(EnergyReadings::new(10.0, 2.0)),
//!     host,
//!     &registry,
//!     EventBus::new(),
//! );
//! assert_eq!(poller.state(), PollState::Fresh);
//!
//! poller.tick().await;
//! assert_eq!(poller.state(), PollState::Steady);
//! assert_eq!(poller.readings().import_kwh, 10.0);
//! # }
//! ```

mod device_poller;
mod energy_accessory;
mod poll_state;

pub use device_poller::{DevicePoller, PREFERENCES_DIR, PollerHandle};
pub use energy_accessory::{ENERGY_SERVICE_SUBTYPE, EnergyCache};
pub use poll_state::{PollState, Refresh, TickReport, Transition};
