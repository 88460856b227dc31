// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `eLicznik` Bridge - exposes Tauron `eLicznik` energy meters to a
//! home-automation bridge.
//!
//! Each configured meter becomes one accessory with an information service
//! and an energy service carrying two read-only characteristics:
//! imported and exported energy in kWh. A poller per meter refreshes the
//! readings on a fixed interval and reconnects after failures.
//!
//! # Components
//!
//! - [`platform::PlatformRegistrar`]: the object the host bridge drives
//! - [`poller::DevicePoller`]: per-meter refresh state machine and timer
//! - [`portal`]: where readings come from ([`portal::PortalClient`] over HTTP)
//! - [`hap`]: accessory, service and characteristic model
//! - [`host::Host`]: what the plugin needs from the bridge
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use elicznik_bridge::config::PlatformConfig;
//! use elicznik_bridge::hap::CapabilityRegistry;
//! use elicznik_bridge::host::LoggingHost;
//! use elicznik_bridge::platform::PlatformRegistrar;
//!
//! #[tokio::main]
//! async fn main() -> elicznik_bridge::Result<()> {
//!     let config = PlatformConfig::from_json(
//!         r#"{
//!             "platform": "tauroneLicznik",
//!             "devices": [{
//!                 "name": "Meter1",
//!                 "user": "jan",
//!                 "passwd": "secret",
//!                 "meterId": "590243",
//!                 "refreshInterval": 30,
//!                 "portalUrl": "https://elicznik.example"
//!             }]
//!         }"#,
//!     )?;
//!
//!     let host = Arc::new(LoggingHost::new("/var/lib/bridge"));
//!     let mut registrar =
//!         PlatformRegistrar::new(config, host, Arc::new(CapabilityRegistry::new()));
//!
//!     let mut events = registrar.subscribe();
//!     registrar.did_finish_launching();
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod hap;
pub mod host;
pub mod platform;
pub mod poller;
pub mod portal;

pub use config::{DeviceConfig, DeviceEntry, PlatformConfig};
pub use error::{ConfigError, Error, ParseError, ProtocolError, RefreshStage, Result};
pub use event::{DeviceEvent, DeviceId, EventBus};
pub use host::{Host, LoggingHost};
pub use platform::PlatformRegistrar;
pub use poller::{DevicePoller, PollState, PollerHandle};
pub use portal::{DeviceSource, EnergyReadings, EnergySource, StaticSource};
#[cfg(feature = "http")]
pub use portal::{PortalClient, PortalConfig};
