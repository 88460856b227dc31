// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sources of meter readings.
//!
//! A poller talks to its meter through the [`EnergySource`] trait:
//!
//! - [`PortalClient`]: logs in to the utility portal over HTTP and reads the
//!   meter's cumulative totals (requires the `http` feature)
//! - [`StaticSource`]: serves fixed readings, zero by default; used for
//!   devices without a portal URL
//!
//! [`DeviceSource`] picks one of the two from a device configuration.

#[cfg(feature = "http")]
mod client;
mod readings;

#[cfg(feature = "http")]
pub use client::{PortalClient, PortalConfig};
pub use readings::EnergyReadings;

use std::future::Future;

use crate::config::DeviceConfig;
use crate::error::Error;

/// Something a poller can read energy totals from.
///
/// `connect` is called on every info refresh; `fetch_readings` on every state
/// refresh. Both are awaited inside one tick, so implementations never see
/// concurrent calls from the same poller.
pub trait EnergySource: Send + Sync + 'static {
    /// Opens or reopens a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached or rejects the login.
    fn connect(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Reads the current cumulative totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    fn fetch_readings(&self) -> impl Future<Output = Result<EnergyReadings, Error>> + Send;
}

/// A source that always returns the same readings.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    readings: EnergyReadings,
}

impl StaticSource {
    /// Creates a source serving the given readings.
    #[must_use]
    pub fn new(readings: EnergyReadings) -> Self {
        Self { readings }
    }

    /// Creates a source serving zero totals.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }
}

impl EnergySource for StaticSource {
    async fn connect(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn fetch_readings(&self) -> Result<EnergyReadings, Error> {
        Ok(self.readings)
    }
}

/// The source a configured device uses.
#[derive(Debug)]
pub enum DeviceSource {
    /// HTTP portal client.
    #[cfg(feature = "http")]
    Portal(PortalClient),
    /// Fixed readings.
    Static(StaticSource),
}

impl DeviceSource {
    /// Chooses the source for a device: the portal when a portal URL is
    /// configured, zero readings otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the portal URL is invalid or the HTTP client
    /// cannot be created.
    pub fn from_config(config: &DeviceConfig) -> Result<Self, Error> {
        if config.portal_url.is_some() {
            return Self::portal(config);
        }
        Ok(Self::Static(StaticSource::zero()))
    }

    #[cfg(feature = "http")]
    fn portal(config: &DeviceConfig) -> Result<Self, Error> {
        let client = PortalConfig::from_device(config)?.into_client()?;
        Ok(Self::Portal(client))
    }

    #[cfg(not(feature = "http"))]
    #[allow(clippy::unnecessary_wraps)]
    fn portal(config: &DeviceConfig) -> Result<Self, Error> {
        tracing::warn!(
            device = %config.name,
            "Portal URL configured but HTTP support is disabled, serving static readings"
        );
        Ok(Self::Static(StaticSource::zero()))
    }
}

impl EnergySource for DeviceSource {
    async fn connect(&self) -> Result<(), Error> {
        match self {
            #[cfg(feature = "http")]
            Self::Portal(client) => client.connect().await,
            Self::Static(source) => source.connect().await,
        }
    }

    async fn fetch_readings(&self) -> Result<EnergyReadings, Error> {
        match self {
            #[cfg(feature = "http")]
            Self::Portal(client) => client.fetch_readings().await,
            Self::Static(source) => source.fetch_readings().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_source_serves_its_readings() {
        let source = StaticSource::new(EnergyReadings::new(1.5, 0.25));
        source.connect().await.unwrap();
        assert_eq!(
            source.fetch_readings().await.unwrap(),
            EnergyReadings::new(1.5, 0.25)
        );
    }

    #[tokio::test]
    async fn device_without_portal_gets_zero_source() {
        let source = DeviceSource::from_config(&DeviceConfig::new("Meter1")).unwrap();
        assert!(matches!(source, DeviceSource::Static(_)));
        assert_eq!(source.fetch_readings().await.unwrap(), EnergyReadings::default());
    }

    #[cfg(feature = "http")]
    #[test]
    fn device_with_portal_gets_client() {
        let config = DeviceConfig::new("Meter1").with_portal_url("https://portal.example");
        let source = DeviceSource::from_config(&config).unwrap();
        assert!(matches!(source, DeviceSource::Portal(_)));
    }

    #[cfg(feature = "http")]
    #[test]
    fn device_with_bad_portal_url_fails() {
        let config = DeviceConfig::new("Meter1").with_portal_url("ftp://portal.example");
        assert!(DeviceSource::from_config(&config).is_err());
    }
}
