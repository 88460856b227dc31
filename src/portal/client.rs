// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the utility portal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use super::{EnergyReadings, EnergySource};
use crate::config::{Credentials, DeviceConfig};
use crate::error::{ConfigError, Error, ProtocolError};

// ============================================================================
// PortalConfig
// ============================================================================

/// Connection parameters for the portal.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use elicznik_bridge::portal::PortalConfig;
///
/// let config = PortalConfig::new("https://portal.example/")
///     .with_meter_id("590243")
///     .with_credentials("jan", "secret")
///     .with_timeout(Duration::from_secs(3));
///
/// assert_eq!(config.login_url(), "https://portal.example/login");
/// assert_eq!(
///     config.readings_url(),
///     "https://portal.example/api/meters/590243/readings"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PortalConfig {
    base_url: String,
    meter_id: String,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl PortalConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration for the portal at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            meter_id: String::new(),
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Builds a configuration from a device configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPortalUrl`] if the device has no portal
    /// URL or it is not an http(s) URL.
    pub fn from_device(device: &DeviceConfig) -> Result<Self, ConfigError> {
        let url = device
            .portal_url
            .as_deref()
            .ok_or_else(|| ConfigError::InvalidPortalUrl(String::new()))?;

        let mut config = Self::new(url).with_meter_id(device.meter_id.clone());
        config.credentials.clone_from(&device.credentials);
        config.validate()?;
        Ok(config)
    }

    /// Sets the meter identifier.
    #[must_use]
    pub fn with_meter_id(mut self, meter_id: impl Into<String>) -> Self {
        self.meter_id = meter_id.into();
        self
    }

    /// Sets the login credentials.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, passwd: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            user: user.into(),
            passwd: passwd.into(),
        });
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the login endpoint.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    /// Returns the readings endpoint of the configured meter.
    #[must_use]
    pub fn readings_url(&self) -> String {
        format!(
            "{}/api/meters/{}/readings",
            self.base_url,
            urlencoding::encode(&self.meter_id)
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let has_scheme =
            self.base_url.starts_with("http://") || self.base_url.starts_with("https://");
        if !has_scheme || self.base_url.len() <= "https://".len() {
            return Err(ConfigError::InvalidPortalUrl(self.base_url.clone()));
        }
        Ok(())
    }

    /// Creates a [`PortalClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// created.
    pub fn into_client(self) -> Result<PortalClient, Error> {
        self.validate()?;

        let client = Client::builder()
            .timeout(self.timeout)
            .cookie_store(true)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(PortalClient {
            config: self,
            client,
            session: AtomicBool::new(false),
        })
    }
}

// ============================================================================
// PortalClient
// ============================================================================

/// Session-based client for the portal.
///
/// [`connect`](EnergySource::connect) posts the credentials as a form
/// (`username`, `password`) to the login endpoint and keeps the session cookie.
/// [`fetch_readings`](EnergySource::fetch_readings) then reads the meter's
/// totals. Without credentials the login step is skipped.
#[derive(Debug)]
pub struct PortalClient {
    config: PortalConfig,
    client: Client,
    session: AtomicBool,
}

impl PortalClient {
    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Returns true if a session is open.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.load(Ordering::Acquire)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ProtocolError {
        if err.is_timeout() {
            let millis = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
            ProtocolError::Timeout(millis)
        } else {
            ProtocolError::Http(err)
        }
    }

    fn check_status(&self, response: &Response) -> Result<(), ProtocolError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.session.store(false, Ordering::Release);
            return Err(ProtocolError::AuthenticationFailed);
        }
        if !status.is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }
        Ok(())
    }
}

impl EnergySource for PortalClient {
    async fn connect(&self) -> Result<(), Error> {
        self.session.store(false, Ordering::Release);

        let Some(credentials) = &self.config.credentials else {
            tracing::debug!(url = %self.config.base_url, "No credentials configured, skipping login");
            self.session.store(true, Ordering::Release);
            return Ok(());
        };

        let url = self.config.login_url();
        tracing::debug!(url = %url, user = %credentials.user, "Logging in to portal");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("username", credentials.user.as_str()),
                ("password", credentials.passwd.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.check_status(&response)?;
        self.session.store(true, Ordering::Release);
        tracing::debug!(url = %url, "Portal session opened");
        Ok(())
    }

    async fn fetch_readings(&self) -> Result<EnergyReadings, Error> {
        if !self.has_session() {
            return Err(ProtocolError::NoSession.into());
        }

        let url = self.config.readings_url();
        tracing::debug!(url = %url, "Requesting meter readings");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.check_status(&response)?;

        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;

        tracing::debug!(body = %body, "Received meter readings");

        Ok(EnergyReadings::parse(&body)?)
    }
}
