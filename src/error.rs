// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the eLicznik bridge.
//!
//! Every failure a poller can hit while talking to the portal ends up as a
//! [`Error::Refresh`], tagged with the [`RefreshStage`] it happened in. The
//! poller never lets one escape to the host; it logs it and changes state.

use std::fmt;

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while talking to the utility portal.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a portal response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Invalid plugin or device configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A refresh of device info or device state failed.
    #[error("{stage} refresh failed: {source}")]
    Refresh {
        /// Which refresh handler failed.
        stage: RefreshStage,
        /// The underlying cause.
        #[source]
        source: Box<Error>,
    },

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps an error as a refresh failure of the given stage.
    #[must_use]
    pub fn refresh(stage: RefreshStage, source: impl Into<Error>) -> Self {
        Self::Refresh {
            stage,
            source: Box::new(source.into()),
        }
    }

    /// Returns the refresh stage if this is a refresh failure.
    #[must_use]
    pub fn stage(&self) -> Option<RefreshStage> {
        match self {
            Self::Refresh { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// The two refresh handlers of a device poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshStage {
    /// Device info refresh (session setup and metadata announcement).
    Info,
    /// Device state refresh (energy readings).
    State,
}

impl fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("device info"),
            Self::State => f.write_str("device state"),
        }
    }
}

/// Errors related to portal communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the portal failed or it answered with an error status.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The portal rejected the credentials or the session expired.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// A reading was requested before a session was opened.
    #[error("no portal session")]
    NoSession,
}

/// Errors related to parsing portal responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to plugin configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A device entry has no usable name.
    #[error("device name missing")]
    MissingName,

    /// A capability type was used before being registered.
    #[error("unregistered capability type: {0}")]
    UnregisteredType(String),

    /// The portal URL could not be used.
    #[error("invalid portal url: {0}")]
    InvalidPortalUrl(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
