// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Standalone runner.
//!
//! Loads a platform configuration, publishes the meters into a
//! [`LoggingHost`] and polls them until interrupted.
//!
//! ```text
//! elicznik-bridge <config.json> [storage-dir]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use elicznik_bridge::config::PlatformConfig;
use elicznik_bridge::hap::{CapabilityRegistry, types};
use elicznik_bridge::host::LoggingHost;
use elicznik_bridge::platform::PlatformRegistrar;
use elicznik_bridge::poller::ENERGY_SERVICE_SUBTYPE;
use elicznik_bridge::{DeviceEvent, DeviceId, Result};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = env::args().skip(1);
    let Some(config_path) = args.next() else {
        eprintln!("usage: elicznik-bridge <config.json> [storage-dir]");
        return ExitCode::from(2);
    };
    let storage = args.next().map_or_else(|| PathBuf::from("."), PathBuf::from);

    match run(&config_path, storage).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "elicznik-bridge failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: &str, storage: PathBuf) -> Result<()> {
    let config = PlatformConfig::load(config_path)?;
    let host = Arc::new(LoggingHost::new(storage));
    let registry = Arc::new(CapabilityRegistry::new());

    let mut registrar = PlatformRegistrar::new(config, Arc::clone(&host), registry);
    let mut events = registrar.subscribe();
    registrar.did_finish_launching();

    if registrar.poller_count() == 0 {
        tracing::warn!("No devices to poll");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    log_event(&event);
                    if let DeviceEvent::StateRefreshed { device_id, .. } = event {
                        read_energy(&host, device_id);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event receiver lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    registrar.shutdown();
    Ok(())
}

/// Reads the energy characteristics the way a controller would, which logs
/// them unless the device disabled read logging.
fn read_energy(host: &LoggingHost, device_id: DeviceId) {
    let published = host.published();
    let Some(service) = published
        .iter()
        .find(|a| a.uuid() == device_id.as_uuid())
        .and_then(|a| a.service(types::ENERGY_SERVICE.uuid, Some(ENERGY_SERVICE_SUBTYPE)))
    else {
        return;
    };

    for kind in [&types::ENERGY_IMPORT, &types::ENERGY_EXPORT] {
        if let Some(characteristic) = service.characteristic(kind.uuid) {
            let value = characteristic.read();
            tracing::trace!(device = %device_id, characteristic = kind.name, %value, "Read");
        }
    }
}

fn log_event(event: &DeviceEvent) {
    match event {
        DeviceEvent::StateRefreshed { device_id, readings } => tracing::info!(
            device = %device_id,
            import_kwh = readings.import_kwh,
            export_kwh = readings.export_kwh,
            "Readings refreshed"
        ),
        DeviceEvent::RefreshFailed { device_id, stage, error } => {
            tracing::debug!(device = %device_id, %stage, error = %error, "Refresh failed");
        }
        other => tracing::debug!(event = ?other, "Device event"),
    }
}
