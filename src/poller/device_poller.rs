// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device polling loop.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::energy_accessory::{EnergyCache, prepare_accessory};
use super::poll_state::{PollState, Refresh, TickReport, Transition};
use crate::config::{DeviceConfig, PLUGIN_NAME};
use crate::error::{Error, RefreshStage};
use crate::event::{DeviceEvent, DeviceId, EventBus};
use crate::hap::{CapabilityRegistry, Service, types};
use crate::host::Host;
use crate::portal::{EnergyReadings, EnergySource};

/// Name of the per-device preferences directory under the host storage path.
pub const PREFERENCES_DIR: &str = "eLicznik";

/// Polls one meter and republishes its readings.
///
/// Construction prepares and publishes the accessory once. Each
/// [`tick`](Self::tick) then runs the refresh handlers the current
/// [`PollState`] calls for. [`spawn`](Self::spawn) drives ticks from a timer
/// on a dedicated task; the poller's state is only touched from that task.
pub struct DevicePoller<S, H> {
    id: DeviceId,
    config: DeviceConfig,
    source: S,
    host: Arc<H>,
    events: EventBus,
    state: PollState,
    state_tx: watch::Sender<PollState>,
    cache: EnergyCache,
    energy_service: Option<Service>,
    accessory_pending: bool,
}

impl<S, H> DevicePoller<S, H>
where
    S: EnergySource,
    H: Host,
{
    /// Creates a poller, its preferences directory and its accessory.
    ///
    /// Nothing here fails: a missing directory or an unbuildable accessory is
    /// logged and polling goes on without it.
    pub fn new(
        config: DeviceConfig,
        source: S,
        host: Arc<H>,
        registry: &CapabilityRegistry,
        events: EventBus,
    ) -> Self {
        let (state_tx, _) = watch::channel(PollState::Fresh);
        let mut poller = Self {
            id: DeviceId::from_name(&config.name),
            config,
            source,
            host,
            events,
            state: PollState::Fresh,
            state_tx,
            cache: EnergyCache::default(),
            energy_service: None,
            accessory_pending: true,
        };

        poller.ensure_preferences_dir();
        if poller.accessory_pending {
            poller.prepare_accessory(registry);
        }
        poller
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the device configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the current poll state.
    #[must_use]
    pub fn state(&self) -> PollState {
        self.state
    }

    /// Returns true if the next tick starts with an info refresh.
    #[must_use]
    pub fn info_pending(&self) -> bool {
        self.state.info_pending()
    }

    /// Returns true if the next tick goes straight to a state refresh.
    #[must_use]
    pub fn state_pending(&self) -> bool {
        self.state.state_pending()
    }

    /// Returns true until the accessory has been published.
    #[must_use]
    pub fn accessory_pending(&self) -> bool {
        self.accessory_pending
    }

    /// Returns the last stored readings.
    #[must_use]
    pub fn readings(&self) -> EnergyReadings {
        self.cache.get()
    }

    /// Returns the preferences directory of this device.
    #[must_use]
    pub fn preferences_dir(&self) -> PathBuf {
        self.host.storage_path().join(PREFERENCES_DIR)
    }

    /// Subscribes to poll state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<PollState> {
        self.state_tx.subscribe()
    }

    fn ensure_preferences_dir(&self) {
        let dir = self.preferences_dir();
        if dir.exists() {
            return;
        }
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::error!(
                device = %self.config.name,
                path = %dir.display(),
                error = %e,
                "Failed to create preferences directory"
            );
        }
    }

    fn prepare_accessory(&mut self, registry: &CapabilityRegistry) {
        tracing::debug!(device = %self.config.name, "Preparing accessory");

        match prepare_accessory(&self.config, registry, &self.cache) {
            Ok(prepared) => {
                self.energy_service = Some(prepared.energy_service);
                tracing::debug!(
                    "Device: {} {}, publishExternalAccessories.",
                    self.config.meter_id,
                    self.config.name
                );
                self.host
                    .publish_external_accessories(PLUGIN_NAME, vec![prepared.accessory]);
                self.events
                    .publish(DeviceEvent::AccessoryPublished { device_id: self.id });
            }
            Err(e) => {
                tracing::error!(
                    device = %self.config.name,
                    error = %e,
                    "Failed to prepare accessory"
                );
            }
        }
        // preparation is one-shot, even when it failed
        self.accessory_pending = false;
    }

    /// Runs one tick of the state machine.
    ///
    /// With info pending, refreshes info and, if that worked, state in the
    /// same tick. Otherwise refreshes state only. Errors never leave this
    /// method; they are logged and turned into transitions.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        if self.state.info_pending() {
            match self.refresh_info().await {
                Ok(()) => {
                    report.info = Refresh::Succeeded;
                    self.apply(Transition::InfoSucceeded);
                    report.state = self.run_state_refresh().await;
                }
                Err(e) => {
                    report.info = Refresh::Failed;
                    tracing::error!(
                        "Device: {} {}, Device Info error: {}, state: Offline, trying to reconnect",
                        self.config.meter_id,
                        self.config.name,
                        e
                    );
                    self.events.publish(DeviceEvent::refresh_failed(
                        self.id,
                        RefreshStage::Info,
                        e.to_string(),
                    ));
                    self.apply(Transition::InfoFailed);
                }
            }
        } else if self.state.state_pending() {
            report.state = self.run_state_refresh().await;
        }

        report
    }

    async fn run_state_refresh(&mut self) -> Refresh {
        match self.refresh_state().await {
            Ok(_) => Refresh::Succeeded,
            Err(e) => {
                tracing::error!(
                    "Device: {} {}, update Device state error: {}",
                    self.config.meter_id,
                    self.config.name,
                    e
                );
                self.events.publish(DeviceEvent::refresh_failed(
                    self.id,
                    RefreshStage::State,
                    e.to_string(),
                ));
                self.apply(Transition::StateFailed);
                Refresh::Failed
            }
        }
    }

    /// Opens a source session and announces the device metadata.
    ///
    /// # Errors
    ///
    /// Returns a [`RefreshStage::Info`] refresh error if the source cannot
    /// be connected.
    pub async fn refresh_info(&mut self) -> Result<(), Error> {
        tracing::debug!(
            "Device: {} {}, requesting Device Info.",
            self.config.meter_id,
            self.config.name
        );

        self.source
            .connect()
            .await
            .map_err(|e| Error::refresh(RefreshStage::Info, e))?;

        let config = &self.config;
        tracing::info!("-------- {} --------", config.name);
        tracing::info!("Manufacturer: {}", config.manufacturer);
        tracing::info!("Model: {}", config.model_name);
        tracing::info!("Meter Id: {}", config.meter_id);
        tracing::info!("Serialnr: {}", config.serial_number);
        tracing::info!("Firmware: {}", config.firmware_revision);
        tracing::info!("----------------------------------");

        self.events
            .publish(DeviceEvent::InfoRefreshed { device_id: self.id });
        Ok(())
    }

    /// Fetches readings, stores them and pushes them to the characteristics.
    ///
    /// Does not change the poll state; [`tick`](Self::tick) does.
    ///
    /// # Errors
    ///
    /// Returns a [`RefreshStage::State`] refresh error if the readings cannot
    /// be fetched.
    pub async fn refresh_state(&mut self) -> Result<EnergyReadings, Error> {
        tracing::debug!(
            "Device: {} {}, requesting Device state.",
            self.config.meter_id,
            self.config.name
        );

        let readings = self
            .source
            .fetch_readings()
            .await
            .map_err(|e| Error::refresh(RefreshStage::State, e))?;

        if let Some(service) = &self.energy_service {
            service
                .update_characteristic(&types::ENERGY_IMPORT, readings.import_kwh)
                .update_characteristic(&types::ENERGY_EXPORT, readings.export_kwh);
        }
        self.cache.set(readings);
        self.apply(Transition::StateSucceeded);

        tracing::debug!(
            device = %self.config.name,
            import_kwh = readings.import_kwh,
            export_kwh = readings.export_kwh,
            "Device state updated"
        );
        self.events.publish(DeviceEvent::StateRefreshed {
            device_id: self.id,
            readings,
        });
        Ok(readings)
    }

    fn apply(&mut self, transition: Transition) {
        let next = self.state.next(transition);
        if next != self.state {
            tracing::debug!(
                device = %self.config.name,
                from = %self.state,
                to = %next,
                "Poll state changed"
            );
            self.state = next;
            self.state_tx.send_replace(next);
        }
    }

    /// Runs ticks forever, one per refresh interval.
    ///
    /// The first tick fires one full interval after the call. A tick that
    /// overruns the interval delays the next one instead of bunching ticks.
    pub async fn run(mut self) {
        let period = self.config.refresh_interval();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(
            device = %self.config.name,
            interval_secs = period.as_secs(),
            "Starting poller"
        );

        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Moves the poller onto its own task.
    #[must_use]
    pub fn spawn(self) -> PollerHandle {
        let id = self.id;
        let name = self.config.name.clone();
        let state = self.watch_state();
        let cache = self.cache.clone();
        let task = tokio::spawn(self.run());

        PollerHandle {
            id,
            name,
            state,
            cache,
            task,
        }
    }
}

impl<S, H> std::fmt::Debug for DevicePoller<S, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevicePoller")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("state", &self.state)
            .field("accessory_pending", &self.accessory_pending)
            .finish_non_exhaustive()
    }
}

/// Handle to a spawned poller.
#[derive(Debug)]
pub struct PollerHandle {
    id: DeviceId,
    name: String,
    state: watch::Receiver<PollState>,
    cache: EnergyCache,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the poller's current state.
    #[must_use]
    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    /// Returns a receiver for state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<PollState> {
        self.state.clone()
    }

    /// Returns the poller's cached readings.
    #[must_use]
    pub fn readings(&self) -> EnergyReadings {
        self.cache.get()
    }

    /// Stops the poller task.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Returns true once the task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
