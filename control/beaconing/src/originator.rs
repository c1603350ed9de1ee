// Copyright 2026 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Periodic beacon origination.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use scion_sdk_procperf::{PerfRecorder, SpanKind};
use scion_sdk_utils::fan_out::fan_out;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    beacon::{Beacon, Extender},
    interface::Interface,
    sender::SenderFactory,
    tick::Tick,
};

const DEFAULT_SENDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration of the [`Originator`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct OriginatorConfig {
    /// Maximum number of beacons originated concurrently
    pub max_concurrent: usize,
    /// Time allowed to create a sender, in seconds
    pub sender_timeout_secs: f32,
}

impl OriginatorConfig {
    /// Returns the sender creation timeout, falling back to the default for invalid values.
    pub fn sender_timeout(&self) -> Duration {
        Duration::try_from_secs_f32(self.sender_timeout_secs).unwrap_or(DEFAULT_SENDER_TIMEOUT)
    }
}

impl Default for OriginatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 16,
            sender_timeout_secs: DEFAULT_SENDER_TIMEOUT.as_secs_f32(),
        }
    }
}

/// Errors originating a beacon on a single interface.
#[derive(Debug, thiserror::Error)]
pub enum OriginateError {
    /// The timestamp does not fit the info field
    #[error("timestamp {0} cannot be encoded in a beacon")]
    InvalidTimestamp(DateTime<Utc>),
    /// The extender failed
    #[error("extending beacon")]
    Extend(#[source] anyhow::Error),
    /// The sender could not be created
    #[error("creating beacon sender")]
    NewSender(#[source] anyhow::Error),
    /// The sender was not created in time
    #[error("creating beacon sender timed out after {0:?}")]
    SenderTimeout(Duration),
    /// Sending failed
    #[error("sending beacon")]
    Send(#[source] anyhow::Error),
}

/// Result of one origination run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginationSummary {
    /// Interfaces a beacon was sent on, sorted by id
    pub egress_interfaces: Vec<u16>,
    /// Interfaces origination failed on, sorted by id
    pub failed: Vec<u16>,
    /// Number of interfaces skipped or aborted because of cancellation
    pub cancelled: usize,
    /// Number of origination tasks that panicked
    pub panicked: usize,
}

/// Source of the interfaces beacons are originated on.
pub type InterfaceSource = Arc<dyn Fn() -> Vec<Arc<Interface>> + Send + Sync>;

/// Originates beacons on all origination interfaces.
pub struct Originator {
    extender: Arc<dyn Extender>,
    sender_factory: Arc<dyn SenderFactory>,
    interfaces: InterfaceSource,
    recorder: PerfRecorder,
    config: OriginatorConfig,
    tick: Tick,
}

impl std::fmt::Debug for Originator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Originator")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

impl Originator {
    /// Creates an originator that runs every `tick` period.
    pub fn new(
        extender: Arc<dyn Extender>,
        sender_factory: Arc<dyn SenderFactory>,
        interfaces: InterfaceSource,
        tick: Tick,
        config: OriginatorConfig,
    ) -> Self {
        Self {
            extender,
            sender_factory,
            interfaces,
            recorder: PerfRecorder::noop(),
            config,
            tick,
        }
    }

    /// Records an `Originated` span for every beacon.
    pub fn with_recorder(mut self, recorder: PerfRecorder) -> Self {
        self.recorder = recorder;
        self
    }

    /// Returns the tick state.
    pub fn tick(&self) -> &Tick {
        &self.tick
    }

    /// Originates beacons on every interface that needs one.
    ///
    /// Once per period every interface gets a beacon, in between only interfaces whose last
    /// origination is overdue do.
    #[instrument(name = "originator", skip_all)]
    pub async fn run(&mut self, cancel: &CancellationToken) -> OriginationSummary {
        self.tick.set_now(Utc::now());
        let summary = self.originate_beacons(cancel).await;
        self.tick.update_last();
        summary
    }

    async fn originate_beacons(&self, cancel: &CancellationToken) -> OriginationSummary {
        let mut intfs = self.need_beacon((self.interfaces)());
        if intfs.is_empty() {
            return OriginationSummary::default();
        }
        intfs.sort_by_key(|intf| intf.id());

        let task = Arc::new(OriginationTask {
            extender: self.extender.clone(),
            sender_factory: self.sender_factory.clone(),
            recorder: self.recorder.clone(),
            timestamp: self.tick.now(),
            sender_timeout: self.config.sender_timeout(),
        });
        // Retries of stale interfaces between periods stay quiet.
        let passed = self.tick.passed();
        let result = fan_out(
            intfs,
            self.config.max_concurrent,
            cancel,
            |intf| {
                let task = task.clone();
                async move {
                    let res = task.originate(&intf).await;
                    (intf.id(), res)
                }
            },
            OriginationSummary::default(),
            |mut summary, (id, res)| {
                match res {
                    Ok(()) => summary.egress_interfaces.push(id),
                    Err(err) => {
                        if passed {
                            tracing::info!(?err, egress = id, "Unable to originate beacon");
                        } else {
                            tracing::debug!(?err, egress = id, "Unable to originate beacon");
                        }
                        summary.failed.push(id);
                    }
                }
                summary
            },
        )
        .await;

        let mut summary = result.value;
        summary.egress_interfaces.sort_unstable();
        summary.failed.sort_unstable();
        summary.cancelled = result.cancelled;
        summary.panicked = result.panicked;

        if passed {
            tracing::debug!(egress_interfaces = ?summary.egress_interfaces, "Originated beacons");
        } else if !summary.egress_interfaces.is_empty() {
            tracing::debug!(
                egress_interfaces = ?summary.egress_interfaces,
                "Originated beacons on stale interfaces"
            );
        }
        summary
    }

    fn need_beacon(&self, intfs: Vec<Arc<Interface>>) -> Vec<Arc<Interface>> {
        if self.tick.passed() {
            return intfs;
        }
        intfs
            .into_iter()
            .filter(|intf| self.tick.overdue(intf.last_originate()))
            .collect()
    }
}

struct OriginationTask {
    extender: Arc<dyn Extender>,
    sender_factory: Arc<dyn SenderFactory>,
    recorder: PerfRecorder,
    timestamp: DateTime<Utc>,
    sender_timeout: Duration,
}

impl OriginationTask {
    async fn originate(&self, intf: &Interface) -> Result<(), OriginateError> {
        let mut span = self.recorder.span(SpanKind::Originated, "");
        let beacon = match self.create_beacon(intf.id()).await {
            Ok(beacon) => beacon,
            Err(err) => {
                span.discard();
                return Err(err);
            }
        };
        span.lap();
        let id = beacon.logging_id();
        span.set_id(id.clone());
        span.set_next_id(id);

        let mut sender = tokio::time::timeout(
            self.sender_timeout,
            self.sender_factory
                .new_sender(intf.id(), intf.internal_addr()),
        )
        .await
        .map_err(|_| OriginateError::SenderTimeout(self.sender_timeout))?
        .map_err(OriginateError::NewSender)?;
        span.lap();

        let sent = sender.send(&beacon).await;
        if let Err(err) = sender.close().await {
            tracing::debug!(%err, egress = intf.id(), "Failed to close beacon sender");
        }
        sent.map_err(OriginateError::Send)?;
        span.lap();

        intf.originate(self.timestamp);
        Ok(())
    }

    async fn create_beacon(&self, egress: u16) -> Result<Beacon, OriginateError> {
        let mut beacon = Beacon::new(self.timestamp, rand::random())?;
        self.extender
            .extend(&mut beacon, 0, egress)
            .await
            .map_err(OriginateError::Extend)?;
        Ok(beacon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_fall_back_to_default_timeout() {
        let config = OriginatorConfig {
            sender_timeout_secs: -1.0,
            ..Default::default()
        };
        assert_eq!(config.sender_timeout(), DEFAULT_SENDER_TIMEOUT);

        let config = OriginatorConfig {
            sender_timeout_secs: 0.5,
            ..Default::default()
        };
        assert_eq!(config.sender_timeout(), Duration::from_millis(500));
    }
}
