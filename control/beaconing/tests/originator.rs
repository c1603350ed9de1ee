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

//! Origination runs against in-memory collaborators.

use std::{
    collections::HashSet,
    io,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use scion_path::{HopField, HopFieldMac};
use scion_sdk_beaconing::{
    Beacon, Extender, Interface, OriginationSummary, Originator, OriginatorConfig, Sender,
    SenderFactory, Tick,
};
use scion_sdk_procperf::{PerfError, PerfRecorder, PerfSink, SpanKind, SpanRecord};
use test_log::test;
use tokio_util::sync::CancellationToken;

struct MacExtender;

#[async_trait]
impl Extender for MacExtender {
    async fn extend(&self, beacon: &mut Beacon, ingress: u16, egress: u16) -> anyhow::Result<()> {
        beacon.hops.push(HopField {
            exp_time: 63,
            cons_ingress: ingress,
            cons_egress: egress,
            mac: HopFieldMac([egress as u8; 6]),
            ..Default::default()
        });
        Ok(())
    }
}

#[derive(Default)]
struct Network {
    sent: Mutex<Vec<(u16, Beacon)>>,
    closed: Mutex<usize>,
    broken: HashSet<u16>,
    unreachable: HashSet<u16>,
}

struct NetworkSender {
    egress: u16,
    network: Arc<Network>,
}

struct NetworkFactory(Arc<Network>);

#[async_trait]
impl SenderFactory for NetworkFactory {
    async fn new_sender(
        &self,
        egress: u16,
        _nexthop: SocketAddr,
    ) -> anyhow::Result<Box<dyn Sender>> {
        if self.0.unreachable.contains(&egress) {
            std::future::pending::<()>().await;
        }
        Ok(Box::new(NetworkSender {
            egress,
            network: self.0.clone(),
        }))
    }
}

#[async_trait]
impl Sender for NetworkSender {
    async fn send(&mut self, beacon: &Beacon) -> anyhow::Result<()> {
        if self.network.broken.contains(&self.egress) {
            anyhow::bail!("link {} is down", self.egress);
        }
        self.network
            .sent
            .lock()
            .unwrap()
            .push((self.egress, beacon.clone()));
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        *self.network.closed.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
struct CollectingSink {
    spans: Mutex<Vec<SpanRecord>>,
}

impl PerfSink for CollectingSink {
    fn record(&self, span: &SpanRecord) -> Result<(), PerfError> {
        self.spans.lock().unwrap().push(span.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), PerfError> {
        Ok(())
    }
}

fn interfaces(ids: &[u16]) -> Vec<Arc<Interface>> {
    ids.iter()
        .map(|&id| {
            Arc::new(Interface::new(
                id,
                SocketAddr::from(([10, 0, 0, id as u8], 30042)),
            ))
        })
        .collect()
}

fn originator(network: Arc<Network>, intfs: Vec<Arc<Interface>>) -> Originator {
    Originator::new(
        Arc::new(MacExtender),
        Arc::new(NetworkFactory(network)),
        Arc::new(move || intfs.clone()),
        Tick::new(Duration::from_secs(3600)),
        OriginatorConfig {
            max_concurrent: 2,
            sender_timeout_secs: 1.0,
        },
    )
}

#[test(tokio::test)]
async fn should_originate_on_all_interfaces() {
    let network = Arc::new(Network::default());
    let intfs = interfaces(&[3, 1, 2]);
    let sink = Arc::new(CollectingSink::default());
    let mut originator = originator(network.clone(), intfs.clone())
        .with_recorder(PerfRecorder::from_shared(sink.clone()));

    let summary = originator.run(&CancellationToken::new()).await;

    assert_eq!(
        summary,
        OriginationSummary {
            egress_interfaces: vec![1, 2, 3],
            ..Default::default()
        }
    );
    let sent = network.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    for (egress, beacon) in sent.iter() {
        assert!(beacon.info.cons_dir());
        assert_eq!(beacon.hops.len(), 1);
        assert_eq!(beacon.hops[0].cons_ingress, 0);
        assert_eq!(beacon.hops[0].cons_egress, *egress);
        assert_eq!(beacon.to_path().unwrap().hop_fields(), beacon.hops.as_slice());
    }
    assert_eq!(*network.closed.lock().unwrap(), 3);

    let now = originator.tick().now();
    assert_eq!(originator.tick().last(), Some(now));
    for intf in &intfs {
        assert_eq!(intf.last_originate(), Some(now));
    }

    let spans = sink.spans.lock().unwrap();
    assert_eq!(spans.len(), 3);
    for span in spans.iter() {
        assert_eq!(span.kind, SpanKind::Originated);
        assert_eq!(span.laps.len(), 3);
        assert_eq!(span.next_id.as_deref(), Some(span.id.as_str()));
    }
}

#[test(tokio::test)]
async fn should_retry_only_failed_interfaces_within_period() {
    let network = Arc::new(Network {
        broken: HashSet::from([2]),
        ..Default::default()
    });
    let intfs = interfaces(&[1, 2]);
    let mut originator = originator(network.clone(), intfs.clone());

    let summary = originator.run(&CancellationToken::new()).await;
    assert_eq!(summary.egress_interfaces, vec![1]);
    assert_eq!(summary.failed, vec![2]);
    assert_eq!(intfs[1].last_originate(), None);
    // Failed sends still close the sender.
    assert_eq!(*network.closed.lock().unwrap(), 2);

    let summary = originator.run(&CancellationToken::new()).await;
    assert!(summary.egress_interfaces.is_empty());
    assert_eq!(summary.failed, vec![2]);
    assert_eq!(network.sent.lock().unwrap().len(), 1);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn count(&self, needle: &str) -> usize {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .matches(needle)
            .count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn should_log_stale_retries_below_info() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let network = Arc::new(Network {
        broken: HashSet::from([2]),
        ..Default::default()
    });
    let mut originator = originator(network, interfaces(&[1, 2]));

    let summary = originator.run(&CancellationToken::new()).await;
    assert_eq!(summary.failed, vec![2]);
    assert_eq!(logs.count("Unable to originate beacon"), 1);

    let summary = originator.run(&CancellationToken::new()).await;
    assert_eq!(summary.failed, vec![2]);
    assert_eq!(logs.count("Unable to originate beacon"), 1);
}

#[test(tokio::test(start_paused = true))]
async fn should_time_out_sender_creation() {
    let network = Arc::new(Network {
        unreachable: HashSet::from([1]),
        ..Default::default()
    });
    let mut originator = originator(network.clone(), interfaces(&[1, 2]));

    let summary = originator.run(&CancellationToken::new()).await;

    assert_eq!(summary.egress_interfaces, vec![2]);
    assert_eq!(summary.failed, vec![1]);
}

#[test(tokio::test)]
async fn should_not_originate_when_cancelled() {
    let network = Arc::new(Network::default());
    let intfs = interfaces(&[1, 2, 3]);
    let mut originator = originator(network.clone(), intfs.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = originator.run(&cancel).await;

    assert!(summary.egress_interfaces.is_empty());
    assert_eq!(summary.cancelled, 3);
    assert!(network.sent.lock().unwrap().is_empty());
    assert!(intfs.iter().all(|intf| intf.last_originate().is_none()));
}

#[test(tokio::test)]
async fn should_skip_run_without_interfaces() {
    let network = Arc::new(Network::default());
    let mut originator = originator(network, Vec::new());

    let summary = originator.run(&CancellationToken::new()).await;

    assert_eq!(summary, OriginationSummary::default());
    assert!(originator.tick().last().is_some());
}

#[test]
fn should_deserialize_config_with_defaults() {
    let config: OriginatorConfig = serde_json::from_str(r#"{"max_concurrent": 4}"#).unwrap();

    assert_eq!(config.max_concurrent, 4);
    assert_eq!(config.sender_timeout(), Duration::from_secs(5));
}
