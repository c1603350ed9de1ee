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

//! Transport of beacons to neighbors.

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::beacon::Beacon;

/// Creates senders for beacons.
#[async_trait]
pub trait SenderFactory: Send + Sync {
    /// Creates a sender for beacons leaving through interface `egress`, towards the router at
    /// `nexthop`.
    async fn new_sender(&self, egress: u16, nexthop: SocketAddr)
    -> anyhow::Result<Box<dyn Sender>>;
}

/// Sends beacons to a neighbor.
#[async_trait]
pub trait Sender: Send {
    /// Sends a beacon.
    async fn send(&mut self, beacon: &Beacon) -> anyhow::Result<()>;

    /// Releases the resources held by the sender.
    async fn close(&mut self) -> anyhow::Result<()>;
}
