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

//! Path segment beacons.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scion_path::{DecodedPath, HopField, InfoField, InfoFieldFlags, PathError};

use crate::originator::OriginateError;

/// A path segment beacon under construction.
///
/// Beacons are built in construction direction, every AS on the way appends its hop field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    /// Info field of the segment
    pub info: InfoField,
    /// Hop fields in construction direction
    pub hops: Vec<HopField>,
}

impl Beacon {
    /// Creates an empty beacon originated at `timestamp`.
    pub fn new(timestamp: DateTime<Utc>, segment_id: u16) -> Result<Self, OriginateError> {
        let ts = u32::try_from(timestamp.timestamp())
            .map_err(|_| OriginateError::InvalidTimestamp(timestamp))?;
        Ok(Self {
            info: InfoField {
                flags: InfoFieldFlags::CONS_DIR,
                segment_id,
                timestamp: ts,
            },
            hops: Vec::new(),
        })
    }

    /// Returns an id identifying the beacon in logs and performance records.
    pub fn logging_id(&self) -> String {
        format!("{:08x}-{:04x}", self.info.timestamp, self.info.segment_id)
    }

    /// Returns the beacon as a single segment path positioned at its first hop.
    pub fn to_path(&self) -> Result<DecodedPath, PathError> {
        DecodedPath::new(0, 0, vec![(self.info, self.hops.clone())])
    }
}

/// Adds the local AS's entry to beacons.
#[async_trait]
pub trait Extender: Send + Sync {
    /// Appends the hop entry for traversing the local AS from `ingress` to `egress`.
    ///
    /// Interface id 0 means the beacon starts or ends in the local AS.
    async fn extend(&self, beacon: &mut Beacon, ingress: u16, egress: u16) -> anyhow::Result<()>;
}
