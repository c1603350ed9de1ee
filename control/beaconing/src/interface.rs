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

//! Local interfaces beacons are originated on.

use std::{
    net::SocketAddr,
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};

/// An egress interface of the local AS.
///
/// Shared between the originator and its tasks, the origination time is updated in place.
#[derive(Debug)]
pub struct Interface {
    id: u16,
    internal_addr: SocketAddr,
    last_originate: Mutex<Option<DateTime<Utc>>>,
}

impl Interface {
    /// Creates an interface that has never originated a beacon.
    pub fn new(id: u16, internal_addr: SocketAddr) -> Self {
        Self {
            id,
            internal_addr,
            last_originate: Mutex::new(None),
        }
    }

    /// Returns the interface id.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Returns the internal address of the router owning the interface.
    pub fn internal_addr(&self) -> SocketAddr {
        self.internal_addr
    }

    /// Returns when a beacon was last originated on the interface.
    pub fn last_originate(&self) -> Option<DateTime<Utc>> {
        *self
            .last_originate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records that a beacon was originated at `at`.
    pub fn originate(&self, at: DateTime<Utc>) {
        *self
            .last_originate
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(at);
    }
}
