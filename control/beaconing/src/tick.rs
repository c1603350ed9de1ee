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

//! Periodic task timing.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Tracks when a periodic task last did its full work.
///
/// A tick is started with [`Tick::set_now`], checked with [`Tick::passed`] and
/// [`Tick::overdue`], and completed with [`Tick::update_last`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    now: DateTime<Utc>,
    last: Option<DateTime<Utc>>,
    period: TimeDelta,
}

impl Tick {
    /// Creates a tick that has never passed.
    pub fn new(period: Duration) -> Self {
        Self {
            now: DateTime::UNIX_EPOCH,
            last: None,
            period: TimeDelta::from_std(period).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Returns the time of the current tick.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns the time the period last passed.
    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    /// Returns the period.
    pub fn period(&self) -> TimeDelta {
        self.period
    }

    /// Starts a new tick.
    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }

    /// Returns true if at least one period elapsed since the last time it passed.
    pub fn passed(&self) -> bool {
        match self.last {
            Some(last) => self.now.signed_duration_since(last) >= self.period,
            None => true,
        }
    }

    /// Returns true if more than one period elapsed since `ts`.
    pub fn overdue(&self, ts: Option<DateTime<Utc>>) -> bool {
        match ts {
            Some(ts) => self.now.signed_duration_since(ts) > self.period,
            None => true,
        }
    }

    /// Records the current tick as the last one if the period passed.
    pub fn update_last(&mut self) {
        if self.passed() {
            self.last = Some(self.now);
        }
    }
}
