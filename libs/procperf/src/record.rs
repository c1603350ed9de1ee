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

//! Span records

use std::{fmt::Display, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};

/// Header line written before the first record.
pub const LINE_HEADER: &str = "Type; ID; Next ID; Start Time; End Time; Laps (us)";

/// What happened to a beacon during a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// The beacon was received from a neighbor
    Received,
    /// The beacon was extended and sent to a neighbor
    Propagated,
    /// The beacon was created by this AS
    Originated,
    /// The beacon was verified and stored
    Processed,
}
impl SpanKind {
    /// Returns the name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Received => "Received",
            SpanKind::Propagated => "Propagated",
            SpanKind::Originated => "Originated",
            SpanKind::Processed => "Processed",
        }
    }
}
impl Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    /// What happened during the span
    pub kind: SpanKind,
    /// Id of the beacon
    pub id: String,
    /// Id the beacon continues under, e.g. after propagation
    pub next_id: Option<String>,
    /// Start of the span
    pub start: DateTime<Utc>,
    /// End of the span
    pub end: DateTime<Utc>,
    /// Durations of the intermediate steps, in order
    pub laps: Vec<Duration>,
}

impl SpanRecord {
    /// Returns the duration of the span, zero if the wall clock went backwards.
    pub fn duration(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }

    /// Formats the record as one line matching [`LINE_HEADER`], without line break.
    pub fn to_line(&self) -> String {
        let laps = self
            .laps
            .iter()
            .map(|lap| lap.as_micros().to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}; {}; {}; {}; {}; {}",
            self.kind,
            self.id,
            self.next_id.as_deref().unwrap_or_default(),
            self.start.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.end.to_rfc3339_opts(SecondsFormat::Micros, true),
            laps
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(next_id: Option<&str>) -> SpanRecord {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        SpanRecord {
            kind: SpanKind::Propagated,
            id: "b1".into(),
            next_id: next_id.map(Into::into),
            start,
            end: start + chrono::TimeDelta::milliseconds(3),
            laps: vec![Duration::from_micros(1200), Duration::from_micros(800)],
        }
    }

    #[test]
    fn should_format_record_as_line() {
        assert_eq!(
            record(Some("b2")).to_line(),
            "Propagated; b1; b2; 2026-03-01T12:00:00.000000Z; 2026-03-01T12:00:00.003000Z; 1200,800"
        );
        assert!(record(None).to_line().starts_with("Propagated; b1; ; "));
    }

    #[test]
    fn should_clamp_negative_duration() {
        let mut record = record(None);
        assert_eq!(record.duration(), Duration::from_millis(3));

        std::mem::swap(&mut record.start, &mut record.end);
        assert_eq!(record.duration(), Duration::ZERO);
    }
}
