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

//! The recorder handle passed to instrumented components

use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};

use crate::{
    PerfError,
    record::{SpanKind, SpanRecord},
    sink::{NoopSink, PerfSink},
};

/// Cloneable handle to a [`PerfSink`].
///
/// Besides timing spans directly, the recorder remembers when beacons became pending so that a
/// span can be emitted once the beacon is done, possibly from another component.
#[derive(Clone)]
pub struct PerfRecorder {
    sink: Arc<dyn PerfSink>,
    pending: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl Debug for PerfRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfRecorder")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl Default for PerfRecorder {
    fn default() -> Self {
        Self::noop()
    }
}

impl PerfRecorder {
    /// Creates a recorder writing to `sink`.
    pub fn new(sink: impl PerfSink + 'static) -> Self {
        Self::from_shared(Arc::new(sink))
    }

    /// Creates a recorder writing to a shared sink.
    pub fn from_shared(sink: Arc<dyn PerfSink>) -> Self {
        PerfRecorder {
            sink,
            pending: Default::default(),
        }
    }

    /// Creates a recorder that discards everything.
    pub fn noop() -> Self {
        Self::new(NoopSink)
    }

    /// Starts a span. It is recorded when the guard is finished or dropped.
    pub fn span(&self, kind: SpanKind, id: impl Into<String>) -> SpanGuard {
        SpanGuard {
            recorder: self.clone(),
            kind,
            id: id.into(),
            next_id: None,
            start: Utc::now(),
            last_lap: Instant::now(),
            laps: Vec::new(),
            done: false,
        }
    }

    /// Records a span that was timed elsewhere.
    pub fn record(&self, span: &SpanRecord) -> Result<(), PerfError> {
        self.sink.record(span)
    }

    /// Remembers that beacon `id` became pending at `at`.
    ///
    /// Marking an id twice keeps the later time.
    pub fn mark_pending(&self, id: impl Into<String>, at: DateTime<Utc>) {
        self.pending().insert(id.into(), at);
    }

    /// Records the span of pending beacon `id` ending at `at` and forgets the beacon.
    ///
    /// [`SpanKind::Propagated`] spans need the id the beacon was propagated under. On error the
    /// beacon stays pending.
    pub fn complete_pending(
        &self,
        id: &str,
        kind: SpanKind,
        at: DateTime<Utc>,
        next_id: Option<String>,
    ) -> Result<(), PerfError> {
        let start = {
            let mut pending = self.pending();
            let Some(start) = pending.get(id).copied() else {
                return Err(PerfError::UnknownId { id: id.to_string() });
            };
            if kind == SpanKind::Propagated && next_id.is_none() {
                return Err(PerfError::MissingNextId { id: id.to_string() });
            }
            pending.remove(id);
            start
        };

        self.sink.record(&SpanRecord {
            kind,
            id: id.to_string(),
            next_id,
            start,
            end: at,
            laps: Vec::new(),
        })
    }

    /// Forgets pending beacon `id` without recording a span.
    ///
    /// Returns false if the beacon was not pending.
    pub fn forget_pending(&self, id: &str) -> bool {
        self.pending().remove(id).is_some()
    }

    /// Forgets all beacons that became pending before `cutoff` and returns how many there were.
    pub fn expire_pending(&self, cutoff: DateTime<Utc>) -> usize {
        let mut pending = self.pending();
        let before = pending.len();
        pending.retain(|_, at| *at >= cutoff);
        before - pending.len()
    }

    /// Returns the number of pending beacons.
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Flushes the sink.
    pub fn flush(&self) -> Result<(), PerfError> {
        self.sink.flush()
    }

    /// Flushes the sink and releases this handle.
    ///
    /// Beacons that are still pending are dropped. The sink itself is closed once the last
    /// handle is gone.
    pub fn shutdown(self) -> Result<(), PerfError> {
        let pending = self.pending_count();
        if pending > 0 {
            tracing::debug!(pending, "Shutting down with pending beacons");
        }
        self.sink.flush()
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A running span.
///
/// Dropping the guard records the span. Use [`SpanGuard::finish`] to observe recording errors.
#[must_use = "the span ends when the guard is dropped"]
pub struct SpanGuard {
    recorder: PerfRecorder,
    kind: SpanKind,
    id: String,
    next_id: Option<String>,
    start: DateTime<Utc>,
    last_lap: Instant,
    laps: Vec<Duration>,
    done: bool,
}

impl SpanGuard {
    /// Ends a lap and returns its duration.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let lap = now.duration_since(self.last_lap);
        self.last_lap = now;
        self.laps.push(lap);
        lap
    }

    /// Returns the id the span is recorded under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Changes the id the span is recorded under.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Sets the id the beacon continues under.
    pub fn set_next_id(&mut self, next_id: impl Into<String>) {
        self.next_id = Some(next_id.into());
    }

    /// Ends the span and records it.
    pub fn finish(mut self) -> Result<(), PerfError> {
        self.write()
    }

    /// Ends the span without recording it.
    pub fn discard(mut self) {
        self.done = true;
    }

    fn write(&mut self) -> Result<(), PerfError> {
        self.done = true;
        let record = SpanRecord {
            kind: self.kind,
            id: std::mem::take(&mut self.id),
            next_id: self.next_id.take(),
            start: self.start,
            end: Utc::now(),
            laps: std::mem::take(&mut self.laps),
        };
        self.recorder.record(&record)
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Err(err) = self.write() {
            tracing::warn!(?err, kind = %self.kind, "Failed to record span");
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

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

    fn recorder() -> (PerfRecorder, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::default());
        (PerfRecorder::from_shared(sink.clone()), sink)
    }

    #[test]
    fn should_record_span_on_drop() {
        let (recorder, sink) = recorder();
        {
            let mut span = recorder.span(SpanKind::Originated, "a");
            span.lap();
            span.lap();
            span.set_next_id("b");
        }

        let spans = sink.spans.lock().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Originated);
        assert_eq!(spans[0].id, "a");
        assert_eq!(spans[0].next_id.as_deref(), Some("b"));
        assert_eq!(spans[0].laps.len(), 2);
        assert!(spans[0].end >= spans[0].start);
    }

    #[test]
    fn should_record_finished_span_once() {
        let (recorder, sink) = recorder();
        let mut span = recorder.span(SpanKind::Processed, "tmp");
        span.set_id("final");
        span.finish().unwrap();

        let spans = sink.spans.lock().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].id, "final");
    }

    #[test]
    fn should_not_record_discarded_span() {
        let (recorder, sink) = recorder();
        let mut span = recorder.span(SpanKind::Originated, "a");
        span.lap();
        span.discard();

        assert!(sink.spans.lock().unwrap().is_empty());
    }

    #[test]
    fn should_complete_pending_beacon() {
        let (recorder, sink) = recorder();
        let received = Utc::now();
        recorder.mark_pending("beacon", received);

        let done = received + chrono::TimeDelta::milliseconds(5);
        recorder
            .complete_pending("beacon", SpanKind::Processed, done, None)
            .unwrap();

        assert_eq!(recorder.pending_count(), 0);
        let spans = sink.spans.lock().unwrap();
        assert_eq!(spans[0].start, received);
        assert_eq!(spans[0].duration(), Duration::from_millis(5));
    }

    #[test]
    fn should_drop_abandoned_pending_beacons() {
        let (recorder, sink) = recorder();
        let now = Utc::now();
        recorder.mark_pending("old", now - chrono::TimeDelta::seconds(60));
        recorder.mark_pending("fresh", now);
        recorder.mark_pending("dropped", now);

        assert!(recorder.forget_pending("dropped"));
        assert!(!recorder.forget_pending("dropped"));
        assert_eq!(recorder.expire_pending(now - chrono::TimeDelta::seconds(10)), 1);
        assert_eq!(recorder.pending_count(), 1);
        assert!(sink.spans.lock().unwrap().is_empty());

        recorder
            .complete_pending("fresh", SpanKind::Processed, now, None)
            .unwrap();
        assert!(matches!(
            recorder.complete_pending("old", SpanKind::Processed, now, None),
            Err(PerfError::UnknownId { .. })
        ));
    }

    #[test]
    fn should_reject_unknown_and_incomplete_beacons() {
        let (recorder, sink) = recorder();
        let now = Utc::now();

        assert!(matches!(
            recorder.complete_pending("nope", SpanKind::Processed, now, None),
            Err(PerfError::UnknownId { id }) if id == "nope"
        ));

        recorder.mark_pending("beacon", now);
        assert!(matches!(
            recorder.complete_pending("beacon", SpanKind::Propagated, now, None),
            Err(PerfError::MissingNextId { .. })
        ));
        assert_eq!(recorder.pending_count(), 1);

        recorder
            .complete_pending("beacon", SpanKind::Propagated, now, Some("next".into()))
            .unwrap();
        assert_eq!(sink.spans.lock().unwrap()[0].next_id.as_deref(), Some("next"));
        assert!(matches!(
            recorder.complete_pending("beacon", SpanKind::Processed, now, None),
            Err(PerfError::UnknownId { .. })
        ));
    }

    #[test]
    fn should_share_pending_beacons_between_clones() {
        let (recorder, _sink) = recorder();
        let clone = recorder.clone();
        clone.mark_pending("beacon", Utc::now());

        assert_eq!(recorder.pending_count(), 1);
        recorder.shutdown().unwrap();
        assert_eq!(clone.pending_count(), 1);
    }
}
