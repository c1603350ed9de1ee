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

//! Performance span recording for control plane services.
//!
//! Services record how long it took to receive, process, originate or propagate a beacon. The
//! recording is done through a [`PerfRecorder`] handle that is constructed once and passed to the
//! components that need it. Where the spans end up is decided by the [`PerfSink`] behind the
//! handle: a file, the tracing subscriber or nowhere.
//!
//! ```no_run
//! use scion_sdk_procperf::{PerfRecorder, SpanKind, WriterSink};
//!
//! # fn main() -> Result<(), scion_sdk_procperf::PerfError> {
//! let recorder = PerfRecorder::new(WriterSink::create("procperf.csv")?);
//!
//! let mut span = recorder.span(SpanKind::Originated, "beacon-1");
//! span.lap();
//! span.finish()?;
//!
//! recorder.shutdown()?;
//! # Ok(())
//! # }
//! ```

pub mod record;
pub mod recorder;
pub mod sink;

pub use record::{SpanKind, SpanRecord};
pub use recorder::{PerfRecorder, SpanGuard};
pub use sink::{NoopSink, PerfSink, TracingSink, WriterSink};

/// Errors of the performance recorder
#[derive(Debug, thiserror::Error)]
pub enum PerfError {
    /// Writing to the sink failed
    #[error("writing performance record failed: {0}")]
    Io(#[from] std::io::Error),
    /// A propagated beacon was completed without the id it was propagated under
    #[error("no next id for propagated beacon {id}")]
    MissingNextId {
        /// Id of the beacon
        id: String,
    },
    /// A beacon was completed that was never marked as pending
    #[error("beacon {id} is not pending")]
    UnknownId {
        /// Id of the beacon
        id: String,
    },
}
