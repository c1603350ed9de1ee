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

//! Destinations for span records

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Mutex, PoisonError},
};

use crate::{
    PerfError,
    record::{LINE_HEADER, SpanRecord},
};

/// Receives completed spans.
pub trait PerfSink: Send + Sync {
    /// Records a span.
    fn record(&self, span: &SpanRecord) -> Result<(), PerfError>;

    /// Persists buffered records.
    fn flush(&self) -> Result<(), PerfError>;
}

/// Writes one line per span to a [`Write`] implementation.
///
/// Lines are buffered. The buffer is flushed on [`PerfSink::flush`] and when the sink is dropped.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<BufWriter<W>>,
}

impl WriterSink<File> {
    /// Creates (or truncates) the file at `path` and writes the header line.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, PerfError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        tracing::debug!(path = %path.display(), "Opened performance log");
        Self::new(file)
    }
}

impl<W: Write + Send> WriterSink<W> {
    /// Wraps `writer` and writes the header line.
    pub fn new(writer: W) -> Result<Self, PerfError> {
        let mut writer = BufWriter::new(writer);
        writeln!(writer, "{LINE_HEADER}")?;
        Ok(WriterSink {
            writer: Mutex::new(writer),
        })
    }
}

impl<W: Write + Send> PerfSink for WriterSink<W> {
    fn record(&self, span: &SpanRecord) -> Result<(), PerfError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", span.to_line())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), PerfError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Drop for WriterSink<W> {
    fn drop(&mut self) {
        let writer = self.writer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writer.flush() {
            tracing::warn!(?err, "Failed to flush performance log");
        }
    }
}

/// Emits every span as a tracing event at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl PerfSink for TracingSink {
    fn record(&self, span: &SpanRecord) -> Result<(), PerfError> {
        tracing::info!(
            kind = %span.kind,
            id = %span.id,
            next_id = ?span.next_id,
            duration = ?span.duration(),
            laps = ?span.laps,
            "Span completed"
        );
        Ok(())
    }

    fn flush(&self) -> Result<(), PerfError> {
        Ok(())
    }
}

/// Discards every span.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl PerfSink for NoopSink {
    fn record(&self, _span: &SpanRecord) -> Result<(), PerfError> {
        Ok(())
    }

    fn flush(&self) -> Result<(), PerfError> {
        Ok(())
    }
}
