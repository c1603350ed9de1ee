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

//! Errors of the path codec.
//!
//! None of these are retried internally. For a router every variant means that the packet must
//! be dropped.

use std::fmt::Display;

/// The kind of record an index or a byte range refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// The path meta header
    Meta,
    /// A segment, as described by one segment length entry
    Segment,
    /// An info field
    Info,
    /// A hop field
    Hop,
}
impl Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::Meta => "meta header",
            FieldKind::Segment => "segment",
            FieldKind::Info => "info field",
            FieldKind::Hop => "hop field",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when decoding, encoding or advancing a standard path
#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq, Hash)]
pub enum PathError {
    /// The input buffer is shorter than the structure it declares
    #[error("buffer too short at {at}: required {required}, actual {actual}")]
    BufferTooShort {
        /// Structure that was being decoded
        at: &'static str,
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        actual: usize,
    },
    /// The output buffer cannot hold the encoded structure
    #[error("buffer too small at {at}: required {required}, actual {actual}")]
    BufferTooSmall {
        /// Structure that was being encoded
        at: &'static str,
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        actual: usize,
    },
    /// A fixed-width record could not be decoded
    #[error("malformed {kind}: required {required} bytes, actual {actual}")]
    MalformedField {
        /// Kind of the record
        kind: FieldKind,
        /// Width of the record
        required: usize,
        /// Number of bytes available
        actual: usize,
    },
    /// Segment lengths or current position pointers are inconsistent
    #[error("invalid segment count: {0}")]
    InvalidSegmentCount(&'static str),
    /// An index is not within the valid count for its kind
    #[error("{kind} index out of range: index {index}, count {count}")]
    IndexOutOfRange {
        /// Kind of the indexed record
        kind: FieldKind,
        /// Requested index
        index: usize,
        /// Number of valid entries
        count: usize,
    },
    /// The path cannot be advanced, the current hop is the last one
    #[error("path already at end: current hop {curr_hop}, total hops {total_hops}")]
    EndOfPath {
        /// Current hop field index
        curr_hop: u8,
        /// Number of hop fields in the path
        total_hops: usize,
    },
}
