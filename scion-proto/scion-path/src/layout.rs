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

//! Byte layout of the standard path
//!
//! Layouts are the source of truth for where each record sits in a path buffer. Both path
//! representations and [`PathState`](crate::base::PathState) derive their offsets from here.
//!
//! ```text
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           PathMeta                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           InfoField                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                              ...                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           HopField                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                              ...                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use std::ops::Range;

/// Size of the path meta header in bytes
pub const META_LEN: usize = 4;
/// Size of an info field in bytes
pub const INFO_LEN: usize = 8;
/// Size of a hop field in bytes
pub const HOP_LEN: usize = 12;
/// Size of a hop field MAC in bytes
pub const MAC_LEN: usize = 6;

/// Maximum number of segments, and therefore info fields, in a path
pub const MAX_SEGMENTS: usize = 3;
/// Maximum number of hop fields in a single segment
pub const MAX_SEGMENT_LEN: usize = 63;
/// Maximum number of hop fields in a path
///
/// The current hop pointer is 6 bits wide, so a path with more hop fields could neither be
/// traversed to its end nor reversed.
pub const MAX_HOPS: usize = 64;

/// Offsets of all records in a standard path with the given record counts
///
/// The layout does no bounds checking of its own, callers validate indices against the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathLayout {
    num_segments: usize,
    total_hops: usize,
}
impl PathLayout {
    /// Creates the layout for `num_segments` info fields and `total_hops` hop fields
    #[inline]
    pub const fn new(num_segments: usize, total_hops: usize) -> Self {
        Self {
            num_segments,
            total_hops,
        }
    }

    /// Returns the number of info fields
    #[inline]
    pub const fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// Returns the number of hop fields
    #[inline]
    pub const fn total_hops(&self) -> usize {
        self.total_hops
    }

    /// Returns the byte offset of the info field at `index`
    #[inline]
    pub const fn info_offset(&self, index: usize) -> usize {
        META_LEN + index * INFO_LEN
    }

    /// Returns the byte offset of the hop field at `index`
    #[inline]
    pub const fn hop_offset(&self, index: usize) -> usize {
        META_LEN + self.num_segments * INFO_LEN + index * HOP_LEN
    }

    /// Returns the byte range of the info field at `index`
    #[inline]
    pub const fn info_range(&self, index: usize) -> Range<usize> {
        let start = self.info_offset(index);
        start..start + INFO_LEN
    }

    /// Returns the byte range of the hop field at `index`
    #[inline]
    pub const fn hop_range(&self, index: usize) -> Range<usize> {
        let start = self.hop_offset(index);
        start..start + HOP_LEN
    }

    /// Returns the total length of the path in bytes
    #[inline]
    pub const fn len(&self) -> usize {
        META_LEN + self.num_segments * INFO_LEN + self.total_hops * HOP_LEN
    }
}
