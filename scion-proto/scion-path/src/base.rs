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

//! Validated path meta header and the position state machine shared by both path
//! representations.
//!
//! A [`PathState`] can only be obtained through validation, so every instance satisfies:
//!
//! - 1 to 3 segments, all non-empty and contiguous from the first segment length entry
//! - at most [`MAX_HOPS`] hop fields in total
//! - `curr_info_idx < num_segments` and `curr_hop_idx < total_hops`
//!
//! The current info field is allowed to disagree with the segment of the current hop field.
//! [`PathState::curr_inf_matches_curr_hf`] reports that case, it is up to the forwarding logic to
//! reject it.

use crate::{
    error::{FieldKind, PathError},
    layout::{MAX_HOPS, MAX_SEGMENTS, PathLayout},
    meta::MetaHeader,
};

/// Position state of a standard path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathState {
    meta: MetaHeader,
    num_segments: usize,
    total_hops: usize,
}

impl PathState {
    /// Decodes and validates the meta header at the start of `bytes`.
    pub fn decode_from_bytes(bytes: &[u8]) -> Result<Self, PathError> {
        Self::from_meta(MetaHeader::decode_from_bytes(bytes)?)
    }

    /// Validates a meta header.
    pub fn from_meta(meta: MetaHeader) -> Result<Self, PathError> {
        let num_segments = meta.num_segments();
        if num_segments == 0 {
            return Err(PathError::InvalidSegmentCount("path has no segments"));
        }
        if meta.seg_len[num_segments..].iter().any(|len| *len != 0) {
            return Err(PathError::InvalidSegmentCount(
                "empty segment followed by a non-empty segment",
            ));
        }

        let total_hops = meta.total_hops();
        if total_hops > MAX_HOPS {
            return Err(PathError::InvalidSegmentCount(
                "path has more hop fields than the hop pointer can address",
            ));
        }
        if usize::from(meta.curr_info_idx) >= num_segments {
            return Err(PathError::InvalidSegmentCount(
                "current info field index exceeds the number of segments",
            ));
        }
        if usize::from(meta.curr_hop_idx) >= total_hops {
            return Err(PathError::InvalidSegmentCount(
                "current hop field index exceeds the number of hop fields",
            ));
        }

        Ok(PathState {
            meta,
            num_segments,
            total_hops,
        })
    }

    /// Returns the meta header reflecting the current position.
    #[inline]
    pub fn meta(&self) -> &MetaHeader {
        &self.meta
    }

    /// Returns the number of segments, which equals the number of info fields.
    #[inline]
    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// Returns the number of hop fields.
    #[inline]
    pub fn total_hops(&self) -> usize {
        self.total_hops
    }

    /// Returns the index of the current info field.
    #[inline]
    pub fn curr_info_idx(&self) -> usize {
        usize::from(self.meta.curr_info_idx)
    }

    /// Returns the index of the current hop field.
    #[inline]
    pub fn curr_hop_idx(&self) -> usize {
        usize::from(self.meta.curr_hop_idx)
    }

    /// Returns the record layout of the path.
    #[inline]
    pub fn layout(&self) -> PathLayout {
        PathLayout::new(self.num_segments, self.total_hops)
    }

    /// Returns the length of the encoded path in bytes.
    #[inline]
    pub fn path_len(&self) -> usize {
        self.layout().len()
    }

    /// Returns the byte offset of info field `index`.
    pub fn info_offset(&self, index: usize) -> Result<usize, PathError> {
        self.check_info_index(index)?;
        Ok(self.layout().info_offset(index))
    }

    /// Returns the byte offset of hop field `index`.
    pub fn hop_offset(&self, index: usize) -> Result<usize, PathError> {
        self.check_hop_index(index)?;
        Ok(self.layout().hop_offset(index))
    }

    /// Returns the index of the segment that hop field `hop_idx` belongs to.
    pub fn inf_index_for_hf(&self, hop_idx: usize) -> Result<usize, PathError> {
        self.check_hop_index(hop_idx)?;

        let mut end = 0;
        for (seg_idx, len) in self.meta.seg_len[..self.num_segments].iter().enumerate() {
            end += usize::from(*len);
            if hop_idx < end {
                return Ok(seg_idx);
            }
        }
        // Unreachable for a validated state, the segment lengths add up to `total_hops`.
        Err(PathError::IndexOutOfRange {
            kind: FieldKind::Hop,
            index: hop_idx,
            count: end,
        })
    }

    /// Returns true if the current hop field is the first one.
    #[inline]
    pub fn is_first_hop(&self) -> bool {
        self.curr_hop_idx() == 0
    }

    /// Returns true if the current hop field is the second to last one.
    #[inline]
    pub fn is_penultimate_hop(&self) -> bool {
        self.total_hops.checked_sub(2) == Some(self.curr_hop_idx())
    }

    /// Returns true if the current hop field is the last one.
    #[inline]
    pub fn is_last_hop(&self) -> bool {
        self.curr_hop_idx() + 1 == self.total_hops
    }

    /// Returns true if the current info field is the one of the current hop field's segment.
    pub fn curr_inf_matches_curr_hf(&self) -> bool {
        self.inf_index_for_hf(self.curr_hop_idx())
            .is_ok_and(|seg_idx| seg_idx == self.curr_info_idx())
    }

    /// Advances the current position by one hop field.
    ///
    /// When the next hop field starts a new segment, the current info field moves along. The
    /// current info field never moves backwards, even if it was ahead of the hop field before.
    pub fn increment_path(&mut self) -> Result<(), PathError> {
        if self.is_last_hop() {
            return Err(PathError::EndOfPath {
                curr_hop: self.meta.curr_hop_idx,
                total_hops: self.total_hops,
            });
        }

        let next_hop = self.curr_hop_idx() + 1;
        let next_info = self.inf_index_for_hf(next_hop)?.max(self.curr_info_idx());

        // Both fit their bit fields: next_hop < total_hops <= 64, next_info < 3.
        self.meta.curr_hop_idx = next_hop as u8;
        self.meta.curr_info_idx = next_info as u8;
        Ok(())
    }

    /// Sets the current info field index without touching the current hop field.
    pub fn set_curr_info_idx(&mut self, index: usize) -> Result<(), PathError> {
        self.check_info_index(index)?;
        self.meta.curr_info_idx = index as u8;
        Ok(())
    }

    /// Sets the current hop field index without touching the current info field.
    pub fn set_curr_hop_idx(&mut self, index: usize) -> Result<(), PathError> {
        self.check_hop_index(index)?;
        self.meta.curr_hop_idx = index as u8;
        Ok(())
    }

    /// Returns the state of the same path traversed in the opposite direction.
    pub(crate) fn reversed(&self) -> Self {
        let n = self.num_segments;
        let mut seg_len = [0u8; MAX_SEGMENTS];
        for (dst, src) in seg_len[..n].iter_mut().zip(self.meta.seg_len[..n].iter().rev()) {
            *dst = *src;
        }

        PathState {
            meta: MetaHeader {
                curr_info_idx: (n - 1 - self.curr_info_idx()) as u8,
                curr_hop_idx: (self.total_hops - 1 - self.curr_hop_idx()) as u8,
                seg_len,
            },
            num_segments: n,
            total_hops: self.total_hops,
        }
    }

    fn check_info_index(&self, index: usize) -> Result<(), PathError> {
        if index >= self.num_segments {
            return Err(PathError::IndexOutOfRange {
                kind: FieldKind::Info,
                index,
                count: self.num_segments,
            });
        }
        Ok(())
    }

    fn check_hop_index(&self, index: usize) -> Result<(), PathError> {
        if index >= self.total_hops {
            return Err(PathError::IndexOutOfRange {
                kind: FieldKind::Hop,
                index,
                count: self.total_hops,
            });
        }
        Ok(())
    }
}
