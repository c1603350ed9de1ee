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

//! Path meta header

use std::ops::Range;

use crate::{
    encode::{WireEncode, ensure_capacity},
    error::{FieldKind, PathError},
    layout::{MAX_SEGMENTS, META_LEN},
};

const CURR_INF_SHIFT: u32 = 30;
const CURR_HF_SHIFT: u32 = 24;
const SEG_LEN_SHIFTS: [u32; MAX_SEGMENTS] = [12, 6, 0];
const CURR_INF_MASK: u32 = 0b11;
const SIX_BIT_MASK: u32 = 0b11_1111;

/// Standard path meta header.
///
/// Carries the current position of the packet and the number of hop fields per segment.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | C |  CurrHF   |    RSV    |  Seg0Len  |  Seg1Len  |  Seg2Len  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Decoding does not check the pointers against the segment lengths, see
/// [`PathState`](crate::base::PathState) for a validated header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MetaHeader {
    /// Index of the current info field (2 bits)
    pub curr_info_idx: u8,
    /// Index of the current hop field (6 bits)
    pub curr_hop_idx: u8,
    /// Number of hop fields in each segment (6 bits each)
    pub seg_len: [u8; MAX_SEGMENTS],
}

impl MetaHeader {
    /// Decodes the meta header from the first [`META_LEN`] bytes of `bytes`.
    pub fn decode_from_bytes(bytes: &[u8]) -> Result<Self, PathError> {
        let Some(buf) = bytes.first_chunk::<META_LEN>() else {
            return Err(PathError::BufferTooShort {
                at: "MetaHeader",
                required: META_LEN,
                actual: bytes.len(),
            });
        };
        let line = u32::from_be_bytes(*buf);

        Ok(MetaHeader {
            curr_info_idx: ((line >> CURR_INF_SHIFT) & CURR_INF_MASK) as u8,
            curr_hop_idx: ((line >> CURR_HF_SHIFT) & SIX_BIT_MASK) as u8,
            seg_len: SEG_LEN_SHIFTS.map(|shift| ((line >> shift) & SIX_BIT_MASK) as u8),
        })
    }

    /// Returns the number of leading non-zero segment lengths.
    pub fn num_segments(&self) -> usize {
        self.seg_len.iter().take_while(|len| **len != 0).count()
    }

    /// Returns the sum of all segment lengths.
    pub fn total_hops(&self) -> usize {
        self.seg_len.iter().map(|len| usize::from(*len)).sum()
    }

    /// Returns the hop field indices `[start, end)` covered by segment `index`.
    pub fn segment_span(&self, index: usize) -> Result<Range<usize>, PathError> {
        let Some(len) = self.seg_len.get(index) else {
            return Err(PathError::IndexOutOfRange {
                kind: FieldKind::Segment,
                index,
                count: MAX_SEGMENTS,
            });
        };
        let start: usize = self.seg_len[..index]
            .iter()
            .map(|len| usize::from(*len))
            .sum();

        Ok(start..start + usize::from(*len))
    }

    fn to_line(self) -> u32 {
        let mut line = (u32::from(self.curr_info_idx) & CURR_INF_MASK) << CURR_INF_SHIFT
            | (u32::from(self.curr_hop_idx) & SIX_BIT_MASK) << CURR_HF_SHIFT;
        for (len, shift) in self.seg_len.iter().zip(SEG_LEN_SHIFTS) {
            line |= (u32::from(*len) & SIX_BIT_MASK) << shift;
        }
        line
    }
}

impl WireEncode for MetaHeader {
    fn encoded_len(&self) -> usize {
        META_LEN
    }

    /// Writes the header with zeroed reserved bits. Values wider than their bit field are
    /// truncated to it.
    fn serialize_to(&self, dst: &mut [u8]) -> Result<usize, PathError> {
        ensure_capacity("MetaHeader", dst, META_LEN)?;
        dst[..META_LEN].copy_from_slice(&self.to_line().to_be_bytes());
        Ok(META_LEN)
    }
}
