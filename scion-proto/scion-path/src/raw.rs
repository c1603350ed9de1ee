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

//! Lazily decoded standard path over a caller provided buffer.
//!
//! Only the meta header is decoded up front. Info and hop fields are transcoded on access,
//! directly from and into the backing buffer. The buffer can be anything that dereferences to a
//! byte slice: `&[u8]` for read-only inspection, `&mut [u8]` or `Vec<u8>` to forward.
//!
//! The meta header bytes in the buffer are rewritten after every position change, so the buffer
//! is a valid encoding of the path at all times.

use std::ops::{Deref, DerefMut, Range};

use crate::{
    base::PathState,
    decoded::DecodedPath,
    encode::{WireEncode, ensure_capacity},
    error::PathError,
    field::{HopField, InfoField},
    layout::META_LEN,
};

/// Standard path backed by a byte buffer.
#[derive(Debug, Clone)]
pub struct RawPath<B> {
    state: PathState,
    buf: B,
}

impl<B> RawPath<B>
where
    B: Deref<Target = [u8]>,
{
    /// Decodes the meta header of `data` and keeps `data` as the backing buffer.
    ///
    /// Fails if `data` is shorter than the path its meta header declares. Trailing bytes are kept
    /// but never read.
    pub fn decode_from_bytes(data: B) -> Result<Self, PathError> {
        let state = PathState::decode_from_bytes(&data)?;
        if data.len() < state.path_len() {
            return Err(PathError::BufferTooShort {
                at: "RawPath",
                required: state.path_len(),
                actual: data.len(),
            });
        }

        Ok(RawPath { state, buf: data })
    }

    /// Returns the position state.
    #[inline]
    pub fn state(&self) -> &PathState {
        &self.state
    }

    /// Returns the encoded path, without trailing bytes of the backing buffer.
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.state.path_len().min(self.buf.len());
        &self.buf[..len]
    }

    /// Returns the backing buffer.
    pub fn into_inner(self) -> B {
        self.buf
    }

    /// Returns the raw bytes of info field `index`.
    pub fn info_field_bytes(&self, index: usize) -> Result<&[u8], PathError> {
        let range = self.info_range(index)?;
        self.region(range)
    }

    /// Returns the raw bytes of hop field `index`.
    ///
    /// This is the MAC input a verifier typically needs.
    pub fn hop_field_bytes(&self, index: usize) -> Result<&[u8], PathError> {
        let range = self.hop_range(index)?;
        self.region(range)
    }

    /// Decodes info field `index`.
    pub fn info_field(&self, index: usize) -> Result<InfoField, PathError> {
        InfoField::decode_from_bytes(self.info_field_bytes(index)?)
    }

    /// Decodes hop field `index`.
    pub fn hop_field(&self, index: usize) -> Result<HopField, PathError> {
        HopField::decode_from_bytes(self.hop_field_bytes(index)?)
    }

    /// Decodes the current info field.
    pub fn current_info_field(&self) -> Result<InfoField, PathError> {
        self.info_field(self.state.curr_info_idx())
    }

    /// Decodes the current hop field.
    pub fn current_hop_field(&self) -> Result<HopField, PathError> {
        self.hop_field(self.state.curr_hop_idx())
    }

    /// Fully decodes the path.
    pub fn to_decoded(&self) -> Result<DecodedPath, PathError> {
        DecodedPath::decode_from_bytes(&self.buf)
    }

    fn info_range(&self, index: usize) -> Result<Range<usize>, PathError> {
        self.state.info_offset(index)?;
        Ok(self.state.layout().info_range(index))
    }

    fn hop_range(&self, index: usize) -> Result<Range<usize>, PathError> {
        self.state.hop_offset(index)?;
        Ok(self.state.layout().hop_range(index))
    }

    fn region(&self, range: Range<usize>) -> Result<&[u8], PathError> {
        let actual = self.buf.len();
        self.buf.get(range.clone()).ok_or(PathError::BufferTooShort {
            at: "RawPath",
            required: range.end,
            actual,
        })
    }
}

impl<B> RawPath<B>
where
    B: DerefMut<Target = [u8]>,
{
    /// Encodes `field` into info field slot `index`.
    pub fn set_info_field(&mut self, field: &InfoField, index: usize) -> Result<(), PathError> {
        let range = self.info_range(index)?;
        field.serialize_to(self.region_mut(range)?)?;
        Ok(())
    }

    /// Encodes `field` into hop field slot `index`.
    pub fn set_hop_field(&mut self, field: &HopField, index: usize) -> Result<(), PathError> {
        let range = self.hop_range(index)?;
        field.serialize_to(self.region_mut(range)?)?;
        Ok(())
    }

    /// Advances the current position by one hop field and updates the buffer.
    ///
    /// See [`PathState::increment_path`].
    pub fn increment_path(&mut self) -> Result<(), PathError> {
        self.state.increment_path()?;
        self.flush_meta()
    }

    /// Sets the current info field index and updates the buffer.
    pub fn set_curr_info_idx(&mut self, index: usize) -> Result<(), PathError> {
        self.state.set_curr_info_idx(index)?;
        self.flush_meta()
    }

    /// Sets the current hop field index and updates the buffer.
    pub fn set_curr_hop_idx(&mut self, index: usize) -> Result<(), PathError> {
        self.state.set_curr_hop_idx(index)?;
        self.flush_meta()
    }

    /// Reverses the path in place.
    ///
    /// The path is fully decoded, reversed and encoded back into the same buffer. The reversed
    /// path has the same length, so it fits.
    pub fn reverse(&mut self) -> Result<(), PathError> {
        let reversed = self.to_decoded()?.reverse();
        reversed.serialize_to(&mut self.buf)?;
        self.state = PathState::decode_from_bytes(&self.buf)?;
        Ok(())
    }

    fn flush_meta(&mut self) -> Result<(), PathError> {
        let meta = *self.state.meta();
        meta.serialize_to(&mut self.buf)?;
        Ok(())
    }

    fn region_mut(&mut self, range: Range<usize>) -> Result<&mut [u8], PathError> {
        let actual = self.buf.len();
        self.buf.get_mut(range.clone()).ok_or(PathError::BufferTooShort {
            at: "RawPath",
            required: range.end,
            actual,
        })
    }
}

impl<B> WireEncode for RawPath<B>
where
    B: Deref<Target = [u8]>,
{
    fn encoded_len(&self) -> usize {
        self.state.path_len()
    }

    /// Writes the meta header for the current position followed by the info and hop fields as
    /// they are in the backing buffer.
    ///
    /// The meta header is rebuilt from the position state, so its reserved bits are written as
    /// zero. The output equals the decoded input byte for byte only if those bits were zero.
    fn serialize_to(&self, dst: &mut [u8]) -> Result<usize, PathError> {
        let len = self.encoded_len();
        ensure_capacity("RawPath", dst, len)?;

        let fields = self.region(META_LEN..len)?;
        self.state.meta().serialize_to(dst)?;
        dst[META_LEN..len].copy_from_slice(fields);
        Ok(len)
    }
}

impl<B> PartialEq for RawPath<B>
where
    B: Deref<Target = [u8]>,
{
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.as_bytes() == other.as_bytes()
    }
}
