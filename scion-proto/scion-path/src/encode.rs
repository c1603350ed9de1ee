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

//! Encoding of path structures into byte buffers
//!
//! Every structure that can be put on the wire implements [`WireEncode`]. The trait has two
//! responsibilities:
//!
//! 1. Reporting the exact size of the wire encoding
//! 2. Writing the wire format into a provided byte buffer, refusing undersized buffers
//!
//! Structures are validated when they are constructed or decoded, so encoding never has to reject
//! a structure for its content.

use crate::error::PathError;

/// Allows encoding to wire format.
pub trait WireEncode {
    /// Returns the number of bytes the wire encoding occupies.
    fn encoded_len(&self) -> usize;

    /// Writes the wire encoding to the beginning of `dst`.
    ///
    /// Returns the number of bytes written, or [`PathError::BufferTooSmall`] if `dst` is shorter
    /// than [`encoded_len`](Self::encoded_len). Bytes past the encoding are left untouched.
    fn serialize_to(&self, dst: &mut [u8]) -> Result<usize, PathError>;

    /// Encodes into a newly allocated buffer of exactly [`encoded_len`](Self::encoded_len) bytes.
    fn encode_to_vec(&self) -> Result<Vec<u8>, PathError> {
        let mut buf = vec![0u8; self.encoded_len()];
        let written = self.serialize_to(&mut buf)?;
        buf.truncate(written);
        Ok(buf)
    }
}

/// Returns an error if `dst` cannot hold `required` bytes.
#[inline]
pub(crate) fn ensure_capacity(
    at: &'static str,
    dst: &[u8],
    required: usize,
) -> Result<(), PathError> {
    if dst.len() < required {
        return Err(PathError::BufferTooSmall {
            at,
            required,
            actual: dst.len(),
        });
    }
    Ok(())
}
