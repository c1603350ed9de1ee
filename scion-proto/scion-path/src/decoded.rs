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

//! Fully decoded standard path

use crate::{
    base::PathState,
    encode::{WireEncode, ensure_capacity},
    error::{FieldKind, PathError},
    field::{HopField, InfoField, InfoFieldFlags},
    layout::{MAX_SEGMENT_LEN, MAX_SEGMENTS, META_LEN},
    meta::MetaHeader,
};

/// Standard path with all info and hop fields decoded into owned vectors.
///
/// Hop fields are stored in buffer order, grouped by segment. The segment lengths of the
/// [`PathState`] give the boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedPath {
    state: PathState,
    info_fields: Vec<InfoField>,
    hop_fields: Vec<HopField>,
}

impl DecodedPath {
    /// Decodes a complete path from the start of `data`.
    pub fn decode_from_bytes(data: &[u8]) -> Result<Self, PathError> {
        let state = PathState::decode_from_bytes(data)?;
        let layout = state.layout();
        if data.len() < layout.len() {
            return Err(PathError::BufferTooShort {
                at: "DecodedPath",
                required: layout.len(),
                actual: data.len(),
            });
        }

        let info_fields = (0..state.num_segments())
            .map(|i| InfoField::decode_from_bytes(&data[layout.info_range(i)]))
            .collect::<Result<Vec<_>, _>>()?;
        let hop_fields = (0..state.total_hops())
            .map(|i| HopField::decode_from_bytes(&data[layout.hop_range(i)]))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DecodedPath {
            state,
            info_fields,
            hop_fields,
        })
    }

    /// Builds a path from its segments.
    ///
    /// Each segment is an info field with its hop fields in buffer order. The result is
    /// validated like a decoded path.
    pub fn new(
        curr_info_idx: u8,
        curr_hop_idx: u8,
        segments: Vec<(InfoField, Vec<HopField>)>,
    ) -> Result<Self, PathError> {
        if segments.is_empty() || segments.len() > MAX_SEGMENTS {
            return Err(PathError::InvalidSegmentCount(
                "path must have between one and three segments",
            ));
        }

        let mut seg_len = [0u8; MAX_SEGMENTS];
        let mut info_fields = Vec::with_capacity(segments.len());
        let mut hop_fields = Vec::new();
        for (slot, (info, hops)) in seg_len.iter_mut().zip(segments) {
            if hops.is_empty() {
                return Err(PathError::InvalidSegmentCount("segment has no hop fields"));
            }
            if hops.len() > MAX_SEGMENT_LEN {
                return Err(PathError::InvalidSegmentCount(
                    "segment has more hop fields than its length field can hold",
                ));
            }
            *slot = hops.len() as u8;
            info_fields.push(info);
            hop_fields.extend(hops);
        }

        let state = PathState::from_meta(MetaHeader {
            curr_info_idx,
            curr_hop_idx,
            seg_len,
        })?;

        Ok(DecodedPath {
            state,
            info_fields,
            hop_fields,
        })
    }

    /// Returns the position state.
    #[inline]
    pub fn state(&self) -> &PathState {
        &self.state
    }

    /// Returns all info fields, one per segment.
    pub fn info_fields(&self) -> &[InfoField] {
        &self.info_fields
    }

    /// Returns all hop fields in buffer order.
    pub fn hop_fields(&self) -> &[HopField] {
        &self.hop_fields
    }

    /// Returns the info field at `index`.
    pub fn info_field(&self, index: usize) -> Result<&InfoField, PathError> {
        let count = self.info_fields.len();
        self.info_fields.get(index).ok_or(PathError::IndexOutOfRange {
            kind: FieldKind::Info,
            index,
            count,
        })
    }

    /// Returns the hop field at `index`.
    pub fn hop_field(&self, index: usize) -> Result<&HopField, PathError> {
        let count = self.hop_fields.len();
        self.hop_fields.get(index).ok_or(PathError::IndexOutOfRange {
            kind: FieldKind::Hop,
            index,
            count,
        })
    }

    /// Returns the info field at `index` for modification.
    pub fn info_field_mut(&mut self, index: usize) -> Result<&mut InfoField, PathError> {
        let count = self.info_fields.len();
        self.info_fields
            .get_mut(index)
            .ok_or(PathError::IndexOutOfRange {
                kind: FieldKind::Info,
                index,
                count,
            })
    }

    /// Returns the hop field at `index` for modification.
    pub fn hop_field_mut(&mut self, index: usize) -> Result<&mut HopField, PathError> {
        let count = self.hop_fields.len();
        self.hop_fields
            .get_mut(index)
            .ok_or(PathError::IndexOutOfRange {
                kind: FieldKind::Hop,
                index,
                count,
            })
    }

    /// Returns the current info field.
    pub fn current_info_field(&self) -> Result<&InfoField, PathError> {
        self.info_field(self.state.curr_info_idx())
    }

    /// Returns the current hop field.
    pub fn current_hop_field(&self) -> Result<&HopField, PathError> {
        self.hop_field(self.state.curr_hop_idx())
    }

    /// Iterates over the segments, each an info field with its hop fields.
    pub fn segments(&self) -> impl Iterator<Item = (&InfoField, &[HopField])> {
        let mut rest = self.hop_fields.as_slice();
        self.info_fields
            .iter()
            .zip(self.state.meta().seg_len)
            .map(move |(info, len)| {
                let (hops, tail) = rest.split_at(usize::from(len).min(rest.len()));
                rest = tail;
                (info, hops)
            })
    }

    /// Advances the current position by one hop field.
    ///
    /// See [`PathState::increment_path`].
    pub fn increment_path(&mut self) -> Result<(), PathError> {
        self.state.increment_path()
    }

    /// Sets the current info field index.
    pub fn set_curr_info_idx(&mut self, index: usize) -> Result<(), PathError> {
        self.state.set_curr_info_idx(index)
    }

    /// Sets the current hop field index.
    pub fn set_curr_hop_idx(&mut self, index: usize) -> Result<(), PathError> {
        self.state.set_curr_hop_idx(index)
    }

    /// Returns the path for traffic in the opposite direction.
    ///
    /// Segments and the hop fields within them swap order and every segment flips its
    /// construction direction flag. The current position is mirrored, so the reversed path
    /// points at the same hop field as before.
    pub fn reverse(&self) -> DecodedPath {
        let info_fields = self
            .info_fields
            .iter()
            .rev()
            .map(|info| {
                let mut info = *info;
                info.flags.toggle(InfoFieldFlags::CONS_DIR);
                info
            })
            .collect();
        // Reversing the flat hop vector reverses the segment order and the order within each
        // segment at once.
        let hop_fields = self.hop_fields.iter().rev().copied().collect();
        let state = self.state.reversed();

        tracing::trace!(
            num_segments = state.num_segments(),
            total_hops = state.total_hops(),
            curr_info = state.curr_info_idx(),
            curr_hop = state.curr_hop_idx(),
            "Reversed path"
        );

        DecodedPath {
            state,
            info_fields,
            hop_fields,
        }
    }
}

impl WireEncode for DecodedPath {
    fn encoded_len(&self) -> usize {
        self.state.path_len()
    }

    fn serialize_to(&self, dst: &mut [u8]) -> Result<usize, PathError> {
        let layout = self.state.layout();
        ensure_capacity("DecodedPath", dst, layout.len())?;

        self.state.meta().serialize_to(&mut dst[..META_LEN])?;
        for (i, info) in self.info_fields.iter().enumerate() {
            info.serialize_to(&mut dst[layout.info_range(i)])?;
        }
        for (i, hop) in self.hop_fields.iter().enumerate() {
            hop.serialize_to(&mut dst[layout.hop_range(i)])?;
        }

        Ok(layout.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::HopFieldMac;

    fn hop(tag: u8) -> HopField {
        HopField {
            mac: HopFieldMac([tag; 6]),
            cons_ingress: u16::from(tag),
            ..Default::default()
        }
    }

    fn info(segment_id: u16, cons_dir: bool) -> InfoField {
        InfoField {
            flags: if cons_dir {
                InfoFieldFlags::CONS_DIR
            } else {
                InfoFieldFlags::empty()
            },
            segment_id,
            timestamp: 1_700_000_000,
        }
    }

    fn three_segment_path() -> DecodedPath {
        DecodedPath::new(
            1,
            3,
            vec![
                (info(1, false), vec![hop(1), hop(2)]),
                (info(2, true), vec![hop(3), hop(4)]),
                (info(3, true), vec![hop(5)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn should_group_hop_fields_by_segment() {
        let path = three_segment_path();
        let segments: Vec<_> = path
            .segments()
            .map(|(info, hops)| (info.segment_id, hops.len()))
            .collect();

        assert_eq!(segments, [(1, 2), (2, 2), (3, 1)]);
        assert_eq!(path.current_info_field().unwrap().segment_id, 2);
        assert_eq!(path.current_hop_field().unwrap(), &hop(4));
    }

    #[test]
    fn should_reverse_segments_hops_and_direction() {
        let path = three_segment_path();
        let reversed = path.reverse();

        let ids: Vec<_> = reversed
            .info_fields()
            .iter()
            .map(|info| (info.segment_id, info.cons_dir()))
            .collect();
        assert_eq!(ids, [(3, false), (2, false), (1, true)]);

        let macs: Vec<_> = reversed.hop_fields().iter().map(|h| h.mac.0[0]).collect();
        assert_eq!(macs, [5, 4, 3, 2, 1]);
        assert_eq!(reversed.state().meta().seg_len, [1, 2, 2]);

        // Same hop field, seen from the other end.
        assert_eq!(reversed.state().curr_info_idx(), 1);
        assert_eq!(reversed.state().curr_hop_idx(), 1);
        assert_eq!(reversed.current_hop_field().unwrap(), &hop(4));
        assert!(reversed.state().curr_inf_matches_curr_hf());

        assert_eq!(reversed.reverse(), path);
    }

    #[test]
    fn should_leave_receiver_untouched_on_reverse() {
        let path = three_segment_path();
        let before = path.clone();
        let _ = path.reverse();
        assert_eq!(path, before);
    }

    #[test]
    fn should_round_trip_through_bytes() {
        let path = three_segment_path();
        let bytes = path.encode_to_vec().unwrap();

        assert_eq!(bytes.len(), 4 + 3 * 8 + 5 * 12);
        assert_eq!(DecodedPath::decode_from_bytes(&bytes), Ok(path));
    }

    #[test]
    fn should_reject_undersized_destination() {
        let path = three_segment_path();
        let len = path.encoded_len();
        let mut out = vec![0xaa; len - 1];

        assert_eq!(
            path.serialize_to(&mut out),
            Err(PathError::BufferTooSmall {
                at: "DecodedPath",
                required: len,
                actual: len - 1
            })
        );
        assert!(out.iter().all(|b| *b == 0xaa));
    }

    #[test]
    fn should_reject_invalid_segments_on_construction() {
        assert!(matches!(
            DecodedPath::new(0, 0, vec![]),
            Err(PathError::InvalidSegmentCount(_))
        ));
        assert!(matches!(
            DecodedPath::new(0, 0, vec![(info(1, true), vec![])]),
            Err(PathError::InvalidSegmentCount(_))
        ));
        assert!(matches!(
            DecodedPath::new(0, 0, vec![(info(1, true), vec![hop(1)]); 4]),
            Err(PathError::InvalidSegmentCount(_))
        ));
        assert!(matches!(
            DecodedPath::new(0, 2, vec![(info(1, true), vec![hop(1), hop(2)])]),
            Err(PathError::InvalidSegmentCount(_))
        ));
    }

    #[test]
    fn should_reject_truncated_input() {
        let bytes = three_segment_path().encode_to_vec().unwrap();

        assert_eq!(
            DecodedPath::decode_from_bytes(&bytes[..40]),
            Err(PathError::BufferTooShort {
                at: "DecodedPath",
                required: bytes.len(),
                actual: 40
            })
        );
    }

    #[test]
    fn should_modify_fields_through_mut_accessors() {
        let mut path = three_segment_path();
        path.hop_field_mut(4).unwrap().cons_egress = 42;
        path.info_field_mut(0).unwrap().timestamp = 7;

        let decoded = DecodedPath::decode_from_bytes(&path.encode_to_vec().unwrap()).unwrap();
        assert_eq!(decoded.hop_field(4).unwrap().cons_egress, 42);
        assert_eq!(decoded.info_field(0).unwrap().timestamp, 7);
        assert!(path.hop_field_mut(5).is_err());
    }
}
