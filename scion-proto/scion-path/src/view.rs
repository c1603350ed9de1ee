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

//! Capabilities shared by the raw and the decoded path.

use std::ops::{Deref, DerefMut};

use crate::{
    base::PathState,
    decoded::DecodedPath,
    encode::WireEncode,
    error::PathError,
    field::{HopField, InfoField},
    raw::RawPath,
};

/// Read access to a standard path.
pub trait PathView {
    /// Returns the position state.
    fn state(&self) -> &PathState;

    /// Returns info field `index`.
    fn info_field(&self, index: usize) -> Result<InfoField, PathError>;

    /// Returns hop field `index`.
    fn hop_field(&self, index: usize) -> Result<HopField, PathError>;

    /// Returns the current info field.
    fn current_info_field(&self) -> Result<InfoField, PathError> {
        self.info_field(self.state().curr_info_idx())
    }

    /// Returns the current hop field.
    fn current_hop_field(&self) -> Result<HopField, PathError> {
        self.hop_field(self.state().curr_hop_idx())
    }

    /// Returns the encoded length of the path.
    fn path_len(&self) -> usize {
        self.state().path_len()
    }

    /// See [`PathState::is_first_hop`].
    fn is_first_hop(&self) -> bool {
        self.state().is_first_hop()
    }

    /// See [`PathState::is_penultimate_hop`].
    fn is_penultimate_hop(&self) -> bool {
        self.state().is_penultimate_hop()
    }

    /// See [`PathState::is_last_hop`].
    fn is_last_hop(&self) -> bool {
        self.state().is_last_hop()
    }

    /// See [`PathState::curr_inf_matches_curr_hf`].
    fn curr_inf_matches_curr_hf(&self) -> bool {
        self.state().curr_inf_matches_curr_hf()
    }
}

/// Write access to a standard path.
pub trait PathViewMut: PathView {
    /// Replaces info field `index`.
    fn set_info_field(&mut self, field: &InfoField, index: usize) -> Result<(), PathError>;

    /// Replaces hop field `index`.
    fn set_hop_field(&mut self, field: &HopField, index: usize) -> Result<(), PathError>;

    /// Advances the current position by one hop field.
    fn increment_path(&mut self) -> Result<(), PathError>;

    /// Sets the current info field index.
    fn set_curr_info_idx(&mut self, index: usize) -> Result<(), PathError>;

    /// Sets the current hop field index.
    fn set_curr_hop_idx(&mut self, index: usize) -> Result<(), PathError>;

    /// Replaces the path with its reverse.
    fn reverse_in_place(&mut self) -> Result<(), PathError>;
}

impl<B> PathView for RawPath<B>
where
    B: Deref<Target = [u8]>,
{
    fn state(&self) -> &PathState {
        RawPath::state(self)
    }

    fn info_field(&self, index: usize) -> Result<InfoField, PathError> {
        RawPath::info_field(self, index)
    }

    fn hop_field(&self, index: usize) -> Result<HopField, PathError> {
        RawPath::hop_field(self, index)
    }
}

impl<B> PathViewMut for RawPath<B>
where
    B: DerefMut<Target = [u8]>,
{
    fn set_info_field(&mut self, field: &InfoField, index: usize) -> Result<(), PathError> {
        RawPath::set_info_field(self, field, index)
    }

    fn set_hop_field(&mut self, field: &HopField, index: usize) -> Result<(), PathError> {
        RawPath::set_hop_field(self, field, index)
    }

    fn increment_path(&mut self) -> Result<(), PathError> {
        RawPath::increment_path(self)
    }

    fn set_curr_info_idx(&mut self, index: usize) -> Result<(), PathError> {
        RawPath::set_curr_info_idx(self, index)
    }

    fn set_curr_hop_idx(&mut self, index: usize) -> Result<(), PathError> {
        RawPath::set_curr_hop_idx(self, index)
    }

    fn reverse_in_place(&mut self) -> Result<(), PathError> {
        self.reverse()
    }
}

impl PathView for DecodedPath {
    fn state(&self) -> &PathState {
        DecodedPath::state(self)
    }

    fn info_field(&self, index: usize) -> Result<InfoField, PathError> {
        DecodedPath::info_field(self, index).copied()
    }

    fn hop_field(&self, index: usize) -> Result<HopField, PathError> {
        DecodedPath::hop_field(self, index).copied()
    }
}

impl PathViewMut for DecodedPath {
    fn set_info_field(&mut self, field: &InfoField, index: usize) -> Result<(), PathError> {
        *self.info_field_mut(index)? = *field;
        Ok(())
    }

    fn set_hop_field(&mut self, field: &HopField, index: usize) -> Result<(), PathError> {
        *self.hop_field_mut(index)? = *field;
        Ok(())
    }

    fn increment_path(&mut self) -> Result<(), PathError> {
        DecodedPath::increment_path(self)
    }

    fn set_curr_info_idx(&mut self, index: usize) -> Result<(), PathError> {
        DecodedPath::set_curr_info_idx(self, index)
    }

    fn set_curr_hop_idx(&mut self, index: usize) -> Result<(), PathError> {
        DecodedPath::set_curr_hop_idx(self, index)
    }

    fn reverse_in_place(&mut self) -> Result<(), PathError> {
        *self = self.reverse();
        Ok(())
    }
}

/// A standard path in either representation.
#[derive(Debug, Clone)]
pub enum ScionPath<B> {
    /// Lazily decoded path over a buffer
    Raw(RawPath<B>),
    /// Fully decoded path
    Decoded(DecodedPath),
}

impl<B> ScionPath<B>
where
    B: Deref<Target = [u8]>,
{
    /// Returns the fully decoded path, decoding the raw variant if necessary.
    pub fn into_decoded(self) -> Result<DecodedPath, PathError> {
        match self {
            ScionPath::Raw(raw) => raw.to_decoded(),
            ScionPath::Decoded(decoded) => Ok(decoded),
        }
    }

    fn view(&self) -> &dyn PathView {
        match self {
            ScionPath::Raw(raw) => raw,
            ScionPath::Decoded(decoded) => decoded,
        }
    }
}

impl<B> From<RawPath<B>> for ScionPath<B> {
    fn from(raw: RawPath<B>) -> Self {
        ScionPath::Raw(raw)
    }
}

impl<B> From<DecodedPath> for ScionPath<B> {
    fn from(decoded: DecodedPath) -> Self {
        ScionPath::Decoded(decoded)
    }
}

impl<B> PathView for ScionPath<B>
where
    B: Deref<Target = [u8]>,
{
    fn state(&self) -> &PathState {
        self.view().state()
    }

    fn info_field(&self, index: usize) -> Result<InfoField, PathError> {
        self.view().info_field(index)
    }

    fn hop_field(&self, index: usize) -> Result<HopField, PathError> {
        self.view().hop_field(index)
    }
}

impl<B> PathViewMut for ScionPath<B>
where
    B: DerefMut<Target = [u8]>,
{
    fn set_info_field(&mut self, field: &InfoField, index: usize) -> Result<(), PathError> {
        match self {
            ScionPath::Raw(raw) => raw.set_info_field(field, index),
            ScionPath::Decoded(decoded) => PathViewMut::set_info_field(decoded, field, index),
        }
    }

    fn set_hop_field(&mut self, field: &HopField, index: usize) -> Result<(), PathError> {
        match self {
            ScionPath::Raw(raw) => raw.set_hop_field(field, index),
            ScionPath::Decoded(decoded) => PathViewMut::set_hop_field(decoded, field, index),
        }
    }

    fn increment_path(&mut self) -> Result<(), PathError> {
        match self {
            ScionPath::Raw(raw) => raw.increment_path(),
            ScionPath::Decoded(decoded) => decoded.increment_path(),
        }
    }

    fn set_curr_info_idx(&mut self, index: usize) -> Result<(), PathError> {
        match self {
            ScionPath::Raw(raw) => raw.set_curr_info_idx(index),
            ScionPath::Decoded(decoded) => decoded.set_curr_info_idx(index),
        }
    }

    fn set_curr_hop_idx(&mut self, index: usize) -> Result<(), PathError> {
        match self {
            ScionPath::Raw(raw) => raw.set_curr_hop_idx(index),
            ScionPath::Decoded(decoded) => decoded.set_curr_hop_idx(index),
        }
    }

    fn reverse_in_place(&mut self) -> Result<(), PathError> {
        match self {
            ScionPath::Raw(raw) => raw.reverse(),
            ScionPath::Decoded(decoded) => decoded.reverse_in_place(),
        }
    }
}

impl<B> WireEncode for ScionPath<B>
where
    B: Deref<Target = [u8]>,
{
    fn encoded_len(&self) -> usize {
        match self {
            ScionPath::Raw(raw) => raw.encoded_len(),
            ScionPath::Decoded(decoded) => decoded.encoded_len(),
        }
    }

    fn serialize_to(&self, dst: &mut [u8]) -> Result<usize, PathError> {
        match self {
            ScionPath::Raw(raw) => raw.serialize_to(dst),
            ScionPath::Decoded(decoded) => decoded.serialize_to(dst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{HopFieldMac, InfoFieldFlags};

    fn sample() -> DecodedPath {
        let hops = (1..=4)
            .map(|tag| HopField {
                mac: HopFieldMac([tag; 6]),
                ..Default::default()
            })
            .collect::<Vec<_>>();
        DecodedPath::new(
            0,
            0,
            vec![
                (InfoField::default(), hops[..2].to_vec()),
                (
                    InfoField {
                        flags: InfoFieldFlags::CONS_DIR,
                        ..Default::default()
                    },
                    hops[2..].to_vec(),
                ),
            ],
        )
        .unwrap()
    }

    fn walk(path: &mut impl PathViewMut) -> Vec<(usize, u8)> {
        let mut seen = Vec::new();
        loop {
            seen.push((
                path.state().curr_info_idx(),
                path.current_hop_field().unwrap().mac.0[0],
            ));
            if path.increment_path().is_err() {
                return seen;
            }
        }
    }

    #[test]
    fn should_behave_identically_for_both_variants() {
        let decoded = sample();
        let bytes = decoded.encode_to_vec().unwrap();

        let mut raw: ScionPath<Vec<u8>> =
            RawPath::decode_from_bytes(bytes.clone()).unwrap().into();
        let mut decoded: ScionPath<Vec<u8>> = decoded.into();

        let expected = vec![(0, 1), (0, 2), (1, 3), (1, 4)];
        assert_eq!(walk(&mut raw), expected);
        assert_eq!(walk(&mut decoded), expected);
        assert_eq!(raw.encode_to_vec(), decoded.encode_to_vec());

        raw.reverse_in_place().unwrap();
        decoded.reverse_in_place().unwrap();
        assert!(raw.is_first_hop());
        assert_eq!(raw.encode_to_vec(), decoded.encode_to_vec());
        assert_eq!(raw.into_decoded(), decoded.into_decoded());
    }

    #[test]
    fn should_set_fields_through_trait() {
        let mut path: ScionPath<Vec<u8>> = sample().into();
        let hop = HopField {
            cons_egress: 9,
            ..Default::default()
        };

        path.set_hop_field(&hop, 3).unwrap();
        assert_eq!(path.hop_field(3), Ok(hop));
        assert!(path.set_info_field(&InfoField::default(), 2).is_err());
    }
}
