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

//! Extension header chain
//!
//! Extensions follow the common header and the path. Each one starts with a subheader naming the
//! next header, so the chain is linked through those fields. The chain ends at the first
//! next-header value that is not an extension class, which is the layer 4 protocol.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  NextHdr      |    HdrLen     |     Type      |               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+               +
//! |                    Data ((HdrLen + 1) * 8 - 3 bytes)          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Records are kept in an owned vector, the next-header links are derived from the record order
//! when encoding.

/// Length of an extension line. Extensions are a multiple of this long.
pub const EXT_LINE_LEN: usize = 8;
/// Length of the extension subheader
pub const EXT_SUBHEADER_LEN: usize = 3;
/// Extension type of the end-to-end path probe
pub const PATH_PROBE_TYPE: u8 = 1;

const PATH_PROBE_DATA_LEN: usize = 5;
const MAX_EXT_LEN: usize = (u8::MAX as usize + 1) * EXT_LINE_LEN;

/// Errors of the extension chain codec
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExtensionError {
    /// The input ends inside an extension
    #[error("buffer too short at {at}: required {required}, actual {actual}")]
    BufferTooShort {
        /// Structure that was being decoded
        at: &'static str,
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        actual: usize,
    },
    /// The output buffer cannot hold the chain
    #[error("buffer too small for extension chain: required {required}, actual {actual}")]
    BufferTooSmall {
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        actual: usize,
    },
    /// A path probe extension carries less data than it needs
    #[error("path probe extension too short: {len} data bytes")]
    MalformedProbe {
        /// Number of data bytes of the extension
        len: usize,
    },
    /// An extension does not fit the 8 bit header length
    #[error("extension too long: {len} bytes")]
    TooLong {
        /// Encoded length of the extension
        len: usize,
    },
}

/// Class of an extension, carried in the preceding next-header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExtensionClass {
    /// Processed by every router on the path
    HopByHop = 0,
    /// Processed by the destination only
    EndToEnd = 222,
}
impl ExtensionClass {
    /// Returns the class for a next-header value, or `None` for a layer 4 protocol.
    pub fn from_next_header(value: u8) -> Option<Self> {
        match value {
            0 => Some(ExtensionClass::HopByHop),
            222 => Some(ExtensionClass::EndToEnd),
            _ => None,
        }
    }
}
impl From<ExtensionClass> for u8 {
    fn from(class: ExtensionClass) -> Self {
        class as u8
    }
}

/// Payload of the path probe extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathProbe {
    /// Set on the reply to a probe
    pub ack: bool,
    /// Probe sequence number
    pub probe_num: u32,
}

/// Decoded content of an extension
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    /// End-to-end path probe
    PathProbe(PathProbe),
    /// Any extension without a dedicated decoder, data kept as is
    Unknown {
        /// Extension type
        ext_type: u8,
        /// Data following the subheader
        data: Vec<u8>,
    },
}

/// A single extension in the chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionRecord {
    /// Class of the extension
    pub class: ExtensionClass,
    /// Content of the extension
    pub kind: ExtensionKind,
}

impl ExtensionRecord {
    /// Returns the extension type carried in the subheader.
    pub fn ext_type(&self) -> u8 {
        match &self.kind {
            ExtensionKind::PathProbe(_) => PATH_PROBE_TYPE,
            ExtensionKind::Unknown { ext_type, .. } => *ext_type,
        }
    }

    /// Returns the encoded length, a multiple of [`EXT_LINE_LEN`].
    pub fn encoded_len(&self) -> usize {
        let data_len = match &self.kind {
            ExtensionKind::PathProbe(_) => PATH_PROBE_DATA_LEN,
            ExtensionKind::Unknown { data, .. } => data.len(),
        };
        (EXT_SUBHEADER_LEN + data_len).div_ceil(EXT_LINE_LEN) * EXT_LINE_LEN
    }

    fn decode(class: ExtensionClass, ext_type: u8, data: &[u8]) -> Result<Self, ExtensionError> {
        let kind = match (class, ext_type) {
            // Longer probe records are kept as is so they encode back to the same length.
            (ExtensionClass::EndToEnd, PATH_PROBE_TYPE) if data.len() <= PATH_PROBE_DATA_LEN => {
                let Some([ack, rest @ ..]) = data.first_chunk::<PATH_PROBE_DATA_LEN>() else {
                    return Err(ExtensionError::MalformedProbe { len: data.len() });
                };
                ExtensionKind::PathProbe(PathProbe {
                    ack: *ack != 0,
                    probe_num: u32::from_be_bytes(*rest),
                })
            }
            _ => {
                ExtensionKind::Unknown {
                    ext_type,
                    data: data.to_vec(),
                }
            }
        };
        Ok(ExtensionRecord { class, kind })
    }

    /// `dst` must hold [`Self::encoded_len`] bytes, which must not exceed [`MAX_EXT_LEN`].
    fn serialize_to(&self, next_header: u8, dst: &mut [u8]) -> usize {
        let len = self.encoded_len();
        let header_len = (len / EXT_LINE_LEN - 1) as u8;

        let out = &mut dst[..len];
        out.fill(0);
        out[..EXT_SUBHEADER_LEN].copy_from_slice(&[next_header, header_len, self.ext_type()]);
        let data = &mut out[EXT_SUBHEADER_LEN..];
        match &self.kind {
            ExtensionKind::PathProbe(probe) => {
                data[0] = u8::from(probe.ack);
                data[1..PATH_PROBE_DATA_LEN].copy_from_slice(&probe.probe_num.to_be_bytes());
            }
            ExtensionKind::Unknown { data: payload, .. } => {
                data[..payload.len()].copy_from_slice(payload);
            }
        }
        len
    }
}

/// Chain of extensions between the path and the layer 4 header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionChain {
    /// Extensions in wire order
    pub records: Vec<ExtensionRecord>,
    /// Protocol number following the last extension
    pub l4_protocol: u8,
}

impl ExtensionChain {
    /// Creates an empty chain in front of `l4_protocol`.
    pub fn new(l4_protocol: u8) -> Self {
        ExtensionChain {
            records: Vec::new(),
            l4_protocol,
        }
    }

    /// Decodes the chain starting with next-header value `first_header`.
    ///
    /// Returns the chain and the number of bytes it occupies in `bytes`.
    pub fn decode_from_bytes(
        first_header: u8,
        bytes: &[u8],
    ) -> Result<(Self, usize), ExtensionError> {
        let mut records = Vec::new();
        let mut current = first_header;
        let mut offset = 0;

        while let Some(class) = ExtensionClass::from_next_header(current) {
            let rest = &bytes[offset..];
            let Some([next_header, header_len, ext_type]) =
                rest.first_chunk::<EXT_SUBHEADER_LEN>()
            else {
                return Err(ExtensionError::BufferTooShort {
                    at: "ExtensionSubheader",
                    required: offset + EXT_SUBHEADER_LEN,
                    actual: bytes.len(),
                });
            };

            let len = (usize::from(*header_len) + 1) * EXT_LINE_LEN;
            let Some(ext) = rest.get(..len) else {
                return Err(ExtensionError::BufferTooShort {
                    at: "Extension",
                    required: offset + len,
                    actual: bytes.len(),
                });
            };

            records.push(ExtensionRecord::decode(
                class,
                *ext_type,
                &ext[EXT_SUBHEADER_LEN..],
            )?);
            current = *next_header;
            offset += len;
        }

        Ok((
            ExtensionChain {
                records,
                l4_protocol: current,
            },
            offset,
        ))
    }

    /// Returns the value the next-header field in front of the chain has to carry.
    pub fn first_header(&self) -> u8 {
        self.records
            .first()
            .map_or(self.l4_protocol, |record| record.class.into())
    }

    /// Returns the encoded length of the whole chain.
    pub fn encoded_len(&self) -> usize {
        self.records.iter().map(ExtensionRecord::encoded_len).sum()
    }

    /// Encodes every record, linking each to the next one.
    ///
    /// Returns the number of bytes written.
    pub fn serialize_to(&self, dst: &mut [u8]) -> Result<usize, ExtensionError> {
        if let Some(len) = self
            .records
            .iter()
            .map(ExtensionRecord::encoded_len)
            .find(|len| *len > MAX_EXT_LEN)
        {
            return Err(ExtensionError::TooLong { len });
        }
        let required = self.encoded_len();
        if dst.len() < required {
            return Err(ExtensionError::BufferTooSmall {
                required,
                actual: dst.len(),
            });
        }

        let mut offset = 0;
        for (i, record) in self.records.iter().enumerate() {
            let next_header = self
                .records
                .get(i + 1)
                .map_or(self.l4_protocol, |next| next.class.into());
            offset += record.serialize_to(next_header, &mut dst[offset..]);
        }
        Ok(offset)
    }

    /// Appends an end-to-end path probe.
    pub fn add_probe(&mut self, probe_num: u32, ack: bool) {
        self.records.push(ExtensionRecord {
            class: ExtensionClass::EndToEnd,
            kind: ExtensionKind::PathProbe(PathProbe { ack, probe_num }),
        });
    }

    /// Returns the first path probe in the chain.
    pub fn find_probe(&self) -> Option<&PathProbe> {
        self.records.iter().find_map(|record| match &record.kind {
            ExtensionKind::PathProbe(probe) if record.class == ExtensionClass::EndToEnd => {
                Some(probe)
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UDP: u8 = 17;

    #[test]
    fn should_decode_probe_and_stop_at_l4() {
        let bytes = [
            222, 0, 7, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, // hop-by-hop, next end-to-end
            UDP, 0, PATH_PROBE_TYPE, 1, 0, 0, 0, 42, // probe, next UDP
            0xff, 0xff, // payload
        ];
        let (chain, consumed) =
            ExtensionChain::decode_from_bytes(ExtensionClass::HopByHop.into(), &bytes).unwrap();

        assert_eq!(consumed, 16);
        assert_eq!(chain.l4_protocol, UDP);
        assert_eq!(
            chain.records[0].kind,
            ExtensionKind::Unknown {
                ext_type: 7,
                data: vec![0xaa, 0xbb, 0xcc, 0xdd, 0xee]
            }
        );
        assert_eq!(
            chain.find_probe(),
            Some(&PathProbe {
                ack: true,
                probe_num: 42
            })
        );
    }

    #[test]
    fn should_not_consume_anything_without_extensions() {
        let (chain, consumed) = ExtensionChain::decode_from_bytes(UDP, &[1, 2, 3]).unwrap();

        assert_eq!(consumed, 0);
        assert_eq!(chain, ExtensionChain::new(UDP));
        assert_eq!(chain.first_header(), UDP);
    }

    #[test]
    fn should_reject_truncated_extension() {
        let bytes = [UDP, 1, 9, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            ExtensionChain::decode_from_bytes(222, &bytes),
            Err(ExtensionError::BufferTooShort {
                at: "Extension",
                required: 16,
                actual: 10
            })
        );
        assert!(matches!(
            ExtensionChain::decode_from_bytes(0, &[UDP]),
            Err(ExtensionError::BufferTooShort {
                at: "ExtensionSubheader",
                ..
            })
        ));
    }

    #[test]
    fn should_link_next_headers_on_encode() {
        let mut chain = ExtensionChain::new(UDP);
        chain.records.push(ExtensionRecord {
            class: ExtensionClass::HopByHop,
            kind: ExtensionKind::Unknown {
                ext_type: 3,
                data: vec![1; 6],
            },
        });
        chain.add_probe(0x0102_0304, false);
        assert_eq!(chain.first_header(), 0);

        let mut buf = vec![0xffu8; chain.encoded_len()];
        assert_eq!(chain.serialize_to(&mut buf), Ok(24));
        assert_eq!(&buf[..3], &[222, 1, 3]);
        assert_eq!(&buf[16..], &[UDP, 0, PATH_PROBE_TYPE, 0, 1, 2, 3, 4]);

        let (decoded, consumed) = ExtensionChain::decode_from_bytes(0, &buf).unwrap();
        assert_eq!(consumed, 24);
        assert_eq!(
            decoded.find_probe(),
            Some(&PathProbe {
                ack: false,
                probe_num: 0x0102_0304
            })
        );
    }

    #[test]
    fn should_keep_long_probe_record_intact() {
        let bytes = [
            UDP, 1, PATH_PROBE_TYPE, 1, 0, 0, 0, 42, // probe with a second line
            9, 8, 7, 6, 5, 4, 3, 2,
        ];
        let (chain, consumed) = ExtensionChain::decode_from_bytes(222, &bytes).unwrap();
        assert_eq!(consumed, 16);
        assert_eq!(chain.find_probe(), None);

        let mut out = vec![0u8; chain.encoded_len()];
        assert_eq!(chain.serialize_to(&mut out), Ok(16));
        assert_eq!(out, bytes);
    }

    #[test]
    fn should_reject_long_record_before_writing() {
        let mut chain = ExtensionChain::new(UDP);
        chain.add_probe(1, false);
        chain.records.push(ExtensionRecord {
            class: ExtensionClass::EndToEnd,
            kind: ExtensionKind::Unknown {
                ext_type: 9,
                data: vec![0; MAX_EXT_LEN],
            },
        });

        let mut out = vec![0xaa; chain.encoded_len()];
        assert_eq!(
            chain.serialize_to(&mut out),
            Err(ExtensionError::TooLong {
                len: MAX_EXT_LEN + EXT_LINE_LEN
            })
        );
        assert!(out.iter().all(|b| *b == 0xaa));
    }

    #[test]
    fn should_reject_short_probe() {
        // A single line always holds a full probe, so feed the record decoder directly.
        assert_eq!(
            ExtensionRecord::decode(ExtensionClass::EndToEnd, PATH_PROBE_TYPE, &[1, 2]),
            Err(ExtensionError::MalformedProbe { len: 2 })
        );
    }
}
