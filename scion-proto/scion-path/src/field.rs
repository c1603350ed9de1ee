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

//! Info and hop fields of the standard path.
//!
//! Both records have a fixed width and are transcoded without touching anything outside of the
//! given byte range. Reserved bits are ignored on decode and written as zero on encode.

use std::{fmt::Debug, time::Duration};

use crate::{
    encode::{WireEncode, ensure_capacity},
    error::{FieldKind, PathError},
    layout::{HOP_LEN, INFO_LEN, MAC_LEN},
};

// InfoFieldFlags
bitflags::bitflags! {
    /// InfoField flags.
    ///
    /// ```text
    ///  0 1 2 3 4 5 6 7
    /// +-+-+-+-+-+-+-+-+
    /// |r r r r r r P C|
    /// +-+-+-+-+-+-+-+-+
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InfoFieldFlags: u8 {
        /// The hop fields of the segment are in the order they were added during beaconing.
        const CONS_DIR = 0b0000_0001;
        /// The segment is a peering segment and needs special handling in the data plane.
        const PEERING = 0b0000_0010;
    }
}

// HopFieldFlags
bitflags::bitflags! {
    /// HopField flags.
    ///
    /// ```text
    ///  0 1 2 3 4 5 6 7
    /// +-+-+-+-+-+-+-+-+
    /// |r r r r r r I E|
    /// +-+-+-+-+-+-+-+-+
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HopFieldFlags: u8 {
        /// The egress router in construction direction processes the L4 payload.
        const CONS_EGRESS_ROUTER_ALERT = 0b0000_0001;
        /// The ingress router in construction direction processes the L4 payload.
        const CONS_INGRESS_ROUTER_ALERT = 0b0000_0010;
    }
}
impl HopFieldFlags {
    /// Returns the ingress router alert in traversal direction.
    ///
    /// Against construction direction the ingress and egress interfaces swap roles.
    pub fn normalized_ingress_router_alert(&self, cons_dir: bool) -> bool {
        if cons_dir {
            self.contains(HopFieldFlags::CONS_INGRESS_ROUTER_ALERT)
        } else {
            self.contains(HopFieldFlags::CONS_EGRESS_ROUTER_ALERT)
        }
    }

    /// Returns the egress router alert in traversal direction.
    pub fn normalized_egress_router_alert(&self, cons_dir: bool) -> bool {
        if cons_dir {
            self.contains(HopFieldFlags::CONS_EGRESS_ROUTER_ALERT)
        } else {
            self.contains(HopFieldFlags::CONS_INGRESS_ROUTER_ALERT)
        }
    }
}

// MaxTTL / 256 (5m38.5s)
/// Expiration duration per ExpTime unit on a HopField.
pub const EXP_TIME_UNIT: Duration = Duration::new(337, 500_000_000);

/// Message authentication code of a hop field.
///
/// Opaque to this crate, it is computed and checked by the control and data plane.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HopFieldMac(pub [u8; MAC_LEN]);
impl HopFieldMac {
    /// Returns the MAC bytes.
    pub fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }
}
impl From<[u8; MAC_LEN]> for HopFieldMac {
    fn from(bytes: [u8; MAC_LEN]) -> Self {
        HopFieldMac(bytes)
    }
}
impl Debug for HopFieldMac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Per-segment metadata.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |r r r r r r P C|      RSV      |             SegID             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InfoField {
    /// Info field flags
    pub flags: InfoFieldFlags,
    /// Segment ID
    ///
    /// Part of the hop field MAC input. Routers update it while the segment is traversed against
    /// construction direction.
    pub segment_id: u16,
    /// Creation time of the segment in seconds since the Unix epoch
    pub timestamp: u32,
}

impl InfoField {
    /// Decodes an info field from the first [`INFO_LEN`] bytes of `bytes`.
    pub fn decode_from_bytes(bytes: &[u8]) -> Result<Self, PathError> {
        let Some(buf) = bytes.first_chunk::<INFO_LEN>() else {
            return Err(PathError::MalformedField {
                kind: FieldKind::Info,
                required: INFO_LEN,
                actual: bytes.len(),
            });
        };

        Ok(InfoField {
            flags: InfoFieldFlags::from_bits_truncate(buf[0]),
            segment_id: u16::from_be_bytes([buf[2], buf[3]]),
            timestamp: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    /// Returns true if the segment is traversed in construction direction.
    #[inline]
    pub fn cons_dir(&self) -> bool {
        self.flags.contains(InfoFieldFlags::CONS_DIR)
    }

    /// Returns true if this is a peering segment.
    #[inline]
    pub fn peering(&self) -> bool {
        self.flags.contains(InfoFieldFlags::PEERING)
    }

    /// Chains the segment ID with the first two bytes of a hop field MAC.
    ///
    /// Applying the same MAC twice restores the previous segment ID.
    pub fn update_segment_id(&mut self, mac: &HopFieldMac) {
        let [a, b, ..] = mac.0;
        self.segment_id ^= u16::from_be_bytes([a, b]);
    }
}

impl WireEncode for InfoField {
    fn encoded_len(&self) -> usize {
        INFO_LEN
    }

    fn serialize_to(&self, dst: &mut [u8]) -> Result<usize, PathError> {
        ensure_capacity("InfoField", dst, INFO_LEN)?;

        let [s0, s1] = self.segment_id.to_be_bytes();
        let [t0, t1, t2, t3] = self.timestamp.to_be_bytes();
        dst[..INFO_LEN].copy_from_slice(&[self.flags.bits(), 0, s0, s1, t0, t1, t2, t3]);

        Ok(INFO_LEN)
    }
}

/// Per-hop forwarding entry.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |r r r r r r I E|    ExpTime    |           ConsIngress         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |        ConsEgress             |                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
/// |                              MAC                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HopField {
    /// Hop field flags
    pub flags: HopFieldFlags,
    /// Expiration relative to the info field timestamp, in units of [`EXP_TIME_UNIT`] minus one
    pub exp_time: u8,
    /// Ingress interface in construction direction
    ///
    /// 0 at the first hop of a segment.
    pub cons_ingress: u16,
    /// Egress interface in construction direction
    ///
    /// 0 at the last hop of a segment.
    pub cons_egress: u16,
    /// Hop field MAC
    pub mac: HopFieldMac,
}

impl HopField {
    /// Decodes a hop field from the first [`HOP_LEN`] bytes of `bytes`.
    pub fn decode_from_bytes(bytes: &[u8]) -> Result<Self, PathError> {
        let Some(buf) = bytes.first_chunk::<HOP_LEN>() else {
            return Err(PathError::MalformedField {
                kind: FieldKind::Hop,
                required: HOP_LEN,
                actual: bytes.len(),
            });
        };

        let mut mac = [0u8; MAC_LEN];
        mac.copy_from_slice(&buf[6..HOP_LEN]);

        Ok(HopField {
            flags: HopFieldFlags::from_bits_truncate(buf[0]),
            exp_time: buf[1],
            cons_ingress: u16::from_be_bytes([buf[2], buf[3]]),
            cons_egress: u16::from_be_bytes([buf[4], buf[5]]),
            mac: HopFieldMac(mac),
        })
    }

    /// Returns how long after the segment timestamp this hop field stays valid.
    pub fn expiry(&self) -> Duration {
        EXP_TIME_UNIT * (u32::from(self.exp_time) + 1)
    }
}

impl WireEncode for HopField {
    fn encoded_len(&self) -> usize {
        HOP_LEN
    }

    fn serialize_to(&self, dst: &mut [u8]) -> Result<usize, PathError> {
        ensure_capacity("HopField", dst, HOP_LEN)?;

        let [i0, i1] = self.cons_ingress.to_be_bytes();
        let [e0, e1] = self.cons_egress.to_be_bytes();
        dst[..6].copy_from_slice(&[self.flags.bits(), self.exp_time, i0, i1, e0, e1]);
        dst[6..HOP_LEN].copy_from_slice(&self.mac.0);

        Ok(HOP_LEN)
    }
}
