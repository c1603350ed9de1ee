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

//! scion-path: codec and state machine for the SCION standard data-plane path.
//!
//! A standard path is a 4 byte meta header followed by up to three info fields (one per segment)
//! and up to 64 hop fields. Routers decode it, check and advance the current position, and end
//! hosts reverse it to answer a packet.
//!
//! Two representations are offered:
//!
//! * [`RawPath`](raw::RawPath) only decodes the meta header and reads or writes individual fields
//!   directly in the caller's buffer. This is the representation for the forwarding fast path.
//!
//! * [`DecodedPath`](decoded::DecodedPath) materializes every info and hop field into owned
//!   vectors. Structural rewrites such as [reversal](decoded::DecodedPath::reverse) are done on
//!   this representation.
//!
//! Both implement [`PathView`](view::PathView), and [`ScionPath`](view::ScionPath) holds either
//! one of them.
//!
//! Hop field MACs are neither computed nor checked here. The [`forward`] module exposes the seam
//! where a caller supplied [`HopVerifier`](forward::HopVerifier) plugs in.

pub mod base;
pub mod decoded;
pub mod encode;
pub mod error;
pub mod extension;
pub mod field;
pub mod forward;
pub mod layout;
pub mod meta;
pub mod raw;
pub mod view;

pub use base::PathState;
pub use decoded::DecodedPath;
pub use encode::WireEncode;
pub use error::{FieldKind, PathError};
pub use field::{HopField, HopFieldFlags, HopFieldMac, InfoField, InfoFieldFlags};
pub use meta::MetaHeader;
pub use raw::RawPath;
pub use view::{PathView, PathViewMut, ScionPath};
