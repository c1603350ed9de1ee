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

//! Beacon origination for core ASes.
//!
//! The [`Originator`] periodically creates a fresh path segment beacon for every egress interface
//! that needs one, extends it with the local hop entry and hands it to a [`Sender`] towards the
//! neighbor. Hop field MAC computation and the transport are provided by the caller through the
//! [`Extender`] and [`SenderFactory`] traits.

pub mod beacon;
pub mod interface;
pub mod originator;
pub mod sender;
pub mod tick;

pub use beacon::{Beacon, Extender};
pub use interface::Interface;
pub use originator::{
    InterfaceSource, OriginateError, OriginationSummary, Originator, OriginatorConfig,
};
pub use sender::{Sender, SenderFactory};
pub use tick::Tick;
