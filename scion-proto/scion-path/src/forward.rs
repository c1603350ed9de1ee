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

//! Per-hop processing of a standard path.
//!
//! [`process_hop`] is what a router does with the path of a packet it received: check that the
//! position is consistent, have the current hop field verified and advance the path. Any error
//! means the packet is dropped.

use crate::{
    error::PathError,
    field::{HopField, InfoField},
    view::PathViewMut,
};

/// Checks the authorization of a hop field.
///
/// MAC computation is not part of this crate. Implementations typically recompute the hop field
/// MAC from the info field, the hop field and key material in the context.
pub trait HopVerifier<C: ?Sized> {
    /// Returns true if `hop` may be used for forwarding.
    fn verify(&self, info: &InfoField, hop: &HopField, ctx: &C) -> bool;
}

impl<C, F> HopVerifier<C> for F
where
    C: ?Sized,
    F: Fn(&InfoField, &HopField, &C) -> bool,
{
    fn verify(&self, info: &InfoField, hop: &HopField, ctx: &C) -> bool {
        self(info, hop, ctx)
    }
}

/// Result of processing a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopOutcome {
    /// The path was advanced, the packet leaves towards hop field `next_hop`
    Forwarded {
        /// Index of the new current hop field
        next_hop: usize,
    },
    /// The current hop field is the last one, the packet is delivered locally
    Delivered,
}

/// Reasons to drop a packet while processing its path.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum ForwardError {
    /// The path could not be read or advanced
    #[error(transparent)]
    Path(#[from] PathError),
    /// The current info field is not the one of the current hop field's segment
    #[error("current info field {curr_info} does not belong to hop field {curr_hop}")]
    SegmentMismatch {
        /// Current info field index
        curr_info: usize,
        /// Current hop field index
        curr_hop: usize,
    },
    /// The verifier rejected the current hop field
    #[error("hop field {hop} failed verification")]
    VerificationFailed {
        /// Index of the rejected hop field
        hop: usize,
    },
}

/// Verifies the current hop field and advances the path past it.
pub fn process_hop<P, V, C>(
    path: &mut P,
    verifier: &V,
    ctx: &C,
) -> Result<HopOutcome, ForwardError>
where
    P: PathViewMut + ?Sized,
    V: HopVerifier<C> + ?Sized,
    C: ?Sized,
{
    let result = try_process_hop(path, verifier, ctx);
    if let Err(err) = &result {
        let state = path.state();
        tracing::debug!(
            ?err,
            curr_info = state.curr_info_idx(),
            curr_hop = state.curr_hop_idx(),
            total_hops = state.total_hops(),
            "Dropping packet"
        );
    }
    result
}

fn try_process_hop<P, V, C>(path: &mut P, verifier: &V, ctx: &C) -> Result<HopOutcome, ForwardError>
where
    P: PathViewMut + ?Sized,
    V: HopVerifier<C> + ?Sized,
    C: ?Sized,
{
    let state = *path.state();
    if !state.curr_inf_matches_curr_hf() {
        return Err(ForwardError::SegmentMismatch {
            curr_info: state.curr_info_idx(),
            curr_hop: state.curr_hop_idx(),
        });
    }

    let info = path.current_info_field()?;
    let hop = path.current_hop_field()?;
    if !verifier.verify(&info, &hop, ctx) {
        return Err(ForwardError::VerificationFailed {
            hop: state.curr_hop_idx(),
        });
    }

    if state.is_last_hop() {
        return Ok(HopOutcome::Delivered);
    }
    path.increment_path()?;
    Ok(HopOutcome::Forwarded {
        next_hop: path.state().curr_hop_idx(),
    })
}
