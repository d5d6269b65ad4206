// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors raised while interpreting catalog entries and payloads.
//!
//! Name decoding never errors; it returns `None` (see [`crate::name`]).

use thiserror::Error;

/// Error type for catalog lookups and payload decoding.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action type is not part of the known catalog.
    #[error("unknown action type: {0:?}")]
    UnknownAction(String),
    /// Payload did not match the shape declared for its action kind.
    #[error("payload shape mismatch: {0}")]
    Payload(#[from] serde_json::Error),
}
