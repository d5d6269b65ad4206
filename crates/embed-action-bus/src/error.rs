// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bus and transport errors.

use thiserror::Error;

/// Error type for bus operations.
///
/// The in-process transport never fails; these surface from host transports
/// and from serializing typed payloads.
#[derive(Debug, Error)]
pub enum BusError {
    /// The execution context has no broadcast primitive to ride on.
    #[error("broadcast transport unavailable: {0}")]
    TransportUnavailable(String),
    /// The host transport rejected an operation; message passed through as-is.
    #[error("transport error: {0}")]
    Transport(String),
    /// A typed payload could not be turned into JSON.
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}
