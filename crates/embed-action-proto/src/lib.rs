// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for embed ↔ host action dispatch.
//!
//! An embedded widget and the page hosting it talk over a shared broadcast
//! primitive. Every message travels under a fully-qualified action name:
//!
//! ```text
//! CAL:<namespace>:<type>      e.g. CAL:widget1:routed
//! CAL::<type>                 root (empty) namespace
//! CAL:<namespace>:*           wildcard channel for a namespace
//! ```
//!
//! This crate owns the pieces both sides must agree on:
//!
//! - [`name`]: the structured [`ActionName`] and the [`NameCodec`] that renders it
//!   to / parses it from the wire string.
//! - [`catalog`]: the enumerated [`ActionKind`]s and their payload structs.
//! - [`envelope`]: the [`Envelope`] delivered to every listener.
//!
//! Nothing here performs I/O; transports live in `embed-action-bus`.

pub mod catalog;
pub mod envelope;
mod error;
pub mod name;

pub use catalog::{Action, ActionKind};
pub use envelope::Envelope;
pub use error::ActionError;
pub use name::{decode, encode, ActionName, NameCodec, NameScheme};

/// Protocol literal that prefixes every wire name.
pub const DEFAULT_PROTOCOL: &str = "CAL";

/// Separator between the protocol, namespace and type segments.
pub const SEPARATOR: char = ':';

/// Reserved action type that subscribes to every type within a namespace.
pub const WILDCARD: &str = "*";

/// Prefix reserved for internal lifecycle/control action types.
pub const INTERNAL_PREFIX: &str = "__";
