// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Namespaced action bus shared by an embedded widget and its host page.
//!
//! ```text
//!   producer                                   listeners
//!   bus.fire("routed", data)                   on("routed")   on("*")
//!        │                                          ▲            ▲
//!        ▼                                          │            │
//!   ┌──────────┐  CAL:ns:routed  ┌───────────┐ ─────┘            │
//!   │ActionBus │ ──────────────► │ Transport │                   │
//!   │  (ns)    │  CAL:ns:*       │ (shared)  │ ──────────────────┘
//!   └──────────┘ ──────────────► └───────────┘
//! ```
//!
//! A bus is bound to one namespace and an injected [`Transport`]. Every fire
//! publishes the same [`Envelope`] on two channels: the type-specific one and
//! the namespace's wildcard. Delivery is synchronous, in registration order,
//! and unbuffered: nobody listening means the message is gone.
//!
//! Buses in different namespaces may share one transport (wrap it in `Rc`);
//! buses given separate transports never see each other.

mod bus;
pub mod config;
mod error;
mod listener;
mod transport;
#[cfg(feature = "web")]
mod web;

pub use bus::{ActionBus, DispatchChannels};
pub use config::BusConfig;
pub use embed_action_proto::{Action, ActionKind, ActionName, Envelope, NameCodec, NameScheme};
pub use error::BusError;
pub use listener::Listener;
pub use transport::{LocalTransport, Transport};
#[cfg(feature = "web")]
pub use web::WebTransport;
