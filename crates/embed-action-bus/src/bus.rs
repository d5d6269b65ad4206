// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Namespace-bound action bus.

use embed_action_proto::{Action, ActionName, Envelope, NameCodec, WILDCARD};
use tracing::{debug, trace};

use crate::{BusConfig, BusError, Listener, Transport};

/// The two channels every fire is published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchChannels {
    /// Wire name of the type-specific channel.
    pub specific: String,
    /// Wire name of the namespace's wildcard channel.
    pub wildcard: String,
}

/// Publish/subscribe handle bound to one namespace.
///
/// The namespace is fixed at construction; `None` is the root (empty)
/// namespace. The bus holds no listener state of its own: everything is
/// registered on the injected transport, so buses sharing a transport and a
/// namespace see each other's fires.
#[derive(Debug)]
pub struct ActionBus<T> {
    namespace: String,
    codec: NameCodec,
    transport: T,
}

impl<T: Transport> ActionBus<T> {
    /// Bus on `transport` using the legacy codec.
    pub fn new(namespace: Option<&str>, transport: T) -> Self {
        Self::with_codec(namespace, transport, NameCodec::default())
    }

    /// Bus on `transport` with an explicit codec.
    pub fn with_codec(namespace: Option<&str>, transport: T, codec: NameCodec) -> Self {
        Self {
            namespace: namespace.unwrap_or_default().to_owned(),
            codec,
            transport,
        }
    }

    /// Bus on `transport` using the codec described by `config`.
    pub fn from_config(namespace: Option<&str>, transport: T, config: &BusConfig) -> Self {
        Self::with_codec(namespace, transport, config.codec())
    }

    /// Namespace this bus is bound to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Codec used to render wire names.
    pub fn codec(&self) -> &NameCodec {
        &self.codec
    }

    /// Injected transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Wire name of `action_type` in this bus's namespace.
    pub fn full_action_name(&self, action_type: &str) -> String {
        self.codec.full_name(&self.namespace, action_type)
    }

    /// Both channels a fire of `action_type` is published on.
    pub fn channels(&self, action_type: &str) -> DispatchChannels {
        DispatchChannels {
            specific: self.full_action_name(action_type),
            wildcard: self.full_action_name(WILDCARD),
        }
    }

    /// Decode a wire name with this bus's codec.
    pub fn parse_action(&self, full: &str) -> Option<ActionName> {
        self.codec.decode(full)
    }

    /// Publish `data` as `action_type`.
    ///
    /// Listeners of the type-specific channel run first, then wildcard
    /// listeners, all before this returns. Both receive the same envelope,
    /// whose `full_type` is the type-specific name. Firing with no listeners
    /// is a silent no-op.
    pub fn fire(
        &self,
        action_type: impl AsRef<str>,
        data: serde_json::Value,
    ) -> Result<(), BusError> {
        let action_type = action_type.as_ref();
        let channels = self.channels(action_type);
        debug!(
            namespace = %self.namespace,
            action = action_type,
            full_type = %channels.specific,
            "fire"
        );
        let envelope = Envelope {
            action_type: action_type.to_owned(),
            namespace: self.namespace.clone(),
            full_type: channels.specific,
            data,
        };
        self.transport.publish(&envelope.full_type, &envelope)?;
        self.transport.publish(&channels.wildcard, &envelope)
    }

    /// Publish a typed payload under its catalog kind.
    pub fn fire_action<A: Action>(&self, payload: &A) -> Result<(), BusError> {
        let data = serde_json::to_value(payload)?;
        self.fire(A::KIND, data)
    }

    /// Register `listener` for `action_type` (`*` for every type).
    ///
    /// Registering the same listener twice is not collapsed here; whether it
    /// then runs twice per fire is up to the transport.
    pub fn on(&self, action_type: impl AsRef<str>, listener: &Listener) -> Result<(), BusError> {
        let name = self.full_action_name(action_type.as_ref());
        trace!(name = %name, "on");
        self.transport.subscribe(&name, listener)
    }

    /// Remove `listener` from `action_type`; unknown pairs are a no-op.
    pub fn off(&self, action_type: impl AsRef<str>, listener: &Listener) -> Result<(), BusError> {
        let name = self.full_action_name(action_type.as_ref());
        trace!(name = %name, "off");
        self.transport.unsubscribe(&name, listener)
    }
}
