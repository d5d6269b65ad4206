// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Envelope delivered to every listener of a fire.

use serde::{Deserialize, Serialize};

use crate::{Action, ActionError, ActionKind, ActionName};

/// Structured message carried under a fully-qualified action name.
///
/// `action_type` and `namespace` travel explicitly even though transports
/// route purely on `full_type`; a wildcard listener relies on them to tell
/// which action it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Logical action type (never `*` unless the producer fired the wildcard itself).
    #[serde(rename = "type")]
    pub action_type: String,
    /// Namespace of the firing bus.
    pub namespace: String,
    /// Wire name of the type-specific channel.
    #[serde(rename = "fullType")]
    pub full_type: String,
    /// Payload, shape negotiated per action kind.
    pub data: serde_json::Value,
}

impl Envelope {
    /// Structured name this envelope was fired under.
    pub fn name(&self) -> ActionName {
        ActionName::new(self.namespace.clone(), self.action_type.clone())
    }

    /// Catalog entry for the action type, when it is a known one.
    pub fn kind(&self) -> Option<ActionKind> {
        self.action_type.parse().ok()
    }

    /// Decode `data` as the payload declared for `A`.
    ///
    /// Does not check that `action_type` matches `A::KIND`; see [`Self::is`].
    pub fn payload<A: Action>(&self) -> Result<A, ActionError> {
        Ok(A::deserialize(&self.data)?)
    }

    /// True when the envelope was fired as `A`'s kind.
    pub fn is<A: Action>(&self) -> bool {
        self.action_type == A::KIND.as_str()
    }
}
