// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fully-qualified action names and the codec that puts them on the wire.
//!
//! Inside the crates an action is addressed by the structured [`ActionName`]
//! tuple. It only becomes a string at the transport boundary, through a
//! [`NameCodec`]:
//!
//! | Scheme | Encode | Decode |
//! |--------|--------|--------|
//! | [`NameScheme::Legacy`] | `P:<ns>:<type>`, fields verbatim | naive positional split, first three segments |
//! | [`NameScheme::Escaped`] | `%` → `%25`, `:` → `%3A` in both fields | exactly three segments, escapes reversed |
//!
//! Both schemes render identical strings for fields free of `:` and `%`, so an
//! escaped peer interoperates with a legacy one for every ordinary name.
//!
//! Under the legacy scheme a `:` inside a field is not escaped and decoding
//! shifts segments (`CAL:a:b:c` decodes as namespace `a`, type `b`). Deployed
//! hosts parse names exactly this way.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_PROTOCOL, SEPARATOR, WILDCARD};

/// Structured (namespace, type) pair addressing one action channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionName {
    /// Namespace scoping the channel; empty is the root namespace.
    pub namespace: String,
    /// Action type within the namespace (`*` for the wildcard channel).
    #[serde(rename = "type")]
    pub action_type: String,
}

impl ActionName {
    /// Build a name from its two components.
    pub fn new(namespace: impl Into<String>, action_type: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            action_type: action_type.into(),
        }
    }

    /// The wildcard channel of `namespace`.
    pub fn wildcard(namespace: impl Into<String>) -> Self {
        Self::new(namespace, WILDCARD)
    }

    /// True when this names the wildcard channel.
    pub fn is_wildcard(&self) -> bool {
        self.action_type == WILDCARD
    }

    /// True when this lives in the root (empty) namespace.
    pub fn is_root(&self) -> bool {
        self.namespace.is_empty()
    }
}

/// How field values are rendered into the wire string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameScheme {
    /// Fields written verbatim; positional split on decode.
    #[default]
    Legacy,
    /// Separator and escape characters percent-escaped inside fields.
    Escaped,
}

/// Renders [`ActionName`]s to wire strings and parses them back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCodec {
    protocol: String,
    scheme: NameScheme,
}

impl Default for NameCodec {
    fn default() -> Self {
        Self::legacy()
    }
}

impl NameCodec {
    /// Codec with an explicit protocol literal and scheme.
    pub fn new(protocol: impl Into<String>, scheme: NameScheme) -> Self {
        Self {
            protocol: protocol.into(),
            scheme,
        }
    }

    /// Legacy scheme under [`DEFAULT_PROTOCOL`].
    pub fn legacy() -> Self {
        Self::new(DEFAULT_PROTOCOL, NameScheme::Legacy)
    }

    /// Escaped scheme under [`DEFAULT_PROTOCOL`].
    pub fn escaped() -> Self {
        Self::new(DEFAULT_PROTOCOL, NameScheme::Escaped)
    }

    /// Protocol literal written as the first segment.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Active field scheme.
    pub fn scheme(&self) -> NameScheme {
        self.scheme
    }

    /// Encode a structured name.
    pub fn encode(&self, name: &ActionName) -> String {
        self.full_name(&name.namespace, &name.action_type)
    }

    /// Encode a (namespace, type) pair without building an [`ActionName`].
    ///
    /// Total and deterministic; the root namespace renders as `P::<type>`.
    pub fn full_name(&self, namespace: &str, action_type: &str) -> String {
        match self.scheme {
            NameScheme::Legacy => join(&self.protocol, namespace, action_type),
            NameScheme::Escaped => join(&self.protocol, &escape(namespace), &escape(action_type)),
        }
    }

    /// Parse a wire name.
    ///
    /// Returns `None` for the empty string and for any string whose first
    /// segment is not this codec's protocol literal. Under the escaped scheme
    /// anything other than exactly three well-escaped segments is also `None`.
    pub fn decode(&self, full: &str) -> Option<ActionName> {
        if full.is_empty() {
            return None;
        }
        let mut segments = full.split(SEPARATOR);
        if segments.next() != Some(self.protocol.as_str()) {
            return None;
        }
        match self.scheme {
            NameScheme::Legacy => {
                // Missing segments read as empty, extra segments are dropped.
                let namespace = segments.next().unwrap_or_default();
                let action_type = segments.next().unwrap_or_default();
                Some(ActionName::new(namespace, action_type))
            }
            NameScheme::Escaped => {
                let namespace = unescape(segments.next()?)?;
                let action_type = unescape(segments.next()?)?;
                if segments.next().is_some() {
                    return None;
                }
                Some(ActionName {
                    namespace,
                    action_type,
                })
            }
        }
    }
}

/// Legacy encode under [`DEFAULT_PROTOCOL`]: `CAL:<namespace>:<type>`.
pub fn encode(namespace: &str, action_type: &str) -> String {
    join(DEFAULT_PROTOCOL, namespace, action_type)
}

/// Legacy decode under [`DEFAULT_PROTOCOL`]; `None` when not a protocol name.
pub fn decode(full: &str) -> Option<ActionName> {
    NameCodec::legacy().decode(full)
}

fn join(protocol: &str, namespace: &str, action_type: &str) -> String {
    let mut out = String::with_capacity(protocol.len() + namespace.len() + action_type.len() + 2);
    out.push_str(protocol);
    out.push(SEPARATOR);
    out.push_str(namespace);
    out.push(SEPARATOR);
    out.push_str(action_type);
    out
}

fn escape(field: &str) -> Cow<'_, str> {
    if !field.contains(['%', SEPARATOR]) {
        return Cow::Borrowed(field);
    }
    let mut out = String::with_capacity(field.len() + 4);
    for ch in field.chars() {
        match ch {
            '%' => out.push_str("%25"),
            SEPARATOR => out.push_str("%3A"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

fn unescape(field: &str) -> Option<String> {
    let mut out = String::with_capacity(field.len());
    let mut rest = field;
    while let Some(idx) = rest.find('%') {
        out.push_str(&rest[..idx]);
        match rest.get(idx + 1..idx + 3)? {
            "25" => out.push('%'),
            "3A" => out.push(SEPARATOR),
            _ => return None,
        }
        rest = &rest[idx + 3..];
    }
    out.push_str(rest);
    Some(out)
}
