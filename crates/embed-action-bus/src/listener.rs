// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Listener handles with identity semantics.

use std::fmt;
use std::ptr;
use std::rc::Rc;

use embed_action_proto::{Action, Envelope};
use tracing::warn;

/// Shared callback registered on a channel.
///
/// Clones share identity: registering a clone and removing the original
/// removes the registration. Two listeners built from separate `new` calls
/// are distinct even if the closures are identical.
#[derive(Clone)]
pub struct Listener {
    callback: Rc<dyn Fn(&Envelope)>,
}

impl Listener {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Envelope) + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Wrap a callback that wants `data` decoded as `A`.
    ///
    /// If `data` does not fit `A`, a warning is logged and the callback is not
    /// run; other listeners of the same fire are unaffected.
    pub fn typed<A, F>(callback: F) -> Self
    where
        A: Action,
        F: Fn(&Envelope, A) + 'static,
    {
        Self::new(move |envelope| match envelope.payload::<A>() {
            Ok(payload) => callback(envelope, payload),
            Err(err) => {
                let expected = A::KIND.as_str();
                warn!(
                    full_type = %envelope.full_type,
                    expected,
                    error = %err,
                    "payload does not match declared shape; listener skipped"
                );
            }
        })
    }

    /// Run the callback.
    pub fn call(&self, envelope: &Envelope) {
        (self.callback)(envelope);
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Self) -> bool {
        ptr::addr_eq(Rc::as_ptr(&self.callback), Rc::as_ptr(&other.callback))
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}
