// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Broadcast transport port and the in-process adapter.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use embed_action_proto::Envelope;
use tracing::trace;

use crate::{BusConfig, BusError, Listener};

/// Broadcast primitive the bus rides on.
///
/// Listeners are keyed by exact wire name. `publish` must invoke every
/// listener registered under `name` synchronously and in registration order
/// before returning.
pub trait Transport {
    /// Deliver `envelope` to every listener registered under `name`.
    fn publish(&self, name: &str, envelope: &Envelope) -> Result<(), BusError>;
    /// Register `listener` under `name`.
    fn subscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError>;
    /// Remove `listener` from `name`; unknown pairs are a no-op.
    fn unsubscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError>;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn publish(&self, name: &str, envelope: &Envelope) -> Result<(), BusError> {
        (**self).publish(name, envelope)
    }

    fn subscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError> {
        (**self).subscribe(name, listener)
    }

    fn unsubscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError> {
        (**self).unsubscribe(name, listener)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn publish(&self, name: &str, envelope: &Envelope) -> Result<(), BusError> {
        (**self).publish(name, envelope)
    }

    fn subscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError> {
        (**self).subscribe(name, listener)
    }

    fn unsubscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError> {
        (**self).unsubscribe(name, listener)
    }
}

#[derive(Debug)]
struct Registration {
    listener: Listener,
    // Set when unsubscribed so an in-flight publish skips it.
    removed: Cell<bool>,
}

/// In-process transport: a listener registry keyed by wire name.
///
/// Single-threaded. A publish works on a snapshot of the registrations, so a
/// listener may call back into the transport (or a bus on it):
///
/// - listeners added during a publish are not invoked by that publish;
/// - listeners removed during a publish are skipped if they have not run yet.
///
/// Registering the same listener twice yields two registrations unless the
/// transport was built with [`LocalTransport::deduplicating`].
#[derive(Debug, Default)]
pub struct LocalTransport {
    registry: RefCell<HashMap<String, Vec<Rc<Registration>>>>,
    deduplicate: bool,
}

impl LocalTransport {
    /// Transport that keeps duplicate registrations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that ignores re-registering a listener already on a channel.
    pub fn deduplicating() -> Self {
        Self {
            deduplicate: true,
            ..Self::default()
        }
    }

    /// Transport configured from `config`.
    pub fn from_config(config: &BusConfig) -> Self {
        Self {
            deduplicate: config.deduplicate_listeners,
            ..Self::default()
        }
    }

    /// Number of registrations currently under `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.registry.borrow().get(name).map_or(0, Vec::len)
    }

    /// True when no channel has any registration.
    pub fn is_idle(&self) -> bool {
        self.registry.borrow().is_empty()
    }
}

impl Transport for LocalTransport {
    fn publish(&self, name: &str, envelope: &Envelope) -> Result<(), BusError> {
        let snapshot = self.registry.borrow().get(name).cloned().unwrap_or_default();
        trace!(name, listeners = snapshot.len(), "publish");
        for registration in snapshot {
            if registration.removed.get() {
                continue;
            }
            registration.listener.call(envelope);
        }
        Ok(())
    }

    fn subscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError> {
        let mut registry = self.registry.borrow_mut();
        let entries = registry.entry(name.to_owned()).or_default();
        if self.deduplicate && entries.iter().any(|r| r.listener.same_as(listener)) {
            trace!(name, "listener already registered");
            return Ok(());
        }
        entries.push(Rc::new(Registration {
            listener: listener.clone(),
            removed: Cell::new(false),
        }));
        trace!(name, listeners = entries.len(), "subscribe");
        Ok(())
    }

    fn unsubscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError> {
        let mut registry = self.registry.borrow_mut();
        let Some(entries) = registry.get_mut(name) else {
            return Ok(());
        };
        entries.retain(|registration| {
            let matched = registration.listener.same_as(listener);
            if matched {
                registration.removed.set(true);
            }
            !matched
        });
        if entries.is_empty() {
            registry.remove(name);
        }
        trace!(name, "unsubscribe");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(name: &str) -> Envelope {
        Envelope {
            action_type: "t".into(),
            namespace: "n".into(),
            full_type: name.into(),
            data: json!(null),
        }
    }

    fn counting(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Listener {
        let log = Rc::clone(log);
        Listener::new(move |_| log.borrow_mut().push(tag))
    }

    #[test]
    fn delivers_in_registration_order() {
        let transport = LocalTransport::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        transport.subscribe("a", &counting(&log, "first")).unwrap();
        transport.subscribe("a", &counting(&log, "second")).unwrap();
        transport.subscribe("b", &counting(&log, "other")).unwrap();

        transport.publish("a", &envelope("a")).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn exact_name_match_only() {
        let transport = LocalTransport::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        transport.subscribe("CAL:a:x", &counting(&log, "x")).unwrap();
        transport.publish("CAL:a:x ", &envelope("CAL:a:x ")).unwrap();
        transport.publish("cal:a:x", &envelope("cal:a:x")).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn duplicate_registrations_multiply_unless_deduplicating() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listener = counting(&log, "hit");

        let plain = LocalTransport::new();
        plain.subscribe("a", &listener).unwrap();
        plain.subscribe("a", &listener).unwrap();
        plain.publish("a", &envelope("a")).unwrap();
        assert_eq!(log.borrow().len(), 2);

        log.borrow_mut().clear();
        let dedupe = LocalTransport::deduplicating();
        dedupe.subscribe("a", &listener).unwrap();
        dedupe.subscribe("a", &listener).unwrap();
        dedupe.publish("a", &envelope("a")).unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn unsubscribe_removes_every_matching_registration() {
        let transport = LocalTransport::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let listener = counting(&log, "hit");
        transport.subscribe("a", &listener).unwrap();
        transport.subscribe("a", &listener).unwrap();
        transport.unsubscribe("a", &listener).unwrap();
        assert_eq!(transport.listener_count("a"), 0);
        assert!(transport.is_idle());

        // Unknown pairs are a no-op.
        transport.unsubscribe("a", &listener).unwrap();
        transport.unsubscribe("never", &listener).unwrap();
    }

    #[test]
    fn listeners_added_mid_publish_wait_for_next_publish() {
        let transport = Rc::new(LocalTransport::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let late = counting(&log, "late");
        let adder = {
            let transport = Rc::clone(&transport);
            let late = late.clone();
            Listener::new(move |_| {
                transport.subscribe("a", &late).unwrap();
            })
        };
        transport.subscribe("a", &adder).unwrap();

        transport.publish("a", &envelope("a")).unwrap();
        assert!(log.borrow().is_empty());

        transport.unsubscribe("a", &adder).unwrap();
        transport.publish("a", &envelope("a")).unwrap();
        assert_eq!(*log.borrow(), vec!["late"]);
    }

    #[test]
    fn listeners_removed_mid_publish_are_skipped() {
        let transport = Rc::new(LocalTransport::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let victim = counting(&log, "victim");
        let remover = {
            let transport = Rc::clone(&transport);
            let victim = victim.clone();
            Listener::new(move |_| {
                transport.unsubscribe("a", &victim).unwrap();
            })
        };
        transport.subscribe("a", &remover).unwrap();
        transport.subscribe("a", &victim).unwrap();

        transport.publish("a", &envelope("a")).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(transport.listener_count("a"), 1);
    }
}
