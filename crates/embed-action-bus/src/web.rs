// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Browser transport: `CustomEvent`s named after the wire name, dispatched on
//! `window` (or any other event target).
//!
//! The envelope travels as the event `detail`, in its JSON-compatible shape,
//! so plain JS on the same page can listen with
//! `window.addEventListener("CAL:ns:type", e => e.detail)`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embed_action_proto::Envelope;
use serde::Serialize;
use tracing::{trace, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CustomEvent, CustomEventInit, Event, EventTarget, Window};

use crate::{BusError, Listener, Transport};

type EventCallback = Closure<dyn FnMut(Event)>;

struct WebRegistration {
    name: String,
    listener: Listener,
    callback: EventCallback,
}

/// Transport backed by a DOM event target, normally the page's `window`.
///
/// Like `addEventListener`, subscribing the same listener twice under one
/// name attaches it once.
pub struct WebTransport {
    target: EventTarget,
    registrations: RefCell<Vec<WebRegistration>>,
    // Callbacks removed while a dispatch is running stay alive until it ends.
    retired: RefCell<Vec<EventCallback>>,
    depth: Rc<Cell<u32>>,
}

impl WebTransport {
    /// Bind to the global `window`.
    ///
    /// Fails with [`BusError::TransportUnavailable`] in contexts without one
    /// (workers, non-browser hosts).
    pub fn new() -> Result<Self, BusError> {
        Self::bind(web_sys::window())
    }

    /// Bind to a specific window.
    pub fn with_window(window: Window) -> Self {
        Self::with_target(window.into())
    }

    /// Bind to any event target, e.g. a detached `EventTarget` for isolation.
    pub fn with_target(target: EventTarget) -> Self {
        Self {
            target,
            registrations: RefCell::new(Vec::new()),
            retired: RefCell::new(Vec::new()),
            depth: Rc::new(Cell::new(0)),
        }
    }

    fn bind(window: Option<Window>) -> Result<Self, BusError> {
        let window = window.ok_or_else(|| {
            BusError::TransportUnavailable("no global `window` in this context".to_owned())
        })?;
        Ok(Self::with_window(window))
    }

    fn release_retired(&self) {
        if self.depth.get() == 0 {
            self.retired.borrow_mut().clear();
        }
    }

    fn detach(&self, registration: &WebRegistration) -> Result<(), BusError> {
        self.target
            .remove_event_listener_with_callback(
                &registration.name,
                registration.callback.as_ref().unchecked_ref(),
            )
            .map_err(|err| host_error("remove listener", &err))
    }

    fn detach_all(&mut self) {
        let registrations = std::mem::take(self.registrations.get_mut());
        for registration in &registrations {
            if let Err(err) = self.detach(registration) {
                warn!(name = %registration.name, error = %err, "listener left attached");
            }
        }
    }
}

impl Drop for WebTransport {
    fn drop(&mut self) {
        self.detach_all();
    }
}

fn host_error(context: &str, err: &JsValue) -> BusError {
    BusError::Transport(format!("{context}: {err:?}"))
}

impl Transport for WebTransport {
    fn publish(&self, name: &str, envelope: &Envelope) -> Result<(), BusError> {
        let detail = envelope
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|err| BusError::Transport(format!("encode event detail: {err}")))?;
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        let event = CustomEvent::new_with_event_init_dict(name, &init)
            .map_err(|err| host_error("create event", &err))?;
        self.depth.set(self.depth.get() + 1);
        let dispatched = self.target.dispatch_event(&event);
        self.depth.set(self.depth.get() - 1);
        dispatched.map_err(|err| host_error("dispatch event", &err))?;
        self.release_retired();
        Ok(())
    }

    fn subscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError> {
        let attached = self
            .registrations
            .borrow()
            .iter()
            .any(|r| r.name == name && r.listener.same_as(listener));
        if attached {
            trace!(name, "subscribe: already attached");
            return Ok(());
        }
        let delivered = listener.clone();
        let channel = name.to_owned();
        let depth = Rc::clone(&self.depth);
        let callback = EventCallback::new(move |event: Event| {
            let Some(custom) = event.dyn_ref::<CustomEvent>() else {
                warn!(channel = %channel, "ignoring non-custom event");
                return;
            };
            match serde_wasm_bindgen::from_value::<Envelope>(custom.detail()) {
                Ok(envelope) => {
                    depth.set(depth.get() + 1);
                    delivered.call(&envelope);
                    depth.set(depth.get() - 1);
                }
                Err(err) => {
                    warn!(
                        channel = %channel,
                        error = %err,
                        "event detail is not an action envelope"
                    );
                }
            }
        });
        self.target
            .add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
            .map_err(|err| host_error("add listener", &err))?;
        trace!(name, "subscribe");
        self.registrations.borrow_mut().push(WebRegistration {
            name: name.to_owned(),
            listener: listener.clone(),
            callback,
        });
        Ok(())
    }

    fn unsubscribe(&self, name: &str, listener: &Listener) -> Result<(), BusError> {
        let removed: Vec<WebRegistration> = {
            let mut registrations = self.registrations.borrow_mut();
            let (removed, kept) = registrations
                .drain(..)
                .partition(|r| r.name == name && r.listener.same_as(listener));
            *registrations = kept;
            removed
        };
        let mut result = Ok(());
        for registration in removed {
            if let Err(err) = self.detach(&registration) {
                result = Err(err);
            }
            self.retired.borrow_mut().push(registration.callback);
        }
        trace!(name, "unsubscribe");
        self.release_retired();
        result
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn isolated() -> WebTransport {
        WebTransport::with_target(EventTarget::new().unwrap())
    }

    fn envelope(full_type: &str) -> Envelope {
        Envelope {
            action_type: "routed".to_owned(),
            namespace: "w".to_owned(),
            full_type: full_type.to_owned(),
            data: serde_json::json!({ "actionValue": "https://x" }),
        }
    }

    fn counter() -> (Rc<Cell<u32>>, Listener) {
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        (hits, Listener::new(move |_| seen.set(seen.get() + 1)))
    }

    fn raw_dispatch(target: &EventTarget, name: &str) {
        let detail = envelope(name)
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .unwrap();
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        let event = CustomEvent::new_with_event_init_dict(name, &init).unwrap();
        target.dispatch_event(&event).unwrap();
    }

    #[wasm_bindgen_test]
    fn missing_window_fails_fast() {
        match WebTransport::bind(None) {
            Err(BusError::TransportUnavailable(msg)) => assert!(msg.contains("window")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("bound without a window"),
        }
        assert!(WebTransport::new().is_ok());
    }

    #[wasm_bindgen_test]
    fn detail_is_readable_from_plain_js() {
        let transport = isolated();
        let seen: Rc<RefCell<Option<JsValue>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&seen);
        let reader = EventCallback::new(move |event: Event| {
            let custom: &CustomEvent = event.unchecked_ref();
            *slot.borrow_mut() = Some(custom.detail());
        });
        transport
            .target
            .add_event_listener_with_callback("CAL:w:routed", reader.as_ref().unchecked_ref())
            .unwrap();

        transport.publish("CAL:w:routed", &envelope("CAL:w:routed")).unwrap();

        let detail = seen.borrow_mut().take().unwrap();
        let field = |key: &str| js_sys::Reflect::get(&detail, &JsValue::from_str(key)).unwrap();
        assert_eq!(field("type").as_string().as_deref(), Some("routed"));
        assert_eq!(field("namespace").as_string().as_deref(), Some("w"));
        assert_eq!(field("fullType").as_string().as_deref(), Some("CAL:w:routed"));
        let data = field("data");
        let value = js_sys::Reflect::get(&data, &JsValue::from_str("actionValue")).unwrap();
        assert_eq!(value.as_string().as_deref(), Some("https://x"));
    }

    #[wasm_bindgen_test]
    fn envelope_reaches_rust_listener() {
        let transport = isolated();
        let got: Rc<RefCell<Option<Envelope>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&got);
        let listener = Listener::new(move |env| *slot.borrow_mut() = Some(env.clone()));
        transport.subscribe("CAL:w:routed", &listener).unwrap();
        transport.publish("CAL:w:routed", &envelope("CAL:w:routed")).unwrap();
        assert_eq!(got.borrow().as_ref(), Some(&envelope("CAL:w:routed")));
    }

    #[wasm_bindgen_test]
    fn duplicate_subscribe_attaches_once() {
        let transport = isolated();
        let (hits, listener) = counter();
        transport.subscribe("CAL:w:routed", &listener).unwrap();
        transport.subscribe("CAL:w:routed", &listener).unwrap();
        transport.publish("CAL:w:routed", &envelope("CAL:w:routed")).unwrap();
        assert_eq!(hits.get(), 1);

        transport.unsubscribe("CAL:w:routed", &listener).unwrap();
        transport.publish("CAL:w:routed", &envelope("CAL:w:routed")).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[wasm_bindgen_test]
    fn self_removal_during_dispatch_is_deferred() {
        let transport = Rc::new(isolated());
        let hits = Rc::new(Cell::new(0));
        let me: Rc<RefCell<Option<Listener>>> = Rc::new(RefCell::new(None));
        let listener = {
            let transport = Rc::clone(&transport);
            let hits = Rc::clone(&hits);
            let me = Rc::clone(&me);
            Listener::new(move |_| {
                hits.set(hits.get() + 1);
                if let Some(me) = me.borrow().as_ref() {
                    transport.unsubscribe("CAL:w:once", me).unwrap();
                    assert_eq!(transport.retired.borrow().len(), 1);
                }
            })
        };
        *me.borrow_mut() = Some(listener.clone());
        transport.subscribe("CAL:w:once", &listener).unwrap();

        transport.publish("CAL:w:once", &envelope("CAL:w:once")).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(transport.depth.get(), 0);
        assert!(transport.retired.borrow().is_empty());

        transport.publish("CAL:w:once", &envelope("CAL:w:once")).unwrap();
        assert_eq!(hits.get(), 1);
        me.borrow_mut().take();
    }

    #[wasm_bindgen_test]
    fn detach_all_releases_the_target() {
        let target = EventTarget::new().unwrap();
        let mut transport = WebTransport::with_target(target.clone());
        let (hits, listener) = counter();
        transport.subscribe("CAL:w:routed", &listener).unwrap();
        transport.subscribe("CAL:w:other", &listener).unwrap();

        transport.detach_all();
        raw_dispatch(&target, "CAL:w:routed");
        raw_dispatch(&target, "CAL:w:other");
        assert_eq!(hits.get(), 0);
        assert!(transport.registrations.borrow().is_empty());
    }

    #[wasm_bindgen_test]
    fn dropped_transport_leaves_no_listener_behind() {
        let target = EventTarget::new().unwrap();
        let (hits, listener) = counter();
        {
            let transport = WebTransport::with_target(target.clone());
            transport.subscribe("CAL:w:routed", &listener).unwrap();
        }
        raw_dispatch(&target, "CAL:w:routed");
        assert_eq!(hits.get(), 0);
    }
}
