//! JS event subscriptions
//!
//! The session publishes into a shared buffer. With callbacks registered, the facade
//! drains it after each call and hands every event to the matching callbacks; without
//! any, events stay buffered until the host pulls them.
//!
//! Callbacks run while the editor call that produced the event is still in progress,
//! so they must not call back into the editor. Hosts that need to query the editor in
//! response to an event pull with `take_events` instead.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use editor_interaction::EditorEvent;
use js_sys::Function;
use tracing::warn;
use wasm_bindgen::JsValue;

use crate::utils::event_type;

/// Events published by the session, waiting for dispatch
pub type EventBuffer = Rc<RefCell<Vec<EditorEvent>>>;

/// Undelivered events kept for a host that never pulls; the oldest are dropped first
pub const MAX_PENDING_EVENTS: usize = 1024;

/// Take every buffered event, oldest first
pub fn drain_events(buffer: &EventBuffer) -> Vec<EditorEvent> {
    buffer.borrow_mut().drain(..).collect()
}

/// One JS callback
pub struct EventSubscription {
    /// Only events with this `type` tag are delivered; `None` receives everything
    pub event_type: Option<String>,
    pub callback: Function,
}

impl EventSubscription {
    fn accepts(&self, event: &EditorEvent) -> bool {
        self.event_type
            .as_deref()
            .is_none_or(|wanted| wanted == event_type(event))
    }
}

/// Subscription manager
pub struct EventSubscriptionManager {
    subscriptions: BTreeMap<u32, EventSubscription>,
    next_id: u32,
}

impl EventSubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn subscribe(&mut self, callback: Function, event_type: Option<String>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.insert(
            id,
            EventSubscription {
                event_type,
                callback,
            },
        );
        id
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Drain `buffer` and call every matching callback with the event as a JS object.
    /// Without subscriptions the events are left for the host to pull.
    pub fn dispatch(&self, buffer: &EventBuffer) {
        if self.subscriptions.is_empty() {
            let mut pending = buffer.borrow_mut();
            let overflow = pending.len().saturating_sub(MAX_PENDING_EVENTS);
            if overflow > 0 {
                pending.drain(..overflow);
                warn!(dropped = overflow, "editor events not pulled, oldest dropped");
            }
            return;
        }

        let events = drain_events(buffer);

        for event in &events {
            let value = match serde_wasm_bindgen::to_value(event) {
                Ok(value) => value,
                Err(err) => {
                    warn!(%err, "failed to serialize editor event");
                    continue;
                }
            };
            for (id, subscription) in &self.subscriptions {
                if !subscription.accepts(event) {
                    continue;
                }
                if let Err(err) = subscription.callback.call1(&JsValue::NULL, &value) {
                    warn!(
                        subscription = id,
                        ?err,
                        "event callback threw (callbacks must not call back into the editor)"
                    );
                }
            }
        }
    }
}

impl Default for EventSubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
