//! Event plumbing between entities and the orchestration layer
//!
//! Entities push into an [`EventQueue`]; the owner drains it once per input cycle
//! and fans the results out to [`Subscribers`].

use std::collections::{BTreeMap, VecDeque};

/// FIFO queue of pending events
#[derive(Debug)]
pub struct EventQueue<E> {
    pending: VecDeque<E>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn push(&mut self, event: E) {
        self.pending.push_back(event);
    }

    /// Take the oldest pending event
    pub fn pop(&mut self) -> Option<E> {
        self.pending.pop_front()
    }

    /// Take every pending event in arrival order
    pub fn drain(&mut self) -> impl Iterator<Item = E> + '_ {
        self.pending.drain(..)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

type Callback<E> = Box<dyn FnMut(&E)>;

/// Observer list keyed by subscription id.
/// Callbacks run in subscription order.
pub struct Subscribers<E> {
    callbacks: BTreeMap<u32, Callback<E>>,
    next_id: u32,
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            callbacks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Register a callback, returns its subscription id
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.callbacks.insert(id, Box::new(callback));
        id
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.callbacks.remove(&id).is_some()
    }

    /// Deliver an event to every subscriber
    pub fn notify(&mut self, event: &E) {
        for callback in self.callbacks.values_mut() {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("ids", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = EventQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(1));
        let rest: Vec<_> = queue.drain().collect();
        assert_eq!(rest, vec![2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_multiple_subscribers_receive_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subscribers = Subscribers::new();

        let first = seen.clone();
        subscribers.subscribe(move |e: &u32| first.borrow_mut().push(("a", *e)));
        let second = seen.clone();
        subscribers.subscribe(move |e: &u32| second.borrow_mut().push(("b", *e)));

        subscribers.notify(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut subscribers = Subscribers::new();
        let counter = count.clone();
        let id = subscribers.subscribe(move |_: &()| *counter.borrow_mut() += 1);

        subscribers.notify(&());
        assert!(subscribers.unsubscribe(id));
        assert!(!subscribers.unsubscribe(id));
        subscribers.notify(&());

        assert_eq!(*count.borrow(), 1);
        assert!(subscribers.is_empty());
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let mut subscribers: Subscribers<()> = Subscribers::new();
        let a = subscribers.subscribe(|_| {});
        let b = subscribers.subscribe(|_| {});
        assert_ne!(a, b);
        assert_eq!(subscribers.len(), 2);
    }
}
