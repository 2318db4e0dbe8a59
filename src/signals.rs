// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Single-threaded observer primitives.

An [Emitter] is a cloneable handle to a list of listeners.  Listeners can be added or removed
at any time, including from inside a listener while the emitter is dispatching.  A listener
removed mid-dispatch is not invoked for the remainder of that dispatch, which mirrors how a
host's event targets behave.

A [Subscription] ties a registration to a value.  Dropping it (or calling
[Subscription::unsubscribe]) removes the registration; [Subscription::detach] keeps the
listener registered for the life of the emitter.
*/

use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Identifies one registration on an [Emitter] or on a host resource.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(u64);

impl ListenerId {
    pub const fn from_raw(raw: u64) -> Self {
        ListenerId(raw)
    }
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

type Listener<E> = Rc<dyn Fn(&E)>;

struct Shared<E> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Listener<E>)>>,
}

/**
A list of listeners for events of type `E`.

Cloning an emitter yields another handle to the same listener list.
*/
pub struct Emitter<E> {
    shared: Rc<Shared<E>>,
}

impl<E> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Emitter {
            shared: self.shared.clone(),
        }
    }
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Emitter {
            shared: Rc::new(Shared {
                next_id: Cell::new(1),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }
}

impl<E> Debug for Emitter<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<E> Emitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its id.
    pub fn add<F: Fn(&E) + 'static>(&self, listener: F) -> ListenerId {
        let id = ListenerId(self.shared.next_id.get());
        self.shared.next_id.set(id.0 + 1);
        self.shared
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    /// Removes a listener.  Returns false if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.shared.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.shared
            .listeners
            .borrow()
            .iter()
            .any(|(existing, _)| *existing == id)
    }

    pub fn len(&self) -> usize {
        self.shared.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.shared.listeners.borrow_mut().clear();
    }

    /**
    Delivers `event` to every listener registered when dispatch begins.

    No borrow is held while a listener runs.  Returns the number of listeners invoked.
    */
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<(ListenerId, Listener<E>)> = self.shared.listeners.borrow().clone();
        let mut invoked = 0;
        for (id, listener) in snapshot {
            if self.is_registered(id) {
                listener(event);
                invoked += 1;
            }
        }
        invoked
    }
}

impl<E: 'static> Emitter<E> {
    /// Registers a listener whose lifetime is tied to the returned [Subscription].
    pub fn subscribe<F: Fn(&E) + 'static>(&self, listener: F) -> Subscription {
        let id = self.add(listener);
        let emitter = self.clone();
        Subscription::new(move || {
            emitter.remove(id);
        })
    }
}

/**
An active registration.

The registration is removed when the subscription is dropped.
*/
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a subscription that runs `unsubscribe` exactly once.
    pub fn new<F: FnOnce() + 'static>(unsubscribe: F) -> Self {
        Subscription {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.run();
    }

    /// Leaves the listener registered for the lifetime of its emitter.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
