//! Synchronous publish/subscribe primitive
//!
//! Listeners run inside the emitting call, in subscription order. Every
//! subscription hands back a [`Subscription`] that the subscriber owns and
//! may dispose at any time. A listener can also dispose itself by returning
//! `ControlFlow::Break(())`, which is how the lazy self-removing listeners
//! of the registry and the attachment manager are expressed.
//!
//! No borrow of the listener list is held while a listener runs, so a
//! listener may subscribe, unsubscribe or emit again. Listeners added during
//! an emission are not invoked by it; listeners disposed during an emission
//! are not invoked after their disposal.
//!
//! An emission started while the same emitter is still delivering is queued
//! and delivered, in order, once the running one has reached every listener.
//! No listener is ever entered twice, and no value is dropped.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<RefCell<dyn FnMut(&T) -> ControlFlow<()>>>;

struct Slot<T> {
    id: u64,
    listener: Listener<T>,
}

struct ListenerSet<T> {
    next_id: u64,
    slots: Vec<Slot<T>>,
    dispatching: bool,
    pending: VecDeque<T>,
}

impl<T> ListenerSet<T> {
    fn contains(&self, id: u64) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        self.slots.len() != before
    }
}

/// Type-erased view of a listener set, so handles don't carry `T`
trait Unlisten {
    fn unlisten(&self, id: u64) -> bool;
    fn is_listening(&self, id: u64) -> bool;
}

impl<T> Unlisten for RefCell<ListenerSet<T>> {
    fn unlisten(&self, id: u64) -> bool {
        match self.try_borrow_mut() {
            Ok(mut set) => set.remove(id),
            Err(_) => false,
        }
    }

    fn is_listening(&self, id: u64) -> bool {
        self.try_borrow().map(|set| set.contains(id)).unwrap_or(false)
    }
}

/// Handle to a single listener registration
///
/// Dropping the handle does not dispose the listener; call
/// [`Subscription::unsubscribe`] for that.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    set: Weak<dyn Unlisten>,
}

impl Subscription {
    /// Dispose the listener
    ///
    /// Returns `true` if the listener was still registered.
    pub fn unsubscribe(&self) -> bool {
        match self.set.upgrade() {
            Some(set) => set.unlisten(self.id),
            None => false,
        }
    }

    /// Whether the listener is still registered with a live emitter
    pub fn is_active(&self) -> bool {
        self.set
            .upgrade()
            .map(|set| set.is_listening(self.id))
            .unwrap_or(false)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A single-threaded event source carrying values of type `T`
///
/// Clones share the same listener list.
pub struct Emitter<T> {
    listeners: Rc<RefCell<ListenerSet<T>>>,
}

impl<T: 'static> Emitter<T> {
    /// Create an emitter with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(ListenerSet {
                next_id: 1,
                slots: Vec::new(),
                dispatching: false,
                pending: VecDeque::new(),
            })),
        }
    }

    /// Register a listener that decides after each call whether to stay
    ///
    /// Returning `ControlFlow::Break(())` disposes the listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&T) -> ControlFlow<()> + 'static,
    {
        let mut set = self.listeners.borrow_mut();
        let id = set.next_id;
        set.next_id += 1;
        set.slots.push(Slot {
            id,
            listener: Rc::new(RefCell::new(listener)),
        });

        let weak: Weak<RefCell<ListenerSet<T>>> = Rc::downgrade(&self.listeners);
        Subscription { id, set: weak }
    }

    /// Register a listener that stays until its handle is disposed
    pub fn on<F>(&self, mut listener: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        self.subscribe(move |value| {
            listener(value);
            ControlFlow::Continue(())
        })
    }

    /// Register a listener that runs at most once
    pub fn once<F>(&self, listener: F) -> Subscription
    where
        F: FnOnce(&T) + 'static,
    {
        let mut listener = Some(listener);
        self.subscribe(move |value| {
            if let Some(listener) = listener.take() {
                listener(value);
            }
            ControlFlow::Break(())
        })
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().slots.len()
    }
}

impl<T: Clone + 'static> Emitter<T> {
    /// Deliver `value` to every current listener
    ///
    /// Called from inside one of this emitter's listeners, the value is
    /// queued and `0` is returned; the outer call delivers it next. Otherwise
    /// returns the number of listener invocations, queued values included.
    pub fn emit(&self, value: &T) -> usize {
        {
            let mut set = self.listeners.borrow_mut();
            if set.dispatching {
                set.pending.push_back(value.clone());
                return 0;
            }
            set.dispatching = true;
        }
        let _guard = Dispatching(&*self.listeners);

        let mut invoked = self.deliver(value);
        loop {
            let next = self.listeners.borrow_mut().pending.pop_front();
            match next {
                Some(value) => invoked += self.deliver(&value),
                None => break,
            }
        }
        invoked
    }

    fn deliver(&self, value: &T) -> usize {
        let snapshot: Vec<(u64, Listener<T>)> = self
            .listeners
            .borrow()
            .slots
            .iter()
            .map(|slot| (slot.id, Rc::clone(&slot.listener)))
            .collect();

        let mut invoked = 0;
        for (id, listener) in snapshot {
            if !self.listeners.borrow().contains(id) {
                continue;
            }

            // Never re-entered: nested emissions are queued
            let flow = (&mut *listener.borrow_mut())(value);
            invoked += 1;

            if flow.is_break() {
                self.listeners.borrow_mut().remove(id);
            }
        }
        invoked
    }
}

/// Clears the dispatching flag even if a listener unwinds
struct Dispatching<'a, T>(&'a RefCell<ListenerSet<T>>);

impl<T> Drop for Dispatching<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.0.try_borrow_mut() {
            set.dispatching = false;
            set.pending.clear();
        }
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.borrow().slots.len())
            .finish()
    }
}
