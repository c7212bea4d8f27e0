//! Observer plumbing shared by the loader and scene crates.
//!
//! Emitters own their [`Listeners`]. Whoever subscribes keeps the returned
//! [`ListenerId`] and hands it back to `unsubscribe` when it goes away.
//! Everything here is single-threaded.

use std::{
    cell::{Cell, RefCell},
    fmt::{self, Debug, Formatter},
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Callback<E> = Rc<dyn Fn(&E)>;

pub struct Listeners<E> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Callback<E>)>>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl<E> Debug for Listeners<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed (or already removed).
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emit(&self, event: &E) {
        // Listeners may subscribe or unsubscribe while being called.
        let listeners: Vec<Callback<E>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }
}

/// A value cell which notifies its listeners whenever the value changes.
pub struct Signal<T> {
    value: RefCell<T>,
    changed: Listeners<T>,
}

impl<T: Debug> Debug for Signal<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.value.borrow())
            .field("listeners", &self.changed.len())
            .finish()
    }
}

impl<T: Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            changed: Listeners::new(),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> ListenerId {
        self.changed.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.changed.unsubscribe(id)
    }
}

impl<T: Clone + PartialEq> Signal<T> {
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Stores `value` and notifies listeners. Setting an equal value is
    /// silent and returns false.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.changed.emit(&value);
        true
    }
}
