//! Property change notification
//!
//! A [`PropertyNotifier`] is the change stream of a view-model: after each
//! successful mutation it synchronously calls every subscribed handler with
//! the name of the property that changed.
//!
//! # Invariants
//!
//! 1. Handlers run in subscription order, before `notify` returns.
//! 2. A handler unsubscribed while a notification is in flight is not called
//!    for the rest of that notification.
//! 3. Handlers may subscribe, unsubscribe or trigger nested notifications;
//!    the subscriber list is never borrowed while a handler runs.
//! 4. [`Subscription`] is the only way to unsubscribe. It is released
//!    explicitly with [`Subscription::unsubscribe`] or on drop.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Handler = Rc<dyn Fn(&str)>;

#[derive(Default)]
struct NotifierInner {
    handlers: Vec<(u64, Handler)>,
    next_id: u64,
}

impl NotifierInner {
    fn contains(&self, id: u64) -> bool {
        self.handlers.iter().any(|(i, _)| *i == id)
    }
}

/// Change-notification stream keyed by property name
#[derive(Clone, Default)]
pub struct PropertyNotifier {
    inner: Rc<RefCell<NotifierInner>>,
}

impl PropertyNotifier {
    /// Create a notifier with no subscribers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler. It stays subscribed while the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, handler: impl Fn(&str) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.push((id, Rc::new(handler)));
        Subscription {
            notifier: Rc::downgrade(&self.inner),
            id,
            active: true,
        }
    }

    /// Notify all subscribers that `property` changed
    pub fn notify(&self, property: &str) {
        let snapshot: Vec<(u64, Handler)> = self
            .inner
            .borrow()
            .handlers
            .iter()
            .map(|(id, h)| (*id, Rc::clone(h)))
            .collect();

        for (id, handler) in snapshot {
            if self.inner.borrow().contains(id) {
                handler(property);
            }
        }
    }

    /// Store `value` in `field` and notify `name` if it changed.
    ///
    /// Returns whether a notification was sent.
    pub fn set_property<T: PartialEq>(&self, field: &ObservableValue<T>, name: &str, value: T) -> bool {
        if field.replace(value) {
            self.notify(name);
            true
        } else {
            false
        }
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }
}

impl fmt::Debug for PropertyNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Unsubscribe handle returned by [`PropertyNotifier::subscribe`]
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    notifier: Weak<RefCell<NotifierInner>>,
    id: u64,
    active: bool,
}

impl Subscription {
    /// Remove the handler from the notifier
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Whether the handler is still registered
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
            && self
                .notifier
                .upgrade()
                .is_some_and(|inner| {
                    let inner = inner.borrow();
                    inner.contains(self.id)
                })
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(inner) = self.notifier.upgrade() {
            inner.borrow_mut().handlers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
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

/// Interior-mutable storage for one view-model property.
///
/// Setters take `&self`, so a view-model shared behind an `Rc` can be
/// mutated from a binding callback while other bindings read it.
#[derive(Debug, Default)]
pub struct ObservableValue<T> {
    value: RefCell<T>,
}

impl<T> ObservableValue<T> {
    /// Create with an initial value
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }

    /// Read through a closure without cloning
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Overwrite without comparing
    pub fn set_silently(&self, value: T) {
        *self.value.borrow_mut() = value;
    }
}

impl<T: Clone> ObservableValue<T> {
    /// Current value
    #[must_use]
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }
}

impl<T: PartialEq> ObservableValue<T> {
    /// Store `value`, returning whether it differs from the previous one
    pub fn replace(&self, value: T) -> bool {
        let mut current = self.value.borrow_mut();
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    }
}
