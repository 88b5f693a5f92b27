#![forbid(unsafe_code)]

//! Synchronous change-notification channel.
//!
//! # Design
//!
//! A [`ChangeEvent`] stores shared [`Handler`]s in subscription order. Handler
//! identity is the `Rc` allocation: unsubscribing removes the most recently
//! attached entry that points at the same closure, so one handler attached
//! twice needs two unsubscribes.
//!
//! # Invariants
//!
//! 1. `emit()` invokes every handler attached when the emit began, in order.
//! 2. Handlers may subscribe or unsubscribe (on this or any other event)
//!    while a dispatch is running; the change applies to the next `emit()`.
//!
//! # Failure Modes
//!
//! - **Handler panics**: the panic propagates to whoever triggered the
//!   mutation. Handlers after the panicking one are not called.
//! - **Ownership cycle**: two objects subscribed to each other notify each
//!   other forever. Acyclic ownership is a precondition.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Zero-argument change handler.
pub type Handler = Rc<dyn Fn()>;

/// Wrap a closure as a [`Handler`].
pub fn handler(f: impl Fn() + 'static) -> Handler {
    Rc::new(f)
}

/// A change-notification channel with zero or more attached handlers.
#[derive(Default)]
pub struct ChangeEvent {
    handlers: RefCell<Vec<Handler>>,
}

impl ChangeEvent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `handler`. Attaching the same handler twice delivers twice.
    pub fn subscribe(&self, handler: &Handler) {
        self.handlers.borrow_mut().push(Rc::clone(handler));
    }

    /// Detach one attachment of `handler`.
    ///
    /// Returns `false` if the handler was not attached.
    pub fn unsubscribe(&self, handler: &Handler) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        match handlers.iter().rposition(|h| Rc::ptr_eq(h, handler)) {
            Some(pos) => {
                handlers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Invoke every attached handler.
    pub fn emit(&self) {
        // Snapshot so handlers can reshape the list mid-dispatch.
        let snapshot: Vec<Handler> = self.handlers.borrow().clone();
        for h in snapshot {
            h();
        }
    }

    /// Number of attachments currently held.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Number of times `handler` is currently attached.
    #[must_use]
    pub fn attachments_of(&self, handler: &Handler) -> usize {
        self.handlers
            .borrow()
            .iter()
            .filter(|h| Rc::ptr_eq(h, handler))
            .count()
    }

    #[must_use]
    pub fn is_subscribed(&self, handler: &Handler) -> bool {
        self.attachments_of(handler) > 0
    }
}

impl fmt::Debug for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeEvent")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
