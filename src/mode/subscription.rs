//! Disposable subscriptions owned on behalf of a mode or the session.

use crate::registry::panic_message;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// A cleanup action that runs exactly once, when disposed.
pub struct Disposable {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Disposable {
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// Runs the cleanup action.
    pub fn dispose(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("pending", &self.dispose.is_some())
            .finish()
    }
}

/// A bag of [`Disposable`]s released together.
#[derive(Debug, Default)]
pub struct Subscriptions {
    items: Vec<Disposable>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, disposable: Disposable) {
        self.items.push(disposable);
    }

    /// Moves everything held by `other` into this bag.
    pub fn append(&mut self, other: &mut Subscriptions) {
        self.items.append(&mut other.items);
    }

    /// Disposes everything, most recent first. Returns how many ran.
    ///
    /// A panicking cleanup action is logged and does not stop the others.
    pub fn dispose_all(&mut self) -> usize {
        let count = self.items.len();
        while let Some(item) = self.items.pop() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| item.dispose())) {
                log::error!(
                    "subscription panicked while disposing: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
        count
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
