// crates/input_core/src/input/signal.rs
//! Minimal single-threaded observer list.

use std::fmt;

/// Returned by [`Signal::subscribe`]; hand it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

type Observer<T> = Box<dyn FnMut(&T)>;

pub struct Signal<T> {
    next_token: u64,
    observers: Vec<(ObserverToken, Observer<T>)>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            next_token: 0,
            observers: Vec::new(),
        }
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&T) + 'static) -> ObserverToken {
        let token = ObserverToken(self.next_token);
        self.next_token += 1;
        self.observers.push((token, Box::new(observer)));
        token
    }

    /// Returns false if the token was unknown (already removed).
    pub fn unsubscribe(&mut self, token: ObserverToken) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(t, _)| *t != token);
        self.observers.len() != before
    }

    /// Calls observers in subscription order.
    pub fn emit(&mut self, value: &T) {
        for (_, observer) in &mut self.observers {
            observer(value);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("observers", &self.observers.len())
            .finish()
    }
}
