//! A value cell that notifies subscribers when it changes.
//!
//! Only the side that owns the value holds a `&mut Observable<T>`, so writes are restricted by
//! ownership rather than by a runtime permission flag.
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

type Observer<T> = Box<dyn FnMut(&T, &T) + Send>;

pub struct Observable<T> {
    value: T,
    observers: Vec<Observer<T>>,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            observers: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Register a callback invoked with `(old, new)` after every change
    pub fn subscribe(&mut self, observer: impl FnMut(&T, &T) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }
}

impl<T: PartialEq> Observable<T> {
    /// Store `value`. Observers only run if the value actually changed.
    ///
    /// Returns true if the value changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        let old = core::mem::replace(&mut self.value, value);
        for observer in self.observers.iter_mut() {
            observer(&old, &self.value);
        }
        true
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("observers", &self.observers.len())
            .finish()
    }
}
