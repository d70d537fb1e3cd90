//! Shared value cells
//!
//! A `SharedValue<T>` is the storage an animation writes into and a renderer
//! reads from. Cloning the cell clones the handle, not the value, so the
//! object that owns the property and the animation driving it see the same
//! storage.
//!
//! Cells are single-writer by convention: if two animations target the same
//! cell, the last write of a tick wins.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Thread-safe handle to a mutable value
pub struct SharedValue<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> SharedValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Replace the current value
    pub fn set(&self, value: T) {
        *self.inner.lock() = value;
    }

    /// Mutate the value in place
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Read the value through a closure without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Whether two handles point at the same cell
    pub fn ptr_eq(&self, other: &SharedValue<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> SharedValue<T> {
    /// Current value
    pub fn get(&self) -> T {
        self.inner.lock().clone()
    }
}

impl<T> Clone for SharedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for SharedValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedValue").field(&*self.inner.lock()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_storage() {
        let a = SharedValue::new(1.0_f64);
        let b = a.clone();
        b.set(4.5);
        assert_eq!(a.get(), 4.5);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&SharedValue::new(4.5)));
    }

    #[test]
    fn test_update_returns_closure_result() {
        let hidden = SharedValue::new(false);
        let now = hidden.update(|h| {
            *h = !*h;
            *h
        });
        assert!(now);
        assert!(hidden.get());
        assert_eq!(hidden.with(|h| if *h { 1 } else { 0 }), 1);
    }
}
