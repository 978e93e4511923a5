//! Observer lists with per-callback isolation
//!
//! Both the connection layer (message and status callbacks) and the bus
//! (subscriber callbacks) fan events out to lists of registered closures.
//! The isolation contract lives here, in the interface: a panicking callback
//! is caught and logged, and never prevents delivery to its siblings.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

/// An ordered list of callbacks invoked with a shared reference to an event.
///
/// Registration appends; there is no duplicate detection and no removal —
/// observers live as long as the list. Notification walks the list in
/// registration order.
pub struct Observers<A> {
    callbacks: Mutex<Vec<Box<dyn Fn(&A) + Send + Sync>>>,
    /// Label used in log lines when a callback panics
    label: &'static str,
}

impl<A> Observers<A> {
    /// Create an empty observer list with a label for diagnostics
    pub fn new(label: &'static str) -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
            label,
        }
    }

    /// Register a callback
    pub fn register<F>(&self, callback: F)
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        self.callbacks
            .lock()
            .expect("observer list poisoned")
            .push(Box::new(callback));
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.callbacks.lock().expect("observer list poisoned").len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every callback with the event, isolating panics per callback
    pub fn notify(&self, event: &A) {
        let callbacks = self.callbacks.lock().expect("observer list poisoned");
        for (index, callback) in callbacks.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::error!(
                    list = self.label,
                    index,
                    "Observer callback panicked, continuing with remaining observers"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_notify_in_registration_order() {
        let observers: Observers<u32> = Observers::new("test");
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..3 {
            let seen = seen.clone();
            observers.register(move |value: &u32| {
                seen.lock().unwrap().push((tag, *value));
            });
        }

        observers.notify(&7);

        assert_eq!(*seen.lock().unwrap(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn test_panicking_callback_does_not_block_siblings() {
        let observers: Observers<()> = Observers::new("test");
        let delivered = Arc::new(AtomicU32::new(0));

        observers.register(|_: &()| panic!("boom"));
        let counter = delivered.clone();
        observers.register(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        observers.notify(&());

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_registration_is_allowed() {
        let observers: Observers<()> = Observers::new("test");
        let count = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let count = count.clone();
            observers.register(move |_: &()| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(observers.len(), 2);
        observers.notify(&());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
