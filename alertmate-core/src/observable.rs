//! Observable values for reactive display
//!
//! An [`Observable`] holds one value behind the lock of a `tokio::sync::watch`
//! channel. Writers mutate in place under that lock and readers always get a
//! clone, so no caller ever holds an alias of the stored value.
//!
//! A [`Subscription`] replays the current value first and then yields the
//! latest value after each change. Bursts of writes may be coalesced into one
//! wake-up; the most recent value is never skipped.

use tokio::sync::watch;

/// A value with replay-on-subscribe change notification.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Point-in-time copy of the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Replace the value only when it differs. Returns true if it changed.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Mutate the value in place while holding the write lock
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Start a new stream of values, beginning with the current one
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: self.tx.subscribe(),
            primed: false,
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Lazy, unbounded stream of an [`Observable`]'s values.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
    primed: bool,
}

impl<T: Clone> Subscription<T> {
    /// Wait for the next value.
    ///
    /// The first call resolves immediately with the current value. Returns
    /// `None` once the owning store has been dropped.
    pub async fn next(&mut self) -> Option<T> {
        if self.primed {
            self.rx.changed().await.ok()?;
        } else {
            self.primed = true;
        }
        Some(self.rx.borrow_and_update().clone())
    }

    /// Latest value without waiting or consuming a change
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }
}
