//! Bounded blocking FIFO used as the transport between pipeline stages.
//!
//! Producers block while the queue is full and consumers block while it is
//! empty, so a slow stage throttles the ones upstream of it. There is no
//! close or cancel signal: streams end with an [`Envelope::Sentinel`] that
//! consumers observe without removing.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// A stream element: either a unit of work or the end-of-stream marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    Item(T),
    Sentinel,
}

impl<T> Envelope<T> {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Envelope::Sentinel)
    }

    /// Predicate for [`BoundedQueue::pop_if`] that never consumes the sentinel.
    pub fn is_item(&self) -> bool {
        !self.is_sentinel()
    }

    pub fn into_item(self) -> Option<T> {
        match self {
            Envelope::Item(item) => Some(item),
            Envelope::Sentinel => None,
        }
    }
}

/// Fixed-capacity blocking queue.
///
/// All state sits behind one mutex with two condition variables, one for
/// "data available" and one for "space available".
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Panics
    /// Panics if `capacity` is zero; such a queue could never accept an item.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Append at the tail, blocking while the queue is full.
    pub fn push_back(&self, item: T) {
        let mut items = self.items.lock();
        while items.len() >= self.capacity {
            self.not_full.wait(&mut items);
        }
        items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Insert at the head, blocking while the queue is full.
    ///
    /// Lets a consumer put an item back ahead of everything else.
    pub fn push_front(&self, item: T) {
        let mut items = self.items.lock();
        while items.len() >= self.capacity {
            self.not_full.wait(&mut items);
        }
        items.push_front(item);
        self.not_empty.notify_one();
    }

    /// Remove and return the head, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                self.not_full.notify_one();
                return item;
            }
            self.not_empty.wait(&mut items);
        }
    }

    /// Block until the queue is non-empty, then remove the head only if
    /// `take` accepts it.
    ///
    /// Returns `None` and leaves the head in place when `take` rejects it.
    /// The inspection and the removal happen under one lock acquisition, so
    /// a rejected head is seen by every consumer that comes after.
    pub fn pop_if<F>(&self, take: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        let mut items = self.items.lock();
        while items.is_empty() {
            self.not_empty.wait(&mut items);
        }

        let accept = items.front().is_some_and(take);
        if accept {
            let item = items.pop_front();
            self.not_full.notify_one();
            item
        } else {
            // The head stays, so hand the wake-up on to the next waiter.
            self.not_empty.notify_one();
            None
        }
    }

    /// Number of items currently queued.
    ///
    /// Advisory only: the value may be stale as soon as the lock is released.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> BoundedQueue<Envelope<T>> {
    /// Next work item, or `None` once the sentinel reaches the head.
    ///
    /// The sentinel is left in the queue so every other consumer sees it too.
    pub fn next_item(&self) -> Option<T> {
        self.pop_if(Envelope::is_item).and_then(Envelope::into_item)
    }
}

impl<T: Clone> BoundedQueue<T> {
    /// Return a copy of the head without removing it, blocking while empty.
    pub fn front(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.front() {
                let item = item.clone();
                self.not_empty.notify_one();
                return item;
            }
            self.not_empty.wait(&mut items);
        }
    }
}
