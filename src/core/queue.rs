//! Bounded multi-producer, single-consumer FIFO
//!
//! One mutex and one condition variable guard the buffer. Producers never
//! wait for space: a push against a full buffer is rejected on the spot.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Capacity used when none is configured
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// Result of [`BoundedQueue::push`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Appended; carries the depth right after the append
    Accepted(usize),
    /// Rejected because `capacity` items are already resident
    Full,
    /// Rejected because the queue was closed for shutdown
    Closed,
}

impl PushOutcome {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, PushOutcome::Accepted(_))
    }
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
            }),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Append `item` unless the queue is full or closed
    ///
    /// The capacity check and the append happen under one lock acquisition,
    /// so no more than `capacity` items are ever resident.
    pub fn push(&self, item: T) -> PushOutcome {
        let depth = {
            let mut state = self.state.lock();
            if state.closed {
                return PushOutcome::Closed;
            }
            if state.items.len() >= self.capacity {
                return PushOutcome::Full;
            }
            state.items.push_back(item);
            state.items.len()
        };

        self.not_empty.notify_one();
        PushOutcome::Accepted(depth)
    }

    /// Block until an item is available or the queue is closed
    ///
    /// Returns `None` once the queue is closed, even if items remain; those
    /// are collected afterwards with [`try_pop`](Self::try_pop).
    pub fn pop_blocking(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Pop the front item without waiting
    pub fn try_pop(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Reject further pushes and wake the consumer
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.not_empty.notify_all();
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
