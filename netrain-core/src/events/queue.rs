//! Bounded event queue between the capture thread and the stream engine.
//!
//! A fixed ring of display events behind a single lock. Pushing onto a full ring
//! overwrites the oldest entry instead of blocking, so a slow consumer never stalls
//! capture; the loss is counted, not signalled back to the producer.
//!
//! Ring invariant (under the lock):
//! - `count <= capacity`
//! - the retained events live at `tail, tail + 1, ..., tail + count - 1` (mod capacity)
//! - `head == (tail + count) % capacity` is the next slot to write

use parking_lot::Mutex;

use super::display::DisplayEvent;
use crate::error::CoreError;

/// Result of a push; eviction is reported for accounting only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Stored,
    EvictedOldest,
}

struct Ring {
    slots: Box<[Option<DisplayEvent>]>,
    head: usize,
    tail: usize,
    count: usize,
    evicted: u64,
}

/// Thread-safe overwrite-on-full FIFO of display events.
pub struct EventQueue {
    ring: Mutex<Ring>,
    capacity: usize,
}

impl EventQueue {
    /// Creates a queue that retains at most `capacity` events.
    pub fn with_capacity(capacity: usize) -> Result<Self, CoreError> {
        if capacity == 0 {
            return Err(CoreError::InvalidCapacity(capacity));
        }

        let slots = (0..capacity)
            .map(|_| None)
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            ring: Mutex::new(Ring {
                slots,
                head: 0,
                tail: 0,
                count: 0,
                evicted: 0,
            }),
            capacity,
        })
    }

    /// Appends an event, evicting the oldest one when full. Never blocks beyond the lock.
    #[inline]
    pub fn push(&self, event: DisplayEvent) -> PushOutcome {
        let mut ring = self.ring.lock();
        let capacity = self.capacity;

        let outcome = if ring.count >= capacity {
            ring.tail = (ring.tail + 1) % capacity;
            ring.count -= 1;
            ring.evicted += 1;
            PushOutcome::EvictedOldest
        } else {
            PushOutcome::Stored
        };

        let head = ring.head;
        ring.slots[head] = Some(event);
        ring.head = (head + 1) % capacity;
        ring.count += 1;
        outcome
    }

    /// Removes the oldest event, or `None` when the queue is empty.
    #[inline]
    pub fn pop(&self) -> Option<DisplayEvent> {
        let mut ring = self.ring.lock();
        if ring.count == 0 {
            return None;
        }

        let tail = ring.tail;
        let event = ring.slots[tail].take();
        ring.tail = (tail + 1) % self.capacity;
        ring.count -= 1;
        event
    }

    /// Pops up to `max` events, handing each to `f`. Returns how many were delivered.
    ///
    /// The lock is taken per event so the producer is never held off for a whole batch.
    pub fn drain_into<F>(&self, max: usize, mut f: F) -> usize
    where
        F: FnMut(DisplayEvent),
    {
        let mut delivered = 0;
        while delivered < max {
            match self.pop() {
                Some(event) => {
                    f(event);
                    delivered += 1;
                }
                None => break,
            }
        }
        delivered
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.lock().count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total events overwritten since creation.
    pub fn evicted(&self) -> u64 {
        self.ring.lock().evicted
    }
}
