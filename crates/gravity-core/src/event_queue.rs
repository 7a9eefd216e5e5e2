//! Fixed-capacity event ring shared between window callbacks and the main loop.

use parking_lot::Mutex;
use thiserror::Error;

use crate::event::Event;

/// Event queue errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventQueueError {
    /// Capacity must leave at least one usable slot.
    #[error("event queue capacity must be non-zero")]
    ZeroCapacity,
    /// `allocate` was called on a queue that already has storage.
    #[error("event queue already allocated")]
    AlreadyAllocated,
}

struct Ring {
    slots: Vec<Option<Event>>,
    current: usize,
    next: usize,
}

impl Ring {
    const fn empty() -> Self {
        Self {
            slots: Vec::new(),
            current: 0,
            next: 0,
        }
    }

    fn is_allocated(&self) -> bool {
        !self.slots.is_empty()
    }

    // One slot always stays empty so `current == next` means "empty".
    fn is_full(&self) -> bool {
        (self.next + 1) % self.slots.len() == self.current
    }

    fn has_events(&self) -> bool {
        self.is_allocated() && self.current != self.next
    }
}

/// Circular buffer of pending [`Event`]s.
///
/// Producers may live on another thread than the consumer; a single mutex
/// serializes every insert and drain. Inserting into a full queue drops the
/// event instead of blocking.
pub struct EventQueue {
    ring: Mutex<Ring>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Create a queue without storage. Call [`EventQueue::allocate`] before use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(Ring::empty()),
        }
    }

    /// Create and allocate a queue in one step.
    pub fn with_capacity(capacity: usize) -> Result<Self, EventQueueError> {
        let queue = Self::new();
        queue.allocate(capacity)?;
        Ok(queue)
    }

    /// Pre-size the ring. A queue of capacity `n` holds at most `n - 1` events.
    pub fn allocate(&self, capacity: usize) -> Result<(), EventQueueError> {
        if capacity == 0 {
            return Err(EventQueueError::ZeroCapacity);
        }
        let mut ring = self.ring.lock();
        if ring.is_allocated() {
            return Err(EventQueueError::AlreadyAllocated);
        }
        ring.slots = std::iter::repeat_with(|| None).take(capacity).collect();
        ring.current = 0;
        ring.next = 0;
        Ok(())
    }

    /// Release the storage, dropping any pending events.
    pub fn teardown(&self) {
        *self.ring.lock() = Ring::empty();
    }

    /// Total number of slots, including the reserved one.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.lock().slots.len()
    }

    /// Try to append an event.
    ///
    /// Returns `false` (and drops the event) if the queue is full or was never
    /// allocated.
    pub fn try_insert(&self, event: Event) -> bool {
        let mut ring = self.ring.lock();
        if !ring.is_allocated() || ring.is_full() {
            tracing::warn!("Event queue full, dropping {} event", event.kind());
            return false;
        }

        tracing::trace!("Queueing {} event", event.kind());
        let next = ring.next;
        ring.slots[next] = Some(event);
        ring.next = (next + 1) % ring.slots.len();
        true
    }

    /// Whether any events are pending.
    #[must_use]
    pub fn has_events(&self) -> bool {
        self.ring.lock().has_events()
    }

    /// Remove and return every pending event in FIFO order.
    ///
    /// Returns an empty vector when nothing is pending.
    pub fn drain_all(&self) -> Vec<Event> {
        let mut ring = self.ring.lock();
        let mut events = Vec::new();
        while ring.has_events() {
            let current = ring.current;
            if let Some(event) = ring.slots[current].take() {
                events.push(event);
            }
            ring.current = (current + 1) % ring.slots.len();
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyName;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn allocate_rejects_zero_and_double_allocation() {
        let queue = EventQueue::new();
        assert_eq!(queue.allocate(0), Err(EventQueueError::ZeroCapacity));
        assert_eq!(queue.allocate(8), Ok(()));
        assert_eq!(queue.allocate(8), Err(EventQueueError::AlreadyAllocated));

        queue.teardown();
        assert_eq!(queue.allocate(4), Ok(()));
        assert_eq!(queue.capacity(), 4);
    }

    #[test]
    fn one_slot_is_always_reserved() {
        let queue = EventQueue::with_capacity(4).unwrap();

        assert!(queue.try_insert(Event::KeyPress(KeyName::A)));
        assert!(queue.try_insert(Event::KeyPress(KeyName::B)));
        assert!(queue.try_insert(Event::KeyPress(KeyName::C)));
        assert!(!queue.try_insert(Event::KeyPress(KeyName::D)));

        let events = queue.drain_all();
        assert_eq!(events.len(), 3);
        let keys: Vec<_> = events
            .iter()
            .map(|e| match e {
                Event::KeyPress(k) => *k,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(keys, vec![KeyName::A, KeyName::B, KeyName::C]);
    }

    #[test]
    fn drain_on_empty_queue_returns_nothing() {
        let queue = EventQueue::with_capacity(4).unwrap();
        assert!(!queue.has_events());
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn insert_without_storage_drops_event() {
        let queue = EventQueue::new();
        assert!(!queue.try_insert(Event::Quit));
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn wraps_around_after_drain() {
        let queue = EventQueue::with_capacity(3).unwrap();

        for round in 0..5u32 {
            assert!(queue.try_insert(Event::WindowResize {
                width: round,
                height: round
            }));
            assert!(queue.try_insert(Event::WindowDraw));
            assert!(!queue.try_insert(Event::Quit));

            let events = queue.drain_all();
            assert_eq!(events.len(), 2);
            assert!(matches!(
                events[0],
                Event::WindowResize { width, .. } if width == round
            ));
            assert!(matches!(events[1], Event::WindowDraw));
        }
    }

    #[test]
    fn producers_on_other_threads() {
        let queue = Arc::new(EventQueue::with_capacity(64).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for _ in 0..10 {
                        assert!(queue.try_insert(Event::WindowDraw));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.drain_all().len(), 40);
        assert!(!queue.has_events());
    }
}
