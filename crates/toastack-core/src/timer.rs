//! Time source and one-shot timers for the cooperative event loop.
//!
//! Nothing here blocks or spawns threads. The host asks for
//! [`TimerQueue::next_deadline`], waits however it likes, and then pops the
//! timers that are due.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

/// Milliseconds on a clock's own monotonic timeline.
pub type Millis = u64;

pub trait Clock {
    fn now(&self) -> Millis;
}

/// Wall clock, counting from its own creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Virtual clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Millis) {
        if now > self.now.get() {
            self.now.set(now);
        }
    }

    pub fn advance(&self, by: Millis) {
        self.now.set(self.now.get().saturating_add(by));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// One-shot timers ordered by deadline, then by scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    pending: BTreeMap<(Millis, TimerId), T>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Millis, task: T) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert((due, id), task);
        id
    }

    /// Cancel a pending timer. Returns the task if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let key = self.pending.keys().find(|(_, k)| *k == id).copied()?;
        self.pending.remove(&key)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.keys().any(|(_, k)| *k == id)
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, TimerId, T)> {
        let (&(due, id), _) = self.pending.first_key_value()?;
        if due > now {
            return None;
        }
        self.pending.remove(&(due, id)).map(|task| (due, id, task))
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
