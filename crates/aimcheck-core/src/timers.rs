//! Deferred callbacks against a logical millisecond clock.
//!
//! Every scheduled event is stamped with the session that created it. Moving
//! to a new session makes all older events inert even if they are still in
//! the queue, so a callback scheduled before a reset can never mutate the
//! next session.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Generation counter identifying one play session.
pub type SessionId = u64;

#[derive(Debug)]
struct Scheduled<E> {
    due_ms: u64,
    seq: u64,
    session: SessionId,
    event: E,
}

// Ordered by (due time, insertion order) only; the payload never participates.
impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

/// Min-heap of session-stamped deferred events.
#[derive(Debug)]
pub struct Scheduler<E> {
    queue: BinaryHeap<Reverse<Scheduled<E>>>,
    session: SessionId,
    next_seq: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            session: 0,
            next_seq: 0,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Start a new session. Events from earlier sessions stay queued but will
    /// be discarded when they come due.
    pub fn next_session(&mut self) -> SessionId {
        self.session += 1;
        self.session
    }

    /// Drop every pending event.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Schedule `event` to fire `delay_ms` after `now_ms`.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, event: E) {
        self.schedule_at(now_ms.saturating_add(delay_ms), event);
    }

    /// Schedule `event` at an absolute logical time.
    pub fn schedule_at(&mut self, due_ms: u64, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled {
            due_ms,
            seq,
            session: self.session,
            event,
        }));
    }

    /// Pop the earliest event due at or before `now_ms`, skipping events that
    /// belong to an older session. Returns the event with its due time.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, E)> {
        loop {
            let due = self.queue.peek().map(|Reverse(s)| s.due_ms)?;
            if due > now_ms {
                return None;
            }
            let Reverse(scheduled) = self.queue.pop()?;
            if scheduled.session != self.session {
                tracing::debug!(
                    stale_session = scheduled.session,
                    session = self.session,
                    due_ms = scheduled.due_ms,
                    "Dropped deferred callback from a previous session"
                );
                continue;
            }
            return Some((scheduled.due_ms, scheduled.event));
        }
    }

    /// Due time of the earliest queued event (stale ones included).
    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(s)| s.due_ms)
    }

    /// Number of queued events (stale ones included).
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending events of the current session, in no particular order.
    pub fn pending(&self) -> impl Iterator<Item = &E> {
        let session = self.session;
        self.queue
            .iter()
            .filter(move |Reverse(s)| s.session == session)
            .map(|Reverse(s)| &s.event)
    }
}
