//! Virtual-time timer queue.
//!
//! The view only asks for callbacks ("call me with this event in 40ms").
//! [`TimerQueue`] orders those requests on a virtual clock so the same view
//! can be driven instantly in tests or mapped onto real sleeps by a runtime.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use rand::Rng;

use crate::scheduler::SessionId;
use crate::shell::Shell;
use crate::view::LinkBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    /// Advance the playback session with this id.
    Playback(SessionId),
    /// Drop the "copied" flag if it still belongs to this copy.
    ClearCopied(u64),
}

/// A callback request: deliver `event` once `after` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub after: Duration,
    pub event: TimerEvent,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    due: Duration,
    seq: u64,
    event: TimerEvent,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Earlier deadline first; ties fire in scheduling order.
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    seq: u64,
    heap: BinaryHeap<Reverse<Entry>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the queue was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn schedule(&mut self, scheduled: Scheduled) {
        self.seq += 1;
        self.heap.push(Reverse(Entry {
            due: self.now + scheduled.after,
            seq: self.seq,
            event: scheduled.event,
        }));
    }

    pub fn extend(&mut self, scheduled: impl IntoIterator<Item = Scheduled>) {
        for item in scheduled {
            self.schedule(item);
        }
    }

    /// Deadline of the earliest pending event.
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }

    /// Pop the earliest event and move the clock to its deadline.
    pub fn pop(&mut self) -> Option<TimerEvent> {
        let Reverse(entry) = self.heap.pop()?;
        self.now = self.now.max(entry.due);
        Some(entry.event)
    }

    /// Pop every event due within `span` from now, moving the clock forward
    /// by exactly `span`.
    pub fn advance_by(&mut self, span: Duration) -> Vec<TimerEvent> {
        let until = self.now + span;
        let mut fired = Vec::new();
        while self.next_due().is_some_and(|due| due <= until) {
            if let Some(event) = self.pop() {
                fired.push(event);
            }
        }
        self.now = until;
        fired
    }
}

/// Feed due timers into `builder` until nothing is pending or `limit`
/// events have fired. Returns the number of events delivered.
pub fn run_until_idle<S: Shell, R: Rng>(
    builder: &mut LinkBuilder<S, R>,
    queue: &mut TimerQueue,
    limit: usize,
) -> usize {
    queue.extend(builder.take_scheduled());
    let mut fired = 0;
    while fired < limit {
        let Some(event) = queue.pop() else {
            break;
        };
        builder.on_timer(event);
        queue.extend(builder.take_scheduled());
        fired += 1;
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64, id: u64) -> Scheduled {
        Scheduled {
            after: Duration::from_millis(ms),
            event: TimerEvent::ClearCopied(id),
        }
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.extend([at(30, 1), at(10, 2), at(20, 3)]);
        assert_eq!(queue.pop(), Some(TimerEvent::ClearCopied(2)));
        assert_eq!(queue.now(), Duration::from_millis(10));
        assert_eq!(queue.pop(), Some(TimerEvent::ClearCopied(3)));
        assert_eq!(queue.pop(), Some(TimerEvent::ClearCopied(1)));
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.now(), Duration::from_millis(30));
    }

    #[test]
    fn ties_keep_scheduling_order() {
        let mut queue = TimerQueue::new();
        queue.extend([at(5, 1), at(5, 2), at(5, 3)]);
        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(
            order,
            vec![
                TimerEvent::ClearCopied(1),
                TimerEvent::ClearCopied(2),
                TimerEvent::ClearCopied(3)
            ]
        );
    }

    #[test]
    fn delays_are_relative_to_current_time() {
        let mut queue = TimerQueue::new();
        queue.schedule(at(100, 1));
        queue.pop();
        queue.schedule(at(50, 2));
        assert_eq!(queue.next_due(), Some(Duration::from_millis(150)));
    }

    #[test]
    fn advance_by_fires_only_due_events() {
        let mut queue = TimerQueue::new();
        queue.extend([at(10, 1), at(40, 2)]);
        assert_eq!(
            queue.advance_by(Duration::from_millis(25)),
            vec![TimerEvent::ClearCopied(1)]
        );
        assert_eq!(queue.now(), Duration::from_millis(25));
        assert_eq!(queue.len(), 1);
        assert!(queue.advance_by(Duration::from_millis(10)).is_empty());
        assert_eq!(
            queue.advance_by(Duration::from_millis(5)),
            vec![TimerEvent::ClearCopied(2)]
        );
        assert!(queue.is_empty());
    }
}
