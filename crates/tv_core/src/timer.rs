//! Scene-owned deferred events.
//!
//! Anything a scene wants to happen "after N seconds" goes through a
//! `TimerQueue<E>` it owns: `schedule` returns an id, the scene advances the
//! queue with its own `dt` and handles whatever events come due. Because the
//! queue belongs to the scene, `cancel_all()` in `cleanup()` is enough to
//! guarantee nothing fires into a torn-down scene.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending<E> {
    id: TimerId,
    remaining: f32,
    event: E,
}

#[derive(Debug)]
pub struct TimerQueue<E> {
    next_id: u64,
    pending: Vec<Pending<E>>,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, delay: f32, event: E) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(Pending {
            id,
            remaining: delay.max(0.0),
            event,
        });
        id
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        before != self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance every timer by `dt` and return the events that came due,
    /// earliest first (ties keep scheduling order).
    pub fn advance(&mut self, dt: f32) -> Vec<E> {
        for p in &mut self.pending {
            p.remaining -= dt;
        }
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].remaining <= 0.0 {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| {
            a.remaining
                .partial_cmp(&b.remaining)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.0.cmp(&b.id.0))
        });
        due.into_iter().map(|p| p.event).collect()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_delay() {
        let mut timers = TimerQueue::new();
        timers.schedule(0.15, "settle");
        assert!(timers.advance(0.1).is_empty());
        assert_eq!(timers.advance(0.06), vec!["settle"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn due_events_come_out_earliest_first() {
        let mut timers = TimerQueue::new();
        timers.schedule(0.3, 3);
        timers.schedule(0.1, 1);
        timers.schedule(0.2, 2);
        assert_eq!(timers.advance(1.0), vec![1, 2, 3]);
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(0.1, "x");
        assert!(timers.is_pending(id));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.advance(1.0).is_empty());
    }

    #[test]
    fn cancel_all_drops_everything() {
        let mut timers = TimerQueue::new();
        timers.schedule(0.1, 'a');
        timers.schedule(5.0, 'b');
        timers.cancel_all();
        assert_eq!(timers.len(), 0);
        assert!(timers.advance(10.0).is_empty());
    }

    #[test]
    fn zero_delay_fires_on_next_advance() {
        let mut timers = TimerQueue::new();
        timers.schedule(0.0, ());
        assert_eq!(timers.advance(0.0).len(), 1);
    }
}
