//! Cancelable one-shot timers.
//!
//! The queue never fires anything by itself: the owner polls it with the
//! current time and receives the events whose deadlines have passed. A
//! cancelled token can never fire, which is what keeps a stale timer from a
//! finished trial out of the next one.

use std::time::Duration;

use log::trace;

/// Handle returned by [`TimerQueue::arm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug)]
struct Pending<E> {
    token: TimerToken,
    deadline_ns: u64,
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

    /// Schedules `event` to be delivered once the absolute `deadline_ns` is
    /// reached. Use [`arm_in`](Self::arm_in) for a delay relative to now.
    pub fn arm(&mut self, deadline_ns: u64, event: E) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id += 1;
        trace!("timer {:?} armed for {} ns", token, deadline_ns);
        self.pending.push(Pending {
            token,
            deadline_ns,
            event,
        });
        token
    }

    /// Schedules `event` to fire `after` the time `now_ns`. Deadlines past the
    /// end of the clock saturate and never fire.
    pub fn arm_in(&mut self, now_ns: u64, after: Duration, event: E) -> TimerToken {
        let after_ns = u64::try_from(after.as_nanos()).unwrap_or(u64::MAX);
        self.arm(now_ns.saturating_add(after_ns), event)
    }

    /// Returns false when the token already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.token != token);
        let removed = self.pending.len() != before;
        if removed {
            trace!("timer {:?} cancelled", token);
        }
        removed
    }

    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.deadline_ns).min()
    }

    /// Removes and returns every event due at `now_ns`, earliest deadline
    /// first, ties in arming order.
    pub fn expired(&mut self, now_ns: u64) -> Vec<E> {
        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.deadline_ns <= now_ns);
        self.pending = rest;
        due.sort_by_key(|p| (p.deadline_ns, p.token.0));
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
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.arm(300, "late");
        q.arm(100, "early");
        q.arm(100, "early-second");
        assert!(q.expired(50).is_empty());
        assert_eq!(q.expired(100), vec!["early", "early-second"]);
        assert_eq!(q.next_deadline(), Some(300));
        assert_eq!(q.expired(1_000), vec!["late"]);
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let keep = q.arm(10, 1);
        let drop = q.arm(10, 2);
        assert!(q.cancel(drop));
        assert!(!q.cancel(drop));
        assert_eq!(q.len(), 1);
        assert_eq!(q.expired(10), vec![1]);
        assert!(!q.cancel(keep));
    }

    #[test]
    fn relative_deadlines() {
        let mut q = TimerQueue::new();
        q.arm_in(1_000, Duration::from_micros(2), "soon");
        assert_eq!(q.next_deadline(), Some(3_000));
        assert!(q.expired(2_999).is_empty());
        assert_eq!(q.expired(3_000), vec!["soon"]);
    }

    #[test]
    fn huge_delays_saturate_instead_of_wrapping() {
        let mut q = TimerQueue::new();
        q.arm_in(u64::MAX - 10, Duration::from_secs(60), "never");
        q.arm_in(5, Duration::MAX, "never either");
        assert_eq!(q.next_deadline(), Some(u64::MAX));
        assert!(q.expired(u64::MAX - 1).is_empty());
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut q = TimerQueue::new();
        q.arm(1, ());
        q.arm(2, ());
        assert_eq!(q.cancel_all(), 2);
        assert!(q.expired(u64::MAX).is_empty());
    }

    #[test]
    fn tokens_are_not_reused() {
        let mut q = TimerQueue::new();
        let a = q.arm(1, ());
        q.cancel_all();
        let b = q.arm(1, ());
        assert_ne!(a, b);
        assert!(!q.cancel(a));
        assert!(q.cancel(b));
    }
}
